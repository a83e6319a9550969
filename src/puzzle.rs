//! Five-switch combination lock.
//!
//! A gesture sets a switch to the position it points at, so repeating the same
//! gesture is a no-op: no sound, no solved check.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::backend::{
    audio::{SoundId, SoundSink},
    common::PuzzleError,
};

pub const SWITCH_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchDirection {
    /// Bit 0.
    Up,
    /// Bit 1.
    Down,
}

impl SwitchDirection {
    pub const fn bit(self) -> bool {
        matches!(self, Self::Down)
    }

    /// Screen-space vertical drag; negative is up.
    pub fn from_drag(dy: f32, dead_zone: f32) -> Option<Self> {
        if !dy.is_finite() || dy.abs() <= dead_zone {
            None
        } else if dy < 0.0 {
            Some(Self::Up)
        } else {
            Some(Self::Down)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchPattern(pub [bool; SWITCH_COUNT]);

impl FromStr for SwitchPattern {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bits = [false; SWITCH_COUNT];
        let mut chars = s.chars();
        for bit in &mut bits {
            *bit = match chars.next() {
                Some('0') => false,
                Some('1') => true,
                _ => return Err(PuzzleError::BadPattern(s.to_string())),
            };
        }
        if chars.next().is_some() {
            return Err(PuzzleError::BadPattern(s.to_string()));
        }
        Ok(Self(bits))
    }
}

impl fmt::Display for SwitchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Unchanged,
    Changed { solved: bool },
}

pub struct SwitchPuzzle {
    bits: SwitchPattern,
    winning: SwitchPattern,
}

fn slot(index: usize) -> Result<usize, PuzzleError> {
    if (1..=SWITCH_COUNT).contains(&index) {
        Ok(index - 1)
    } else {
        Err(PuzzleError::InvalidSwitch(index))
    }
}

impl SwitchPuzzle {
    pub fn new(winning: SwitchPattern) -> Self {
        Self {
            bits: SwitchPattern::default(),
            winning,
        }
    }

    pub fn bit(&self, index: usize) -> Result<bool, PuzzleError> {
        Ok(self.bits.0[slot(index)?])
    }

    pub const fn state(&self) -> SwitchPattern {
        self.bits
    }

    pub fn state_string(&self) -> String {
        self.bits.to_string()
    }

    pub fn is_solved(&self) -> bool {
        self.bits == self.winning
    }

    pub fn reset(&mut self) {
        self.bits = SwitchPattern::default();
        log::info!("Switches reset to {}", self.bits);
    }

    /// Set switch `index` (1-based) to the position `direction` points at.
    pub fn toggle(
        &mut self,
        index: usize,
        direction: SwitchDirection,
        sounds: &mut dyn SoundSink,
    ) -> Result<ToggleOutcome, PuzzleError> {
        let slot = slot(index)?;
        let bit = direction.bit();
        if self.bits.0[slot] == bit {
            log::debug!("Switch {} already {:?}", index, direction);
            return Ok(ToggleOutcome::Unchanged);
        }

        self.bits.0[slot] = bit;
        sounds.play(SoundId::Toggle);
        log::debug!("Switch {} -> {:?}, state {}", index, direction, self.bits);

        let solved = self.is_solved();
        if solved {
            log::info!("Switch combination {} solved", self.bits);
            sounds.play(SoundId::PuzzleSolved);
        }
        Ok(ToggleOutcome::Changed { solved })
    }
}
