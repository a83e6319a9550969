use std::path::Path;

use crate::config_io::{self, CONFIG_ROOT_PATH};
use crate::puzzle::SwitchPattern;
use anyhow::bail;
use config::Config;
use config::File;
use serde::Deserialize;
use serde::Serialize;

fn def_pinch_threshold() -> f32 {
    0.04
}

fn def_hand_forward_offset() -> f32 {
    0.08
}

fn def_glitch_threshold() -> f32 {
    100.0
}

fn def_drag_sensitivity() -> f32 {
    0.003
}

fn def_drag_max_offset() -> f32 {
    5.0
}

fn def_hand_tracking_ceiling() -> f32 {
    15.0
}

fn def_pinch_ceiling() -> f32 {
    10.0
}

fn def_anchor_exception_radius() -> f32 {
    2.0
}

fn def_pinch_follow_speed() -> f32 {
    2.0
}

fn def_pinch_snap_distance() -> f32 {
    0.03
}

fn def_grace_period() -> f32 {
    2.0
}

fn def_protective_radius() -> f32 {
    0.4
}

fn def_protective_impulse() -> f32 {
    1.5
}

fn def_protective_settle() -> f32 {
    1.0
}

fn def_grounded_height() -> f32 {
    0.08
}

fn def_absolute_safety_height() -> f32 {
    0.10
}

fn def_attach_threshold() -> f32 {
    0.30
}

fn def_switch_drag_dead_zone() -> f32 {
    10.0
}

fn def_winning_pattern() -> String {
    "01100".into()
}

fn def_true() -> bool {
    true
}

fn def_false() -> bool {
    false
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InteractionConfig {
    /// Thumb-tip to index-tip distance below which a hand counts as pinching.
    #[serde(default = "def_pinch_threshold")]
    pub pinch_threshold: f32,

    /// How far ahead of the wrist (toward the index tip) the hand position sits.
    #[serde(default = "def_hand_forward_offset")]
    pub hand_forward_offset: f32,

    /// Drag deltas longer than this are treated as sensor glitches.
    #[serde(default = "def_glitch_threshold")]
    pub glitch_threshold: f32,

    #[serde(default = "def_drag_sensitivity")]
    pub drag_sensitivity: f32,

    /// Radius the accumulated drag offset is clamped to.
    #[serde(default = "def_drag_max_offset")]
    pub drag_max_offset: f32,

    #[serde(default = "def_hand_tracking_ceiling")]
    pub hand_tracking_ceiling: f32,

    #[serde(default = "def_pinch_ceiling")]
    pub pinch_ceiling: f32,

    #[serde(default = "def_anchor_exception_radius")]
    pub anchor_exception_radius: f32,

    /// Meters per second the prop travels toward a pinching hand.
    #[serde(default = "def_pinch_follow_speed")]
    pub pinch_follow_speed: f32,

    #[serde(default = "def_pinch_snap_distance")]
    pub pinch_snap_distance: f32,

    /// Seconds a released pinch may resume before the prop drops.
    #[serde(default = "def_grace_period")]
    pub grace_period: f32,

    #[serde(default = "def_protective_radius")]
    pub protective_radius: f32,

    #[serde(default = "def_protective_impulse")]
    pub protective_impulse: f32,

    /// Seconds between a protective bounce and the re-lock to grounded.
    #[serde(default = "def_protective_settle")]
    pub protective_settle: f32,

    /// Pivot height above the floor a protective bounce settles at.
    #[serde(default = "def_grounded_height")]
    pub grounded_height: f32,

    #[serde(default = "def_absolute_safety_height")]
    pub absolute_safety_height: f32,

    #[serde(default = "def_attach_threshold")]
    pub attach_threshold: f32,

    /// Vertical drag (screen units) needed before a switch gesture has a direction.
    #[serde(default = "def_switch_drag_dead_zone")]
    pub switch_drag_dead_zone: f32,

    #[serde(default = "def_winning_pattern")]
    pub winning_pattern: String,

    #[serde(default = "def_false")]
    pub handle_starts_attached: bool,

    #[serde(default = "def_true")]
    pub sounds_enabled: bool,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: def_pinch_threshold(),
            hand_forward_offset: def_hand_forward_offset(),
            glitch_threshold: def_glitch_threshold(),
            drag_sensitivity: def_drag_sensitivity(),
            drag_max_offset: def_drag_max_offset(),
            hand_tracking_ceiling: def_hand_tracking_ceiling(),
            pinch_ceiling: def_pinch_ceiling(),
            anchor_exception_radius: def_anchor_exception_radius(),
            pinch_follow_speed: def_pinch_follow_speed(),
            pinch_snap_distance: def_pinch_snap_distance(),
            grace_period: def_grace_period(),
            protective_radius: def_protective_radius(),
            protective_impulse: def_protective_impulse(),
            protective_settle: def_protective_settle(),
            grounded_height: def_grounded_height(),
            absolute_safety_height: def_absolute_safety_height(),
            attach_threshold: def_attach_threshold(),
            switch_drag_dead_zone: def_switch_drag_dead_zone(),
            winning_pattern: def_winning_pattern(),
            handle_starts_attached: def_false(),
            sounds_enabled: def_true(),
        }
    }
}

impl InteractionConfig {
    fn sanitize_range(name: &str, val: f32, from: f32, to: f32) -> anyhow::Result<()> {
        if !val.is_finite() || val < from || val > to {
            bail!(
                "InteractionConfig: {} needs to be between {} and {}, got {}",
                name,
                from,
                to,
                val
            );
        }
        Ok(())
    }

    pub fn load_from_disk() -> anyhow::Result<Self> {
        let config = load_general()?;
        config.post_load()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.post_load()?;
        Ok(config)
    }

    pub fn pattern(&self) -> anyhow::Result<SwitchPattern> {
        Ok(self.winning_pattern.parse()?)
    }

    /// Range-check every tunable and the switch pattern.
    pub(crate) fn post_load(&self) -> anyhow::Result<()> {
        Self::sanitize_range("pinch_threshold", self.pinch_threshold, 0.001, 0.5)?;
        Self::sanitize_range("hand_forward_offset", self.hand_forward_offset, 0.0, 0.5)?;
        Self::sanitize_range("glitch_threshold", self.glitch_threshold, 1.0, 10_000.0)?;
        Self::sanitize_range("drag_sensitivity", self.drag_sensitivity, 0.0001, 1.0)?;
        Self::sanitize_range("drag_max_offset", self.drag_max_offset, 0.1, 50.0)?;
        Self::sanitize_range("hand_tracking_ceiling", self.hand_tracking_ceiling, 0.5, 100.0)?;
        Self::sanitize_range("pinch_ceiling", self.pinch_ceiling, 0.5, 100.0)?;
        Self::sanitize_range(
            "anchor_exception_radius",
            self.anchor_exception_radius,
            0.0,
            10.0,
        )?;
        Self::sanitize_range("pinch_follow_speed", self.pinch_follow_speed, 0.01, 100.0)?;
        Self::sanitize_range("pinch_snap_distance", self.pinch_snap_distance, 0.0, 1.0)?;
        Self::sanitize_range("grace_period", self.grace_period, 0.0, 30.0)?;
        Self::sanitize_range("protective_radius", self.protective_radius, 0.0, 5.0)?;
        Self::sanitize_range("protective_impulse", self.protective_impulse, 0.0, 50.0)?;
        Self::sanitize_range("protective_settle", self.protective_settle, 0.0, 10.0)?;
        Self::sanitize_range("grounded_height", self.grounded_height, 0.0, 2.0)?;
        Self::sanitize_range(
            "absolute_safety_height",
            self.absolute_safety_height,
            0.0,
            2.0,
        )?;
        Self::sanitize_range("attach_threshold", self.attach_threshold, 0.01, 5.0)?;
        Self::sanitize_range("switch_drag_dead_zone", self.switch_drag_dead_zone, 0.0, 1000.0)?;
        self.pattern()?;
        Ok(())
    }
}

fn add_file_source(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    path: &Path,
) -> config::ConfigBuilder<config::builder::DefaultState> {
    log::info!("Loading config file: {}", path.to_string_lossy());
    builder.add_source(File::from(path))
}

pub fn load_general() -> anyhow::Result<InteractionConfig> {
    let mut settings_builder = Config::builder();

    if let Some(base_conf) = config_io::base_config_file(&CONFIG_ROOT_PATH) {
        settings_builder = add_file_source(settings_builder, &base_conf);
    }
    for path in config_io::conf_d_files(&CONFIG_ROOT_PATH) {
        settings_builder = add_file_source(settings_builder, &path);
    }

    let settings = settings_builder.build()?;
    Ok(settings.try_deserialize::<InteractionConfig>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_matches_default() {
        let loaded = InteractionConfig::from_yaml("{}").unwrap();
        let default = InteractionConfig::default();
        assert_eq!(loaded.pinch_threshold, default.pinch_threshold);
        assert_eq!(loaded.grace_period, default.grace_period);
        assert_eq!(loaded.winning_pattern, "01100");
        assert!(!loaded.handle_starts_attached);
    }

    #[test]
    fn test_override_single_value() {
        let loaded = InteractionConfig::from_yaml("grace_period: 3.5\n").unwrap();
        assert_eq!(loaded.grace_period, 3.5);
        assert_eq!(loaded.attach_threshold, 0.30);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(InteractionConfig::from_yaml("pinch_threshold: 4.0\n").is_err());
        assert!(InteractionConfig::from_yaml("grace_period: .nan\n").is_err());
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        assert!(InteractionConfig::from_yaml("winning_pattern: \"0110\"\n").is_err());
        assert!(InteractionConfig::from_yaml("winning_pattern: \"01a00\"\n").is_err());
    }
}
