use strum::{AsRefStr, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum SoundId {
    PinchGrab,
    Toggle,
    PuzzleSolved,
    DropImpact,
    Attach,
}

/// Fire-and-forget one-shot playback.
pub trait SoundSink {
    fn play(&mut self, sound: SoundId);
}

/// Logs every request and keeps them for inspection.
#[derive(Debug, Default)]
pub struct SoundLog {
    pub played: Vec<SoundId>,
    pub muted: bool,
}

impl SoundLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, sound: SoundId) -> usize {
        self.played.iter().filter(|s| **s == sound).count()
    }
}

impl SoundSink for SoundLog {
    fn play(&mut self, sound: SoundId) {
        if self.muted {
            return;
        }
        log::debug!("Sound: {}", sound.as_ref());
        self.played.push(sound);
    }
}

#[cfg(feature = "audio")]
pub use rodio_output::AudioOutput;

#[cfg(feature = "audio")]
mod rodio_output {
    use std::time::Duration;

    use rodio::{source::SineWave, OutputStream, OutputStreamHandle, Source};

    use super::{SoundId, SoundSink};

    /// Synthesized tones through the default output device.
    pub struct AudioOutput {
        audio_stream: Option<(OutputStream, OutputStreamHandle)>,
        first_try: bool,
    }

    impl AudioOutput {
        pub fn new() -> Self {
            Self {
                audio_stream: None,
                first_try: true,
            }
        }

        fn get_handle(&mut self) -> Option<&OutputStreamHandle> {
            if self.audio_stream.is_none() && self.first_try {
                self.first_try = false;
                if let Ok((stream, handle)) = OutputStream::try_default() {
                    self.audio_stream = Some((stream, handle));
                } else {
                    log::error!("Failed to open audio stream. Audio will not work.");
                    return None;
                }
            }
            self.audio_stream.as_ref().map(|(_, h)| h)
        }
    }

    impl Default for AudioOutput {
        fn default() -> Self {
            Self::new()
        }
    }

    const fn tone(sound: SoundId) -> (f32, u64) {
        match sound {
            SoundId::PinchGrab => (660.0, 60),
            SoundId::Toggle => (1320.0, 30),
            SoundId::PuzzleSolved => (880.0, 600),
            SoundId::DropImpact => (110.0, 120),
            SoundId::Attach => (990.0, 90),
        }
    }

    impl SoundSink for AudioOutput {
        fn play(&mut self, sound: SoundId) {
            let Some(handle) = self.get_handle() else {
                return;
            };
            let (freq, millis) = tone(sound);
            let source = SineWave::new(freq)
                .take_duration(Duration::from_millis(millis))
                .amplify(0.2);
            if let Err(e) = handle.play_raw(source.convert_samples()) {
                log::error!("Failed to play {}: {}", sound.as_ref(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_sound_names() {
        let names: Vec<_> = SoundId::iter().map(|s| s.as_ref().to_string()).collect();
        assert_eq!(
            names,
            ["pinch_grab", "toggle", "puzzle_solved", "drop_impact", "attach"]
        );
    }

    #[test]
    fn test_muted_log_records_nothing() {
        let mut log = SoundLog {
            muted: true,
            ..Default::default()
        };
        log.play(SoundId::Toggle);
        assert_eq!(log.count(SoundId::Toggle), 0);
    }
}
