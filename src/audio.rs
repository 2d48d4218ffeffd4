//! Sound cues
//!
//! The simulation never plays audio itself. It queues `SoundEffect` cues that
//! the host drains once per frame and hands to an `AudioManager`. When no
//! playback backend is available the manager stays silent; a missing device
//! never reaches the simulation.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Ship or saucer fired
    Fire,
    /// Ship thrust
    Thrust,
    /// Asteroid explosions by size
    BangLarge,
    BangMedium,
    BangSmall,
    /// Ship destroyed
    BangShip,
    /// Alien saucer destroyed
    BangAlien,
    /// Ship heartbeat
    Beat,
    /// Invulnerability picked up
    Shield,
    /// Extra life picked up
    ExtraLife,
}

impl SoundEffect {
    /// Resource name a file-based backend would load
    pub fn file_name(&self) -> &'static str {
        match self {
            SoundEffect::Fire => "fire.wav",
            SoundEffect::Thrust => "thrust.wav",
            SoundEffect::BangLarge => "bangLarge.wav",
            SoundEffect::BangMedium => "bangMedium.wav",
            SoundEffect::BangSmall => "bangSmall.wav",
            SoundEffect::BangShip => "bangShip.wav",
            SoundEffect::BangAlien => "bangAlien.wav",
            SoundEffect::Beat => "beat1.wav",
            SoundEffect::Shield => "alarm_beep.wav",
            SoundEffect::ExtraLife => "coin_flip.wav",
        }
    }
}

/// Something that can play a cue at a volume (0.0 - 1.0)
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect, volume: f32);
}

/// Discards every cue
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect, _volume: f32) {}
}

/// Logs cues instead of playing them (headless runs)
#[derive(Debug, Default)]
pub struct LogAudio {
    pub played: usize,
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect, volume: f32) {
        self.played += 1;
        log::trace!("sound {} at {:.2}", effect.file_name(), volume);
    }
}

/// Audio manager for the game
pub struct AudioManager {
    sink: Option<Box<dyn AudioSink>>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AudioManager {
    /// `None` means no device could be opened; playback becomes a no-op
    pub fn new(sink: Option<Box<dyn AudioSink>>) -> Self {
        if sink.is_none() {
            log::warn!("No audio backend available - audio disabled");
        }
        Self {
            sink,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.sink.is_some()
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(sink) = self.sink.as_mut() else { return };
        sink.play(effect, vol);
    }

    /// Play every queued cue
    pub fn play_all(&mut self, effects: impl IntoIterator<Item = SoundEffect>) {
        for effect in effects {
            self.play(effect);
        }
    }
}
