//! Audio system using Web Audio API
//!
//! Sound effects are synthesized from oscillators, so there are no audio
//! assets to fetch. The event mapping is platform independent; playback is
//! WASM only.

use crate::sim::{GameEvent, PickupKind};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    Jump,
    Slide,
    Coin,
    PowerUp,
    /// Shield soaked up a hit
    ShieldBreak,
    Crash,
    DifficultyUp,
    /// Continued with a lifeline
    Lifeline,
    GameOver,
    HighScore,
}

impl SoundEffect {
    /// Sound for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::RunStarted => None,
            GameEvent::Jumped => Some(SoundEffect::Jump),
            GameEvent::Slid => Some(SoundEffect::Slide),
            GameEvent::CoinCollected { .. } => Some(SoundEffect::Coin),
            GameEvent::PowerUpCollected(_) => Some(SoundEffect::PowerUp),
            GameEvent::ShieldAbsorbed => Some(SoundEffect::ShieldBreak),
            GameEvent::DifficultyIncreased { .. } => Some(SoundEffect::DifficultyUp),
            GameEvent::Crashed { .. } => Some(SoundEffect::Crash),
            GameEvent::Revived { .. } => Some(SoundEffect::Lifeline),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
        }
    }
}

/// Pitch offset so each power-up sounds slightly different
pub fn powerup_pitch(kind: PickupKind) -> f32 {
    match kind {
        PickupKind::Shield => 1.0,
        PickupKind::Booster => 1.25,
        PickupKind::Magnet => 0.8,
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundEffect;
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Fails outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.master_volume = settings.master_volume.clamp(0.0, 1.0);
            self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        }

        /// Mute/unmute all audio (mirrors `pageMuted`)
        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.master_volume * self.sfx_volume
            }
        }

        /// Play a sound effect; `pitch` scales every frequency
        pub fn play(&self, effect: SoundEffect, pitch: f32) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Jump => self.sweep(ctx, vol * 0.3, 220.0 * pitch, 520.0 * pitch, 0.15),
                SoundEffect::Slide => self.play_slide(ctx, vol, pitch),
                SoundEffect::Coin => {
                    self.arpeggio(ctx, vol * 0.2, &[988.0, 1319.0], 0.06, 0.12, pitch)
                }
                SoundEffect::PowerUp => {
                    self.arpeggio(ctx, vol * 0.25, &[523.0, 659.0, 784.0, 1047.0], 0.06, 0.15, pitch)
                }
                SoundEffect::ShieldBreak => self.play_shield_break(ctx, vol),
                SoundEffect::Crash => self.play_crash(ctx, vol),
                SoundEffect::DifficultyUp => {
                    self.arpeggio(ctx, vol * 0.3, &[392.0, 523.0, 659.0, 784.0], 0.1, 0.35, pitch)
                }
                SoundEffect::Lifeline => self.sweep(ctx, vol * 0.35, 300.0, 1200.0, 0.4),
                SoundEffect::GameOver => {
                    self.arpeggio(ctx, vol * 0.3, &[440.0, 370.0, 311.0, 220.0], 0.2, 0.3, pitch)
                }
                SoundEffect::HighScore => self.arpeggio(
                    ctx,
                    vol * 0.25,
                    &[523.0, 659.0, 784.0, 880.0, 1047.0],
                    0.08,
                    0.25,
                    pitch,
                ),
            }
        }

        // === Sound generators ===

        /// Create an oscillator routed through a gain node
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Single tone gliding from `from` to `to`
        fn sweep(&self, ctx: &AudioContext, level: f32, from: f32, to: f32, len: f64) {
            let Some((osc, gain)) = self.create_osc(ctx, from, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + len)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + len * 0.8)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + len + 0.05).ok();
        }

        /// Notes played one after another
        fn arpeggio(
            &self,
            ctx: &AudioContext,
            level: f32,
            notes: &[f32],
            step: f64,
            len: f64,
            pitch: f32,
        ) {
            for (i, freq) in notes.iter().enumerate() {
                let Some((osc, gain)) =
                    self.create_osc(ctx, freq * pitch, OscillatorType::Triangle)
                else {
                    continue;
                };
                let t = ctx.current_time() + i as f64 * step;
                gain.gain().set_value_at_time(level, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + len)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + len + 0.05).ok();
            }
        }

        /// Low scrape
        fn play_slide(&self, ctx: &AudioContext, vol: f32, pitch: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 180.0 * pitch, OscillatorType::Sawtooth)
            else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.15, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                .ok();
            osc.frequency().set_value_at_time(180.0 * pitch, t).ok();
            osc.frequency().set_value_at_time(140.0 * pitch, t + 0.05).ok();
            osc.frequency().set_value_at_time(170.0 * pitch, t + 0.1).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(90.0 * pitch, t + 0.25)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        /// Bright crackle over a soft thump
        fn play_shield_break(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 2400.0, OscillatorType::Square) {
                gain.gain().set_value_at_time(vol * 0.12, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                    .ok();
                for (i, f) in [2400.0, 3600.0, 1800.0, 3000.0, 1200.0].iter().enumerate() {
                    osc.frequency()
                        .set_value_at_time(*f, t + i as f64 * 0.025)
                        .ok();
                }
                osc.start().ok();
                osc.stop_with_when(t + 0.18).ok();
            }

            if let Some((osc, gain)) = self.create_osc(ctx, 90.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.15).ok();
            }
        }

        /// Heavy impact
        fn play_crash(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 110.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.5, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.45)
                    .ok();
                osc.frequency().set_value_at_time(110.0, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(30.0, t + 0.45)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.5).ok();
            }

            if let Some((osc, gain)) = self.create_osc(ctx, 1200.0, OscillatorType::Square) {
                gain.gain().set_value_at_time(vol * 0.18, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.1).ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_sounds() {
        assert_eq!(SoundEffect::for_event(&GameEvent::RunStarted), None);
        assert_eq!(
            SoundEffect::for_event(&GameEvent::CoinCollected { total: 3 }),
            Some(SoundEffect::Coin)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::Revived { lifelines_left: 0 }),
            Some(SoundEffect::Lifeline)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::DifficultyIncreased {
                index: 2,
                name: "Runner"
            }),
            Some(SoundEffect::DifficultyUp)
        );
    }

    #[test]
    fn test_powerup_pitch_distinct() {
        let pitches = [
            powerup_pitch(PickupKind::Shield),
            powerup_pitch(PickupKind::Booster),
            powerup_pitch(PickupKind::Magnet),
        ];
        assert!(pitches[0] != pitches[1] && pitches[1] != pitches[2]);
    }
}
