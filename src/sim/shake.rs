//! Screen shake with linear decay

use glam::Vec2;
use rand::Rng;

/// Camera shake; intensity is the max offset in metres
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenShake {
    /// Intensity at the moment the shake started
    pub start_intensity: f32,
    /// Total duration in seconds
    pub duration: f32,
    /// Seconds elapsed since the start
    pub elapsed: f32,
}

impl ScreenShake {
    /// Start a shake. A weaker shake never cuts a stronger one short.
    pub fn start(&mut self, intensity: f32, duration: f32) {
        if intensity <= 0.0 || duration <= 0.0 {
            return;
        }
        if intensity >= self.intensity() {
            self.start_intensity = intensity;
            self.duration = duration;
            self.elapsed = 0.0;
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.is_active() {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
    }

    /// Current intensity, falling linearly to zero over the duration
    pub fn intensity(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        let remaining = 1.0 - self.elapsed / self.duration;
        (self.start_intensity * remaining).max(0.0)
    }

    pub fn is_active(&self) -> bool {
        self.intensity() > 0.0
    }

    /// Random camera offset within the current intensity
    pub fn offset(&self, rng: &mut impl Rng) -> Vec2 {
        let intensity = self.intensity();
        if intensity <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            rng.random_range(-1.0f32..=1.0) * intensity,
            rng.random_range(-1.0f32..=1.0) * intensity,
        )
    }

    pub fn stop(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_linear_decay() {
        let mut shake = ScreenShake::default();
        shake.start(0.5, 1.0);
        assert!((shake.intensity() - 0.5).abs() < 1e-6);
        shake.update(0.5);
        assert!((shake.intensity() - 0.25).abs() < 1e-6);
        shake.update(0.5);
        assert_eq!(shake.intensity(), 0.0);
        assert!(!shake.is_active());
        // Stays at rest
        shake.update(1.0);
        assert_eq!(shake.intensity(), 0.0);
    }

    #[test]
    fn test_offset_bounded_and_zero_when_idle() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut shake = ScreenShake::default();
        assert_eq!(shake.offset(&mut rng), Vec2::ZERO);

        shake.start(0.3, 0.4);
        for _ in 0..100 {
            let o = shake.offset(&mut rng);
            assert!(o.x.abs() <= 0.3 && o.y.abs() <= 0.3);
        }
    }

    #[test]
    fn test_weaker_shake_does_not_override() {
        let mut shake = ScreenShake::default();
        shake.start(0.6, 1.0);
        shake.start(0.1, 5.0);
        assert!((shake.intensity() - 0.6).abs() < 1e-6);
        assert_eq!(shake.duration, 1.0);
    }
}
