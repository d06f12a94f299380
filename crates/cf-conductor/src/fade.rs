//! Fades
//!
//! Linear ramp of a lease's internal volume, ticked by the conductor.

use crate::handle::LeaseHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct Fade {
    lease: LeaseHandle,
    from: f32,
    to: f32,
    /// Seconds
    duration: f32,
    elapsed: f32,
    stop_on_complete: bool,
}

impl Fade {
    pub fn new(
        lease: LeaseHandle,
        from: f32,
        to: f32,
        duration: f32,
        stop_on_complete: bool,
    ) -> Self {
        Self {
            lease,
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            stop_on_complete,
        }
    }

    /// Silence to `target`
    pub fn fade_in(lease: LeaseHandle, target: f32, duration: f32) -> Self {
        Self::new(lease, 0.0, target, duration, false)
    }

    /// `from` to silence, then stop
    pub fn fade_out(lease: LeaseHandle, from: f32, duration: f32) -> Self {
        Self::new(lease, from, 0.0, duration, true)
    }

    #[inline]
    pub fn lease(&self) -> LeaseHandle {
        self.lease
    }

    #[inline]
    pub fn stop_on_complete(&self) -> bool {
        self.stop_on_complete
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Interpolated volume at the current elapsed time
    pub fn value(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    /// Advance by `dt` seconds (returns true if still fading)
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        !self.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lease() -> LeaseHandle {
        LeaseHandle::from_raw(1)
    }

    #[test]
    fn test_linear_progress() {
        let mut fade = Fade::fade_in(lease(), 0.8, 2.0);
        assert_relative_eq!(fade.value(), 0.0);

        assert!(fade.tick(0.5));
        assert_relative_eq!(fade.value(), 0.2);

        assert!(fade.tick(1.0));
        assert_relative_eq!(fade.value(), 0.6);

        assert!(!fade.tick(1.0));
        assert_relative_eq!(fade.value(), 0.8);
        assert!(fade.is_complete());
    }

    #[test]
    fn test_fade_out_stops() {
        let mut fade = Fade::fade_out(lease(), 1.0, 0.25);
        assert!(fade.stop_on_complete());
        assert!(!fade.tick(0.3));
        assert_eq!(fade.value(), 0.0);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let mut fade = Fade::new(lease(), 1.0, 0.5, 0.0, false);
        assert!(fade.is_complete());
        assert!(!fade.tick(0.0));
        assert_eq!(fade.value(), 0.5);
    }

    #[test]
    fn test_negative_dt_ignored() {
        let mut fade = Fade::fade_in(lease(), 1.0, 1.0);
        fade.tick(-5.0);
        assert_eq!(fade.value(), 0.0);
    }
}
