//! Rising-edge detection on the motion sensor line.

use motion_kvs_types::SensorLevel;

/// Detects inactive → active transitions between consecutive samples.
///
/// Holds only the previously sampled level. Call [`detect`](Self::detect)
/// exactly once per tick with the fresh sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    previous: SensorLevel,
}

impl EdgeDetector {
    /// Create a detector whose previous level is inactive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `level` is above the previous sample.
    ///
    /// The previous level is updated to `level` whether or not an edge fired.
    pub fn detect(&mut self, level: SensorLevel) -> bool {
        let rising = level > self.previous;
        self.previous = level;
        rising
    }

    /// The level seen on the last call to `detect`.
    pub fn previous(&self) -> SensorLevel {
        self.previous
    }

    /// Forget the last sample; the stored level becomes inactive.
    pub fn reset(&mut self) {
        self.previous = SensorLevel::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SensorLevel::{Active, Inactive};

    fn edges(levels: &[SensorLevel]) -> Vec<bool> {
        let mut detector = EdgeDetector::new();
        levels.iter().map(|&l| detector.detect(l)).collect()
    }

    #[test]
    fn fires_once_on_rising_transition() {
        assert_eq!(
            edges(&[Inactive, Inactive, Active, Active, Inactive]),
            vec![false, false, true, false, false]
        );
    }

    #[test]
    fn never_fires_on_flat_or_falling() {
        assert!(edges(&[Inactive; 5]).iter().all(|e| !e));

        let mut detector = EdgeDetector::new();
        detector.detect(Active);
        assert!(!detector.detect(Active));
        assert!(!detector.detect(Inactive));
        assert!(!detector.detect(Inactive));
    }

    #[test]
    fn high_line_at_start_is_an_edge() {
        assert_eq!(edges(&[Active, Active]), vec![true, false]);
    }

    #[test]
    fn previous_tracks_last_sample() {
        let mut detector = EdgeDetector::new();
        detector.detect(Active);
        assert_eq!(detector.previous(), Active);
        detector.detect(Inactive);
        assert_eq!(detector.previous(), Inactive);
    }

    #[test]
    fn reset_lets_a_held_line_fire_again() {
        let mut detector = EdgeDetector::new();
        assert!(detector.detect(Active));
        assert!(!detector.detect(Active));

        detector.reset();
        assert!(detector.detect(Active));
    }
}
