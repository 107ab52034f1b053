// Additive oscillator bank.

use std::f32::consts::TAU;

use crate::state::{NUM_HARMONICS, PartialLevels};

/// Output scale applied to every partial so a full registration stays
/// within a sensible range before the distortion stage.
const BANK_GAIN: f32 = 0.25;

// ═══════════════════════════════════════════════════════════════════
// Oscillator Bank
// ═══════════════════════════════════════════════════════════════════

/// Sum of sinusoids at integer multiples of a base frequency.
///
/// Every partial owns its phase accumulator and keeps advancing even at
/// zero level, so registration changes never cause phase jumps.
#[derive(Debug, Clone)]
pub struct OscillatorBank {
    phases: [f32; NUM_HARMONICS],
    increments: [f32; NUM_HARMONICS],
    levels: [f32; NUM_HARMONICS],
}

impl OscillatorBank {
    pub fn new() -> Self {
        Self {
            phases: [0.0; NUM_HARMONICS],
            increments: [0.0; NUM_HARMONICS],
            levels: [0.0; NUM_HARMONICS],
        }
    }

    /// Zero every phase accumulator.
    pub fn reset(&mut self) {
        self.phases = [0.0; NUM_HARMONICS];
    }

    /// Load frequencies and weights for the next chunk.
    ///
    /// `note_hz` is the fully modulated note frequency; the registration's
    /// base ratio selects the pitch the partials are multiples of. Partials
    /// at or above Nyquist are muted.
    pub fn prepare(&mut self, note_hz: f32, partials: &PartialLevels, sample_rate: f64) {
        let sr = sample_rate as f32;
        let nyquist = sr * 0.5;
        let base = note_hz * partials.base_ratio;

        for k in 0..NUM_HARMONICS {
            let freq = base * (k + 1) as f32;
            if freq.is_finite() && freq > 0.0 && freq < nyquist {
                self.increments[k] = freq / sr;
                self.levels[k] = partials.levels[k] * BANK_GAIN;
            } else {
                self.increments[k] = if freq.is_finite() { (freq / sr).fract() } else { 0.0 };
                self.levels[k] = 0.0;
            }
        }
    }

    /// Produce one sample and advance every partial.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let mut sum = 0.0;
        for k in 0..NUM_HARMONICS {
            let level = self.levels[k];
            if level != 0.0 {
                sum += level * (self.phases[k] * TAU).sin();
            }
            self.phases[k] = (self.phases[k] + self.increments[k]).fract();
        }
        sum
    }
}

impl Default for OscillatorBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48_000.0;

    fn single_partial(k: usize) -> PartialLevels {
        let mut levels = [0.0; NUM_HARMONICS];
        levels[k] = 1.0;
        PartialLevels {
            base_ratio: 1.0,
            levels,
        }
    }

    fn upward_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
            .count()
    }

    #[test]
    fn test_silent_without_levels() {
        let mut bank = OscillatorBank::new();
        let partials = PartialLevels {
            base_ratio: 1.0,
            levels: [0.0; NUM_HARMONICS],
        };
        bank.prepare(440.0, &partials, SR);
        assert!((0..256).all(|_| bank.next_sample() == 0.0));
    }

    #[test]
    fn test_partial_frequency() {
        let mut bank = OscillatorBank::new();
        bank.prepare(100.0, &single_partial(2), SR); // 300 Hz
        let samples: Vec<f32> = (0..48_000).map(|_| bank.next_sample()).collect();
        let crossings = upward_crossings(&samples);
        assert!(crossings.abs_diff(300) <= 1, "expected ~300 cycles, got {crossings}");
    }

    #[test]
    fn test_partials_above_nyquist_are_muted() {
        let mut bank = OscillatorBank::new();
        bank.prepare(4_000.0, &single_partial(15), SR); // 64 kHz
        assert!((0..256).all(|_| bank.next_sample() == 0.0));
    }

    #[test]
    fn test_level_changes_keep_phase() {
        let partials = single_partial(0);
        let muted = PartialLevels {
            base_ratio: 1.0,
            levels: [0.0; NUM_HARMONICS],
        };

        let mut steady = OscillatorBank::new();
        let mut toggled = OscillatorBank::new();
        steady.prepare(220.0, &partials, SR);
        toggled.prepare(220.0, &muted, SR);

        for _ in 0..100 {
            steady.next_sample();
            toggled.next_sample();
        }
        toggled.prepare(220.0, &partials, SR);
        for _ in 0..100 {
            assert_eq!(steady.next_sample(), toggled.next_sample());
        }
    }

    #[test]
    fn test_reset_restarts_phase() {
        let mut bank = OscillatorBank::new();
        bank.prepare(440.0, &single_partial(0), SR);
        let first: Vec<f32> = (0..32).map(|_| bank.next_sample()).collect();
        bank.reset();
        let again: Vec<f32> = (0..32).map(|_| bank.next_sample()).collect();
        assert_eq!(first, again);
        assert_eq!(first[0], 0.0);
    }
}
