// src/nodes/modulation.rs
//
// Vibrato LFO, evaluated at chunk rate.

use std::f32::consts::TAU;

/// Vibrato rate in Hz.
pub const VIBRATO_RATE_HZ: f32 = 5.0;

/// Sine LFO shared by every voice.
///
/// Advanced once per chunk; the value at the chunk start is held for the
/// whole chunk.
#[derive(Debug, Clone)]
pub struct Vibrato {
    rate: f32,  // Hz
    phase: f32, // 0.0 - 1.0
}

impl Vibrato {
    pub fn new() -> Self {
        Self {
            rate: VIBRATO_RATE_HZ,
            phase: 0.0,
        }
    }

    /// Return the LFO value (-1..1) for this chunk and step past it.
    #[inline]
    pub fn advance(&mut self, frames: usize, sample_rate: f64) -> f32 {
        let value = (self.phase * TAU).sin();
        self.phase += self.rate * frames as f32 / sample_rate as f32;
        self.phase -= self.phase.floor();
        value
    }

    /// Frequency multiplier for `depth` semitones of peak deviation.
    #[inline]
    pub fn factor(lfo: f32, depth: f32) -> f32 {
        (depth * lfo / 12.0).exp2()
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

impl Default for Vibrato {
    fn default() -> Self {
        Self::new()
    }
}
