// src/config.rs
//
// Engine configuration shared by the Rust API and the C ABI.

use crate::error::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE, OrganError, OrganResult};

// Default audio configuration
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;
pub const DEFAULT_MAX_VOICES: u32 = 16;
pub const DEFAULT_EVENT_CAPACITY: u32 = 1024;

/// Configuration for creating an engine.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrganConfig {
    /// Sample rate in Hz (e.g., 44100.0, 48000.0).
    pub sample_rate: f64,
    /// Maximum number of simultaneous voices for polyphony.
    pub max_voices: u32,
    /// Number of note/registration events that may be pending between two
    /// render chunks before new ones are dropped.
    pub event_capacity: u32,
}

impl OrganConfig {
    /// Default configuration at the given sample rate.
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Check that an engine can be built from this configuration.
    pub fn validate(&self) -> OrganResult<()> {
        if !self.sample_rate.is_finite()
            || !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate)
        {
            return Err(OrganError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_voices == 0 {
            return Err(OrganError::NoVoices);
        }
        if self.event_capacity == 0 {
            return Err(OrganError::NoEventCapacity);
        }
        Ok(())
    }
}

impl Default for OrganConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_voices: DEFAULT_MAX_VOICES,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(OrganConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_sample_rates() {
        for rate in [0.0, -44_100.0, f64::NAN, f64::INFINITY, 1_000.0, 1_000_000.0] {
            let cfg = OrganConfig::with_sample_rate(rate);
            assert!(cfg.validate().is_err(), "rate {rate} should be rejected");
        }
    }

    #[test]
    fn test_rejects_empty_pools() {
        let cfg = OrganConfig {
            max_voices: 0,
            ..OrganConfig::default()
        };
        assert_eq!(cfg.validate(), Err(OrganError::NoVoices));

        let cfg = OrganConfig {
            event_capacity: 0,
            ..OrganConfig::default()
        };
        assert_eq!(cfg.validate(), Err(OrganError::NoEventCapacity));
    }
}
