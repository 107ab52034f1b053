// src/error.rs
//
// Errors reported by engine initialization.

/// Lowest sample rate the engine accepts, in Hz.
pub const MIN_SAMPLE_RATE: f64 = 8_000.0;

/// Highest sample rate the engine accepts, in Hz.
pub const MAX_SAMPLE_RATE: f64 = 384_000.0;

/// Error during engine initialization.
#[derive(Debug, Clone, PartialEq)]
pub enum OrganError {
    /// The sample rate is not finite or lies outside the supported range.
    InvalidSampleRate(f64),

    /// The voice pool would be empty.
    NoVoices,

    /// The event queue would have no capacity.
    NoEventCapacity,
}

impl OrganError {
    /// Status code reported across the C ABI. Success is 0.
    pub fn status_code(&self) -> i32 {
        match self {
            OrganError::InvalidSampleRate(_) => -1,
            OrganError::NoVoices => -2,
            OrganError::NoEventCapacity => -3,
        }
    }
}

impl std::fmt::Display for OrganError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrganError::InvalidSampleRate(rate) => write!(
                f,
                "Sample rate {} Hz is outside {}..={} Hz",
                rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            ),
            OrganError::NoVoices => write!(f, "Voice pool must hold at least one voice"),
            OrganError::NoEventCapacity => write!(f, "Event queue capacity must be non-zero"),
        }
    }
}

impl std::error::Error for OrganError {}

/// Result of engine initialization.
pub type OrganResult<T> = Result<T, OrganError>;
