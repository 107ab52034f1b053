// src/state/param_info.rs
//
// Parameter metadata: identity, range, default and unit of every scalar
// control the engine exposes.

use std::fmt;

/// Every scalar parameter of the engine.
///
/// The discriminant indexes [`SharedParams`](super::SharedParams) and is the
/// parameter id used across the C ABI.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    PitchOffset = 0,
    VibratoDepth = 1,
    MasterVolume = 2,
    VelocitySensitivity = 3,
    TuningRatio = 4,
    AmpAttack = 5,
    AmpDecay = 6,
    AmpSustain = 7,
    AmpRelease = 8,
    Power = 9,
    Drive = 10,
    Gain = 11,
    LeslieSpeed = 12,
}

/// Number of scalar parameters.
pub const PARAM_COUNT: usize = 13;

impl ParamId {
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::PitchOffset,
        ParamId::VibratoDepth,
        ParamId::MasterVolume,
        ParamId::VelocitySensitivity,
        ParamId::TuningRatio,
        ParamId::AmpAttack,
        ParamId::AmpDecay,
        ParamId::AmpSustain,
        ParamId::AmpRelease,
        ParamId::Power,
        ParamId::Drive,
        ParamId::Gain,
        ParamId::LeslieSpeed,
    ];

    /// Look up a parameter by its numeric id.
    pub fn from_u32(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Metadata for this parameter.
    pub const fn info(self) -> ParamInfo {
        match self {
            ParamId::PitchOffset => ParamInfo::new(self, "Pitch Offset")
                .range(f32::MIN, f32::MAX)
                .unit(ParamUnit::Semitones),
            ParamId::VibratoDepth => ParamInfo::new(self, "Vibrato Depth")
                .range(f32::MIN, f32::MAX)
                .unit(ParamUnit::Semitones),
            ParamId::MasterVolume => ParamInfo::new(self, "Master Volume").default(1.0),
            ParamId::VelocitySensitivity => {
                ParamInfo::new(self, "Velocity Sensitivity").default(1.0)
            }
            ParamId::TuningRatio => ParamInfo::new(self, "Tuning Ratio")
                .range(f32::MIN_POSITIVE, f32::MAX)
                .default(1.0)
                .positive(),
            ParamId::AmpAttack => ParamInfo::new(self, "Attack")
                .range(0.0, f32::MAX)
                .default(0.01)
                .unit(ParamUnit::Seconds),
            ParamId::AmpDecay => ParamInfo::new(self, "Decay")
                .range(0.0, f32::MAX)
                .default(0.1)
                .unit(ParamUnit::Seconds),
            ParamId::AmpSustain => ParamInfo::new(self, "Sustain")
                .default(1.0)
                .unit(ParamUnit::Fraction),
            ParamId::AmpRelease => ParamInfo::new(self, "Release")
                .range(0.0, f32::MAX)
                .default(0.1)
                .unit(ParamUnit::Seconds),
            // Distortion controls are unbounded; typical values are 1.0 to 2.5.
            ParamId::Power => ParamInfo::new(self, "Power")
                .range(f32::MIN, f32::MAX)
                .default(1.0),
            ParamId::Drive => ParamInfo::new(self, "Drive")
                .range(f32::MIN, f32::MAX)
                .default(1.0),
            ParamId::Gain => ParamInfo::new(self, "Gain")
                .range(f32::MIN, f32::MAX)
                .default(1.0),
            ParamId::LeslieSpeed => ParamInfo::new(self, "Leslie Speed")
                .range(1.0, 8.0)
                .default(1.0)
                .step(1.0),
        }
    }
}

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamUnit {
    #[default]
    None,
    /// Seconds
    Seconds,
    /// Semitones
    Semitones,
    /// Fraction of full scale (0-1)
    Fraction,
}

impl fmt::Display for ParamUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamUnit::None => Ok(()),
            ParamUnit::Seconds => write!(f, "s"),
            ParamUnit::Semitones => write!(f, "st"),
            ParamUnit::Fraction => Ok(()),
        }
    }
}

/// Metadata describing a parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamInfo {
    pub id: ParamId,

    /// Human-readable name
    pub name: &'static str,

    /// Minimum value
    pub min: f32,

    /// Maximum value
    pub max: f32,

    /// Default value
    pub default: f32,

    /// Unit for display
    pub unit: ParamUnit,

    /// Quantization step (0 = continuous). Values are truncated to it.
    pub step: f32,

    /// Zero and negative writes are rejected instead of clamped.
    pub positive: bool,
}

impl ParamInfo {
    pub const fn new(id: ParamId, name: &'static str) -> Self {
        Self {
            id,
            name,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            unit: ParamUnit::None,
            step: 0.0,
            positive: false,
        }
    }

    pub const fn range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub const fn default(mut self, value: f32) -> Self {
        self.default = value;
        self
    }

    pub const fn unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    pub const fn step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub const fn positive(mut self) -> Self {
        self.positive = true;
        self
    }

    /// Clamp a value to the valid range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Clamp and quantize a written value.
    ///
    /// Returns `None` for non-finite input, and for non-positive input to a
    /// positive parameter, which callers discard.
    pub fn sanitize(&self, value: f32) -> Option<f32> {
        if !value.is_finite() || (self.positive && value <= 0.0) {
            return None;
        }
        let clamped = self.clamp(value);
        if self.step > 0.0 {
            let steps = ((clamped - self.min) / self.step).trunc();
            Some(self.clamp(self.min + steps * self.step))
        } else {
            Some(clamped)
        }
    }

    /// Format a value for display.
    pub fn format(&self, value: f32) -> String {
        let precision = if self.step > 0.0 { 0 } else { 2 };
        match self.unit {
            ParamUnit::None | ParamUnit::Fraction => {
                format!("{:.prec$}", value, prec = precision)
            }
            unit => format!("{:.prec$} {}", value, unit, prec = precision),
        }
    }
}
