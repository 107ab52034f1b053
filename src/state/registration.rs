// src/state/registration.rs
//
// Timbre registration: drawbar levels, harmonic levels and the mode that
// decides which of the two feeds the oscillator bank.

/// Number of Hammond-style drawbars.
pub const NUM_DRAWBARS: usize = 9;

/// Number of harmonic partials (also the size of each voice's oscillator bank).
pub const NUM_HARMONICS: usize = 16;

/// Partial of the 16' base pitch sounded by each drawbar:
/// 16', 5 1/3', 8', 4', 2 2/3', 2', 1 3/5', 1 1/3', 1'.
pub const DRAWBAR_PARTIALS: [usize; NUM_DRAWBARS] = [1, 3, 2, 4, 6, 8, 10, 12, 16];

/// Drawbar mode sounds partials of the 16' pitch, one octave below the note.
pub const DRAWBAR_BASE_RATIO: f32 = 0.5;

/// Classic "888000000" registration.
const DEFAULT_DRAWBARS: [f32; NUM_DRAWBARS] = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];

/// Which level array drives synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimbreMode {
    #[default]
    Drawbar,
    Harmonic,
}

/// The level array currently driving synthesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActiveTimbre<'a> {
    Drawbar(&'a [f32; NUM_DRAWBARS]),
    Harmonic(&'a [f32; NUM_HARMONICS]),
}

/// Per-partial weights handed to the oscillator bank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialLevels {
    /// Ratio of the bank's base frequency to the note frequency.
    pub base_ratio: f32,
    /// Weight of partial `k + 1` of the base frequency.
    pub levels: [f32; NUM_HARMONICS],
}

/// Both level arrays plus the active mode.
///
/// Writing either array makes it the active one (last write wins); the
/// other array keeps its values.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    drawbars: [f32; NUM_DRAWBARS],
    harmonics: [f32; NUM_HARMONICS],
    mode: TimbreMode,
}

impl Registration {
    pub fn new() -> Self {
        let mut harmonics = [0.0; NUM_HARMONICS];
        harmonics[0] = 1.0;
        Self {
            drawbars: DEFAULT_DRAWBARS,
            harmonics,
            mode: TimbreMode::Drawbar,
        }
    }

    /// Set a drawbar level (clamped to 0..1) and select drawbar mode.
    ///
    /// Returns `false` and changes nothing if the index or value is invalid.
    pub fn set_drawbar(&mut self, index: usize, level: f32) -> bool {
        match self.drawbars.get_mut(index) {
            Some(slot) if level.is_finite() => {
                *slot = level.clamp(0.0, 1.0);
                self.mode = TimbreMode::Drawbar;
                true
            }
            _ => false,
        }
    }

    /// Set a harmonic level (clamped to 0..1) and select harmonic mode.
    ///
    /// Returns `false` and changes nothing if the index or value is invalid.
    pub fn set_harmonic(&mut self, index: usize, level: f32) -> bool {
        match self.harmonics.get_mut(index) {
            Some(slot) if level.is_finite() => {
                *slot = level.clamp(0.0, 1.0);
                self.mode = TimbreMode::Harmonic;
                true
            }
            _ => false,
        }
    }

    pub fn drawbar(&self, index: usize) -> Option<f32> {
        self.drawbars.get(index).copied()
    }

    pub fn harmonic(&self, index: usize) -> Option<f32> {
        self.harmonics.get(index).copied()
    }

    pub fn mode(&self) -> TimbreMode {
        self.mode
    }

    pub fn active(&self) -> ActiveTimbre<'_> {
        match self.mode {
            TimbreMode::Drawbar => ActiveTimbre::Drawbar(&self.drawbars),
            TimbreMode::Harmonic => ActiveTimbre::Harmonic(&self.harmonics),
        }
    }

    /// Flatten the active mode into per-partial weights.
    pub fn partial_levels(&self) -> PartialLevels {
        match self.active() {
            ActiveTimbre::Drawbar(drawbars) => {
                let mut levels = [0.0; NUM_HARMONICS];
                for (bar, &partial) in drawbars.iter().zip(DRAWBAR_PARTIALS.iter()) {
                    levels[partial - 1] += *bar;
                }
                PartialLevels {
                    base_ratio: DRAWBAR_BASE_RATIO,
                    levels,
                }
            }
            ActiveTimbre::Harmonic(harmonics) => PartialLevels {
                base_ratio: 1.0,
                levels: *harmonics,
            },
        }
    }
}

impl Default for Registration {
    fn default() -> Self {
        Self::new()
    }
}
