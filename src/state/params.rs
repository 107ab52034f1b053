// src/state/params.rs
//
// Lock-free parameter cells shared between the control and audio threads.

use std::sync::atomic::{AtomicU32, Ordering};

use super::param_info::{PARAM_COUNT, ParamId};

/// An `f32` stored as its bit pattern (no AtomicF32 in std).
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Continuous engine parameters.
///
/// Single writer (control side), read once per chunk by the audio thread.
/// Cells are independent: a reader may observe a mix of old and new values
/// for one chunk, which is harmless for continuous controls.
#[derive(Debug)]
pub struct SharedParams {
    cells: [AtomicF32; PARAM_COUNT],
}

impl SharedParams {
    pub fn new() -> Self {
        Self {
            cells: std::array::from_fn(|i| AtomicF32::new(ParamId::ALL[i].info().default)),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.cells[id.index()].load()
    }

    /// Store a value after clamping/quantizing it to the parameter's range.
    ///
    /// Returns the stored value, or `None` if the write was discarded.
    pub fn set(&self, id: ParamId, value: f32) -> Option<f32> {
        let value = id.info().sanitize(value)?;
        self.cells[id.index()].store(value);
        Some(value)
    }

    /// Restore every parameter to its default.
    pub fn reset_defaults(&self) {
        for id in ParamId::ALL {
            self.cells[id.index()].store(id.info().default);
        }
    }

    /// Copy every cell into a plain snapshot.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            values: std::array::from_fn(|i| self.cells[i].load()),
        }
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameter values captured at one chunk boundary.
#[derive(Debug, Clone, Copy)]
pub struct ParamSnapshot {
    values: [f32; PARAM_COUNT],
}

impl ParamSnapshot {
    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()]
    }
}
