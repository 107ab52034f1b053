// src/nodes/mod.rs
//
// DSP building blocks for the organ: per-voice oscillator bank and
// envelope, the shared vibrato LFO, and the master effects.

mod effects;
mod envelope;
mod modulation;
mod oscillators;

pub use effects::*;
pub use envelope::*;
pub use modulation::*;
pub use oscillators::*;
