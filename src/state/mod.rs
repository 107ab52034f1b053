// src/state/mod.rs
//
// State shared between the control side and the render side.
//
// Key principles:
// - Discrete changes travel as Commands through the event queue
// - Continuous parameters live in atomic cells, read once per chunk
// - The control side keeps its own copy of the registration for getters

mod command;
mod param_info;
mod params;
mod registration;

pub use command::*;
pub use param_info::*;
pub use params::*;
pub use registration::*;
