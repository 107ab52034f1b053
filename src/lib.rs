// src/lib.rs
//
// Library entry point for Rust, C (iOS/Swift) and WebAssembly consumers.

mod bridge;
mod config;
mod engine;
mod error;
mod nodes;
mod organ;
mod state;
mod voice;
mod voice_allocator;

pub mod ffi;

#[cfg(feature = "web")]
pub mod wasm;


// Re-export key types for Rust consumers
pub use bridge::{EngineHandle, EngineReadback, OrganHandle, create_bridge};
pub use config::{DEFAULT_EVENT_CAPACITY, DEFAULT_MAX_VOICES, DEFAULT_SAMPLE_RATE, OrganConfig};
pub use engine::{CHUNK_SIZE, Engine};
pub use error::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE, OrganError, OrganResult};
pub use nodes::{LESLIE_FAST_HZ, LESLIE_SLOW_HZ, VIBRATO_RATE_HZ};
pub use organ::Organ;
pub use state::{
    Command, NUM_DRAWBARS, NUM_HARMONICS, PARAM_COUNT, ParamId, ParamInfo, ParamUnit,
    Registration, SharedParams, TimbreMode,
};
