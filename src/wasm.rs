//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { organ_wasm_init, WasmOrgan } from './organ.js';
//!
//! await init();
//! organ_wasm_init();
//!
//! const organ = new WasmOrgan(sampleRate);
//! organ.set_drawbar(3, 0.75);
//! organ.play_note(60, 100, 261.63);
//!
//! // In the AudioWorkletProcessor
//! process(inputs, outputs) {
//!     const [left, right] = outputs[0];
//!     organ.render(left, right);
//!     return true;
//! }
//! ```
//!
//! Control and rendering share one object here: an AudioWorklet runs both
//! on the audio thread and forwards control changes through its port.

use wasm_bindgen::prelude::*;

use crate::config::{DEFAULT_EVENT_CAPACITY, DEFAULT_MAX_VOICES, DEFAULT_SAMPLE_RATE, OrganConfig};
use crate::organ::Organ;
use crate::state::{ParamId, TimbreMode};

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn organ_wasm_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration for creating an organ.
#[wasm_bindgen]
#[derive(Clone, Copy)]
pub struct WasmOrganConfig {
    /// Sample rate in Hz (e.g., 44100.0, 48000.0).
    pub sample_rate: f64,
    /// Maximum number of simultaneous voices for polyphony.
    pub max_voices: u32,
    /// Events that may be pending between two render chunks.
    pub event_capacity: u32,
}

#[wasm_bindgen]
impl WasmOrganConfig {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(sample_rate: f64, max_voices: u32, event_capacity: u32) -> Self {
        Self {
            sample_rate,
            max_voices,
            event_capacity,
        }
    }
}

impl Default for WasmOrganConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_voices: DEFAULT_MAX_VOICES,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl From<WasmOrganConfig> for OrganConfig {
    fn from(c: WasmOrganConfig) -> Self {
        Self {
            sample_rate: c.sample_rate,
            max_voices: c.max_voices,
            event_capacity: c.event_capacity,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Organ
// ═══════════════════════════════════════════════════════════════════════════

/// Organ instance for an AudioWorklet.
#[wasm_bindgen]
pub struct WasmOrgan {
    inner: Organ,
}

#[wasm_bindgen]
impl WasmOrgan {
    /// Create an organ at `sample_rate` with default polyphony.
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> Result<WasmOrgan, JsError> {
        Self::new_with_config(WasmOrganConfig {
            sample_rate,
            ..WasmOrganConfig::default()
        })
    }

    pub fn new_with_config(config: WasmOrganConfig) -> Result<WasmOrgan, JsError> {
        let mut inner = Organ::new();
        inner.init_with_config(config.into())?;
        Ok(WasmOrgan { inner })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Notes
    // ─────────────────────────────────────────────────────────────────────────

    pub fn play_note(&mut self, note: u8, velocity: u8, frequency: f32) {
        self.inner.play_note(note, velocity, frequency);
    }

    pub fn stop_note(&mut self, note: u8, immediate: bool) {
        self.inner.stop_note(note, immediate);
    }

    pub fn sustain_pedal(&mut self, down: bool) {
        self.inner.sustain_pedal(down);
    }

    pub fn all_notes_off(&mut self, immediate: bool) {
        self.inner.all_notes_off(immediate);
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Parameters
    // ─────────────────────────────────────────────────────────────────────────

    /// Set a parameter by numeric id (see `ParamId`). Unknown ids are ignored.
    pub fn set_param(&mut self, id: u32, value: f32) {
        if let Some(id) = ParamId::from_u32(id) {
            self.inner.set_param(id, value);
        }
    }

    /// Read a parameter by numeric id. Unknown ids read as 0.
    pub fn param(&self, id: u32) -> f32 {
        ParamId::from_u32(id).map_or(0.0, |id| self.inner.param(id))
    }

    pub fn set_pitch_offset(&mut self, semitones: f32) {
        self.inner.set_pitch_offset(semitones);
    }

    pub fn pitch_offset(&self) -> f32 {
        self.inner.pitch_offset()
    }

    pub fn set_vibrato_depth(&mut self, semitones: f32) {
        self.inner.set_vibrato_depth(semitones);
    }

    pub fn vibrato_depth(&self) -> f32 {
        self.inner.vibrato_depth()
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.inner.set_master_volume(volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.inner.master_volume()
    }

    pub fn set_velocity_sensitivity(&mut self, sensitivity: f32) {
        self.inner.set_velocity_sensitivity(sensitivity);
    }

    pub fn velocity_sensitivity(&self) -> f32 {
        self.inner.velocity_sensitivity()
    }

    pub fn set_tuning_ratio(&mut self, ratio: f32) {
        self.inner.set_tuning_ratio(ratio);
    }

    pub fn tuning_ratio(&self) -> f32 {
        self.inner.tuning_ratio()
    }

    pub fn set_amp_attack_duration_seconds(&mut self, seconds: f32) {
        self.inner.set_amp_attack_duration_seconds(seconds);
    }

    pub fn amp_attack_duration_seconds(&self) -> f32 {
        self.inner.amp_attack_duration_seconds()
    }

    pub fn set_amp_decay_duration_seconds(&mut self, seconds: f32) {
        self.inner.set_amp_decay_duration_seconds(seconds);
    }

    pub fn amp_decay_duration_seconds(&self) -> f32 {
        self.inner.amp_decay_duration_seconds()
    }

    pub fn set_amp_sustain_fraction(&mut self, fraction: f32) {
        self.inner.set_amp_sustain_fraction(fraction);
    }

    pub fn amp_sustain_fraction(&self) -> f32 {
        self.inner.amp_sustain_fraction()
    }

    pub fn set_amp_release_duration_seconds(&mut self, seconds: f32) {
        self.inner.set_amp_release_duration_seconds(seconds);
    }

    pub fn amp_release_duration_seconds(&self) -> f32 {
        self.inner.amp_release_duration_seconds()
    }

    pub fn set_power(&mut self, power: f32) {
        self.inner.set_power(power);
    }

    pub fn power(&self) -> f32 {
        self.inner.power()
    }

    pub fn set_drive(&mut self, drive: f32) {
        self.inner.set_drive(drive);
    }

    pub fn drive(&self) -> f32 {
        self.inner.drive()
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.inner.set_gain(gain);
    }

    pub fn gain(&self) -> f32 {
        self.inner.gain()
    }

    pub fn set_leslie_speed(&mut self, speed: f32) {
        self.inner.set_leslie_speed(speed);
    }

    pub fn leslie_speed(&self) -> f32 {
        self.inner.leslie_speed()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_drawbar(&mut self, index: usize, level: f32) {
        self.inner.set_drawbar(index, level);
    }

    /// Drawbar level, or 0 for an invalid index.
    pub fn drawbar(&self, index: usize) -> f32 {
        self.inner.drawbar(index).unwrap_or(0.0)
    }

    pub fn set_harmonic_level(&mut self, index: usize, level: f32) {
        self.inner.set_harmonic_level(index, level);
    }

    /// Harmonic level, or 0 for an invalid index.
    pub fn harmonic_level(&self, index: usize) -> f32 {
        self.inner.harmonic_level(index).unwrap_or(0.0)
    }

    /// True while the harmonic array drives synthesis.
    pub fn harmonic_mode(&self) -> bool {
        self.inner.timbre_mode() == TimbreMode::Harmonic
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    /// Render one AudioWorklet quantum into a stereo pair.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let mut out: [&mut [f32]; 2] = [left, right];
        self.inner.render(2, frames, &mut out);
    }

    /// Render into a single (mono) buffer; receives the left microphone.
    pub fn render_mono(&mut self, output: &mut [f32]) {
        let frames = output.len();
        let mut out: [&mut [f32]; 1] = [output];
        self.inner.render(1, frames, &mut out);
    }

    /// Voices sounding as of the last render call.
    pub fn active_voices(&self) -> u32 {
        self.inner.active_voices() as u32
    }
}
