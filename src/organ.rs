// src/organ.rs
//
// Single-owner facade over the bridge, for hosts that drive control and
// rendering from one place.

use log::{info, warn};

use crate::bridge::{EngineHandle, OrganHandle, create_bridge};
use crate::config::OrganConfig;
use crate::error::OrganResult;
use crate::state::{ParamId, Registration, TimbreMode};

/// An organ instance: inert until [`Organ::init`] succeeds.
///
/// Before a successful `init` (or after `deinit`) every control call is
/// ignored, getters report defaults and `render` writes silence.
#[derive(Default)]
pub struct Organ {
    control: Option<OrganHandle>,
    engine: Option<EngineHandle>,
}

impl Organ {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize at `sample_rate` with default polyphony.
    pub fn init(&mut self, sample_rate: f64) -> OrganResult<()> {
        self.init_with_config(OrganConfig::with_sample_rate(sample_rate))
    }

    /// Initialize (or re-initialize) from a full configuration.
    ///
    /// A failed init leaves the organ inert.
    pub fn init_with_config(&mut self, config: OrganConfig) -> OrganResult<()> {
        self.deinit();
        let (control, engine) = create_bridge(config).inspect_err(|e| {
            warn!("organ init failed: {}", e);
        })?;
        self.control = Some(control);
        self.engine = Some(engine);
        Ok(())
    }

    /// Release the engine. Safe to call when not initialized.
    pub fn deinit(&mut self) {
        if self.engine.take().is_some() {
            info!("organ deinitialized");
        }
        self.control = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    pub fn sample_rate(&self) -> Option<f64> {
        self.engine.as_ref().map(EngineHandle::sample_rate)
    }

    /// Split into the two thread handles.
    pub fn into_handles(self) -> Option<(OrganHandle, EngineHandle)> {
        self.control.zip(self.engine)
    }

    fn control_mut(&mut self) -> Option<&mut OrganHandle> {
        if self.control.is_none() {
            warn!("organ used before init, call ignored");
        }
        self.control.as_mut()
    }

    // ───────────────────────────────────────────────────────────────
    // Notes
    // ───────────────────────────────────────────────────────────────

    pub fn play_note(&mut self, note: u8, velocity: u8, frequency: f32) {
        if let Some(c) = self.control_mut() {
            c.play_note(note, velocity, frequency);
        }
    }

    pub fn stop_note(&mut self, note: u8, immediate: bool) {
        if let Some(c) = self.control_mut() {
            c.stop_note(note, immediate);
        }
    }

    pub fn sustain_pedal(&mut self, down: bool) {
        if let Some(c) = self.control_mut() {
            c.sustain_pedal(down);
        }
    }

    pub fn all_notes_off(&mut self, immediate: bool) {
        if let Some(c) = self.control_mut() {
            c.all_notes_off(immediate);
        }
    }

    pub fn reset(&mut self) {
        if let Some(c) = self.control_mut() {
            c.reset();
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Scalar parameters
    // ───────────────────────────────────────────────────────────────

    pub fn set_param(&mut self, id: ParamId, value: f32) {
        if let Some(c) = self.control_mut() {
            c.set_param(id, value);
        }
    }

    pub fn param(&self, id: ParamId) -> f32 {
        self.control
            .as_ref()
            .map_or(id.info().default, |c| c.param(id))
    }

    pub fn set_pitch_offset(&mut self, semitones: f32) {
        self.set_param(ParamId::PitchOffset, semitones);
    }

    pub fn pitch_offset(&self) -> f32 {
        self.param(ParamId::PitchOffset)
    }

    pub fn set_vibrato_depth(&mut self, semitones: f32) {
        self.set_param(ParamId::VibratoDepth, semitones);
    }

    pub fn vibrato_depth(&self) -> f32 {
        self.param(ParamId::VibratoDepth)
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.set_param(ParamId::MasterVolume, volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.param(ParamId::MasterVolume)
    }

    pub fn set_velocity_sensitivity(&mut self, sensitivity: f32) {
        self.set_param(ParamId::VelocitySensitivity, sensitivity);
    }

    pub fn velocity_sensitivity(&self) -> f32 {
        self.param(ParamId::VelocitySensitivity)
    }

    /// 0.5 plays an octave below the note frequencies.
    pub fn set_tuning_ratio(&mut self, ratio: f32) {
        self.set_param(ParamId::TuningRatio, ratio);
    }

    pub fn tuning_ratio(&self) -> f32 {
        self.param(ParamId::TuningRatio)
    }

    pub fn set_amp_attack_duration_seconds(&mut self, seconds: f32) {
        self.set_param(ParamId::AmpAttack, seconds);
    }

    pub fn amp_attack_duration_seconds(&self) -> f32 {
        self.param(ParamId::AmpAttack)
    }

    pub fn set_amp_decay_duration_seconds(&mut self, seconds: f32) {
        self.set_param(ParamId::AmpDecay, seconds);
    }

    pub fn amp_decay_duration_seconds(&self) -> f32 {
        self.param(ParamId::AmpDecay)
    }

    pub fn set_amp_sustain_fraction(&mut self, fraction: f32) {
        self.set_param(ParamId::AmpSustain, fraction);
    }

    pub fn amp_sustain_fraction(&self) -> f32 {
        self.param(ParamId::AmpSustain)
    }

    pub fn set_amp_release_duration_seconds(&mut self, seconds: f32) {
        self.set_param(ParamId::AmpRelease, seconds);
    }

    pub fn amp_release_duration_seconds(&self) -> f32 {
        self.param(ParamId::AmpRelease)
    }

    pub fn set_power(&mut self, power: f32) {
        self.set_param(ParamId::Power, power);
    }

    pub fn power(&self) -> f32 {
        self.param(ParamId::Power)
    }

    pub fn set_drive(&mut self, drive: f32) {
        self.set_param(ParamId::Drive, drive);
    }

    pub fn drive(&self) -> f32 {
        self.param(ParamId::Drive)
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.set_param(ParamId::Gain, gain);
    }

    pub fn gain(&self) -> f32 {
        self.param(ParamId::Gain)
    }

    /// Rotor target speed, 1 (slow) to 8 (fast); the fractional part is
    /// ignored.
    pub fn set_leslie_speed(&mut self, speed: f32) {
        self.set_param(ParamId::LeslieSpeed, speed);
    }

    /// Quantized target speed.
    pub fn leslie_speed(&self) -> f32 {
        self.param(ParamId::LeslieSpeed)
    }

    // ───────────────────────────────────────────────────────────────
    // Registration
    // ───────────────────────────────────────────────────────────────

    pub fn set_drawbar(&mut self, index: usize, level: f32) {
        if let Some(c) = self.control_mut() {
            c.set_drawbar(index, level);
        }
    }

    pub fn drawbar(&self, index: usize) -> Option<f32> {
        match &self.control {
            Some(c) => c.drawbar(index),
            None => Registration::new().drawbar(index),
        }
    }

    pub fn set_harmonic_level(&mut self, index: usize, level: f32) {
        if let Some(c) = self.control_mut() {
            c.set_harmonic_level(index, level);
        }
    }

    pub fn harmonic_level(&self, index: usize) -> Option<f32> {
        match &self.control {
            Some(c) => c.harmonic_level(index),
            None => Registration::new().harmonic(index),
        }
    }

    pub fn timbre_mode(&self) -> TimbreMode {
        self.control
            .as_ref()
            .map_or(TimbreMode::default(), OrganHandle::timbre_mode)
    }

    // ───────────────────────────────────────────────────────────────
    // Rendering
    // ───────────────────────────────────────────────────────────────

    /// Fill `sample_count` samples of the first `channel_count` buffers.
    ///
    /// Writes silence when not initialized.
    pub fn render(&mut self, channel_count: usize, sample_count: usize, out: &mut [&mut [f32]]) {
        match &mut self.engine {
            Some(engine) => engine.render(channel_count, sample_count, out),
            None => {
                for buf in out.iter_mut().take(channel_count) {
                    let n = sample_count.min(buf.len());
                    buf[..n].fill(0.0);
                }
            }
        }
    }

    /// Voices sounding as of the last render call.
    pub fn active_voices(&self) -> usize {
        self.control.as_ref().map_or(0, OrganHandle::active_voices)
    }
}
