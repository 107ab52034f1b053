//! Thread-safe bridge between the control side and the audio renderer.
//!
//! # Architecture
//!
//! - **Control thread** owns [`OrganHandle`]: note events, parameter writes,
//!   and a local mirror of the registration for getters
//! - **Audio thread** owns [`EngineHandle`] with the [`Engine`]
//! - Discrete events travel through a bounded channel drained at every
//!   chunk boundary; continuous parameters live in relaxed atomic cells;
//!   readback goes the other way through atomics
//!
//! Nothing on the control side ever blocks: a full queue drops the event
//! and logs a warning.
//!
//! # Usage
//!
//! ```ignore
//! let (mut control, mut engine) = create_bridge(OrganConfig::default())?;
//!
//! // Control thread
//! control.play_note(60, 100, 261.63);
//! control.set_param(ParamId::LeslieSpeed, 8.0);
//!
//! // Audio thread
//! engine.render(2, frames, &mut [left, right]);
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
    mpsc::{self, SyncSender, TrySendError},
};

use log::{debug, info, warn};

use crate::config::OrganConfig;
use crate::engine::Engine;
use crate::error::OrganResult;
use crate::state::{Command, ParamId, Registration, SharedParams, TimbreMode};

/// Handle for the control thread.
///
/// Every method returns immediately. Discrete events reach the renderer at
/// its next chunk boundary.
pub struct OrganHandle {
    /// Channel to send events to the engine.
    command_tx: SyncSender<Command>,

    /// Continuous parameters (written here, read by the engine).
    params: Arc<SharedParams>,

    /// Registration as last accepted by the queue, for getters.
    registration: Registration,

    sustain_pedal: bool,

    /// Shared readback state (updated by engine, read here).
    readback: Arc<SharedReadback>,
}

/// Handle for the audio thread containing the engine.
pub struct EngineHandle {
    /// The audio engine (owned by audio thread).
    engine: Engine,

    /// Shared readback state (written by engine).
    readback: Arc<SharedReadback>,
}

/// Lock-free engine -> control readback.
struct SharedReadback {
    active_voices: AtomicUsize,
    frames_rendered: AtomicU64,
}

impl SharedReadback {
    fn new() -> Self {
        Self {
            active_voices: AtomicUsize::new(0),
            frames_rendered: AtomicU64::new(0),
        }
    }
}

/// Snapshot of the engine state as last published by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineReadback {
    pub active_voices: usize,
    pub frames_rendered: u64,
}

/// Create a linked pair of handles for control and audio threads.
pub fn create_bridge(config: OrganConfig) -> OrganResult<(OrganHandle, EngineHandle)> {
    config.validate()?;

    let (command_tx, command_rx) = mpsc::sync_channel(config.event_capacity as usize);
    let params = Arc::new(SharedParams::new());
    let readback = Arc::new(SharedReadback::new());

    let engine = Engine::new(&config, Arc::clone(&params), command_rx);

    info!(
        "organ engine created: {} Hz, {} voices, {} queued events",
        config.sample_rate, config.max_voices, config.event_capacity
    );

    let control = OrganHandle {
        command_tx,
        params,
        registration: Registration::new(),
        sustain_pedal: false,
        readback: Arc::clone(&readback),
    };

    let engine = EngineHandle { engine, readback };

    Ok((control, engine))
}

// ═══════════════════════════════════════════════════════════════════
// OrganHandle - Control Thread API
// ═══════════════════════════════════════════════════════════════════

impl OrganHandle {
    /// Queue an event for the engine.
    ///
    /// Returns `false` if the event was dropped.
    pub fn send(&mut self, cmd: Command) -> bool {
        match self.command_tx.try_send(cmd) {
            Ok(()) => true,
            Err(TrySendError::Full(cmd)) => {
                warn!("event queue full, dropping {:?}", cmd);
                false
            }
            Err(TrySendError::Disconnected(cmd)) => {
                warn!("engine is gone, dropping {:?}", cmd);
                false
            }
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Notes
    // ───────────────────────────────────────────────────────────────

    /// Start a note. Playing a note that is already sounding retriggers it.
    ///
    /// `velocity` above 127 is clamped. Notes above 127 and non-positive
    /// or non-finite frequencies are discarded.
    pub fn play_note(&mut self, note: u8, velocity: u8, frequency: f32) -> bool {
        if note > 127 {
            warn!("play_note: note {} out of range, ignored", note);
            return false;
        }
        if !frequency.is_finite() || frequency <= 0.0 {
            warn!("play_note: invalid frequency {} for note {}, ignored", frequency, note);
            return false;
        }
        let velocity = velocity.min(127);
        debug!("note on {} vel {} ({} Hz)", note, velocity, frequency);
        self.send(Command::NoteOn {
            note,
            velocity,
            frequency,
        })
    }

    /// Stop a note. With `immediate` the voice is cut without a release,
    /// even if the sustain pedal is down.
    pub fn stop_note(&mut self, note: u8, immediate: bool) -> bool {
        debug!("note off {} (immediate: {})", note, immediate);
        self.send(Command::NoteOff { note, immediate })
    }

    pub fn sustain_pedal(&mut self, down: bool) -> bool {
        debug!("sustain pedal {}", if down { "down" } else { "up" });
        let sent = self.send(Command::SustainPedal { down });
        if sent {
            self.sustain_pedal = down;
        }
        sent
    }

    pub fn is_sustain_pedal_down(&self) -> bool {
        self.sustain_pedal
    }

    /// Release (or cut) every sounding voice.
    pub fn all_notes_off(&mut self, immediate: bool) -> bool {
        debug!("all notes off (immediate: {})", immediate);
        self.send(Command::AllNotesOff { immediate })
    }

    /// Silence everything and rewind vibrato and rotor phases. Parameters
    /// and registration are kept.
    pub fn reset(&mut self) -> bool {
        debug!("reset");
        let sent = self.send(Command::Reset);
        if sent {
            self.sustain_pedal = false;
        }
        sent
    }

    // ───────────────────────────────────────────────────────────────
    // Parameters
    // ───────────────────────────────────────────────────────────────

    /// Set a scalar parameter, clamped to its range.
    ///
    /// Non-finite values, and non-positive values for a positive-only
    /// parameter, are discarded and return `false`.
    pub fn set_param(&mut self, id: ParamId, value: f32) -> bool {
        match self.params.set(id, value) {
            Some(_) => true,
            None => {
                warn!("{}: discarded invalid value {}", id.info().name, value);
                false
            }
        }
    }

    /// Current value of a scalar parameter as stored.
    pub fn param(&self, id: ParamId) -> f32 {
        self.params.get(id)
    }

    /// Restore every scalar parameter to its default.
    pub fn reset_params(&mut self) {
        self.params.reset_defaults();
    }

    // ───────────────────────────────────────────────────────────────
    // Registration
    // ───────────────────────────────────────────────────────────────

    /// Set drawbar `index` (0..9) to `level` (clamped to 0..1) and switch
    /// to drawbar mode.
    pub fn set_drawbar(&mut self, index: usize, level: f32) -> bool {
        let mut next = self.registration.clone();
        if !next.set_drawbar(index, level) {
            warn!("set_drawbar: invalid drawbar {} = {}, ignored", index, level);
            return false;
        }
        self.commit(next, Command::SetDrawbar { index, level })
    }

    /// Set harmonic `index` (0..16) to `level` (clamped to 0..1) and switch
    /// to harmonic mode.
    pub fn set_harmonic_level(&mut self, index: usize, level: f32) -> bool {
        let mut next = self.registration.clone();
        if !next.set_harmonic(index, level) {
            warn!("set_harmonic_level: invalid harmonic {} = {}, ignored", index, level);
            return false;
        }
        self.commit(next, Command::SetHarmonic { index, level })
    }

    fn commit(&mut self, next: Registration, cmd: Command) -> bool {
        let sent = self.send(cmd);
        if sent {
            self.registration = next;
        }
        sent
    }

    pub fn drawbar(&self, index: usize) -> Option<f32> {
        self.registration.drawbar(index)
    }

    pub fn harmonic_level(&self, index: usize) -> Option<f32> {
        self.registration.harmonic(index)
    }

    pub fn timbre_mode(&self) -> TimbreMode {
        self.registration.mode()
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    // ───────────────────────────────────────────────────────────────
    // Readback
    // ───────────────────────────────────────────────────────────────

    pub fn readback(&self) -> EngineReadback {
        EngineReadback {
            active_voices: self.readback.active_voices.load(Ordering::Relaxed),
            frames_rendered: self.readback.frames_rendered.load(Ordering::Relaxed),
        }
    }

    /// Voices sounding as of the last render call.
    pub fn active_voices(&self) -> usize {
        self.readback.active_voices.load(Ordering::Relaxed)
    }
}

// ═══════════════════════════════════════════════════════════════════
// EngineHandle - Audio Thread API
// ═══════════════════════════════════════════════════════════════════

impl EngineHandle {
    /// Render `sample_count` samples into the first `channel_count`
    /// buffers and publish readback.
    ///
    /// Never blocks, locks or allocates.
    pub fn render(&mut self, channel_count: usize, sample_count: usize, out: &mut [&mut [f32]]) {
        let frames = self.engine.render(channel_count, sample_count, out);

        self.readback
            .active_voices
            .store(self.engine.active_voices(), Ordering::Relaxed);
        self.readback
            .frames_rendered
            .fetch_add(frames as u64, Ordering::Relaxed);
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn sample_rate(&self) -> f64 {
        self.engine.sample_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrganError;
    use std::thread;

    fn bridge() -> (OrganHandle, EngineHandle) {
        create_bridge(OrganConfig::default()).unwrap()
    }

    fn render(engine: &mut EngineHandle, frames: usize) -> Vec<f32> {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        {
            let mut out: [&mut [f32]; 2] = [&mut left, &mut right];
            engine.render(2, frames, &mut out);
        }
        left
    }

    #[test]
    fn test_invalid_config() {
        let config = OrganConfig::with_sample_rate(f64::NAN);
        assert!(matches!(
            create_bridge(config),
            Err(OrganError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn test_readback_after_render() {
        let (mut control, mut engine) = bridge();
        control.play_note(60, 100, 261.63);
        control.play_note(64, 100, 329.63);
        assert_eq!(control.active_voices(), 0);

        render(&mut engine, 64);
        assert_eq!(control.readback().active_voices, 2);
        assert_eq!(control.readback().frames_rendered, 64);
    }

    #[test]
    fn test_frames_rendered_counts_what_was_written() {
        let (control, mut engine) = bridge();
        let mut left = vec![0.0; 40];
        let mut right = vec![0.0; 100];
        {
            let mut out: [&mut [f32]; 2] = [&mut left, &mut right];
            engine.render(2, 100, &mut out);
        }
        assert_eq!(control.readback().frames_rendered, 40);
    }

    #[test]
    fn test_queue_overflow_drops_without_blocking() {
        let config = OrganConfig {
            event_capacity: 4,
            ..OrganConfig::default()
        };
        let (mut control, mut engine) = create_bridge(config).unwrap();

        let sent = (0..10).filter(|&n| control.play_note(60 + n, 100, 440.0)).count();
        assert_eq!(sent, 4);

        render(&mut engine, 16);
        assert_eq!(control.active_voices(), 4);
        assert!(control.play_note(80, 100, 440.0));
    }

    #[test]
    fn test_invalid_notes_are_discarded() {
        let (mut control, _engine) = bridge();
        assert!(!control.play_note(128, 100, 440.0));
        assert!(!control.play_note(60, 100, f32::NAN));
        assert!(!control.play_note(60, 100, 0.0));
        assert!(control.play_note(60, 200, 440.0));
    }

    #[test]
    fn test_registration_mirror() {
        let (mut control, mut engine) = bridge();
        assert!(control.set_drawbar(2, 0.25));
        assert!(control.set_harmonic_level(4, 2.0));
        assert!(!control.set_drawbar(9, 1.0));
        assert!(!control.set_harmonic_level(0, f32::INFINITY));

        assert_eq!(control.drawbar(2), Some(0.25));
        assert_eq!(control.harmonic_level(4), Some(1.0));
        assert_eq!(control.timbre_mode(), TimbreMode::Harmonic);

        render(&mut engine, 16);
        assert_eq!(engine.engine().registration(), control.registration());
    }

    #[test]
    fn test_param_writes() {
        let (mut control, _engine) = bridge();
        assert!(control.set_param(ParamId::MasterVolume, 3.0));
        assert_eq!(control.param(ParamId::MasterVolume), 1.0);

        assert!(control.set_param(ParamId::LeslieSpeed, 5.9));
        assert_eq!(control.param(ParamId::LeslieSpeed), 5.0);

        assert!(!control.set_param(ParamId::Drive, f32::NAN));
        assert_eq!(control.param(ParamId::Drive), 1.0);

        control.reset_params();
        assert_eq!(control.param(ParamId::LeslieSpeed), 1.0);
    }

    #[test]
    fn test_concurrent_control_and_render() {
        let (mut control, mut engine) = bridge();

        let writer = thread::spawn(move || {
            for i in 0..2_000u32 {
                let note = 36 + (i % 48) as u8;
                let frequency = 440.0 * ((note as f32 - 69.0) / 12.0).exp2();
                control.play_note(note, (i % 128) as u8, frequency);
                control.set_param(ParamId::LeslieSpeed, (i % 8 + 1) as f32);
                control.set_param(ParamId::VibratoDepth, (i % 3) as f32 * 0.5);
                control.set_drawbar((i % 9) as usize, (i % 5) as f32 / 4.0);
                if i % 3 == 0 {
                    control.stop_note(note, i % 2 == 0);
                }
                control.sustain_pedal(i % 50 < 25);
                if i % 97 == 0 {
                    thread::yield_now();
                }
            }
            control
        });

        let mut frames = 0u64;
        while !writer.is_finished() {
            let out = render(&mut engine, 128);
            assert!(out.iter().all(|s| s.is_finite()));
            frames += 128;
        }

        let mut control = writer.join().unwrap();
        render(&mut engine, 16);
        assert!(control.active_voices() <= OrganConfig::default().max_voices as usize);

        // The queue is drained now, so this one cannot be dropped.
        assert!(control.all_notes_off(true));
        render(&mut engine, 16);
        frames += 32;

        assert_eq!(control.active_voices(), 0);
        assert_eq!(control.readback().frames_rendered, frames);
    }
}
