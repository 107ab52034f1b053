// src/engine.rs

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use crate::config::OrganConfig;
use crate::nodes::{Distortion, EnvelopeParams, Leslie, Vibrato};
use crate::state::{Command, ParamId, ParamSnapshot, PartialLevels, Registration, SharedParams};
use crate::voice::ChunkContext;
use crate::voice_allocator::VoiceAllocator;

/// Samples rendered between two control-rate updates.
pub const CHUNK_SIZE: usize = 16;

/// Real-time organ renderer.
///
/// This struct runs exclusively on the audio thread.
/// It must be deterministic, allocation-free, and lock-free.
///
/// Work is split in two levels: once per chunk the event queue is drained
/// and every block-rate value (parameters, envelopes, vibrato, rotor
/// speed, partial increments) is computed; per sample only the oscillator
/// banks, the effects and the output writes run.
pub struct Engine {
    sample_rate: f64,

    /// Voice pool
    voices: VoiceAllocator,

    /// Discrete events from the control side
    events: Receiver<Command>,

    /// Continuous parameters written by the control side
    params: Arc<SharedParams>,

    registration: Registration,
    partials: PartialLevels,

    vibrato: Vibrato,
    distortion: Distortion,
    leslie: Leslie,

    /// Master volume captured for the current chunk
    master_volume: f32,

    /// An immediate stop arrived since the last chunk
    cut: bool,
}

impl Engine {
    /// Build an engine from a validated configuration.
    pub fn new(config: &OrganConfig, params: Arc<SharedParams>, events: Receiver<Command>) -> Self {
        let registration = Registration::new();
        let partials = registration.partial_levels();
        Self {
            sample_rate: config.sample_rate,
            voices: VoiceAllocator::new(config.max_voices as usize),
            events,
            params,
            registration,
            partials,
            vibrato: Vibrato::new(),
            distortion: Distortion::new(),
            leslie: Leslie::new(config.sample_rate),
            master_volume: 1.0,
            cut: false,
        }
    }

    /// Fill `sample_count` samples of the first `channel_count` buffers.
    ///
    /// Channel `c` receives the Leslie output `c % 2`. Buffers shorter than
    /// `sample_count` limit the number of samples rendered. Returns the
    /// number of frames actually rendered.
    pub fn render(
        &mut self,
        channel_count: usize,
        sample_count: usize,
        out: &mut [&mut [f32]],
    ) -> usize {
        let channels = channel_count.min(out.len());
        let out = &mut out[..channels];
        let frames = out
            .iter()
            .map(|buf| buf.len())
            .min()
            .map_or(sample_count, |len| len.min(sample_count));

        let mut offset = 0;
        while offset < frames {
            let len = CHUNK_SIZE.min(frames - offset);
            self.render_prep(len);

            for i in 0..len {
                let mut mix = 0.0;
                for voice in self.voices.sounding_mut() {
                    mix += voice.next_sample(i);
                }

                let stereo = self.leslie.process(self.distortion.process(mix));
                for (c, buf) in out.iter_mut().enumerate() {
                    buf[offset + i] = stereo[c % 2] * self.master_volume;
                }
            }

            offset += len;
        }

        frames
    }

    /// Chunk-boundary update.
    fn render_prep(&mut self, frames: usize) {
        while let Ok(cmd) = self.events.try_recv() {
            self.apply_command(cmd);
        }

        // Nothing left to play: drop the rotor tail so the cut is heard at once.
        if std::mem::take(&mut self.cut) && self.voices.active_count() == 0 {
            self.leslie.clear();
        }

        let p = self.params.snapshot();

        self.master_volume = p.get(ParamId::MasterVolume);
        self.distortion
            .set(p.get(ParamId::Power), p.get(ParamId::Drive), p.get(ParamId::Gain));
        self.leslie.set_speed(p.get(ParamId::LeslieSpeed));
        self.leslie.render_prep(frames);

        let lfo = self.vibrato.advance(frames, self.sample_rate);
        let ctx = ChunkContext {
            sample_rate: self.sample_rate,
            pitch_factor: pitch_factor(&p, lfo),
            velocity_sensitivity: p.get(ParamId::VelocitySensitivity),
            envelope: EnvelopeParams::from_seconds(
                p.get(ParamId::AmpAttack),
                p.get(ParamId::AmpDecay),
                p.get(ParamId::AmpSustain),
                p.get(ParamId::AmpRelease),
                self.sample_rate,
            ),
            partials: self.partials,
        };
        self.voices.prepare(frames, &ctx);
    }

    /// Apply a discrete event immediately.
    fn apply_command(&mut self, cmd: Command) {
        match cmd {
            Command::NoteOn {
                note,
                velocity,
                frequency,
            } => {
                self.voices.play_note(note, velocity, frequency);
            }

            Command::NoteOff { note, immediate } => {
                self.voices.stop_note(note, immediate);
                self.cut |= immediate;
            }

            Command::SustainPedal { down } => {
                self.voices.set_sustain_pedal(down);
            }

            Command::AllNotesOff { immediate } => {
                self.voices.all_notes_off(immediate);
                self.cut |= immediate;
            }

            Command::SetDrawbar { index, level } => {
                if self.registration.set_drawbar(index, level) {
                    self.partials = self.registration.partial_levels();
                }
            }

            Command::SetHarmonic { index, level } => {
                if self.registration.set_harmonic(index, level) {
                    self.partials = self.registration.partial_levels();
                }
            }

            Command::Reset => self.reset(),
        }
    }

    /// Silence every voice and rewind the modulation sources.
    pub fn reset(&mut self) {
        self.voices.reset();
        self.vibrato.reset();
        self.leslie.reset();
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of voices not yet returned to the pool.
    pub fn active_voices(&self) -> usize {
        self.voices.active_count()
    }

    pub(crate) fn voices(&self) -> &VoiceAllocator {
        &self.voices
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn leslie(&self) -> &Leslie {
        &self.leslie
    }
}

/// Frequency multiplier common to every voice for one chunk.
#[inline]
fn pitch_factor(p: &ParamSnapshot, lfo: f32) -> f32 {
    p.get(ParamId::TuningRatio)
        * (p.get(ParamId::PitchOffset) / 12.0).exp2()
        * Vibrato::factor(lfo, p.get(ParamId::VibratoDepth))
}
