// src/voice.rs

use crate::nodes::{AdsrEnvelope, EnvelopeParams, OscillatorBank};
use crate::state::PartialLevels;

pub type VoiceId = usize;

/// Block-rate values shared by every voice for one chunk.
#[derive(Debug, Clone, Copy)]
pub struct ChunkContext {
    pub sample_rate: f64,
    /// tuning ratio x pitch offset x vibrato, applied to every note frequency
    pub pitch_factor: f32,
    pub velocity_sensitivity: f32,
    pub envelope: EnvelopeParams,
    pub partials: PartialLevels,
}

/// A voice is one sounding note: its oscillator bank, its envelope and
/// the note identity the pool uses to find it again.
#[derive(Debug, Clone)]
pub struct Voice {
    pub id: VoiceId,
    pub note: u8,
    pub velocity: u8,
    pub frequency: f32,
    /// Note-off arrived while the sustain pedal was down.
    pub sustained: bool,
    /// Note-on stamp; lower is older.
    pub age: u64,

    bank: OscillatorBank,
    envelope: AdsrEnvelope,

    // Gain ramp for the current chunk: envelope x velocity amplitude.
    gain: f32,
    gain_step: f32,
}

impl Voice {
    #[inline]
    pub fn new(id: VoiceId) -> Self {
        Self {
            id,
            note: 0,
            velocity: 0,
            frequency: 0.0,
            sustained: false,
            age: 0,
            bank: OscillatorBank::new(),
            envelope: AdsrEnvelope::new(),
            gain: 0.0,
            gain_step: 0.0,
        }
    }

    /// Not yet returned to the pool.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.envelope.is_idle()
    }

    #[inline]
    pub fn is_releasing(&self) -> bool {
        self.envelope.is_releasing()
    }

    /// Key is still down (neither released nor held by the pedal).
    #[inline]
    pub fn is_gated(&self) -> bool {
        self.is_active() && !self.is_releasing() && !self.sustained
    }

    #[inline]
    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    /// Start a new note in this slot: phases at zero, envelope from silence.
    pub fn note_on(&mut self, note: u8, velocity: u8, frequency: f32, age: u64) {
        self.note = note;
        self.velocity = velocity;
        self.frequency = frequency;
        self.age = age;
        self.sustained = false;
        self.bank.reset();
        self.envelope.start();
    }

    /// Play the same note again: keep phases and level, re-enter Attack.
    pub fn retrigger(&mut self, velocity: u8, frequency: f32, age: u64) {
        self.velocity = velocity;
        self.frequency = frequency;
        self.age = age;
        self.sustained = false;
        self.envelope.retrigger();
    }

    /// Keep sounding until the pedal comes up.
    pub fn hold(&mut self) {
        self.sustained = true;
    }

    pub fn note_off(&mut self) {
        self.sustained = false;
        self.envelope.release();
    }

    /// Cut to silence and free the slot.
    pub fn kill(&mut self) {
        self.sustained = false;
        self.envelope.kill();
        self.gain = 0.0;
        self.gain_step = 0.0;
    }

    /// Velocity amplitude, interpolating between fixed level and full
    /// velocity scaling.
    #[inline]
    pub fn amplitude(&self, sensitivity: f32) -> f32 {
        (1.0 - sensitivity) + sensitivity * self.velocity as f32 / 127.0
    }

    /// Advance the envelope over the chunk and load the oscillator bank.
    pub fn prepare(&mut self, frames: usize, ctx: &ChunkContext) {
        if self.envelope.is_idle() || frames == 0 {
            self.gain = 0.0;
            self.gain_step = 0.0;
            return;
        }

        let amp = self.amplitude(ctx.velocity_sensitivity);
        let start = self.envelope.level();
        let end = self.envelope.advance(frames, &ctx.envelope);
        self.gain = start * amp;
        self.gain_step = (end - start) * amp / frames as f32;

        self.bank
            .prepare(self.frequency * ctx.pitch_factor, &ctx.partials, ctx.sample_rate);
    }

    /// Has anything to contribute to the current chunk.
    #[inline]
    pub fn is_sounding(&self) -> bool {
        self.gain != 0.0 || self.gain_step != 0.0
    }

    /// Sample `frame` of the current chunk.
    #[inline]
    pub fn next_sample(&mut self, frame: usize) -> f32 {
        self.bank.next_sample() * (self.gain + self.gain_step * frame as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Registration;

    fn context(sustain: f32) -> ChunkContext {
        ChunkContext {
            sample_rate: 48_000.0,
            pitch_factor: 1.0,
            velocity_sensitivity: 1.0,
            envelope: EnvelopeParams::from_seconds(0.001, 0.01, sustain, 0.01, 48_000.0),
            partials: Registration::new().partial_levels(),
        }
    }

    #[test]
    fn test_velocity_sensitivity() {
        let mut voice = Voice::new(0);
        voice.note_on(60, 127, 261.63, 1);
        assert_eq!(voice.amplitude(1.0), 1.0);
        assert_eq!(voice.amplitude(0.0), 1.0);

        voice.note_on(60, 0, 261.63, 2);
        assert_eq!(voice.amplitude(1.0), 0.0);
        assert_eq!(voice.amplitude(0.0), 1.0);
        assert!((voice.amplitude(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_chunk_ramp_starts_at_previous_level() {
        let ctx = context(1.0);
        let mut voice = Voice::new(0);
        voice.note_on(60, 127, 440.0, 1);

        voice.prepare(16, &ctx);
        assert!(voice.is_sounding());
        // The first chunk ramps up from silence.
        assert_eq!(voice.next_sample(0), 0.0);

        let before = voice.envelope_level();
        voice.prepare(16, &ctx);
        assert!((voice.gain - before).abs() < 1e-6);
    }

    #[test]
    fn test_lifecycle_flags() {
        let ctx = context(0.5);
        let mut voice = Voice::new(3);
        assert!(!voice.is_active());

        voice.note_on(64, 100, 329.63, 1);
        assert!(voice.is_gated());

        voice.hold();
        assert!(voice.is_active() && !voice.is_gated());

        voice.note_off();
        assert!(voice.is_releasing() && !voice.sustained);

        for _ in 0..100 {
            voice.prepare(16, &ctx);
        }
        assert!(!voice.is_active());
        voice.prepare(16, &ctx);
        assert!(!voice.is_sounding());
    }

    #[test]
    fn test_kill_silences_immediately() {
        let ctx = context(1.0);
        let mut voice = Voice::new(0);
        voice.note_on(60, 127, 440.0, 1);
        voice.prepare(16, &ctx);
        voice.kill();
        assert!(!voice.is_sounding());
        voice.prepare(16, &ctx);
        assert!(!voice.is_sounding());
    }
}
