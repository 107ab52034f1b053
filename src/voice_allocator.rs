// src/voice_allocator.rs

use crate::voice::{ChunkContext, Voice, VoiceId};

/// Fixed pool of organ voices.
///
/// Responsibilities:
/// - map notes to voices
/// - retrigger, sustain and steal
/// - manage voice lifetime
///
/// Does NOT:
/// - allocate after construction
/// - know about parameters or the event queue
pub struct VoiceAllocator {
    voices: Vec<Voice>,
    sustain_pedal: bool,
    next_age: u64,
}

impl VoiceAllocator {
    pub fn new(max_voices: usize) -> Self {
        let voices = (0..max_voices).map(Voice::new).collect();
        Self {
            voices,
            sustain_pedal: false,
            next_age: 0,
        }
    }

    #[cfg(test)]
    pub fn sustain_pedal(&self) -> bool {
        self.sustain_pedal
    }

    /// Start (or retrigger) a note.
    ///
    /// A note that is already sounding is retriggered in place. Otherwise
    /// the lowest free slot is used, and with no free slot the oldest
    /// releasing voice is stolen, falling back to the oldest voice overall.
    pub fn play_note(&mut self, note: u8, velocity: u8, frequency: f32) -> Option<VoiceId> {
        let age = self.next_age;
        self.next_age = self.next_age.wrapping_add(1);

        if let Some(v) = self
            .voices
            .iter_mut()
            .find(|v| v.is_active() && v.note == note)
        {
            v.retrigger(velocity, frequency, age);
            return Some(v.id);
        }

        let slot = self
            .voices
            .iter()
            .position(|v| !v.is_active())
            .or_else(|| self.steal_candidate())?;

        let v = &mut self.voices[slot];
        v.note_on(note, velocity, frequency, age);
        Some(v.id)
    }

    fn steal_candidate(&self) -> Option<usize> {
        self.voices
            .iter()
            .filter(|v| v.is_releasing())
            .min_by_key(|v| v.age)
            .or_else(|| self.voices.iter().min_by_key(|v| v.age))
            .map(|v| v.id)
    }

    /// Release a note, hold it for the pedal, or cut it when `immediate`.
    pub fn stop_note(&mut self, note: u8, immediate: bool) {
        let pedal = self.sustain_pedal;
        for v in self
            .voices
            .iter_mut()
            .filter(|v| v.is_active() && v.note == note)
        {
            if immediate {
                v.kill();
            } else if v.is_releasing() || v.sustained {
                continue;
            } else if pedal {
                v.hold();
            } else {
                v.note_off();
            }
        }
    }

    /// Pedal up releases every voice it was holding.
    pub fn set_sustain_pedal(&mut self, down: bool) {
        self.sustain_pedal = down;
        if !down {
            for v in self.voices.iter_mut().filter(|v| v.sustained) {
                v.note_off();
            }
        }
    }

    pub fn all_notes_off(&mut self, immediate: bool) {
        for v in self.voices.iter_mut().filter(|v| v.is_active()) {
            if immediate {
                v.kill();
            } else {
                v.note_off();
            }
        }
    }

    /// Silence everything and forget the pedal.
    pub fn reset(&mut self) {
        for v in &mut self.voices {
            v.kill();
        }
        self.sustain_pedal = false;
        self.next_age = 0;
    }

    /// Advance every voice's envelope over the next chunk.
    pub fn prepare(&mut self, frames: usize, ctx: &ChunkContext) {
        for v in &mut self.voices {
            v.prepare(frames, ctx);
        }
    }

    /// Voices with output in the current chunk.
    pub fn sounding_mut(&mut self) -> impl Iterator<Item = &mut Voice> + '_ {
        self.voices.iter_mut().filter(|v| v.is_sounding())
    }

    pub fn get_voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(id)
    }

    /// Number of voices not yet returned to the pool.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::EnvelopeParams;
    use crate::state::Registration;

    fn context() -> ChunkContext {
        ChunkContext {
            sample_rate: 48_000.0,
            pitch_factor: 1.0,
            velocity_sensitivity: 1.0,
            envelope: EnvelopeParams::from_seconds(0.0, 0.0, 1.0, 1.0, 48_000.0),
            partials: Registration::new().partial_levels(),
        }
    }

    fn hz(note: u8) -> f32 {
        440.0 * ((note as f32 - 69.0) / 12.0).exp2()
    }

    fn play(alloc: &mut VoiceAllocator, note: u8) -> VoiceId {
        alloc.play_note(note, 100, hz(note)).unwrap()
    }

    #[test]
    fn test_lowest_free_slot() {
        let mut alloc = VoiceAllocator::new(4);
        assert_eq!(play(&mut alloc, 60), 0);
        assert_eq!(play(&mut alloc, 62), 1);
        alloc.stop_note(60, true);
        assert_eq!(play(&mut alloc, 64), 0);
        assert_eq!(alloc.active_count(), 2);
    }

    #[test]
    fn test_same_note_retriggers() {
        let mut alloc = VoiceAllocator::new(4);
        let id = play(&mut alloc, 60);
        alloc.stop_note(60, false);
        assert!(alloc.get_voice(id).unwrap().is_releasing());

        assert_eq!(play(&mut alloc, 60), id);
        assert_eq!(alloc.active_count(), 1);
        assert!(alloc.get_voice(id).unwrap().is_gated());
    }

    #[test]
    fn test_steals_oldest_releasing_first() {
        let mut alloc = VoiceAllocator::new(3);
        play(&mut alloc, 60); // 0
        play(&mut alloc, 62); // 1
        play(&mut alloc, 64); // 2
        alloc.stop_note(64, false);
        alloc.stop_note(62, false);

        // 62 started before 64, so it is the oldest releasing voice.
        assert_eq!(play(&mut alloc, 67), 1);
        assert_eq!(alloc.active_count(), 3);
        assert!(alloc.get_voice(0).unwrap().is_gated());
    }

    #[test]
    fn test_steals_oldest_when_all_held() {
        let mut alloc = VoiceAllocator::new(2);
        play(&mut alloc, 60);
        play(&mut alloc, 62);
        assert_eq!(play(&mut alloc, 64), 0);
        assert_eq!(play(&mut alloc, 65), 1);
        assert_eq!(alloc.get_voice(0).unwrap().note, 64);
        assert_eq!(alloc.active_count(), 2);
    }

    #[test]
    fn test_empty_pool() {
        let mut alloc = VoiceAllocator::new(0);
        assert_eq!(alloc.play_note(60, 100, hz(60)), None);
    }

    #[test]
    fn test_sustain_pedal() {
        let mut alloc = VoiceAllocator::new(4);
        let a = play(&mut alloc, 60);
        let b = play(&mut alloc, 64);

        alloc.set_sustain_pedal(true);
        alloc.stop_note(60, false);
        assert!(alloc.get_voice(a).unwrap().sustained);
        assert!(!alloc.get_voice(a).unwrap().is_releasing());

        alloc.set_sustain_pedal(false);
        assert!(alloc.get_voice(a).unwrap().is_releasing());
        // Still held by the key, so the pedal does not release it.
        assert!(alloc.get_voice(b).unwrap().is_gated());
    }

    #[test]
    fn test_immediate_stop_ignores_pedal() {
        let mut alloc = VoiceAllocator::new(4);
        play(&mut alloc, 60);
        alloc.set_sustain_pedal(true);
        alloc.stop_note(60, true);
        assert_eq!(alloc.active_count(), 0);
    }

    #[test]
    fn test_stop_unknown_note_is_noop() {
        let mut alloc = VoiceAllocator::new(4);
        let id = play(&mut alloc, 60);
        alloc.stop_note(61, false);
        assert!(alloc.get_voice(id).unwrap().is_gated());
    }

    #[test]
    fn test_all_notes_off() {
        let ctx = context();
        let mut alloc = VoiceAllocator::new(4);
        play(&mut alloc, 60);
        play(&mut alloc, 64);
        alloc.prepare(16, &ctx);
        alloc.all_notes_off(false);
        assert_eq!(alloc.active_count(), 2);

        alloc.prepare(16, &ctx);
        assert_eq!(alloc.sounding_mut().count(), 2);
        assert!(alloc.sounding_mut().all(|v| v.is_releasing()));

        alloc.all_notes_off(true);
        assert_eq!(alloc.active_count(), 0);
    }

    #[test]
    fn test_release_returns_voice_to_pool() {
        let ctx = context();
        let mut alloc = VoiceAllocator::new(2);
        play(&mut alloc, 60);
        alloc.prepare(16, &ctx);
        alloc.stop_note(60, false);

        // Slightly over one second of release at 48 kHz.
        for _ in 0..3100 {
            alloc.prepare(16, &ctx);
        }
        assert_eq!(alloc.active_count(), 0);
    }

    #[test]
    fn test_reset() {
        let mut alloc = VoiceAllocator::new(4);
        play(&mut alloc, 60);
        alloc.set_sustain_pedal(true);
        alloc.reset();
        assert_eq!(alloc.active_count(), 0);
        assert!(!alloc.sustain_pedal());
    }
}
