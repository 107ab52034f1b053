// src/state/command.rs
//
// Discrete events from the control side to the render side.
//
// Commands are the ONLY way the control side mutates voice or timbre state.
// They are queued and applied by the audio thread at chunk boundaries.
// Continuous parameters bypass the queue (see `SharedParams`).

/// A command from the control side to the engine.
///
/// Commands are:
/// - Immutable once created
/// - Small and `Copy`, so queueing never allocates
/// - Applied in the order they were sent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    // ═══════════════════════════════════════════
    // Notes
    // ═══════════════════════════════════════════
    /// Start (or retrigger) a note.
    NoteOn {
        note: u8,
        velocity: u8,
        frequency: f32,
    },

    /// Stop a note; `immediate` skips the release stage.
    NoteOff { note: u8, immediate: bool },

    /// Sustain pedal down/up.
    SustainPedal { down: bool },

    /// Release (or cut) every sounding voice.
    AllNotesOff { immediate: bool },

    // ═══════════════════════════════════════════
    // Registration
    // ═══════════════════════════════════════════
    /// Set a drawbar level; selects drawbar mode.
    SetDrawbar { index: usize, level: f32 },

    /// Set a harmonic level; selects harmonic mode.
    SetHarmonic { index: usize, level: f32 },

    // ═══════════════════════════════════════════
    // Engine
    // ═══════════════════════════════════════════
    /// Silence every voice and reset modulation phases.
    Reset,
}
