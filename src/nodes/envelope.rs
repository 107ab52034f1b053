// Envelope generators.

// ═══════════════════════════════════════════════════════════════════
// ADSR Envelope
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Envelope timing converted to samples.
///
/// Rebuilt once per chunk from the shared parameter cells, so edits take
/// effect on the next chunk even for voices already sounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    attack_samples: f32,
    decay_samples: f32,
    sustain: f32,
    release_samples: f32,
}

impl EnvelopeParams {
    pub fn from_seconds(
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
        sample_rate: f64,
    ) -> Self {
        let sr = sample_rate as f32;
        Self {
            attack_samples: attack.max(0.0) * sr,
            decay_samples: decay.max(0.0) * sr,
            sustain: sustain.clamp(0.0, 1.0),
            release_samples: release.max(0.0) * sr,
        }
    }
}

/// Linear four-stage amplitude envelope.
///
/// Advanced a whole chunk at a time; stage transitions that fall inside a
/// chunk are resolved exactly, so the chunk-end level does not depend on
/// the chunk size.
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    stage: EnvelopeStage,
    level: f32,
    release_level: f32,
}

impl AdsrEnvelope {
    pub fn new() -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_level: 0.0,
        }
    }

    #[cfg(test)]
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    #[inline]
    pub fn is_releasing(&self) -> bool {
        self.stage == EnvelopeStage::Release
    }

    /// Begin a fresh note from silence.
    pub fn start(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeStage::Attack;
    }

    /// Re-enter Attack from the current level (same note played again).
    pub fn retrigger(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    /// Enter Release from wherever the envelope currently is.
    pub fn release(&mut self) {
        if self.stage != EnvelopeStage::Idle && self.stage != EnvelopeStage::Release {
            self.release_level = self.level;
            self.stage = EnvelopeStage::Release;
        }
    }

    /// Hard cut to silence.
    pub fn kill(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
    }

    /// Advance by `frames` samples and return the new level.
    pub fn advance(&mut self, frames: usize, params: &EnvelopeParams) -> f32 {
        let mut remaining = frames as f32;

        loop {
            match self.stage {
                EnvelopeStage::Idle => {
                    self.level = 0.0;
                    break;
                }

                EnvelopeStage::Attack => {
                    if params.attack_samples < 1.0 {
                        self.level = 1.0;
                        self.stage = EnvelopeStage::Decay;
                        continue;
                    }
                    let rate = 1.0 / params.attack_samples;
                    let needed = (1.0 - self.level) / rate;
                    if remaining < needed {
                        self.level += remaining * rate;
                        break;
                    }
                    remaining -= needed;
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }

                EnvelopeStage::Decay => {
                    if self.level <= params.sustain || params.decay_samples < 1.0 {
                        self.level = params.sustain;
                        self.stage = EnvelopeStage::Sustain;
                        continue;
                    }
                    let rate = (1.0 - params.sustain) / params.decay_samples;
                    let needed = (self.level - params.sustain) / rate;
                    if remaining < needed {
                        self.level -= remaining * rate;
                        break;
                    }
                    remaining -= needed;
                    self.level = params.sustain;
                    self.stage = EnvelopeStage::Sustain;
                }

                EnvelopeStage::Sustain => {
                    self.level = params.sustain;
                    break;
                }

                EnvelopeStage::Release => {
                    let rate = if params.release_samples < 1.0 {
                        f32::INFINITY
                    } else {
                        self.release_level / params.release_samples
                    };
                    if rate <= 0.0 || self.level <= 0.0 {
                        self.kill();
                        break;
                    }
                    let needed = self.level / rate;
                    if remaining < needed {
                        self.level -= remaining * rate;
                        break;
                    }
                    self.kill();
                    break;
                }
            }
        }

        self.level
    }
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new()
    }
}
