// Audio effect nodes: waveshaping distortion and the rotating speaker.

use std::f32::consts::TAU;

// ═══════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════

/// Smallest power the waveshaper will use; lower values are raised to it.
const MIN_POWER: f32 = 0.1;

/// Horn rate at Leslie speed 1 ("chorale"), in Hz.
pub const LESLIE_SLOW_HZ: f32 = 0.8;

/// Horn rate at Leslie speed 8 ("tremolo"), in Hz.
pub const LESLIE_FAST_HZ: f32 = 6.7;

/// Drum rate as a fraction of the horn rate.
const DRUM_RATIO: f32 = 0.87;

/// Rotor acceleration limits in Hz per second. The light horn spins up
/// much faster than the heavy drum.
const HORN_ACCEL: f32 = 4.0;
const DRUM_ACCEL: f32 = 1.5;

/// Crossover between drum (below) and horn (above).
const CROSSOVER_HZ: f32 = 800.0;

/// Amplitude modulation depths (fraction of full level removed at the
/// point where the rotor faces away from the microphone).
const HORN_AM_DEPTH: f32 = 0.35;
const DRUM_AM_DEPTH: f32 = 0.2;

/// Horn path delay and its peak Doppler swing, in seconds.
const HORN_BASE_DELAY: f32 = 0.0006;
const HORN_DOPPLER: f32 = 0.00025;

// ═══════════════════════════════════════════════════════════════════
// Distortion
// ═══════════════════════════════════════════════════════════════════

/// Stateless saturating waveshaper.
///
/// `y = gain * sign(u) * tanh(|u|^p)^(1/p)` with `u = drive * x`.
/// Linear for small inputs, bounded by `gain`; the knee hardens as the
/// power grows and `p = 1` is plain tanh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distortion {
    power: f32,
    drive: f32,
    gain: f32,
}

impl Distortion {
    pub fn new() -> Self {
        Self {
            power: 1.0,
            drive: 1.0,
            gain: 1.0,
        }
    }

    pub fn set(&mut self, power: f32, drive: f32, gain: f32) {
        self.power = power.max(MIN_POWER);
        self.drive = drive;
        self.gain = gain;
    }

    #[inline]
    pub fn process(&self, input: f32) -> f32 {
        self.gain * shape(input * self.drive, self.power)
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit saturating curve with knee hardness `power`.
#[inline]
pub fn shape(x: f32, power: f32) -> f32 {
    if power == 1.0 {
        return x.tanh();
    }
    let magnitude = x.abs();
    if magnitude == 0.0 {
        return 0.0;
    }
    x.signum() * magnitude.powf(power).tanh().powf(power.recip())
}

// ═══════════════════════════════════════════════════════════════════
// Leslie (rotating speaker)
// ═══════════════════════════════════════════════════════════════════

/// Horn rate for a quantized speed setting (1..=8).
pub fn horn_rate_for_speed(speed: f32) -> f32 {
    let step = (speed.clamp(1.0, 8.0).trunc() - 1.0) / 7.0;
    LESLIE_SLOW_HZ + step * (LESLIE_FAST_HZ - LESLIE_SLOW_HZ)
}

/// One spinning element with motor inertia.
#[derive(Debug, Clone)]
struct Rotor {
    /// Current physical rate (Hz).
    rate: f32,
    /// Rate the motor is driving toward (Hz).
    target: f32,
    /// Maximum rate change (Hz per second).
    accel: f32,
    /// Rotation phase (0.0 - 1.0).
    phase: f32,
    /// Phase increment per sample at the current rate.
    inc: f32,
}

impl Rotor {
    fn new(rate: f32, accel: f32, sample_rate: f32) -> Self {
        Self {
            rate,
            target: rate,
            accel,
            phase: 0.0,
            inc: rate / sample_rate,
        }
    }

    /// Move the physical rate toward the target by at most one chunk's
    /// worth of acceleration.
    fn ramp(&mut self, frames: usize, sample_rate: f32) {
        let max_step = self.accel * frames as f32 / sample_rate;
        self.rate += (self.target - self.rate).clamp(-max_step, max_step);
        self.inc = self.rate / sample_rate;
    }

    #[inline]
    fn advance(&mut self) {
        self.phase += self.inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
    }
}

/// Two-rotor rotating speaker simulation.
///
/// The signal is split at ~800 Hz. The drum (lows) gets amplitude
/// modulation; the horn (highs) gets amplitude modulation plus Doppler
/// pitch modulation through a short modulated delay. Two microphones a
/// quarter turn apart give the left and right outputs.
#[derive(Debug, Clone)]
pub struct Leslie {
    horn: Rotor,
    drum: Rotor,
    speed: f32,

    crossover_coeff: f32,
    low_state: f32,

    delay: Vec<f32>,
    write_pos: usize,
    base_delay: f32,    // In samples
    doppler_depth: f32, // In samples

    sample_rate: f32,
}

impl Leslie {
    /// Create a rotor pair at rest speed 1.
    ///
    /// Allocates the Doppler delay line; nothing allocates afterwards.
    pub fn new(sample_rate: f64) -> Self {
        let sr = sample_rate as f32;
        let horn_rate = horn_rate_for_speed(1.0);
        let base_delay = HORN_BASE_DELAY * sr;
        let doppler_depth = HORN_DOPPLER * sr;
        let delay_len = (base_delay + doppler_depth).ceil() as usize + 4;

        Self {
            horn: Rotor::new(horn_rate, HORN_ACCEL, sr),
            drum: Rotor::new(horn_rate * DRUM_RATIO, DRUM_ACCEL, sr),
            speed: 1.0,
            crossover_coeff: 1.0 - (-TAU * CROSSOVER_HZ / sr).exp(),
            low_state: 0.0,
            delay: vec![0.0; delay_len],
            write_pos: 0,
            base_delay,
            doppler_depth,
            sample_rate: sr,
        }
    }

    /// Set the target speed (1.0 - 8.0, fractional part ignored).
    pub fn set_speed(&mut self, speed: f32) {
        let speed = speed.clamp(1.0, 8.0).trunc();
        if speed != self.speed {
            self.speed = speed;
            let horn = horn_rate_for_speed(speed);
            self.horn.target = horn;
            self.drum.target = horn * DRUM_RATIO;
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Current physical horn rate in Hz.
    pub fn horn_rate(&self) -> f32 {
        self.horn.rate
    }

    /// Current physical drum rate in Hz.
    pub fn drum_rate(&self) -> f32 {
        self.drum.rate
    }

    /// Chunk-rate update: step both rotors toward their target rates.
    pub fn render_prep(&mut self, frames: usize) {
        self.horn.ramp(frames, self.sample_rate);
        self.drum.ramp(frames, self.sample_rate);
    }

    /// Process one mono sample into a left/right pair.
    #[inline]
    pub fn process(&mut self, input: f32) -> [f32; 2] {
        // Crossover
        self.low_state += (input - self.low_state) * self.crossover_coeff;
        let low = self.low_state;
        let high = input - low;

        let len = self.delay.len();
        self.delay[self.write_pos] = high;

        // Right microphone sits a quarter turn after the left one:
        // sin(a + pi/2) = cos(a), cos(a + pi/2) = -sin(a).
        let (horn_sin, horn_cos) = (self.horn.phase * TAU).sin_cos();
        let (drum_sin, drum_cos) = (self.drum.phase * TAU).sin_cos();
        let horn_pos = [(horn_sin, horn_cos), (horn_cos, -horn_sin)];
        let drum_facing = [drum_cos, -drum_sin];

        let mut out = [0.0; 2];
        for mic in 0..2 {
            let (sin, cos) = horn_pos[mic];
            let delay = self.base_delay + self.doppler_depth * sin;
            let horn_gain = 1.0 - HORN_AM_DEPTH * 0.5 * (1.0 - cos);
            let drum_gain = 1.0 - DRUM_AM_DEPTH * 0.5 * (1.0 - drum_facing[mic]);
            out[mic] = self.read_delay(delay) * horn_gain + low * drum_gain;
        }

        self.write_pos = (self.write_pos + 1) % len;
        self.horn.advance();
        self.drum.advance();

        out
    }

    /// Read the horn delay line with fractional (linear interpolation) delay.
    #[inline]
    fn read_delay(&self, delay_samples: f32) -> f32 {
        let len = self.delay.len();
        let delay = delay_samples.clamp(0.0, (len - 2) as f32);
        let whole = delay as usize;
        let frac = delay - whole as f32;

        let i0 = (self.write_pos + len - whole) % len;
        let i1 = (i0 + len - 1) % len;

        self.delay[i0] + frac * (self.delay[i1] - self.delay[i0])
    }

    /// Drop everything still ringing in the crossover and the horn delay.
    /// Rotor speed and phase are kept.
    pub fn clear(&mut self) {
        self.low_state = 0.0;
        self.delay.fill(0.0);
    }

    /// Clear filter and delay state and rewind both rotors.
    pub fn reset(&mut self) {
        self.clear();
        self.write_pos = 0;
        self.horn.phase = 0.0;
        self.drum.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48_000.0;

    #[test]
    fn test_shape_is_linear_for_small_inputs() {
        for power in [1.0, 1.5, 2.0, 2.5] {
            let y = shape(0.01, power);
            assert!((y - 0.01).abs() < 1e-4, "power {power}: {y}");
        }
    }

    #[test]
    fn test_shape_is_odd_and_bounded() {
        for power in [0.5, 1.0, 2.0, 4.0] {
            for x in [0.1, 0.5, 1.0, 3.0, 100.0] {
                let y = shape(x, power);
                assert!(y > 0.0 && y <= 1.0, "shape({x}, {power}) = {y}");
                assert_eq!(shape(-x, power), -y);
            }
        }
        assert_eq!(shape(0.0, 2.0), 0.0);
    }

    #[test]
    fn test_shape_is_monotonic() {
        let mut last = 0.0;
        for i in 1..200 {
            let y = shape(i as f32 * 0.05, 2.0);
            assert!(y >= last);
            last = y;
        }
    }

    #[test]
    fn test_distortion_gain_and_drive() {
        let mut dist = Distortion::new();
        dist.set(1.0, 2.0, 1.5);
        let expected = 1.5 * (0.3f32 * 2.0).tanh();
        assert!((dist.process(0.3) - expected).abs() < 1e-6);
        // Stateless: the same input always gives the same output.
        assert_eq!(dist.process(0.3), dist.process(0.3));
        assert!(dist.process(1000.0) <= 1.5);
    }

    #[test]
    fn test_distortion_clamps_power() {
        let mut dist = Distortion::new();
        dist.set(-3.0, 1.0, 1.0);
        let y = dist.process(0.5);
        assert!(y.is_finite() && y > 0.0);
    }

    #[test]
    fn test_speed_is_quantized() {
        let mut leslie = Leslie::new(SR);
        leslie.set_speed(4.7);
        assert_eq!(leslie.speed(), 4.0);
        leslie.set_speed(0.0);
        assert_eq!(leslie.speed(), 1.0);
        leslie.set_speed(9.5);
        assert_eq!(leslie.speed(), 8.0);
        assert_eq!(horn_rate_for_speed(8.0), LESLIE_FAST_HZ);
        assert_eq!(horn_rate_for_speed(1.0), LESLIE_SLOW_HZ);
    }

    #[test]
    fn test_rotor_ramps_gradually() {
        let mut leslie = Leslie::new(SR);
        let chunk = 16;
        let max_step = HORN_ACCEL * chunk as f32 / SR as f32;

        leslie.set_speed(8.0);
        let mut last = leslie.horn_rate();
        assert_eq!(last, LESLIE_SLOW_HZ);

        let mut reached_at = None;
        let mut drum_when_reached = 0.0;
        for n in 1..=6000 {
            leslie.render_prep(chunk);
            let rate = leslie.horn_rate();
            assert!(rate >= last);
            assert!(rate - last <= max_step + 1e-5, "jumped {} Hz", rate - last);
            last = rate;
            if reached_at.is_none() && rate >= LESLIE_FAST_HZ - 1e-3 {
                reached_at = Some(n);
                drum_when_reached = leslie.drum_rate();
            }
        }

        // ~1.5 s of spin-up at 4 Hz/s, far more than one chunk.
        let reached_at = reached_at.expect("horn never reached target");
        assert!(reached_at > 1000, "reached target after {reached_at} chunks");
        // The heavy drum lags behind the horn.
        assert!(drum_when_reached < LESLIE_FAST_HZ * DRUM_RATIO - 0.5);
    }

    #[test]
    fn test_stereo_microphones_differ() {
        let mut leslie = Leslie::new(SR);
        leslie.set_speed(8.0);
        let mut diff = 0.0f32;
        for i in 0..48_000 {
            if i % 16 == 0 {
                leslie.render_prep(16);
            }
            let x = (i as f32 * TAU * 2_000.0 / SR as f32).sin();
            let [l, r] = leslie.process(x);
            diff = diff.max((l - r).abs());
        }
        assert!(diff > 0.05, "left and right should differ, max diff {diff}");
    }

    #[test]
    fn test_clear_stops_the_tail() {
        let mut leslie = Leslie::new(SR);
        leslie.set_speed(8.0);
        for i in 0..4_800 {
            if i % 16 == 0 {
                leslie.render_prep(16);
            }
            leslie.process((i as f32 * TAU * 440.0 / SR as f32).sin());
        }
        let rate = leslie.horn_rate();

        leslie.clear();
        assert_eq!(leslie.horn_rate(), rate);
        for _ in 0..64 {
            assert_eq!(leslie.process(0.0), [0.0, 0.0]);
        }
    }

    #[test]
    fn test_silence_in_silence_out() {
        let mut leslie = Leslie::new(SR);
        for _ in 0..1024 {
            assert_eq!(leslie.process(0.0), [0.0, 0.0]);
        }
    }
}
