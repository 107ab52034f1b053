// C-compatible FFI bindings for Swift/iOS and other native hosts.
//
// Safety requirements:
// - Handles must be created by `organ_init` and not fabricated
// - Null handles are tolerated: setters do nothing, getters return defaults
// - Each handle pair must be released exactly once with `organ_deinit`
// - The control handle may live on a different thread than the engine
//   handle, but each handle must only be used from one thread at a time

use log::{error, info};
#[cfg(feature = "ios")]
use log::LevelFilter;
#[cfg(feature = "ios")]
use oslog::OsLogger;

use crate::bridge::{EngineHandle, OrganHandle, create_bridge};
use crate::config::OrganConfig;
use crate::state::{ParamId, TimbreMode};

// Logger subsystem identifier
#[cfg(feature = "ios")]
const LOG_SUBSYSTEM: &str = "com.organ.engine";

/// Status returned by `organ_init` when an output pointer is null.
pub const ORGAN_STATUS_NULL_POINTER: i32 = -4;

/// Frames rendered per internal pass of `organ_render`.
const RENDER_SCRATCH: usize = 256;

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup. Messages appear in Console.app and
/// Xcode's debug console.
#[cfg(feature = "ios")]
#[unsafe(no_mangle)]
pub extern "C" fn organ_init_logger() {
    OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle Types
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to the control side.
pub struct OrganControl {
    inner: OrganHandle,
}

/// Opaque handle to the audio side.
pub struct OrganEngine {
    inner: EngineHandle,
}

/// Parameter metadata for UI controls.
#[repr(C)]
pub struct OrganParamInfo {
    pub id: u32,
    pub min_value: f32,
    pub max_value: f32,
    pub default_value: f32,
    /// 0 for continuous parameters.
    pub step: f32,
}

// ═══════════════════════════════════════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════════════════════════════════════

/// Default configuration (48 kHz, 16 voices, 1024 queued events).
#[unsafe(no_mangle)]
pub extern "C" fn organ_default_config() -> OrganConfig {
    OrganConfig::default()
}

/// Create an engine.
///
/// `config` may be null to use the defaults. On success returns 0 and
/// writes both handles; on failure returns a negative status and writes
/// null handles.
///
/// # Safety
/// `config` must be null or valid; `out_control` and `out_engine` must be
/// valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_init(
    config: *const OrganConfig,
    out_control: *mut *mut OrganControl,
    out_engine: *mut *mut OrganEngine,
) -> i32 {
    if out_control.is_null() || out_engine.is_null() {
        error!("organ_init: null output pointer");
        return ORGAN_STATUS_NULL_POINTER;
    }
    unsafe {
        *out_control = std::ptr::null_mut();
        *out_engine = std::ptr::null_mut();
    }

    let config = if config.is_null() {
        OrganConfig::default()
    } else {
        unsafe { *config }
    };

    match create_bridge(config) {
        Ok((control, engine)) => {
            unsafe {
                *out_control = Box::into_raw(Box::new(OrganControl { inner: control }));
                *out_engine = Box::into_raw(Box::new(OrganEngine { inner: engine }));
            }
            0
        }
        Err(e) => {
            error!("organ_init failed: {}", e);
            e.status_code()
        }
    }
}

/// Destroy both handles. Either may be null.
///
/// # Safety
/// Rendering must have stopped; the handles must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_deinit(control: *mut OrganControl, engine: *mut OrganEngine) {
    if !control.is_null() {
        drop(unsafe { Box::from_raw(control) });
    }
    if !engine.is_null() {
        drop(unsafe { Box::from_raw(engine) });
        info!("organ deinitialized");
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Notes
// ═══════════════════════════════════════════════════════════════════════════

/// Start (or retrigger) a note.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_play_note(
    control: *mut OrganControl,
    note: u8,
    velocity: u8,
    frequency: f32,
) {
    if let Some(c) = unsafe { control.as_mut() } {
        c.inner.play_note(note, velocity, frequency);
    }
}

/// Stop a note; `immediate` skips the release.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_stop_note(control: *mut OrganControl, note: u8, immediate: bool) {
    if let Some(c) = unsafe { control.as_mut() } {
        c.inner.stop_note(note, immediate);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_sustain_pedal(control: *mut OrganControl, down: bool) {
    if let Some(c) = unsafe { control.as_mut() } {
        c.inner.sustain_pedal(down);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_all_notes_off(control: *mut OrganControl, immediate: bool) {
    if let Some(c) = unsafe { control.as_mut() } {
        c.inner.all_notes_off(immediate);
    }
}

/// Silence everything and rewind modulation. Parameters are kept.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_reset(control: *mut OrganControl) {
    if let Some(c) = unsafe { control.as_mut() } {
        c.inner.reset();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameters
// ═══════════════════════════════════════════════════════════════════════════

/// Set a parameter by numeric id. Returns `false` for an unknown id or a
/// discarded value.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_set_param(control: *mut OrganControl, id: u32, value: f32) -> bool {
    match (unsafe { control.as_mut() }, ParamId::from_u32(id)) {
        (Some(c), Some(id)) => c.inner.set_param(id, value),
        _ => false,
    }
}

/// Read a parameter by numeric id. Unknown ids read as 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_get_param(control: *const OrganControl, id: u32) -> f32 {
    let Some(id) = ParamId::from_u32(id) else {
        return 0.0;
    };
    match unsafe { control.as_ref() } {
        Some(c) => c.inner.param(id),
        None => id.info().default,
    }
}

/// Metadata for parameter `id`. Returns `false` for an unknown id.
///
/// # Safety
/// `out` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_param_info(id: u32, out: *mut OrganParamInfo) -> bool {
    let (Some(id), Some(out)) = (ParamId::from_u32(id), unsafe { out.as_mut() }) else {
        return false;
    };
    let info = id.info();
    *out = OrganParamInfo {
        id: id as u32,
        min_value: info.min,
        max_value: info.max,
        default_value: info.default,
        step: info.step,
    };
    true
}

/// One setter/getter pair per scalar parameter.
macro_rules! param_accessors {
    ($($set:ident, $get:ident => $id:ident;)*) => {
        $(
            #[unsafe(no_mangle)]
            pub unsafe extern "C" fn $set(control: *mut OrganControl, value: f32) {
                if let Some(c) = unsafe { control.as_mut() } {
                    c.inner.set_param(ParamId::$id, value);
                }
            }

            #[unsafe(no_mangle)]
            pub unsafe extern "C" fn $get(control: *const OrganControl) -> f32 {
                unsafe { organ_get_param(control, ParamId::$id as u32) }
            }
        )*
    };
}

param_accessors! {
    organ_set_pitch_offset, organ_get_pitch_offset => PitchOffset;
    organ_set_vibrato_depth, organ_get_vibrato_depth => VibratoDepth;
    organ_set_master_volume, organ_get_master_volume => MasterVolume;
    organ_set_velocity_sensitivity, organ_get_velocity_sensitivity => VelocitySensitivity;
    organ_set_tuning_ratio, organ_get_tuning_ratio => TuningRatio;
    organ_set_amp_attack_duration_seconds, organ_get_amp_attack_duration_seconds => AmpAttack;
    organ_set_amp_decay_duration_seconds, organ_get_amp_decay_duration_seconds => AmpDecay;
    organ_set_amp_sustain_fraction, organ_get_amp_sustain_fraction => AmpSustain;
    organ_set_amp_release_duration_seconds, organ_get_amp_release_duration_seconds => AmpRelease;
    organ_set_power, organ_get_power => Power;
    organ_set_drive, organ_get_drive => Drive;
    organ_set_gain, organ_get_gain => Gain;
    organ_set_leslie_speed, organ_get_leslie_speed => LeslieSpeed;
}

// ═══════════════════════════════════════════════════════════════════════════
// Registration
// ═══════════════════════════════════════════════════════════════════════════

/// Set drawbar `index` (0-8); selects drawbar mode.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_set_drawbar(control: *mut OrganControl, index: u32, value: f32) {
    if let Some(c) = unsafe { control.as_mut() } {
        c.inner.set_drawbar(index as usize, value);
    }
}

/// Drawbar level, or 0 for an invalid index or null handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_get_drawbar(control: *const OrganControl, index: u32) -> f32 {
    unsafe { control.as_ref() }
        .and_then(|c| c.inner.drawbar(index as usize))
        .unwrap_or(0.0)
}

/// Set harmonic `index` (0-15); selects harmonic mode.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_set_harmonic_level(
    control: *mut OrganControl,
    index: u32,
    value: f32,
) {
    if let Some(c) = unsafe { control.as_mut() } {
        c.inner.set_harmonic_level(index as usize, value);
    }
}

/// Harmonic level, or 0 for an invalid index or null handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_get_harmonic_level(control: *const OrganControl, index: u32) -> f32 {
    unsafe { control.as_ref() }
        .and_then(|c| c.inner.harmonic_level(index as usize))
        .unwrap_or(0.0)
}

/// 0 = drawbars, 1 = harmonics.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_get_timbre_mode(control: *const OrganControl) -> u32 {
    match unsafe { control.as_ref() }.map(|c| c.inner.timbre_mode()) {
        Some(TimbreMode::Harmonic) => 1,
        _ => 0,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Readback
// ═══════════════════════════════════════════════════════════════════════════

/// Voices sounding as of the last render call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_get_active_voices(control: *const OrganControl) -> u32 {
    unsafe { control.as_ref() }.map_or(0, |c| c.inner.active_voices() as u32)
}

// ═══════════════════════════════════════════════════════════════════════════
// Rendering
// ═══════════════════════════════════════════════════════════════════════════

/// Render `sample_count` samples into `channel_count` planar buffers.
///
/// Channel `c` receives the rotor microphone `c % 2`. Null channel
/// pointers are skipped; with a null engine every buffer gets silence.
///
/// # Safety
/// - Must be called from the audio thread
/// - `buffers` must be null or point to `channel_count` pointers, each null
///   or valid for `sample_count` floats
#[unsafe(no_mangle)]
pub unsafe extern "C" fn organ_render(
    engine: *mut OrganEngine,
    channel_count: u32,
    sample_count: u32,
    buffers: *mut *mut f32,
) {
    if buffers.is_null() || channel_count == 0 {
        return;
    }
    let total_frames = sample_count as usize;
    let channels = unsafe { std::slice::from_raw_parts(buffers, channel_count as usize) };

    let Some(engine) = (unsafe { engine.as_mut() }) else {
        for &ptr in channels.iter().filter(|p| !p.is_null()) {
            unsafe { std::ptr::write_bytes(ptr, 0, total_frames) };
        }
        return;
    };

    // Render the microphone pair into scratch, then fan out to the host's
    // channels.
    let mut left = [0.0f32; RENDER_SCRATCH];
    let mut right = [0.0f32; RENDER_SCRATCH];
    let mut offset = 0;
    while offset < total_frames {
        let frames = (total_frames - offset).min(RENDER_SCRATCH);
        {
            let mut pair: [&mut [f32]; 2] = [&mut left[..frames], &mut right[..frames]];
            engine.inner.render(2, frames, &mut pair);
        }

        for (c, &ptr) in channels.iter().enumerate() {
            if ptr.is_null() {
                continue;
            }
            let src = if c % 2 == 0 { &left } else { &right };
            let dst = unsafe { std::slice::from_raw_parts_mut(ptr.add(offset), frames) };
            dst.copy_from_slice(&src[..frames]);
        }

        offset += frames;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn init() -> (*mut OrganControl, *mut OrganEngine) {
        let mut control = ptr::null_mut();
        let mut engine = ptr::null_mut();
        let config = OrganConfig::with_sample_rate(44_100.0);
        assert_eq!(unsafe { organ_init(&config, &mut control, &mut engine) }, 0);
        (control, engine)
    }

    #[test]
    fn test_init_failure_writes_null_handles() {
        let mut control = ptr::null_mut();
        let mut engine = ptr::null_mut();
        let config = OrganConfig::with_sample_rate(0.0);
        assert_eq!(unsafe { organ_init(&config, &mut control, &mut engine) }, -1);
        assert!(control.is_null() && engine.is_null());

        let status = unsafe { organ_init(ptr::null(), ptr::null_mut(), &mut engine) };
        assert_eq!(status, ORGAN_STATUS_NULL_POINTER);
    }

    #[test]
    fn test_null_handles_are_ignored() {
        unsafe {
            organ_play_note(ptr::null_mut(), 60, 100, 261.63);
            organ_set_master_volume(ptr::null_mut(), 0.5);
            assert_eq!(organ_get_master_volume(ptr::null()), 1.0);
            assert_eq!(organ_get_drawbar(ptr::null(), 0), 0.0);
            assert_eq!(organ_get_active_voices(ptr::null()), 0);

            let mut buf = vec![1.0f32; 32];
            let mut chans = [buf.as_mut_ptr()];
            organ_render(ptr::null_mut(), 1, 32, chans.as_mut_ptr());
            assert!(buf.iter().all(|&s| s == 0.0));

            organ_deinit(ptr::null_mut(), ptr::null_mut());
        }
    }

    #[test]
    fn test_params_through_abi() {
        let (control, engine) = init();
        unsafe {
            organ_set_leslie_speed(control, 3.7);
            assert_eq!(organ_get_leslie_speed(control), 3.0);
            assert!(!organ_set_param(control, 99, 1.0));
            assert_eq!(organ_get_param(control, 99), 0.0);

            organ_set_harmonic_level(control, 2, 0.5);
            assert_eq!(organ_get_harmonic_level(control, 2), 0.5);
            assert_eq!(organ_get_timbre_mode(control), 1);
            organ_set_drawbar(control, 20, 0.5);
            assert_eq!(organ_get_timbre_mode(control), 1);

            let mut info = OrganParamInfo {
                id: 0,
                min_value: 0.0,
                max_value: 0.0,
                default_value: 0.0,
                step: 0.0,
            };
            assert!(organ_param_info(ParamId::AmpSustain as u32, &mut info));
            assert_eq!((info.min_value, info.max_value), (0.0, 1.0));
            assert!(!organ_param_info(PARAM_ID_OUT_OF_RANGE, &mut info));

            organ_deinit(control, engine);
        }
    }

    const PARAM_ID_OUT_OF_RANGE: u32 = crate::state::PARAM_COUNT as u32;

    #[test]
    fn test_render_skips_null_channels() {
        let (control, engine) = init();
        unsafe {
            organ_play_note(control, 60, 100, 261.63);

            let mut left = vec![0.0f32; 600];
            let mut third = vec![0.0f32; 600];
            let mut chans = [left.as_mut_ptr(), ptr::null_mut(), third.as_mut_ptr()];
            organ_render(engine, 3, 600, chans.as_mut_ptr());

            assert!(left.iter().any(|&s| s != 0.0));
            assert_eq!(left, third);
            assert_eq!(organ_get_active_voices(control), 1);

            organ_deinit(control, engine);
        }
    }
}
