// src/main.rs
//
// Offline demo: plays a chord, speeds the Leslie up and prints per-block
// levels. Run with RUST_LOG=debug to see control-side logging.

use log::info;

use organ::{Organ, OrganError, ParamId};

const SAMPLE_RATE: f64 = 48_000.0;
const BLOCK: usize = 512;

fn main() -> Result<(), OrganError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut organ = Organ::new();
    organ.init(SAMPLE_RATE)?;

    // 88 8800 000
    for (i, level) in [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0].into_iter().enumerate() {
        organ.set_drawbar(i, level);
    }
    organ.set_drive(1.5);
    organ.set_vibrato_depth(0.1);

    for id in ParamId::ALL {
        let info = id.info();
        info!("{:<22} {}", info.name, info.format(organ.param(id)));
    }

    let chord = [(60, 261.63), (64, 329.63), (67, 392.00)];
    for (note, freq) in chord {
        organ.play_note(note, 100, freq);
    }

    let mut left = vec![0.0f32; BLOCK];
    let mut right = vec![0.0f32; BLOCK];
    let blocks = (SAMPLE_RATE as usize * 3) / BLOCK;

    for block in 0..blocks {
        if block == blocks / 3 {
            info!("leslie fast");
            organ.set_leslie_speed(8.0);
        }
        if block == 2 * blocks / 3 {
            for (note, _) in chord {
                organ.stop_note(note, false);
            }
        }

        {
            let mut out: [&mut [f32]; 2] = [&mut left, &mut right];
            organ.render(2, BLOCK, &mut out);
        }

        if block % 10 == 0 {
            println!(
                "block {:4}  voices {:2}  rms L {:.4}  R {:.4}  peak {:.4}",
                block,
                organ.active_voices(),
                rms(&left),
                rms(&right),
                left.iter().chain(&right).fold(0.0f32, |m, s| m.max(s.abs())),
            );
        }
    }

    organ.deinit();
    Ok(())
}

fn rms(buf: &[f32]) -> f32 {
    (buf.iter().map(|s| s * s).sum::<f32>() / buf.len() as f32).sqrt()
}
