use anyhow::{bail, ensure, Context};
use beam::nalgebra::SVector;
use beam::{loop_index, Float, Mirror, Ray, RayPath, Termination};
use beam_json::{deserialize_simulation, serde_json, simulation_dim, JsonSer, Simulation};
use beam_scene::{PrismEvent, PrismScene};
use clap::Parser;
use log::{debug, info, warn};

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

mod cli;
mod dynamic;

use cli::{init_logger, Cli, Command};
use dynamic::SceneMirror;

/// Two reflection points closer than this are considered the same.
const LOOP_TOLERANCE: Float = 1e-9;

/// Follows `ray` for at most `max_reflections` reflections, returning the index of
/// the first leg the path goes through again, if any.
fn find_loop<const D: usize, M: Mirror<D> + ?Sized>(
    mirror: &M,
    ray: Ray<D>,
    eps: Float,
    max_reflections: usize,
) -> Option<usize> {
    let mut path: Vec<SVector<Float, D>> = vec![ray.origin];

    for pt in RayPath::new(mirror, ray, eps).take(max_reflections) {
        if let Some(i) = loop_index(&path, pt, LOOP_TOLERANCE) {
            return Some(i);
        }
        path.push(pt);
    }

    None
}

fn trace<const D: usize>(json: &serde_json::Value, output: Option<&Path>) -> anyhow::Result<()>
where
    Box<dyn SceneMirror<D>>: beam_json::JsonDes,
{
    let Simulation {
        config,
        mirror,
        rays,
    } = deserialize_simulation::<D, Box<dyn SceneMirror<D>>>(json)?;

    info!(
        "{} ray(s) in {D}D, bounce limit {}, far {}",
        rays.len(),
        config.params.bounce_limit,
        config.params.far,
    );

    let mut reflector = config.build::<D>();
    let mut results = Vec::with_capacity(rays.len());

    for (i, ray) in rays.iter().enumerate() {
        let mut hits = 0usize;
        let termination = reflector.cast(&mirror, ray.origin, ray.direction.into_inner(), |_, _| {
            hits += 1
        });

        let segments = reflector.segments();
        info!(
            "ray {i}: {} segment(s), {hits} hit(s), length {:.3}, {termination}",
            segments.len(),
            segments.total_length(),
        );

        if termination == Termination::BounceLimit {
            let max_reflections = config.params.bounce_limit.saturating_mul(2);
            if let Some(leg) = find_loop(&mirror, *ray, config.params.eps, max_reflections) {
                info!("ray {i} is trapped, its path repeats from leg {leg} on");
            }
        }

        results.push(serde_json::json!({
            "segments": segments.to_json(),
            "termination": termination.as_str(),
        }));
    }

    if let Some(path) = output {
        let file = File::create(path)
            .with_context(|| format!("couldn't create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &serde_json::json!({ "rays": results }))
            .with_context(|| format!("couldn't write to {}", path.display()))?;

        info!("segments written to {}", path.display());
    }

    Ok(())
}

fn prism(frames: usize, viewport_height: Float, fps: Float, prism_x: Float) -> anyhow::Result<()> {
    ensure!(fps.is_finite() && fps > 0.0, "fps must be positive, got {fps}");

    let mut scene = PrismScene::new()?;
    if prism_x != 0.0 {
        scene.set_prism_position([prism_x, -3.0, 0.0])?;
    }

    for frame in 0..frames {
        let report = scene.tick(viewport_height, frame as Float / fps);

        for event in &report.events {
            match event {
                PrismEvent::Over => info!("frame {frame}: the beam reaches the prism"),
                PrismEvent::Out => info!("frame {frame}: the beam leaves the prism"),
                PrismEvent::Move { position, .. } => {
                    debug!("frame {frame}: beam on the prism at {:?}", position.as_slice())
                }
            }
        }

        if report.termination == Termination::BufferFull {
            warn!("frame {frame}: the beam was cut short");
        }
    }

    let state = scene.state();
    info!(
        "after {frames} frame(s): prism {}, rainbow intensity {:.3}, beam of {} segment(s)",
        if state.prism_hit { "lit" } else { "dark" },
        state.rainbow.emissive_intensity,
        scene.beam().len(),
    );

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level.into());

    match cli.command {
        Command::Trace { scene, output } => {
            let file = File::open(&scene)
                .with_context(|| format!("couldn't open {}", scene.display()))?;
            let json: serde_json::Value = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("{} isn't valid JSON", scene.display()))?;

            match simulation_dim(&json)? {
                2 => trace::<2>(&json, output.as_deref()),
                3 => trace::<3>(&json, output.as_deref()),
                dim => bail!("dimension must be 2 or 3, found {dim}"),
            }
        }
        Command::Prism {
            frames,
            viewport_height,
            fps,
            prism_x,
        } => prism(frames, viewport_height, fps, prism_x),
    }
}
