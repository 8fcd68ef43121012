//! Entry point for meshbake.
//! Loads a model, flattens it and reports what a renderer would receive.

use std::path::PathBuf;

use anyhow::{Context, Result};
use asset::{ImportFlags, LoadOptions, NormalTransform, ObjImporter, load_model};

fn parse_normals_arg(args: &[String]) -> NormalTransform {
    // Accept: --normals=inverse-transpose|same
    let mut normals = NormalTransform::default();
    for arg in args {
        if let Some(val) = arg.strip_prefix("--normals=") {
            normals = match val.to_ascii_lowercase().as_str() {
                "inverse-transpose" | "it" | "correct" => NormalTransform::InverseTranspose,
                "same" | "naive" | "positions" => NormalTransform::SameAsPositions,
                other => {
                    log::warn!("Unknown normal mode '{}', falling back to inverse-transpose.", other);
                    NormalTransform::default()
                }
            };
        }
    }
    normals
}

fn parse_f32_arg(args: &[String], prefix: &str) -> Option<f32> {
    let mut value = None;
    for arg in args {
        if let Some(v) = arg.strip_prefix(prefix) {
            match v.parse::<f32>() {
                Ok(parsed) if parsed.is_finite() && parsed > 0.0 => value = Some(parsed),
                _ => log::warn!("Ignoring invalid value '{}' for {}", v, prefix.trim_end_matches('=')),
            }
        }
    }
    value
}

fn parse_flags_args(args: &[String]) -> ImportFlags {
    let mut flags = ImportFlags::default();
    for arg in args {
        match arg.as_str() {
            "--no-triangulate" => flags.triangulate = false,
            "--flip-uvs" => flags.flip_uvs = true,
            _ => {}
        }
    }
    flags
}

fn parse_options(args: &[String]) -> LoadOptions {
    let scale = parse_f32_arg(args, "--scale=");
    let fit_to = parse_f32_arg(args, "--fit=");
    if let (Some(scale), Some(fit)) = (scale, fit_to) {
        log::warn!("Both --scale={} and --fit={} given; --fit wins.", scale, fit);
    }
    LoadOptions {
        flags: parse_flags_args(args),
        scale: scale.unwrap_or(1.0),
        fit_to,
        normals: parse_normals_arg(args),
    }
}

fn parse_model_path(args: &[String]) -> Option<PathBuf> {
    args.iter().find(|a| !a.starts_with("--")).map(PathBuf::from)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let path = parse_model_path(&args).context(
        "usage: meshbake <model.obj> [--scale=F] [--fit=F] [--normals=inverse-transpose|same] \
         [--no-triangulate] [--flip-uvs]",
    )?;
    let options = parse_options(&args);
    log::info!(
        "Starting meshbake. scale={}, fit={:?}, normals={:?}, flags={:?}",
        options.scale,
        options.fit_to,
        options.normals,
        options.flags
    );

    let model = load_model(&ObjImporter, &path, &options)
        .with_context(|| format!("Failed to load model {}", path.display()))?;

    for (i, mesh) in model.meshes.iter().enumerate() {
        log::info!(
            "mesh[{}]: {} vertices, {} triangles",
            i,
            mesh.vertices().len(),
            mesh.triangle_count()
        );
    }
    if let Some(bounds) = model.bounds() {
        log::info!(
            "bounds: min={:?} max={:?} extent={:?}",
            bounds.min,
            bounds.max,
            bounds.extent()
        );
    }

    Ok(())
}
