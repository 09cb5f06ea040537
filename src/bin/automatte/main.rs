//! Automatte - ID matte resampling CLI
//!
//! Reads a sample container, runs the Gaussian ID matte filter over the whole
//! frame and writes the matte container and/or an 8-bit PNG preview.

mod args;

use args::Args;
use clap::Parser;
use log::{debug, info, warn};
use serde_json::json;
use std::fs;

use automatte::filter::{AutomatteFilter, PixelFilter};
use automatte::params::SpecialChannel;
use automatte::preview::{matte_to_rgb8, save_preview_png};
use automatte::sfi::{read_samples, write_matte};
use automatte::tiling::render_image;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.output.is_none() && args.preview.is_none() && !args.stats_json {
        warn!("no --output, --preview or --stats-json given; the result will be discarded");
    }

    let bytes = fs::read(&args.input)
        .map_err(|e| format!("Failed to read {}: {}", args.input.display(), e))?;
    let image = read_samples(&bytes)
        .map_err(|e| format!("Failed to load samples from {}: {}", args.input.display(), e))?;
    info!(
        "loaded {}: {}x{} samples, {} channels, {}x{} spp",
        args.input.display(),
        image.width,
        image.height,
        image.vector_size,
        image.samples_per_pixel_x,
        image.samples_per_pixel_y
    );

    let mut filter = AutomatteFilter::from_options_str(&args.filter);
    let options = *filter.options();
    info!("filter options: {}", options.to_arg_string());

    let dependencies = filter.declare_dependencies();
    debug!("special channels requested: {:?}", dependencies);
    if dependencies.contains(&SpecialChannel::ObjectId) && image.object_ids.is_none() {
        return Err(format!(
            "-h {} needs object_id/material_id tensors, but {} has none",
            options.hash_source.as_str(),
            args.input.display()
        ));
    }

    let matte = render_image(&mut filter, &image, args.tile_size)
        .map_err(|e| format!("Filtering failed: {}", e))?;

    if let Some(ref path) = args.output {
        let out = write_matte(&matte, &options, args.dtype.to_sfi_dtype())
            .map_err(|e| format!("Failed to encode matte: {}", e))?;
        fs::write(path, out).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        info!("wrote matte {}", path.display());
    }

    if let Some(ref path) = args.preview {
        let rgb = matte_to_rgb8(&matte.data, matte.width, matte.height, matte.vector_size, options.rank)
            .map_err(|e| format!("Failed to build preview: {}", e))?;
        save_preview_png(path, &rgb, matte.width as u32, matte.height as u32)?;
        info!("wrote preview {}", path.display());
    }

    if args.stats_json {
        let stats = json!({
            "width": matte.width,
            "height": matte.height,
            "vector_size": matte.vector_size,
            "options": options,
            "pixels": matte.stats.pixels,
            "degenerate_pixels": matte.stats.degenerate_pixels,
        });
        println!("{}", stats);
    }

    Ok(())
}
