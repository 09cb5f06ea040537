//! Command-line argument definitions and type conversions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use automatte::sfi::SfiDtype;
use automatte::tiling::DEFAULT_TILE_SIZE;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputDtype {
    /// 32-bit float, required for ranked (-r N > 0) mattes
    F32,
    /// 16-bit half float, rank 0 only
    F16,
    /// 16-bit bfloat, rank 0 only
    Bf16,
}

impl OutputDtype {
    pub fn to_sfi_dtype(self) -> SfiDtype {
        match self {
            OutputDtype::F32 => SfiDtype::F32,
            OutputDtype::F16 => SfiDtype::F16,
            OutputDtype::Bf16 => SfiDtype::BF16,
        }
    }
}

// ============================================================================
// Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "automatte")]
#[command(author, version, about = "Automatte - Gaussian ID matte resampling filter", long_about = None)]
pub struct Args {
    /// Input sample container (.sfi, kind = samples)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Filter options, e.g. "-w 2 -r 1 -i material -h crypto"
    ///
    /// -w  Gaussian width in pixels (default 2)
    /// -r  0 = random colour matte, N = ranked pairs from the Nth identifier
    /// -i  asset | object | material | group
    /// -h  crypto (ids in channels 1/2) | mantra (ids in object_id/material_id tensors)
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    pub filter: String,

    /// Output matte container path (optional)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output PNG preview path (optional)
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Output tile edge in pixels (0 = whole frame as one tile)
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: usize,

    /// Element type of the output matte
    #[arg(long, value_enum, default_value_t = OutputDtype::F32)]
    pub dtype: OutputDtype,

    /// Print the filter statistics as JSON to stdout
    #[arg(long)]
    pub stats_json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
