//! Filter option parsing
//!
//! Options arrive as a short argument string, e.g. `-w 2.5 -r 1 -i material -h mantra`.
//! Parsing is permissive: unrecognized values silently fall back to the
//! default for that option, stray words are skipped and an unknown flag stops
//! parsing without discarding what came before it.

use clap::Parser;
use log::debug;
use serde::{Deserialize, Serialize};

/// Default Gaussian filter width, in pixels
pub const DEFAULT_FILTER_WIDTH: f32 = 2.0;

/// Which scene identifier the matte is built from
///
/// Resolution convention of the precomputed channels: R asset, G object,
/// B material, A group. Only object and material are produced upstream, so
/// asset and group read the material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    Asset,
    #[default]
    Object,
    Material,
    Group,
}

impl IdType {
    pub fn from_str(s: &str) -> Option<IdType> {
        match s.to_lowercase().as_str() {
            "asset" => Some(IdType::Asset),
            "object" => Some(IdType::Object),
            "material" => Some(IdType::Material),
            "group" => Some(IdType::Group),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Asset => "asset",
            IdType::Object => "object",
            IdType::Material => "material",
            IdType::Group => "group",
        }
    }

    /// True when the identifier comes from the object slot, false for the material slot
    #[inline]
    pub fn uses_object_slot(&self) -> bool {
        matches!(self, IdType::Object)
    }

    /// Channel offset of the identifier inside a precomputed sample vector
    #[inline]
    pub fn hash_channel(&self) -> usize {
        if self.uses_object_slot() { 1 } else { 2 }
    }

    /// Returns true for identifier types that have a real upstream producer
    pub fn is_supported(&self) -> bool {
        matches!(self, IdType::Object | IdType::Material)
    }
}

/// Where identifier values are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashSource {
    /// Precomputed shader channels, stored inside the sample vector
    #[default]
    Crypto,
    /// Renderer-provided special channels (one float per sample)
    Mantra,
}

impl HashSource {
    pub fn from_str(s: &str) -> Option<HashSource> {
        match s.to_lowercase().as_str() {
            "crypto" | "cryptomatte" => Some(HashSource::Crypto),
            "mantra" => Some(HashSource::Mantra),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashSource::Crypto => "crypto",
            HashSource::Mantra => "mantra",
        }
    }
}

/// User-facing filter options, before any resolution-dependent constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Gaussian kernel width in pixels (`-w`)
    pub filter_width: f32,
    /// 0 = random colour encoding, N > 0 = ranked pairs starting at the Nth (`-r`)
    pub rank: u32,
    /// Identifier semantic to expose (`-i`)
    pub id_type: IdType,
    /// Identifier source (`-h`)
    pub hash_source: HashSource,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            filter_width: DEFAULT_FILTER_WIDTH,
            rank: 0,
            id_type: IdType::default(),
            hash_source: HashSource::default(),
        }
    }
}

impl FilterOptions {
    /// Parse a whitespace separated option string on top of the defaults
    pub fn parse(options: &str) -> Self {
        let mut parsed = Self::default();
        parsed.apply_args(options.split_whitespace());
        parsed
    }

    /// Apply argv-style tokens to these options.
    ///
    /// Accepts both `-w 2` and `-w2`. Stray words are skipped; an unknown flag
    /// ends parsing and keeps whatever was read before it.
    pub fn apply_args<'a, I>(&mut self, args: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let parsed = match OptionArgs::try_parse_from(args) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("filter options not understood, keeping defaults: {}", e);
                return;
            }
        };
        if !parsed.ignored.is_empty() {
            debug!("ignoring stray filter arguments {:?}", parsed.ignored);
        }

        if let Some(ref value) = parsed.width {
            self.filter_width = parse_width(value);
        }
        if let Some(ref value) = parsed.rank {
            self.rank = parse_rank(value);
        }
        if let Some(ref value) = parsed.id_type {
            self.id_type = IdType::from_str(value).unwrap_or_else(|| {
                debug!("unknown identifier type '{}', using default", value);
                IdType::default()
            });
        }
        if let Some(ref value) = parsed.hash_source {
            self.hash_source = HashSource::from_str(value).unwrap_or_else(|| {
                debug!("unknown hash source '{}', using default", value);
                HashSource::default()
            });
        }
    }

    /// Render back to the option string form accepted by [`FilterOptions::parse`]
    pub fn to_arg_string(&self) -> String {
        format!(
            "-w {} -r {} -i {} -h {}",
            self.filter_width,
            self.rank,
            self.id_type.as_str(),
            self.hash_source.as_str()
        )
    }
}

/// Raw option tokens. Values stay strings so bad input falls back per option
/// instead of failing the whole parse.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true, disable_version_flag = true, ignore_errors = true)]
struct OptionArgs {
    #[arg(short = 'w', allow_hyphen_values = true)]
    width: Option<String>,

    #[arg(short = 'r', allow_hyphen_values = true)]
    rank: Option<String>,

    #[arg(short = 'i', allow_hyphen_values = true)]
    id_type: Option<String>,

    #[arg(short = 'h', allow_hyphen_values = true)]
    hash_source: Option<String>,

    #[arg(num_args = 0..)]
    ignored: Vec<String>,
}

fn parse_width(value: &str) -> f32 {
    match value.parse::<f32>() {
        Ok(w) if w.is_finite() => w,
        _ => {
            debug!("invalid filter width '{}', using default", value);
            DEFAULT_FILTER_WIDTH
        }
    }
}

// Rank is read as a float and truncated, so "1.0" and "1" are equivalent.
fn parse_rank(value: &str) -> u32 {
    match value.parse::<f32>() {
        Ok(r) if r.is_finite() && r >= 0.0 => r as u32,
        _ => {
            debug!("invalid rank '{}', using default", value);
            0
        }
    }
}
