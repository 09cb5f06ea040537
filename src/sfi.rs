//! Sample and matte container format
//!
//! Safetensors layout: an 8-byte little-endian header length, a JSON header,
//! then raw little-endian tensor data. The header's `__metadata__` map carries
//! `format = "automatte"` and a `kind` of either `samples` or `matte`.
//!
//! Sample files hold:
//! - `samples` `[H, W, C]` sub-pixel sample vectors
//! - optional `object_id` / `material_id` `[H, W, 1]` host identifier channels
//! - metadata `samples_per_pixel_x`, `samples_per_pixel_y`
//!
//! Matte files hold a single `matte` `[H, W, C]` tensor plus the filter options
//! that produced it. Identifiers are float bit patterns, so half precision is
//! only accepted for rank 0 mattes.

use half::{bf16, f16};
use log::debug;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::buffer::SampleImage;
use crate::error::FilterError;
use crate::options::FilterOptions;
use crate::tiling::MatteImage;

pub const FORMAT_NAME: &str = "automatte";
pub const FORMAT_VERSION: &str = "1.0";

const SAMPLES_TENSOR: &str = "samples";
const OBJECT_ID_TENSOR: &str = "object_id";
const MATERIAL_ID_TENSOR: &str = "material_id";
const MATTE_TENSOR: &str = "matte";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum SfiError {
    #[error("file too short for safetensors format")]
    FileTooShort,
    #[error("invalid header size")]
    InvalidHeaderSize,
    #[error("JSON error: {0}")]
    Json(String),
    #[error("missing required metadata: {0}")]
    MissingMetadata(String),
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("tensor not found: {0}")]
    TensorNotFound(String),
    #[error("invalid or unsupported dtype: {0}")]
    InvalidDtype(String),
    #[error("invalid tensor shape: {0}")]
    InvalidShape(String),
    #[error("data size mismatch: expected {expected} bytes, got {actual}")]
    DataSizeMismatch { expected: usize, actual: usize },
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

// ============================================================================
// Metadata Types
// ============================================================================

/// Tensor element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SfiDtype {
    #[default]
    F32,
    F16,
    BF16,
}

impl SfiDtype {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "F32" | "f32" => Some(SfiDtype::F32),
            "F16" | "f16" => Some(SfiDtype::F16),
            "BF16" | "bf16" => Some(SfiDtype::BF16),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SfiDtype::F32 => "F32",
            SfiDtype::F16 => "F16",
            SfiDtype::BF16 => "BF16",
        }
    }

    fn bytes_per_element(&self) -> usize {
        match self {
            SfiDtype::F32 => 4,
            SfiDtype::F16 | SfiDtype::BF16 => 2,
        }
    }
}

/// What a container holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SfiKind {
    Samples,
    Matte,
}

impl SfiKind {
    fn from_str(s: &str) -> Result<Self, SfiError> {
        match s {
            "samples" => Ok(SfiKind::Samples),
            "matte" => Ok(SfiKind::Matte),
            _ => Err(SfiError::InvalidMetadata(format!("unknown kind: {}", s))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SfiKind::Samples => "samples",
            SfiKind::Matte => "matte",
        }
    }
}

/// Matte loaded back from a container
#[derive(Debug, Clone, PartialEq)]
pub struct SfiMatte {
    pub width: usize,
    pub height: usize,
    pub vector_size: usize,
    pub data: Vec<f32>,
    pub options: FilterOptions,
    pub dtype: SfiDtype,
}

// ============================================================================
// Format Detection
// ============================================================================

/// Check whether `data` is an automatte container of any kind
pub fn is_sfi_format(data: &[u8]) -> bool {
    read_kind(data).is_ok()
}

/// Kind of an automatte container
pub fn read_kind(data: &[u8]) -> Result<SfiKind, SfiError> {
    let (header, _) = parse_header(data)?;
    let meta = metadata(&header)?;
    SfiKind::from_str(meta_str(meta, "kind")?)
}

// ============================================================================
// Reading
// ============================================================================

/// Read a sample container into a frame ready for filtering
pub fn read_samples(data: &[u8]) -> Result<SampleImage, SfiError> {
    let (header, body) = parse_header(data)?;
    let meta = metadata(&header)?;
    expect_kind(meta, SfiKind::Samples)?;

    let spp_x = meta_usize(meta, "samples_per_pixel_x")?;
    let spp_y = meta_usize(meta, "samples_per_pixel_y")?;

    let samples = read_tensor(&header, body, SAMPLES_TENSOR)?
        .ok_or_else(|| SfiError::TensorNotFound(SAMPLES_TENSOR.to_string()))?;
    let (height, width, vector_size) = samples.hwc()?;

    let mut image = SampleImage::new(samples.values, width, height, vector_size, spp_x, spp_y)?;

    let object_ids = read_tensor(&header, body, OBJECT_ID_TENSOR)?;
    let material_ids = read_tensor(&header, body, MATERIAL_ID_TENSOR)?;
    match (object_ids, material_ids) {
        (Some(obj), Some(mat)) => {
            obj.expect_plane(height, width, OBJECT_ID_TENSOR)?;
            mat.expect_plane(height, width, MATERIAL_ID_TENSOR)?;
            image = image.with_special_channels(obj.values, mat.values)?;
        }
        (None, None) => {}
        _ => {
            return Err(SfiError::InvalidMetadata(
                "object_id and material_id must be stored together".to_string(),
            ))
        }
    }

    debug!(
        "read {}x{} samples ({} channels, {}x{} spp, {} dtype, special channels: {})",
        width,
        height,
        vector_size,
        spp_x,
        spp_y,
        samples.dtype.as_str(),
        image.object_ids.is_some()
    );
    Ok(image)
}

/// Read a matte container
pub fn read_matte(data: &[u8]) -> Result<SfiMatte, SfiError> {
    let (header, body) = parse_header(data)?;
    let meta = metadata(&header)?;
    expect_kind(meta, SfiKind::Matte)?;

    let options: FilterOptions = serde_json::from_str(meta_str(meta, "options")?)
        .map_err(|e| SfiError::InvalidMetadata(format!("options: {}", e)))?;

    let matte = read_tensor(&header, body, MATTE_TENSOR)?
        .ok_or_else(|| SfiError::TensorNotFound(MATTE_TENSOR.to_string()))?;
    let (height, width, vector_size) = matte.hwc()?;

    Ok(SfiMatte {
        width,
        height,
        vector_size,
        data: matte.values,
        options,
        dtype: matte.dtype,
    })
}

/// Split `data` into the parsed JSON header and the tensor byte region
fn parse_header(data: &[u8]) -> Result<(Value, &[u8]), SfiError> {
    if data.len() < 8 {
        return Err(SfiError::FileTooShort);
    }
    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&data[..8]);
    let header_size = usize::try_from(u64::from_le_bytes(size_bytes)).map_err(|_| SfiError::InvalidHeaderSize)?;

    if header_size == 0 || header_size > data.len() - 8 {
        return Err(SfiError::InvalidHeaderSize);
    }

    let json_str = std::str::from_utf8(&data[8..8 + header_size]).map_err(|e| SfiError::Json(e.to_string()))?;
    let parsed: Value = serde_json::from_str(json_str).map_err(|e| SfiError::Json(e.to_string()))?;
    Ok((parsed, &data[8 + header_size..]))
}

fn metadata(header: &Value) -> Result<&Map<String, Value>, SfiError> {
    let meta = header
        .get("__metadata__")
        .and_then(|v| v.as_object())
        .ok_or_else(|| SfiError::MissingMetadata("__metadata__".to_string()))?;
    let format = meta_str(meta, "format")?;
    if format != FORMAT_NAME {
        return Err(SfiError::InvalidMetadata(format!(
            "expected format '{}', got '{}'",
            FORMAT_NAME, format
        )));
    }
    Ok(meta)
}

fn expect_kind(meta: &Map<String, Value>, kind: SfiKind) -> Result<(), SfiError> {
    let found = SfiKind::from_str(meta_str(meta, "kind")?)?;
    if found != kind {
        return Err(SfiError::InvalidMetadata(format!(
            "expected a {} container, got {}",
            kind.as_str(),
            found.as_str()
        )));
    }
    Ok(())
}

fn meta_str<'a>(meta: &'a Map<String, Value>, key: &str) -> Result<&'a str, SfiError> {
    meta.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| SfiError::MissingMetadata(key.to_string()))
}

/// Safetensors metadata values are strings; numbers are stored in decimal
fn meta_usize(meta: &Map<String, Value>, key: &str) -> Result<usize, SfiError> {
    let s = meta_str(meta, key)?;
    s.parse::<usize>()
        .map_err(|_| SfiError::InvalidMetadata(format!("{} is not an integer: '{}'", key, s)))
}

/// Decoded tensor, always widened to f32
struct Tensor {
    shape: Vec<usize>,
    dtype: SfiDtype,
    values: Vec<f32>,
}

impl Tensor {
    fn hwc(&self) -> Result<(usize, usize, usize), SfiError> {
        match self.shape[..] {
            [h, w, c] => Ok((h, w, c)),
            _ => Err(SfiError::InvalidShape(format!(
                "expected 3 dimensions, got {}",
                self.shape.len()
            ))),
        }
    }

    fn expect_plane(&self, height: usize, width: usize, name: &str) -> Result<(), SfiError> {
        if self.shape != [height, width, 1] {
            return Err(SfiError::InvalidShape(format!(
                "{} has shape {:?}, expected [{}, {}, 1]",
                name, self.shape, height, width
            )));
        }
        Ok(())
    }
}

fn read_tensor(header: &Value, body: &[u8], name: &str) -> Result<Option<Tensor>, SfiError> {
    let Some(info) = header.get(name) else {
        return Ok(None);
    };

    let dtype_str = info
        .get("dtype")
        .and_then(|v| v.as_str())
        .ok_or_else(|| SfiError::MissingMetadata(format!("{}.dtype", name)))?;
    let dtype = SfiDtype::from_str(dtype_str).ok_or_else(|| SfiError::InvalidDtype(dtype_str.to_string()))?;

    let shape: Vec<usize> = info
        .get("shape")
        .and_then(|v| v.as_array())
        .ok_or_else(|| SfiError::MissingMetadata(format!("{}.shape", name)))?
        .iter()
        .map(|v| v.as_u64().and_then(|n| usize::try_from(n).ok()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| SfiError::InvalidShape(format!("{}: invalid dimension values", name)))?;

    let offsets = info
        .get("data_offsets")
        .and_then(|v| v.as_array())
        .filter(|a| a.len() == 2)
        .ok_or_else(|| SfiError::InvalidShape(format!("{}: data_offsets must have 2 elements", name)))?;
    let offset = |i: usize| {
        offsets[i]
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| SfiError::InvalidShape(format!("{}: invalid data_offsets", name)))
    };
    let (start, end) = (offset(0)?, offset(1)?);
    if end < start {
        return Err(SfiError::InvalidShape(format!("{}: data_offsets are reversed", name)));
    }

    let expected = shape
        .iter()
        .try_fold(dtype.bytes_per_element(), |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| SfiError::InvalidShape(format!("{}: shape {:?} is too large", name, shape)))?;
    if end - start != expected {
        return Err(SfiError::DataSizeMismatch {
            expected,
            actual: end - start,
        });
    }
    if end > body.len() {
        return Err(SfiError::FileTooShort);
    }

    let bytes = &body[start..end];
    let values: Vec<f32> = match dtype {
        SfiDtype::F32 => bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        SfiDtype::F16 => bytes
            .chunks_exact(2)
            .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
        SfiDtype::BF16 => bytes
            .chunks_exact(2)
            .map(|c| bf16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
    };

    Ok(Some(Tensor { shape, dtype, values }))
}

// ============================================================================
// Writing
// ============================================================================

/// Write a sample frame. Samples are always stored as F32 so identifier bit
/// patterns survive.
pub fn write_samples(image: &SampleImage) -> Result<Vec<u8>, SfiError> {
    let mut writer = ContainerWriter::new(SfiKind::Samples);
    writer.meta("samples_per_pixel_x", image.samples_per_pixel_x.to_string());
    writer.meta("samples_per_pixel_y", image.samples_per_pixel_y.to_string());
    writer.tensor(
        SAMPLES_TENSOR,
        [image.height, image.width, image.vector_size],
        &image.data,
        SfiDtype::F32,
    );
    if let (Some(obj), Some(mat)) = (&image.object_ids, &image.material_ids) {
        writer.tensor(OBJECT_ID_TENSOR, [image.height, image.width, 1], obj, SfiDtype::F32);
        writer.tensor(MATERIAL_ID_TENSOR, [image.height, image.width, 1], mat, SfiDtype::F32);
    }
    writer.finish()
}

/// Write a filtered matte along with the options that produced it.
///
/// Ranked mattes store identifiers and must use F32.
pub fn write_matte(matte: &MatteImage, options: &FilterOptions, dtype: SfiDtype) -> Result<Vec<u8>, SfiError> {
    if options.rank > 0 && dtype != SfiDtype::F32 {
        return Err(SfiError::Unsupported(format!(
            "rank {} mattes carry identifiers and cannot be stored as {}",
            options.rank,
            dtype.as_str()
        )));
    }

    let options_json = serde_json::to_string(options).map_err(|e| SfiError::Json(e.to_string()))?;

    let mut writer = ContainerWriter::new(SfiKind::Matte);
    writer.meta("rank", options.rank.to_string());
    writer.meta("id_type", options.id_type.as_str().to_string());
    writer.meta("options", options_json);
    writer.tensor(
        MATTE_TENSOR,
        [matte.height, matte.width, matte.vector_size],
        &matte.data,
        dtype,
    );
    writer.finish()
}

/// Accumulates tensors back to back and emits the header on `finish`
struct ContainerWriter {
    metadata: Map<String, Value>,
    tensors: Map<String, Value>,
    body: Vec<u8>,
}

impl ContainerWriter {
    fn new(kind: SfiKind) -> Self {
        let mut metadata = Map::new();
        metadata.insert("format".to_string(), json!(FORMAT_NAME));
        metadata.insert("version".to_string(), json!(FORMAT_VERSION));
        metadata.insert("kind".to_string(), json!(kind.as_str()));
        Self {
            metadata,
            tensors: Map::new(),
            body: Vec::new(),
        }
    }

    fn meta(&mut self, key: &str, value: String) {
        self.metadata.insert(key.to_string(), Value::String(value));
    }

    fn tensor(&mut self, name: &str, shape: [usize; 3], values: &[f32], dtype: SfiDtype) {
        let start = self.body.len();
        self.body.reserve(values.len() * dtype.bytes_per_element());
        match dtype {
            SfiDtype::F32 => values.iter().for_each(|v| self.body.extend_from_slice(&v.to_le_bytes())),
            SfiDtype::F16 => values
                .iter()
                .for_each(|v| self.body.extend_from_slice(&f16::from_f32(*v).to_le_bytes())),
            SfiDtype::BF16 => values
                .iter()
                .for_each(|v| self.body.extend_from_slice(&bf16::from_f32(*v).to_le_bytes())),
        }

        let mut info = Map::new();
        info.insert("dtype".to_string(), json!(dtype.as_str()));
        info.insert("shape".to_string(), json!(shape));
        info.insert("data_offsets".to_string(), json!([start, self.body.len()]));
        self.tensors.insert(name.to_string(), Value::Object(info));
    }

    fn finish(self) -> Result<Vec<u8>, SfiError> {
        let mut header = self.tensors;
        header.insert("__metadata__".to_string(), Value::Object(self.metadata));
        let header_json = serde_json::to_string(&header).map_err(|e| SfiError::Json(e.to_string()))?;
        let header_bytes = header_json.as_bytes();

        let mut output = Vec::with_capacity(8 + header_bytes.len() + self.body.len());
        output.extend_from_slice(&(header_bytes.len() as u64).to_le_bytes());
        output.extend_from_slice(header_bytes);
        output.extend_from_slice(&self.body);
        Ok(output)
    }
}
