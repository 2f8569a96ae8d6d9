use crate::domain::pattern::{PatternError, ZONED_TIMESTAMP};
use crate::domain::Envelope;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::{Compression, write::GzEncoder};
use regex::Captures;
use std::io::Write;
use thiserror::Error;

/// Form field carrying the payload, both inside the frame and in the body.
pub const FORM_FIELD: &str = "data";

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Compression failed: {0}")]
    CompressionFailed(#[source] std::io::Error),
    #[error("Timestamp pattern unavailable: {0}")]
    PatternUnavailable(#[from] PatternError),
}

/// How the framed payload is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compress {
    Gzip,
    None,
}

impl Compress {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled { Compress::Gzip } else { Compress::None }
    }

    /// Value of the `compress` request header.
    pub fn header_value(&self) -> &'static str {
        match self {
            Compress::Gzip => "gzip",
            Compress::None => "none",
        }
    }
}

/// Serializes an envelope and rewrites zoned timestamps into wire form.
pub fn encode_envelope(envelope: &Envelope) -> Result<String, CodecError> {
    let json = serialize(envelope)?;
    normalize_timestamps(&json)
}

pub fn serialize(envelope: &Envelope) -> Result<String, CodecError> {
    Ok(serde_json::to_string(envelope)?)
}

/// Rewrites `YYYY-MM-DDTHH:MM:SS.fff…(Z|±HH:MM)` into `YYYY-MM-DD HH:MM:SS.fff`.
///
/// The fraction is padded or truncated to milliseconds and the zone suffix
/// dropped without converting the wall clock. Runs until nothing matches.
pub fn normalize_timestamps(input: &str) -> Result<String, CodecError> {
    let pattern = ZONED_TIMESTAMP.get()?;
    let mut current = input.to_string();
    while pattern.is_match(&current) {
        current = pattern
            .replace_all(&current, |caps: &Captures| {
                format!("{} {}.{}", &caps[1], &caps[2], millis(&caps[3]))
            })
            .into_owned();
    }
    Ok(current)
}

fn millis(fraction: &str) -> String {
    fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(3)
        .collect()
}

/// Gzip at the default level.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(CodecError::CompressionFailed)?;
    encoder.finish().map_err(CodecError::CompressionFailed)
}

/// Inner frame: `data=<base64 payload>`.
pub fn frame_payload(payload: &str) -> String {
    format!("{FORM_FIELD}={}", STANDARD.encode(payload.as_bytes()))
}

/// Full request body: `data=<urlencoded base64 of the optionally gzip'd frame>`.
pub fn encode_body(payload: &str, compress_mode: Compress) -> Result<String, CodecError> {
    let frame = frame_payload(payload);
    let bytes = match compress_mode {
        Compress::Gzip => compress(frame.as_bytes())?,
        Compress::None => frame.into_bytes(),
    };

    Ok(url::form_urlencoded::Serializer::new(String::new())
        .append_pair(FORM_FIELD, &STANDARD.encode(bytes))
        .finish())
}
