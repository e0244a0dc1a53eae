use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use serde::{Deserialize, Serialize};

use crate::error::CompressionError;

pub const MAX_LEVEL: u32 = 9;

// Upfront reservation when inflating; `expected_len` may come from an
// untrusted header.
const INITIAL_OUTPUT_CAPACITY: usize = 64 * 1024;

/// Default input ceiling: 64 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Zlib,
    Gzip,
    Deflate,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Zlib => "zlib",
            Algorithm::Gzip => "gzip",
            Algorithm::Deflate => "deflate",
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            Algorithm::Zlib => 0,
            Algorithm::Gzip => 1,
            Algorithm::Deflate => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Algorithm::Zlib),
            1 => Some(Algorithm::Gzip),
            2 => Some(Algorithm::Deflate),
            _ => None,
        }
    }
}

/// A lossless byte compressor.
pub trait Compressor: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    fn level(&self) -> u32;

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError>;

    /// Inflates `input`, failing unless exactly `expected_len` bytes come out.
    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>, CompressionError>;
}

/// DEFLATE-family compressor backed by flate2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlateCompressor {
    algorithm: Algorithm,
    level: u32,
    max_input_bytes: usize,
}

impl FlateCompressor {
    pub fn new(
        algorithm: Algorithm,
        level: u32,
        max_input_bytes: usize,
    ) -> Result<Self, CompressionError> {
        if level > MAX_LEVEL {
            return Err(CompressionError::InvalidLevel { level });
        }
        Ok(Self {
            algorithm,
            level,
            max_input_bytes: max_input_bytes.min(u32::MAX as usize),
        })
    }

    pub fn max_input_bytes(&self) -> usize {
        self.max_input_bytes
    }

    fn io_error(&self, source: std::io::Error) -> CompressionError {
        CompressionError::Io {
            algorithm: self.algorithm.as_str(),
            source,
        }
    }
}

impl Default for FlateCompressor {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Zlib,
            level: MAX_LEVEL,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl Compressor for FlateCompressor {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError> {
        if input.len() > self.max_input_bytes {
            return Err(CompressionError::InputTooLarge {
                size: input.len(),
                limit: self.max_input_bytes,
            });
        }

        let level = Compression::new(self.level);
        let out = Vec::with_capacity(input.len() / 2 + 64);
        let result = match self.algorithm {
            Algorithm::Zlib => {
                let mut encoder = ZlibEncoder::new(out, level);
                encoder.write_all(input).and_then(|_| encoder.finish())
            }
            Algorithm::Gzip => {
                let mut encoder = GzEncoder::new(out, level);
                encoder.write_all(input).and_then(|_| encoder.finish())
            }
            Algorithm::Deflate => {
                let mut encoder = DeflateEncoder::new(out, level);
                encoder.write_all(input).and_then(|_| encoder.finish())
            }
        };
        result.map_err(|e| self.io_error(e))
    }

    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>, CompressionError> {
        let mut out = Vec::with_capacity(expected_len.min(INITIAL_OUTPUT_CAPACITY));
        let limit = expected_len as u64 + 1;
        let result = match self.algorithm {
            Algorithm::Zlib => ZlibDecoder::new(input).take(limit).read_to_end(&mut out),
            Algorithm::Gzip => GzDecoder::new(input).take(limit).read_to_end(&mut out),
            Algorithm::Deflate => DeflateDecoder::new(input).take(limit).read_to_end(&mut out),
        };
        result.map_err(|e| self.io_error(e))?;

        if out.len() != expected_len {
            return Err(CompressionError::LengthMismatch {
                expected: expected_len,
                actual: out.len(),
            });
        }
        Ok(out)
    }
}
