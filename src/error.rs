use std::io;

use thiserror::Error;

/// Anything that can stop a history from being measured or archived.
#[derive(Debug, Error)]
pub enum ScaleDownError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("record {index} has non-finite {field} ({value})")]
    NonFinite {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("record {index} has negative sleep_hours ({value})")]
    NegativeSleep { index: usize, value: f64 },

    #[error("failed to encode record {index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: bincode::error::EncodeError,
    },

    #[error("failed to decode record at byte {offset}: {source}")]
    Decode {
        offset: usize,
        #[source]
        source: bincode::error::DecodeError,
    },
}

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge { size: usize, limit: usize },

    #[error("invalid compression level {level}: must be in range [0, 9]")]
    InvalidLevel { level: u32 },

    #[error("decompressed {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("{algorithm} stream failed: {source}")]
    Io {
        algorithm: &'static str,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive truncated: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{section} checksum mismatch: expected 0x{expected:08X}, got 0x{actual:08X}")]
    ChecksumMismatch {
        section: &'static str,
        expected: u32,
        actual: u32,
    },

    #[error("data digest mismatch")]
    DigestMismatch,

    #[error("invalid compression level {0} in archive header")]
    InvalidLevel(u8),

    #[error("unsupported archive version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown compression algorithm tag {0}")]
    UnknownAlgorithm(u8),

    #[error("archive declares {expected} records but holds {actual}")]
    RecordCountMismatch { expected: u32, actual: usize },

    #[error("{0} bytes of trailing data after archive")]
    TrailingData(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
