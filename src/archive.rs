use std::io::{Read, Write};

use flate2::Crc;

use crate::codec;
use crate::compressor::{Algorithm, Compressor, FlateCompressor, MAX_LEVEL};
use crate::error::{ArchiveError, CompressionError, ScaleDownError};
use crate::reporter::validate_user_id;
use crate::types::{ArchiveMetadata, CompressionReport, HealthHistory};

pub const ARCHIVE_VERSION: u8 = 1;

// version, algorithm, level, record_count, raw_len, raw_crc, fingerprint, payload_len
const HEADER_LEN: usize = 1 + 1 + 1 + 4 + 4 + 4 + 32 + 4;
const TRAILER_LEN: usize = 4;

/// A compressed history that can be stored and restored losslessly.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedHistory {
    version: u8,
    algorithm: Algorithm,
    level: u8,
    record_count: u32,
    raw_len: u32,
    raw_crc: u32,
    fingerprint: [u8; 32],
    payload_len: u32,
    payload: Vec<u8>,
}

/// Container length fields are u32.
fn checked_len(len: usize) -> Result<u32, CompressionError> {
    u32::try_from(len).map_err(|_| CompressionError::InputTooLarge {
        size: len,
        limit: u32::MAX as usize,
    })
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

impl CompressedHistory {
    #[tracing::instrument(
        name = "Archive health history",
        skip_all,
        fields(records = history.len())
    )]
    pub fn compress<C: Compressor + ?Sized>(
        history: &HealthHistory,
        compressor: &C,
    ) -> Result<Self, ScaleDownError> {
        let raw = codec::encode_history(history)?;
        let payload = compressor.compress(&raw)?;

        let raw_len = checked_len(raw.len())?;
        let record_count = checked_len(history.len())?;
        let payload_len = checked_len(payload.len())?;

        Ok(Self {
            version: ARCHIVE_VERSION,
            algorithm: compressor.algorithm(),
            level: compressor.level() as u8,
            record_count,
            raw_len,
            raw_crc: crc32(&raw),
            fingerprint: codec::fingerprint(&raw),
            payload_len,
            payload,
        })
    }

    #[tracing::instrument(
        name = "Restore health history",
        skip_all,
        fields(records = self.record_count)
    )]
    pub fn decompress(&self) -> Result<HealthHistory, ScaleDownError> {
        let compressor =
            FlateCompressor::new(self.algorithm, self.level.into(), self.raw_len as usize)?;
        let raw = compressor.decompress(&self.payload, self.raw_len as usize)?;

        let actual = crc32(&raw);
        if actual != self.raw_crc {
            return Err(ArchiveError::ChecksumMismatch {
                section: "data",
                expected: self.raw_crc,
                actual,
            }
            .into());
        }
        if codec::fingerprint(&raw) != self.fingerprint {
            return Err(ArchiveError::DigestMismatch.into());
        }

        let history = codec::decode_history(&raw)?;
        if history.len() != self.record_count as usize {
            return Err(ArchiveError::RecordCountMismatch {
                expected: self.record_count,
                actual: history.len(),
            }
            .into());
        }
        Ok(history)
    }

    /// Everything but the trailing checksum.
    fn body(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len() + TRAILER_LEN);
        buf.push(self.version);
        buf.push(self.algorithm.tag());
        buf.push(self.level);
        buf.extend_from_slice(&self.record_count.to_le_bytes());
        buf.extend_from_slice(&self.raw_len.to_le_bytes());
        buf.extend_from_slice(&self.raw_crc.to_le_bytes());
        buf.extend_from_slice(&self.fingerprint);
        buf.extend_from_slice(&self.payload_len.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    pub fn to_blob(&self) -> Vec<u8> {
        let mut buf = self.body();
        let overall_crc = crc32(&buf);
        buf.extend_from_slice(&overall_crc.to_le_bytes());
        buf
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self, ArchiveError> {
        if blob.len() < HEADER_LEN + TRAILER_LEN {
            return Err(ArchiveError::Truncated {
                offset: 0,
                needed: HEADER_LEN + TRAILER_LEN,
                available: blob.len(),
            });
        }

        let crc_pos = blob.len() - TRAILER_LEN;
        let mut trailer = [0u8; 4];
        trailer.copy_from_slice(&blob[crc_pos..]);
        let expected = u32::from_le_bytes(trailer);
        let actual = crc32(&blob[..crc_pos]);
        if actual != expected {
            return Err(ArchiveError::ChecksumMismatch {
                section: "overall",
                expected,
                actual,
            });
        }

        let mut reader = BlobReader::new(&blob[..crc_pos]);
        let version = reader.u8()?;
        if version != ARCHIVE_VERSION {
            return Err(ArchiveError::UnsupportedVersion(version));
        }
        let tag = reader.u8()?;
        let algorithm = Algorithm::from_tag(tag).ok_or(ArchiveError::UnknownAlgorithm(tag))?;
        let level = reader.u8()?;
        if u32::from(level) > MAX_LEVEL {
            return Err(ArchiveError::InvalidLevel(level));
        }
        let record_count = reader.u32()?;
        let raw_len = reader.u32()?;
        let raw_crc = reader.u32()?;
        let mut fingerprint = [0u8; 32];
        fingerprint.copy_from_slice(reader.take(32)?);
        let payload_len = reader.u32()?;
        let payload = reader.take(payload_len as usize)?.to_vec();

        if reader.remaining() > 0 {
            return Err(ArchiveError::TrailingData(reader.remaining()));
        }

        Ok(Self {
            version,
            algorithm,
            level,
            record_count,
            raw_len,
            raw_crc,
            fingerprint,
            payload_len,
            payload,
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<usize, ArchiveError> {
        let blob = self.to_blob();
        w.write_all(&blob)?;
        Ok(blob.len())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, ArchiveError> {
        let mut buf = Vec::new();
        r.read_to_end(&mut buf)?;
        Self::from_blob(&buf)
    }

    /// The report the reporter would give for the archived history.
    pub fn report(&self, user_id: &str) -> CompressionReport {
        match validate_user_id(user_id) {
            Ok(()) => CompressionReport::measured(
                user_id,
                self.raw_len as usize,
                self.payload.len(),
                self.record_count as usize,
                codec::to_hex(&self.fingerprint),
            ),
            Err(e) => CompressionReport::failure(user_id, e),
        }
    }

    pub fn metadata(&self) -> ArchiveMetadata {
        ArchiveMetadata {
            version: self.version,
            algorithm: self.algorithm,
            level: self.level.into(),
            record_count: self.record_count,
            raw_size: self.raw_len as usize,
            compressed_size: self.payload.len(),
            raw_checksum: self.raw_crc,
            overall_checksum: crc32(&self.body()),
            digest: codec::to_hex(&self.fingerprint),
        }
    }
}

struct BlobReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ArchiveError> {
        if n > self.remaining() {
            return Err(ArchiveError::Truncated {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ArchiveError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, ArchiveError> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Days, NaiveDate};
    use std::io::Cursor;

    use crate::types::HealthRecord;

    fn make_history() -> HealthHistory {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..30u32)
            .map(|i| HealthRecord {
                timestamp: start + Days::new(i.into()),
                heart_rate: 68.0 + (i % 4) as f64,
                steps: 8000 + (i % 7) * 250,
                sleep_hours: 7.0 + (i % 3) as f64 * 0.25,
                calories: 2400 - (i % 5) * 20,
            })
            .collect()
    }

    fn archive() -> CompressedHistory {
        CompressedHistory::compress(&make_history(), &FlateCompressor::default()).unwrap()
    }

    #[test]
    fn test_compress_decompress_roundtrip() {
        let history = make_history();
        let compressed =
            CompressedHistory::compress(&history, &FlateCompressor::default()).unwrap();
        assert_eq!(compressed.decompress().unwrap(), history);
    }

    #[test]
    fn test_roundtrip_every_algorithm() {
        let history = make_history();
        for algorithm in [Algorithm::Zlib, Algorithm::Gzip, Algorithm::Deflate] {
            let compressor = FlateCompressor::new(algorithm, 6, 1 << 20).unwrap();
            let compressed = CompressedHistory::compress(&history, &compressor).unwrap();
            let restored = CompressedHistory::from_blob(&compressed.to_blob()).unwrap();
            assert_eq!(restored.decompress().unwrap(), history);
        }
    }

    #[test]
    fn test_blob_roundtrip() {
        let compressed = archive();
        let restored = CompressedHistory::from_blob(&compressed.to_blob()).unwrap();
        assert_eq!(restored, compressed);
    }

    #[test]
    fn test_writer_reader() {
        let compressed = archive();
        let mut buf = Vec::new();
        let written = compressed.write_to(&mut buf).unwrap();
        assert_eq!(written, buf.len());

        let mut cursor = Cursor::new(buf);
        let restored = CompressedHistory::read_from(&mut cursor).unwrap();
        assert_eq!(restored.metadata(), compressed.metadata());
    }

    #[test]
    fn test_empty_history() {
        let compressed =
            CompressedHistory::compress(&HealthHistory::default(), &FlateCompressor::default())
                .unwrap();
        let restored = CompressedHistory::from_blob(&compressed.to_blob()).unwrap();
        assert!(restored.decompress().unwrap().is_empty());
        assert_eq!(restored.report("user123").compression_ratio, 0.0);
    }

    #[test]
    fn test_metadata() {
        let meta = archive().metadata();
        assert_eq!(meta.version, ARCHIVE_VERSION);
        assert_eq!(meta.algorithm, Algorithm::Zlib);
        assert_eq!(meta.level, 9);
        assert_eq!(meta.record_count, 30);
        assert!(meta.compressed_size < meta.raw_size);
        assert_eq!(meta.digest.len(), 64);
    }

    #[test]
    fn test_report_matches_metadata() {
        let compressed = archive();
        let meta = compressed.metadata();
        let report = compressed.report("user123");
        assert!(report.success);
        assert_eq!(report.original_size_bytes, meta.raw_size as u64);
        assert_eq!(report.compressed_size_bytes, meta.compressed_size as u64);
        assert_eq!(report.digest, Some(meta.digest));
        assert!(!compressed.report("").success);
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let mut compressed = archive();
        let mid = compressed.payload.len() / 2;
        compressed.payload[mid] ^= 0xFF;
        assert!(compressed.decompress().is_err());
    }

    #[test]
    fn test_data_checksum_validation() {
        let mut compressed = archive();
        compressed.raw_crc ^= 1;
        assert!(matches!(
            compressed.decompress(),
            Err(ScaleDownError::Archive(ArchiveError::ChecksumMismatch {
                section: "data",
                ..
            }))
        ));
    }

    #[test]
    fn test_corrupted_overall_checksum() {
        let mut blob = archive().to_blob();
        let len = blob.len();
        blob[len - 1] ^= 0xFF;
        assert!(matches!(
            CompressedHistory::from_blob(&blob),
            Err(ArchiveError::ChecksumMismatch {
                section: "overall",
                ..
            })
        ));
    }

    #[test]
    fn test_corrupted_body_detected() {
        let mut blob = archive().to_blob();
        let mid = blob.len() / 2;
        blob[mid] ^= 0xFF;
        assert!(CompressedHistory::from_blob(&blob).is_err());
    }

    #[test]
    fn test_short_blob() {
        assert!(matches!(
            CompressedHistory::from_blob(&[1, 2, 3]),
            Err(ArchiveError::Truncated { available: 3, .. })
        ));
    }

    #[test]
    fn test_record_count_mismatch() {
        let mut compressed = archive();
        compressed.record_count = 31;
        assert!(matches!(
            compressed.decompress(),
            Err(ScaleDownError::Archive(ArchiveError::RecordCountMismatch {
                expected: 31,
                actual: 30
            }))
        ));
    }

    #[test]
    fn test_length_fields_must_fit_u32() {
        assert_eq!(checked_len(u32::MAX as usize).unwrap(), u32::MAX);
        if let Some(len) = (u32::MAX as usize).checked_add(1) {
            assert!(matches!(
                checked_len(len),
                Err(CompressionError::InputTooLarge { limit, .. }) if limit == u32::MAX as usize
            ));
        }
    }

    #[test]
    fn test_oversized_raw_len_header_is_rejected() {
        let mut compressed = archive();
        compressed.raw_len = u32::MAX;
        let restored = CompressedHistory::from_blob(&compressed.to_blob()).unwrap();
        assert!(matches!(
            restored.decompress(),
            Err(ScaleDownError::Compression(CompressionError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut compressed = archive();
        compressed.version = 7;
        assert!(matches!(
            CompressedHistory::from_blob(&compressed.to_blob()),
            Err(ArchiveError::UnsupportedVersion(7))
        ));
    }
}
