use bincode::de::Decoder;
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode, config};
use chrono::{Datelike, NaiveDate};
use sha2::{Digest, Sha256};

use crate::error::SerializationError;
use crate::types::{HealthHistory, HealthRecord};

// Field order on the wire: timestamp, heart_rate, steps, sleep_hours, calories.
impl Encode for HealthRecord {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        if !self.heart_rate.is_finite() || !self.sleep_hours.is_finite() {
            return Err(EncodeError::Other("non-finite float in health record"));
        }
        self.timestamp.num_days_from_ce().encode(encoder)?;
        self.heart_rate.encode(encoder)?;
        self.steps.encode(encoder)?;
        self.sleep_hours.encode(encoder)?;
        self.calories.encode(encoder)
    }
}

impl<Context> Decode<Context> for HealthRecord {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let days: i32 = Decode::decode(decoder)?;
        let timestamp = NaiveDate::from_num_days_from_ce_opt(days)
            .ok_or(DecodeError::Other("day number out of calendar range"))?;
        Ok(Self {
            timestamp,
            heart_rate: Decode::decode(decoder)?,
            steps: Decode::decode(decoder)?,
            sleep_hours: Decode::decode(decoder)?,
            calories: Decode::decode(decoder)?,
        })
    }
}

/// Checks that a record only holds values the schema can represent.
pub fn validate(index: usize, record: &HealthRecord) -> Result<(), SerializationError> {
    for (field, value) in [
        ("heart_rate", record.heart_rate),
        ("sleep_hours", record.sleep_hours),
    ] {
        if !value.is_finite() {
            return Err(SerializationError::NonFinite {
                index,
                field,
                value,
            });
        }
    }
    if record.sleep_hours < 0.0 {
        return Err(SerializationError::NegativeSleep {
            index,
            value: record.sleep_hours,
        });
    }
    Ok(())
}

/// Encodes every record back to back. An empty history yields no bytes
/// and appending a record only ever appends to the output.
pub fn encode_history(history: &HealthHistory) -> Result<Vec<u8>, SerializationError> {
    let mut buf = Vec::new();
    for (index, record) in history.iter().enumerate() {
        validate(index, record)?;
        bincode::encode_into_std_write(record, &mut buf, config::standard())
            .map_err(|source| SerializationError::Encode { index, source })?;
    }
    Ok(buf)
}

pub fn decode_history(bytes: &[u8]) -> Result<HealthHistory, SerializationError> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (record, read): (HealthRecord, usize) =
            bincode::decode_from_slice(&bytes[pos..], config::standard()).map_err(|source| {
                SerializationError::Decode {
                    offset: pos,
                    source,
                }
            })?;
        records.push(record);
        pos += read;
    }
    Ok(HealthHistory::new(records))
}

/// SHA-256 of an encoded history
pub fn fingerprint(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

pub fn digest(bytes: &[u8]) -> String {
    to_hex(&fingerprint(bytes))
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
