use crate::codec;
use crate::compressor::{Compressor, FlateCompressor};
use crate::error::ScaleDownError;
use crate::settings::ScaleDownSettings;
use crate::types::{CompressionReport, HealthHistory};

/// Measures how well a user's history compresses.
///
/// Holds no per-call state, so one reporter can be shared across threads
/// and called concurrently.
#[derive(Debug, Clone, Default)]
pub struct CompressionReporter<C = FlateCompressor> {
    compressor: C,
}

impl CompressionReporter<FlateCompressor> {
    /// zlib at level 9 with the default input ceiling.
    pub fn new() -> Self {
        Self {
            compressor: FlateCompressor::default(),
        }
    }

    pub fn from_settings(settings: &ScaleDownSettings) -> Result<Self, ScaleDownError> {
        let compressor =
            FlateCompressor::new(settings.algorithm, settings.level, settings.max_input_bytes)?;
        tracing::info!(
            algorithm = compressor.algorithm().as_str(),
            level = compressor.level(),
            "ScaleDown reporter initialized"
        );
        Ok(Self { compressor })
    }
}

impl<C: Compressor> CompressionReporter<C> {
    pub fn with_compressor(compressor: C) -> Self {
        Self { compressor }
    }

    pub fn compressor(&self) -> &C {
        &self.compressor
    }

    /// Serializes and compresses `history`, reporting sizes and ratio.
    /// Every failure is folded into the returned report.
    #[tracing::instrument(
        name = "Compress health history",
        skip(self, history),
        fields(user_id = %user_id, records = history.len())
    )]
    pub fn compress_history(&self, user_id: &str, history: &HealthHistory) -> CompressionReport {
        match self.measure(user_id, history) {
            Ok(report) => {
                tracing::debug!(
                    original = report.original_size_bytes,
                    compressed = report.compressed_size_bytes,
                    ratio = report.compression_ratio,
                    "History compressed"
                );
                report
            }
            Err(e) => {
                tracing::error!(error = %e, "Compression error");
                CompressionReport::failure(user_id, e)
            }
        }
    }

    fn measure(
        &self,
        user_id: &str,
        history: &HealthHistory,
    ) -> Result<CompressionReport, ScaleDownError> {
        validate_user_id(user_id)?;
        let serialized = codec::encode_history(history)?;
        let compressed = self.compressor.compress(&serialized)?;

        Ok(CompressionReport::measured(
            user_id,
            serialized.len(),
            compressed.len(),
            history.len(),
            codec::digest(&serialized),
        ))
    }
}

/// Rejects identifiers that are empty or only whitespace.
pub fn validate_user_id(user_id: &str) -> Result<(), ScaleDownError> {
    if user_id.trim().is_empty() {
        return Err(ScaleDownError::InvalidInput(
            "user id must not be empty".to_string(),
        ));
    }
    Ok(())
}
