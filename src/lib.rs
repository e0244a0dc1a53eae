pub mod archive;
pub mod codec;
pub mod compressor;
pub mod error;
pub mod reporter;
pub mod settings;
pub mod synthetic;
pub mod telemetry;
mod types;

pub use archive::CompressedHistory;
pub use compressor::{Algorithm, Compressor, FlateCompressor};
pub use error::{ArchiveError, CompressionError, ScaleDownError, SerializationError};
pub use reporter::CompressionReporter;
pub use settings::ScaleDownSettings;
pub use types::{ArchiveMetadata, CompressionReport, HealthHistory, HealthRecord};
