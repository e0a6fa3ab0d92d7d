//! Configuration and application services for pdfqa.

pub mod bootstrap;
pub mod config;
pub mod ingest;
pub mod qa;
pub mod secret;

pub use config::Config;
pub use ingest::{IngestError, PdfIngestor};
pub use qa::{Answer, QaError, QaService};
