pub mod api;
pub mod data_collector;
pub mod error;
pub mod exporter;
pub mod models;
pub mod utils;

pub use api::{IndustryDataProvider, TsetmcClient};
pub use data_collector::IndustryCollector;
pub use error::{PipelineError, RetrievalError, WriteError};
pub use exporter::{export_all, Exporter};
pub use models::{Company, Config, FailurePolicy, Industry, IndustryGroup};
