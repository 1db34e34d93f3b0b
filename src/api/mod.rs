use crate::error::RetrievalError;
use crate::models::{Company, IndustryGroup};

pub mod tsetmc_client;
pub use tsetmc_client::TsetmcClient;

/// Source of industry groups and their listed companies
#[async_trait::async_trait]
pub trait IndustryDataProvider {
    /// All industry groups known to the source, de-duplicated by code
    async fn list_industries(&self) -> Result<Vec<IndustryGroup>, RetrievalError>;

    /// Companies listed under one industry group, in source order
    async fn companies_for_industry(&self, code: &str) -> Result<Vec<Company>, RetrievalError>;
}
