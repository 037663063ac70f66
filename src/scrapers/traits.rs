use crate::models::Property;
use crate::scrapers::types::SearchParams;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all property scrapers
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Scrape properties matching the given parameters
    async fn scrape(&self, params: &SearchParams) -> Result<Vec<Property>>;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}
