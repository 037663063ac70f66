use crate::models::Property;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::SearchParams;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

/// Serves records from a JSON file instead of a live source.
///
/// The file must hold an array of objects. Search parameters are ignored.
pub struct FixtureScraper {
    path: PathBuf,
}

impl FixtureScraper {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScraperTrait for FixtureScraper {
    async fn scrape(&self, params: &SearchParams) -> Result<Vec<Property>> {
        debug!("Ignoring search parameters for fixture scrape: {:?}", params);

        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read fixture {}", self.path.display()))?;
        let properties: Vec<Property> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse fixture {}", self.path.display()))?;

        info!("Loaded {} properties from {}", properties.len(), self.path.display());
        Ok(properties)
    }

    fn source_name(&self) -> &'static str {
        "Fixture"
    }
}
