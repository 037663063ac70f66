use serde::{Deserialize, Serialize};

/// Search parameters for property scraping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// City, zip code or address to search in
    pub location: String,
    /// Listing status: `sold`, `for_sale`, `for_rent` or `pending`
    pub listing_type: String,
    /// Lookback window in days
    pub past_days: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            location: "San Diego, CA".to_string(),
            listing_type: "sold".to_string(),
            past_days: 30,
        }
    }
}
