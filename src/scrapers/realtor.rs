use crate::models::{FieldValue, Property};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::SearchParams;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const SEARCH_URL: &str =
    "https://www.realtor.com/api/v1/rdc_search_srp?client_id=rdc-search-new-communities&schema=vesta";
const SUGGEST_URL: &str = "https://parser-external.geo.moveaws.com/suggest";
const AREA_TYPES: &str =
    "city,state,county,postal_code,address,street,neighborhood,school,school_district,university,park";

/// Results requested per search call.
const PAGE_SIZE: usize = 200;
/// The search endpoint refuses offsets past this.
const MAX_RESULTS: usize = 10_000;

const SEARCH_QUERY: &str = r#"query HomeSearch($query: HomeSearchCriteria!, $limit: Int, $offset: Int) {
  home_search(query: $query, limit: $limit, offset: $offset) {
    count
    total
    results {
      property_id
      href
      status
      list_price
      list_date
      last_sold_price
      last_sold_date
      description {
        style
        beds
        baths_full
        baths_half
        sqft
        lot_sqft
        year_built
        stories
        garage
        sold_price
      }
      location {
        address {
          line
          unit
          city
          state_code
          postal_code
          coordinate { lat lon }
        }
      }
      hoa { fee }
      source { id listing_id }
      primary_photo { href }
      photos { href }
    }
  }
}"#;

/// Realtor.com scraper implementation
pub struct RealtorScraper {
    client: Client,
}

impl RealtorScraper {
    /// Create a new Realtor scraper with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Resolve free-form location text into search criteria
    async fn resolve_location(&self, location: &str) -> Result<Map<String, Value>> {
        debug!("Resolving location: {}", location);

        let response = self
            .client
            .get(SUGGEST_URL)
            .query(&[
                ("input", location),
                ("client_id", "for-sale"),
                ("limit", "1"),
                ("area_types", AREA_TYPES),
            ])
            .send()
            .await
            .context("Failed to fetch location suggestions")?;

        if !response.status().is_success() {
            warn!("Location service returned status: {}", response.status());
            bail!("Failed to resolve location: {}", response.status());
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to read location suggestions")?;

        location_criteria(location, &body)
    }

    async fn search_page(&self, query: &Value, offset: usize) -> Result<(usize, Vec<Value>)> {
        let payload = json!({
            "query": SEARCH_QUERY,
            "variables": {
                "query": query,
                "limit": PAGE_SIZE,
                "offset": offset,
            },
        });

        let response = self
            .client
            .post(SEARCH_URL)
            .json(&payload)
            .send()
            .await
            .context("Failed to fetch search results")?;

        if !response.status().is_success() {
            warn!("Realtor returned status: {}", response.status());
            bail!("Failed to fetch search results: {}", response.status());
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to read search results")?;

        parse_search_page(&body)
    }
}

#[async_trait]
impl ScraperTrait for RealtorScraper {
    async fn scrape(&self, params: &SearchParams) -> Result<Vec<Property>> {
        info!(
            "Starting Realtor scrape: location={}, listing_type={}, past_days={}",
            params.location, params.listing_type, params.past_days
        );

        let mut query = self.resolve_location(&params.location).await?;
        apply_listing_filter(&mut query, &params.listing_type, params.past_days)?;
        let query = Value::Object(query);

        let today = Utc::now().date_naive();
        let mut properties = Vec::new();
        let mut offset = 0;
        loop {
            let (total, results) = self.search_page(&query, offset).await?;
            debug!("Fetched {} results at offset {} (total {})", results.len(), offset, total);

            if results.is_empty() {
                break;
            }
            properties.extend(results.iter().map(|r| flatten_result(r, today)));

            offset += PAGE_SIZE;
            if offset >= total || offset >= MAX_RESULTS {
                break;
            }
        }

        info!("Scraped {} properties from Realtor", properties.len());
        Ok(properties)
    }

    fn source_name(&self) -> &'static str {
        "Realtor"
    }
}

/// Build search criteria from the first location suggestion.
fn location_criteria(input: &str, body: &Value) -> Result<Map<String, Value>> {
    let Some(hit) = body
        .get("autocomplete")
        .and_then(Value::as_array)
        .and_then(|hits| hits.first())
    else {
        bail!("No location found for `{}`", input);
    };

    let field = |name: &str| hit.get(name).cloned().unwrap_or(Value::Null);
    let mut criteria = Map::new();
    match hit.get("area_type").and_then(Value::as_str) {
        Some("city") => {
            criteria.insert("city".into(), field("city"));
            criteria.insert("state_code".into(), field("state_code"));
        }
        Some("postal_code") => {
            criteria.insert("postal_code".into(), field("postal_code"));
        }
        Some("county") => {
            criteria.insert("county".into(), json!([field("county")]));
            criteria.insert("state_code".into(), field("state_code"));
        }
        Some("state") => {
            criteria.insert("state_code".into(), field("state_code"));
        }
        _ => {
            criteria.insert("search_location".into(), json!({ "location": input }));
        }
    }
    Ok(criteria)
}

/// Add the status and lookback-window criteria for a listing type.
fn apply_listing_filter(query: &mut Map<String, Value>, listing_type: &str, past_days: u32) -> Result<()> {
    let date_field = match listing_type {
        "sold" => "sold_date",
        "for_sale" | "for_rent" | "pending" => "list_date",
        other => bail!("Unsupported listing type: {}", other),
    };
    query.insert("status".into(), json!([listing_type]));
    query.insert(
        date_field.into(),
        json!({ "min": format!("$nowUTC-{}D", past_days) }),
    );
    Ok(())
}

fn parse_search_page(body: &Value) -> Result<(usize, Vec<Value>)> {
    let Some(search) = body.pointer("/data/home_search").filter(|v| !v.is_null()) else {
        if let Some(errors) = body.get("errors") {
            bail!("Search request failed: {}", errors);
        }
        bail!("Search response is missing `data.home_search`");
    };

    let total = search.get("total").and_then(Value::as_u64).unwrap_or(0) as usize;
    let results = search
        .get("results")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    Ok((total, results))
}

fn text(value: Option<&Value>) -> FieldValue {
    match value {
        Some(Value::String(s)) => FieldValue::Text(s.clone()),
        Some(Value::Number(n)) => FieldValue::Text(n.to_string()),
        _ => FieldValue::Null,
    }
}

fn number(value: Option<&Value>) -> FieldValue {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => FieldValue::Int(i),
            None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
        },
        _ => FieldValue::Null,
    }
}

fn date(value: Option<&Value>) -> Option<NaiveDate> {
    let raw = value?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok())
}

/// Flatten one search result into a record with a fixed column order.
fn flatten_result(result: &Value, today: NaiveDate) -> Property {
    let at = |path: &str| result.pointer(path);

    let status = text(at("/status"));
    let list_date = date(at("/list_date"));
    let sold_date = date(at("/last_sold_date"));
    let sold_price = match number(at("/description/sold_price")) {
        FieldValue::Null => number(at("/last_sold_price")),
        price => price,
    };
    let list_price = number(at("/list_price"));
    let sqft = number(at("/description/sqft"));

    let days_on_mls = list_date.map(|listed| {
        let end = match (status.as_text(), sold_date) {
            (Some("sold"), Some(sold)) => sold,
            _ => today,
        };
        (end - listed).num_days()
    });

    let price_per_sqft = {
        let price = if sold_price.is_null() { &list_price } else { &sold_price };
        match (price, &sqft) {
            (FieldValue::Int(p), FieldValue::Int(s)) if *s > 0 => {
                FieldValue::Int((*p as f64 / *s as f64).round() as i64)
            }
            _ => FieldValue::Null,
        }
    };

    let alt_photos: Vec<&str> = at("/photos")
        .and_then(Value::as_array)
        .map(|photos| {
            photos
                .iter()
                .filter_map(|p| p.get("href").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let property_url = match at("/href").and_then(Value::as_str) {
        Some(href) if href.starts_with("http") => FieldValue::Text(href.to_string()),
        Some(href) => FieldValue::Text(format!("https://www.realtor.com/realestateandhomes-detail/{}", href)),
        None => FieldValue::Null,
    };

    Property::new()
        .with("property_url", property_url)
        .with("mls", text(at("/source/id")))
        .with("mls_id", text(at("/source/listing_id")))
        .with("status", status.clone())
        .with("style", text(at("/description/style")))
        .with("street", text(at("/location/address/line")))
        .with("unit", text(at("/location/address/unit")))
        .with("city", text(at("/location/address/city")))
        .with("state", text(at("/location/address/state_code")))
        .with("zip_code", text(at("/location/address/postal_code")))
        .with("beds", number(at("/description/beds")))
        .with("full_baths", number(at("/description/baths_full")))
        .with("half_baths", number(at("/description/baths_half")))
        .with("sqft", sqft)
        .with("year_built", number(at("/description/year_built")))
        .with("days_on_mls", days_on_mls)
        .with("list_price", list_price)
        .with("list_date", list_date)
        .with("sold_price", sold_price)
        .with("last_sold_date", sold_date)
        .with("lot_sqft", number(at("/description/lot_sqft")))
        .with("price_per_sqft", price_per_sqft)
        .with("latitude", number(at("/location/address/coordinate/lat")))
        .with("longitude", number(at("/location/address/coordinate/lon")))
        .with("stories", number(at("/description/stories")))
        .with("hoa_fee", number(at("/hoa/fee")))
        .with("parking_garage", number(at("/description/garage")))
        .with("primary_photo", text(at("/primary_photo/href")))
        .with(
            "alt_photos",
            if alt_photos.is_empty() {
                FieldValue::Null
            } else {
                FieldValue::Text(alt_photos.join(", "))
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> Value {
        json!({
            "property_id": "1234",
            "href": "https://www.realtor.com/realestateandhomes-detail/123-Main-St",
            "status": "sold",
            "list_price": 800000,
            "list_date": "2024-01-01T08:00:00Z",
            "last_sold_price": 790000,
            "last_sold_date": "2024-01-31",
            "description": {
                "style": "SINGLE_FAMILY",
                "beds": 3,
                "baths_full": 2,
                "baths_half": null,
                "sqft": 1000,
                "lot_sqft": 5000,
                "year_built": 1978,
                "stories": 1,
                "garage": 2,
                "sold_price": 790000
            },
            "location": {
                "address": {
                    "line": "123 Main St",
                    "unit": null,
                    "city": "San Diego",
                    "state_code": "CA",
                    "postal_code": "92101",
                    "coordinate": { "lat": 32.7, "lon": -117.1 }
                }
            },
            "hoa": { "fee": 350 },
            "source": { "id": "SDCA", "listing_id": "240001" },
            "primary_photo": { "href": "https://ap.rdcpix.com/a.jpg" },
            "photos": [
                { "href": "https://ap.rdcpix.com/a.jpg" },
                { "href": "https://ap.rdcpix.com/b.jpg" }
            ]
        })
    }

    #[test]
    fn flattens_search_result() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let p = flatten_result(&sample_result(), today);

        assert_eq!(p.get("street"), Some(&FieldValue::Text("123 Main St".into())));
        assert_eq!(p.get("unit"), Some(&FieldValue::Null));
        assert_eq!(p.get("sold_price"), Some(&FieldValue::Int(790000)));
        assert_eq!(p.get("price_per_sqft"), Some(&FieldValue::Int(790)));
        assert_eq!(p.get("days_on_mls"), Some(&FieldValue::Int(30)));
        assert_eq!(
            p.get("list_date"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        );
        assert_eq!(
            p.get("alt_photos"),
            Some(&FieldValue::Text("https://ap.rdcpix.com/a.jpg, https://ap.rdcpix.com/b.jpg".into()))
        );
        assert_eq!(p.names().next(), Some("property_url"));
        assert_eq!(p.names().last(), Some("alt_photos"));
    }

    #[test]
    fn city_suggestion_becomes_city_criteria() {
        let body = json!({
            "autocomplete": [{ "area_type": "city", "city": "San Diego", "state_code": "CA" }]
        });
        let criteria = location_criteria("San Diego, CA", &body).unwrap();
        assert_eq!(criteria.get("city"), Some(&json!("San Diego")));
        assert_eq!(criteria.get("state_code"), Some(&json!("CA")));
    }

    #[test]
    fn empty_suggestions_are_an_error() {
        let body = json!({ "autocomplete": [] });
        assert!(location_criteria("Nowhere", &body).is_err());
    }

    #[test]
    fn listing_filter_uses_sold_date_for_sold() {
        let mut query = Map::new();
        apply_listing_filter(&mut query, "sold", 30).unwrap();
        assert_eq!(query.get("status"), Some(&json!(["sold"])));
        assert_eq!(query.get("sold_date"), Some(&json!({ "min": "$nowUTC-30D" })));
    }

    #[test]
    fn unknown_listing_type_is_rejected() {
        let mut query = Map::new();
        assert!(apply_listing_filter(&mut query, "auction", 30).is_err());
    }

    #[test]
    fn graphql_errors_are_surfaced() {
        let body = json!({ "data": null, "errors": [{ "message": "rate limited" }] });
        let err = parse_search_page(&body).unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn default_config_builds_realtor_scraper() {
        let config = crate::Config::default();
        let state = crate::AppState::from_config(&config).unwrap();
        assert_eq!(state.scraper.source_name(), "Realtor");
    }
}
