//! Request parameter parsing.

use crate::scrapers::SearchParams;
use serde::Deserialize;
use thiserror::Error;

/// Parameter parsing failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid value `{value}` for parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Query string exactly as received. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuery {
    pub location: Option<String>,
    pub listing_type: Option<String>,
    pub past_days: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub format: Option<String>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub filter_by: Option<String>,
    pub filter_value: Option<String>,
}

/// Response envelope kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Html,
}

impl Format {
    fn from_param(value: &str) -> Self {
        if value == "json" {
            Format::Json
        } else {
            Format::Html
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Html => "html",
        }
    }
}

/// Sort direction. Only the literal `asc` sorts ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn from_param(value: &str) -> Self {
        if value == "asc" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Fully defaulted request parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub search: SearchParams,
    pub page: usize,
    pub per_page: usize,
    pub format: Format,
    pub query: String,
    pub sort_by: String,
    pub order: SortOrder,
    pub filter_by: String,
    pub filter_value: String,
}

impl QuerySpec {
    /// Applies defaults to `raw`. Scrape parameters fall back to `defaults`.
    ///
    /// # Errors
    ///
    /// Errors if `page`, `per_page` or `past_days` is not an unsigned
    /// integer, or if `per_page` is zero.
    pub fn parse(raw: &RawQuery, defaults: &SearchParams) -> Result<Self, Error> {
        let per_page = number("per_page", present(&raw.per_page), 10)?;
        if per_page == 0 {
            return Err(Error::InvalidParameter {
                name: "per_page",
                value: "0".to_string(),
                reason: "must be greater than zero",
            });
        }

        Ok(Self {
            search: SearchParams {
                location: text(&raw.location, &defaults.location),
                listing_type: text(&raw.listing_type, &defaults.listing_type),
                past_days: number("past_days", present(&raw.past_days), defaults.past_days)?,
            },
            page: number("page", present(&raw.page), 1)?,
            per_page,
            format: Format::from_param(present(&raw.format).unwrap_or("json")),
            query: text(&raw.query, ""),
            sort_by: text(&raw.sort_by, ""),
            order: SortOrder::from_param(present(&raw.order).unwrap_or("asc")),
            filter_by: text(&raw.filter_by, ""),
            filter_value: text(&raw.filter_value, ""),
        })
    }

    /// Query string pairs reproducing this spec on another page.
    pub fn to_pairs(&self, page: usize) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("location", self.search.location.clone()),
            ("listing_type", self.search.listing_type.clone()),
            ("past_days", self.search.past_days.to_string()),
            ("page", page.to_string()),
            ("per_page", self.per_page.to_string()),
            ("format", self.format.as_param().to_string()),
        ];
        let optional = [
            ("query", &self.query),
            ("sort_by", &self.sort_by),
            ("filter_by", &self.filter_by),
            ("filter_value", &self.filter_value),
        ];
        pairs.extend(
            optional
                .into_iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k, v.clone())),
        );
        if !self.sort_by.is_empty() {
            pairs.push(("order", self.order.as_param().to_string()));
        }
        pairs
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn text(value: &Option<String>, default: &str) -> String {
    present(value).unwrap_or(default).to_string()
}

fn number<N: std::str::FromStr>(name: &'static str, value: Option<&str>, default: N) -> Result<N, Error> {
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| Error::InvalidParameter {
            name,
            value: v.to_string(),
            reason: "expected a non-negative integer",
        }),
    }
}
