//! Filtering, searching, sorting and paging of a result set.
//!
//! Steps always run in this order, so page counts reflect the records left
//! after filtering and searching.

use crate::models::{columns, FieldValue, Property};
use crate::query::{QuerySpec, SortOrder};
use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("cannot sort by unknown field `{0}`")]
    UnknownSortField(String),
}

/// One page of a shaped result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub page: usize,
    pub total_pages: usize,
    pub total_properties: usize,
    pub properties: Vec<Property>,
}

fn has_field(properties: &[Property], name: &str) -> bool {
    properties.iter().any(|p| p.contains(name))
}

/// Keeps records whose `field` is the string `value`.
///
/// Does nothing if no record has `field`.
pub fn filter(properties: Vec<Property>, field: &str, value: &str) -> Vec<Property> {
    if !has_field(&properties, field) {
        debug!("Skipping filter on unknown field `{}`", field);
        return properties;
    }
    properties
        .into_iter()
        .filter(|p| p.get(field).and_then(FieldValue::as_text) == Some(value))
        .collect()
}

/// Keeps records where any value contains `query`, ignoring case.
pub fn search(properties: Vec<Property>, query: &str) -> Vec<Property> {
    let needle = query.to_lowercase();
    properties
        .into_iter()
        .filter(|p| p.values().any(|v| v.to_string().to_lowercase().contains(&needle)))
        .collect()
}

/// Stable sort by `field`. Missing and null values go last.
pub fn sort(properties: &mut [Property], field: &str, order: SortOrder) {
    properties.sort_by(|a, b| {
        let a = a.get(field).filter(|v| !v.is_null());
        let b = b.get(field).filter(|v| !v.is_null());
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => match order {
                SortOrder::Asc => a.sort_cmp(b),
                SortOrder::Desc => b.sort_cmp(a),
            },
        }
    });
}

/// Number of pages needed for `total` records.
pub fn total_pages(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page)
}

/// Slices out page `page` (1-based). Out-of-range pages are empty.
pub fn paginate(properties: Vec<Property>, page: usize, per_page: usize) -> Page {
    let total_properties = properties.len();
    let properties = match page.checked_sub(1) {
        Some(index) => properties
            .into_iter()
            .skip(index.saturating_mul(per_page))
            .take(per_page)
            .collect(),
        None => Vec::new(),
    };
    Page {
        page,
        total_pages: total_pages(total_properties, per_page),
        total_properties,
        properties,
    }
}

/// Runs filter, search, sort and paging as requested by `spec`.
///
/// # Errors
///
/// Errors if `spec.sort_by` names a field absent from the scraped schema.
/// The schema is taken before filtering, so a sort on a known field still
/// succeeds when nothing is left to sort. An empty scrape has no schema to
/// check against and sorts trivially.
pub fn shape(mut properties: Vec<Property>, spec: &QuerySpec) -> Result<Page, Error> {
    if !spec.sort_by.is_empty()
        && !properties.is_empty()
        && !columns(&properties).contains(&spec.sort_by.as_str())
    {
        return Err(Error::UnknownSortField(spec.sort_by.clone()));
    }

    if !spec.filter_by.is_empty() && !spec.filter_value.is_empty() {
        properties = filter(properties, &spec.filter_by, &spec.filter_value);
    }
    if !spec.query.is_empty() {
        properties = search(properties, &spec.query);
    }
    if !spec.sort_by.is_empty() {
        sort(&mut properties, &spec.sort_by, spec.order);
    }
    Ok(paginate(properties, spec.page, spec.per_page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RawQuery;
    use crate::scrapers::SearchParams;

    fn listings(n: usize) -> Vec<Property> {
        (0..n)
            .map(|i| {
                Property::new()
                    .with("street", format!("{} Main St", i))
                    .with("list_price", (1000 - i as i64 * 10) % 370)
                    .with("status", if i % 3 == 0 { "Sold" } else { "Pending" })
            })
            .collect()
    }

    fn spec(f: impl FnOnce(&mut RawQuery)) -> QuerySpec {
        let mut raw = RawQuery::default();
        f(&mut raw);
        QuerySpec::parse(&raw, &SearchParams::default()).unwrap()
    }

    #[test]
    fn pages_reassemble_the_result_set() {
        let all = listings(23);
        for per_page in [1, 4, 10, 23, 50] {
            let pages = total_pages(all.len(), per_page);
            let rebuilt: Vec<Property> = (1..=pages)
                .flat_map(|page| paginate(all.clone(), page, per_page).properties)
                .collect();
            assert_eq!(rebuilt, all, "per_page={per_page}");
        }
    }

    #[test]
    fn third_page_of_twenty_five() {
        let page = paginate(listings(25), 3, 10);
        assert_eq!(page.properties.len(), 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_properties, 25);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = paginate(listings(25), 9, 10);
        assert!(page.properties.is_empty());
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_properties, 25);
    }

    #[test]
    fn page_zero_is_empty() {
        let page = paginate(listings(5), 0, 10);
        assert!(page.properties.is_empty());
        assert_eq!(page.total_properties, 5);
    }

    #[test]
    fn empty_set_has_no_pages() {
        let page = paginate(Vec::new(), 1, 10);
        assert_eq!(page.total_pages, 0);
        assert!(page.properties.is_empty());
    }

    #[test]
    fn filter_keeps_exact_matches() {
        let kept = filter(listings(10), "status", "Sold");
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|p| p.get("status") == Some(&FieldValue::Text("Sold".into()))));
    }

    #[test]
    fn filter_is_case_and_type_sensitive() {
        assert!(filter(listings(10), "status", "sold").is_empty());
        let rows = vec![Property::new().with("beds", 3), Property::new().with("beds", "3")];
        assert_eq!(filter(rows, "beds", "3"), vec![Property::new().with("beds", "3")]);
    }

    #[test]
    fn filter_on_unknown_field_is_a_no_op() {
        let all = listings(10);
        assert_eq!(filter(all.clone(), "nope", "Sold"), all);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let rows = vec![
            Property::new().with("street", "12 Ocean Blvd").with("beds", 2),
            Property::new().with("street", "9 Hill Rd").with("beds", 42),
            Property::new().with("street", "3 Oak Ln").with("beds", FieldValue::Null),
        ];
        assert_eq!(search(rows.clone(), "OCEAN").len(), 1);
        assert_eq!(search(rows.clone(), "42").len(), 1);
        assert_eq!(search(rows.clone(), "").len(), 3);
    }

    #[test]
    fn sort_ascending_and_descending() {
        let mut rows = listings(12);
        sort(&mut rows, "list_price", SortOrder::Asc);
        let prices: Vec<_> = rows.iter().map(|p| p.get("list_price").cloned().unwrap()).collect();
        assert!(prices.windows(2).all(|w| w[0].sort_cmp(&w[1]) != Ordering::Greater));

        sort(&mut rows, "list_price", SortOrder::Desc);
        let prices: Vec<_> = rows.iter().map(|p| p.get("list_price").cloned().unwrap()).collect();
        assert!(prices.windows(2).all(|w| w[0].sort_cmp(&w[1]) != Ordering::Less));
    }

    #[test]
    fn sort_puts_nulls_last_either_way() {
        let mut rows = vec![
            Property::new().with("beds", FieldValue::Null),
            Property::new().with("beds", 3),
            Property::new().with("beds", 1),
        ];
        sort(&mut rows, "beds", SortOrder::Desc);
        assert_eq!(rows[0].get("beds"), Some(&FieldValue::Int(3)));
        assert_eq!(rows[2].get("beds"), Some(&FieldValue::Null));
    }

    #[test]
    fn sort_on_known_field_survives_an_empty_search() {
        let rows = vec![Property::new().with("street", "1 Main").with("list_price", 10)];
        let page = shape(
            rows,
            &spec(|r| {
                r.query = Some("zzz".into());
                r.sort_by = Some("list_price".into());
            }),
        )
        .unwrap();
        assert!(page.properties.is_empty());
        assert_eq!(page.total_properties, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn sort_on_known_field_survives_an_empty_filter() {
        let page = shape(
            listings(10),
            &spec(|r| {
                r.filter_by = Some("status".into());
                r.filter_value = Some("Withdrawn".into());
                r.sort_by = Some("list_price".into());
            }),
        )
        .unwrap();
        assert_eq!(page.total_properties, 0);
    }

    #[test]
    fn sort_on_empty_scrape_is_empty_page() {
        let page = shape(Vec::new(), &spec(|r| r.sort_by = Some("list_price".into()))).unwrap();
        assert!(page.properties.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn shape_counts_after_filtering() {
        let page = shape(
            listings(10),
            &spec(|r| {
                r.filter_by = Some("status".into());
                r.filter_value = Some("Sold".into());
            }),
        )
        .unwrap();
        assert_eq!(page.total_properties, 4);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.properties.len(), 4);
    }

    #[test]
    fn shape_ignores_filter_without_value() {
        let page = shape(listings(10), &spec(|r| r.filter_by = Some("status".into()))).unwrap();
        assert_eq!(page.total_properties, 10);
    }

    #[test]
    fn shape_surfaces_unknown_sort_field() {
        let err = shape(listings(10), &spec(|r| r.sort_by = Some("nope".into()))).unwrap_err();
        assert_eq!(err, Error::UnknownSortField("nope".into()));
    }
}
