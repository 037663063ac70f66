//! Spreadsheet export of a full result set.

use crate::models::{columns, FieldValue, Property};
use anyhow::{Context, Result};
use chrono::Datelike;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::debug;

/// MIME type of an `.xlsx` workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Photo URL columns are cut to this many characters.
pub const MAX_URL_LEN: usize = 2000;

/// Columns holding a single photo URL.
const PHOTO_URL_FIELDS: &[&str] = &["primary_photo"];

/// Columns of unbounded photo lists, dropped from the export.
const DROPPED_FIELDS: &[&str] = &["alt_photos"];

/// Earliest year an Excel serial date can hold.
const EXCEL_EPOCH_YEAR: i32 = 1900;

fn truncate_chars(text: &mut String, max: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
    }
}

/// Makes records fit spreadsheet cell limits.
///
/// Photo URLs are truncated to [`MAX_URL_LEN`] characters and the
/// alternate-photo column is removed.
pub fn prepare(mut properties: Vec<Property>) -> Vec<Property> {
    for property in &mut properties {
        for field in PHOTO_URL_FIELDS {
            if let Some(FieldValue::Text(url)) = property.get_mut(field) {
                truncate_chars(url, MAX_URL_LEN);
            }
        }
        for field in DROPPED_FIELDS {
            property.remove(field);
        }
    }
    properties
}

/// Writes records into an in-memory `.xlsx` workbook with a header row.
pub fn workbook(properties: &[Property]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let datetime = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("properties")?;

    let names = columns(properties);
    for (col, name) in names.iter().enumerate() {
        let col = u16::try_from(col).context("Too many columns for a worksheet")?;
        worksheet.write_string_with_format(0, col, *name, &header)?;
    }

    for (idx, property) in properties.iter().enumerate() {
        let row = u32::try_from(idx + 1).context("Too many rows for a worksheet")?;
        for (col, name) in names.iter().enumerate() {
            let col = col as u16;
            match property.get(name) {
                None | Some(FieldValue::Null) => {}
                Some(FieldValue::Float(f)) if f.is_nan() => {}
                Some(FieldValue::Bool(b)) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Some(FieldValue::Int(i)) => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                Some(FieldValue::Float(f)) => {
                    worksheet.write_number(row, col, *f)?;
                }
                Some(FieldValue::Date(d)) if d.year() >= EXCEL_EPOCH_YEAR => {
                    worksheet.write_datetime_with_format(row, col, d, &date)?;
                }
                Some(FieldValue::DateTime(dt)) if dt.year() >= EXCEL_EPOCH_YEAR => {
                    worksheet.write_datetime_with_format(row, col, &dt.naive_utc(), &datetime)?;
                }
                Some(value) => {
                    worksheet.write_string(row, col, value.to_string())?;
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer().context("Failed to build workbook")?;
    debug!("Built workbook with {} rows, {} columns", properties.len(), names.len());
    Ok(bytes)
}

/// Prepares records, builds the workbook and saves a copy to `path`.
pub async fn export_to(properties: Vec<Property>, path: &Path) -> Result<Vec<u8>> {
    let bytes = workbook(&prepare(properties))?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_photo_url_and_drops_alt_photos() {
        let long_url = format!("https://ap.rdcpix.com/{}", "x".repeat(3000 - 22));
        assert_eq!(long_url.len(), 3000);
        let record = Property::new()
            .with("street", "1 Main St")
            .with("primary_photo", long_url.clone())
            .with("alt_photos", "https://a.jpg, https://b.jpg");

        let out = prepare(vec![record]);

        let url = out[0].get("primary_photo").and_then(FieldValue::as_text).unwrap();
        assert_eq!(url.chars().count(), 2000);
        assert_eq!(url, &long_url[..2000]);
        assert!(!out[0].contains("alt_photos"));
        assert_eq!(out[0].names().collect::<Vec<_>>(), vec!["street", "primary_photo"]);
    }

    #[test]
    fn short_urls_are_untouched() {
        let record = Property::new().with("primary_photo", "https://a.jpg");
        let out = prepare(vec![record.clone()]);
        assert_eq!(out, vec![record]);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut text = "é".repeat(2500);
        truncate_chars(&mut text, MAX_URL_LEN);
        assert_eq!(text.chars().count(), MAX_URL_LEN);
    }

    #[test]
    fn workbook_is_a_zip_document() {
        let rows = vec![
            Property::new().with("street", "1 Main St").with("beds", 3).with("sold", true),
            Property::new().with("street", "2 Main St").with("beds", FieldValue::Null),
        ];
        let bytes = workbook(&rows).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn dates_become_date_cells() {
        let sold = chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let listed = sold.and_hms_opt(9, 30, 0).unwrap().and_utc();
        let rows = vec![
            Property::new().with("last_sold_date", sold).with("list_date", FieldValue::DateTime(listed)),
            Property::new()
                .with("last_sold_date", chrono::NaiveDate::from_ymd_opt(1850, 1, 1).unwrap())
                .with("list_date", FieldValue::Null),
        ];
        let bytes = workbook(&rows).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn export_writes_file() {
        let path = std::env::temp_dir().join("housing_harvest_export/results.xlsx");
        let _ = tokio::fs::remove_file(&path).await;

        let bytes = export_to(vec![Property::new().with("a", 1)], &path).await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), bytes);
    }
}
