use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A single cell of a property record.
///
/// The schema of a record is whatever the scraper returns, so values are
/// kept dynamically typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Returns the text if this value is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts dates into their string form and leaves primitives alone.
    pub fn coerced(&self) -> FieldValue {
        match self {
            FieldValue::Date(_) | FieldValue::DateTime(_) => FieldValue::Text(self.to_string()),
            other => other.clone(),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Int(_) | FieldValue::Float(_) => 2,
            FieldValue::Date(_) | FieldValue::DateTime(_) => 3,
            FieldValue::Text(_) => 4,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Total order used for sorting non-null values.
    ///
    /// Numbers compare numerically across `Int`/`Float`, dates across
    /// `Date`/`DateTime`; values of different kinds order by kind.
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            _ => match (self.type_rank(), other.type_rank()) {
                (2, 2) => {
                    let (a, b) = (self.as_f64().unwrap_or(0.0), other.as_f64().unwrap_or(0.0));
                    a.total_cmp(&b)
                }
                (3, 3) => self.as_datetime().cmp(&other.as_datetime()),
                (a, b) => a.cmp(&b),
            },
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) if v.is_nan() => Ok(()),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// One scraped listing: field names mapped to values, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Property {
    fields: Vec<(String, FieldValue)>,
}

impl Property {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field, keeping its position if it already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.iter_mut().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let idx = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy of this record with date values turned into strings.
    pub fn coerced(&self) -> Property {
        self.iter().map(|(k, v)| (k.to_string(), v.coerced())).collect()
    }
}

impl FromIterator<(String, FieldValue)> for Property {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut property = Property::new();
        for (k, v) in iter {
            property.insert(k, v);
        }
        property
    }
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Property {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertyVisitor;

        impl<'de> Visitor<'de> for PropertyVisitor {
            type Value = Property;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Property, A::Error> {
                let mut property = Property::new();
                while let Some((k, v)) = access.next_entry::<String, FieldValue>()? {
                    property.insert(k, v);
                }
                Ok(property)
            }
        }

        deserializer.deserialize_map(PropertyVisitor)
    }
}

/// Field names across a result set, in first-seen order.
pub fn columns(properties: &[Property]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for property in properties {
        for name in property.names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_keeps_position_on_overwrite() {
        let mut p = Property::new().with("a", 1).with("b", "x");
        p.insert("a", 2);
        assert_eq!(p.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(p.get("a"), Some(&FieldValue::Int(2)));
    }

    #[test]
    fn serializes_in_field_order() {
        let p = Property::new().with("zeta", 1).with("alpha", FieldValue::Null);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"zeta":1,"alpha":null}"#);
    }

    #[test]
    fn deserializes_json_values_into_variants() {
        let p: Property = serde_json::from_value(json!({
            "price": 450000,
            "baths": 2.5,
            "status": "SOLD",
            "garage": null,
            "new": true
        }))
        .unwrap();
        assert_eq!(p.get("price"), Some(&FieldValue::Int(450000)));
        assert_eq!(p.get("baths"), Some(&FieldValue::Float(2.5)));
        assert_eq!(p.get("status"), Some(&FieldValue::Text("SOLD".into())));
        assert_eq!(p.get("garage"), Some(&FieldValue::Null));
        assert_eq!(p.get("new"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn coerces_dates_to_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let p = Property::new().with("sold", date).with("price", 10).coerced();
        assert_eq!(p.get("sold"), Some(&FieldValue::Text("2024-03-09".into())));
        assert_eq!(p.get("price"), Some(&FieldValue::Int(10)));
    }

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert_eq!(FieldValue::Int(3).sort_cmp(&FieldValue::Float(2.5)), Ordering::Greater);
        assert_eq!(FieldValue::Float(1.0).sort_cmp(&FieldValue::Int(1)), Ordering::Equal);
    }

    #[test]
    fn columns_are_first_seen_union() {
        let rows = vec![
            Property::new().with("a", 1).with("b", 2),
            Property::new().with("c", 3).with("a", 4),
        ];
        assert_eq!(columns(&rows), vec!["a", "b", "c"]);
    }
}
