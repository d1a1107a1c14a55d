//! Record and filter types shared by all providers.

use std::collections::BTreeMap;

use serde_json::Value;

/// A mock business record. Always a JSON value, usually an object.
pub type Record = Value;

/// Equality filter applied by `list`.
///
/// A record matches when every `(field, value)` pair equals the record's
/// top-level field rendered as a string. Numbers and booleans compare by
/// their JSON text, so `?Quantity=5` matches `{"Quantity": 5}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Field equality constraints.
    pub equals: BTreeMap<String, String>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// A filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality constraint.
    #[must_use]
    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.equals.insert(field.to_owned(), value.to_owned());
        self
    }

    /// Cap the number of returned records.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `record` satisfies every constraint.
    pub fn matches(&self, record: &Record) -> bool {
        self.equals.iter().all(|(field, expected)| {
            record.get(field).is_some_and(|actual| match actual {
                Value::String(s) => s == expected,
                Value::Null => false,
                other => other.to_string() == *expected,
            })
        })
    }

    /// Apply the filter to records in key order.
    pub(crate) fn apply<'a, I>(&self, records: I) -> Vec<Record>
    where
        I: Iterator<Item = &'a Record>,
    {
        let matching = records.filter(|r| self.matches(r)).cloned();
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

/// Check that a collection name or key is safe to use as a storage name.
///
/// Accepts ASCII alphanumerics plus `_`, `-` and `.`, but never a name made
/// only of dots.
pub(crate) fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().all(|c| c == '.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn filter_matches_strings_and_numbers() {
        let record = json!({"Status": "OPEN", "Quantity": 5, "Flag": true});
        assert!(RecordFilter::all().matches(&record));
        assert!(RecordFilter::all().with("Status", "OPEN").matches(&record));
        assert!(RecordFilter::all().with("Quantity", "5").matches(&record));
        assert!(RecordFilter::all().with("Flag", "true").matches(&record));
        assert!(!RecordFilter::all().with("Status", "open").matches(&record));
        assert!(!RecordFilter::all().with("Missing", "x").matches(&record));
    }

    #[test]
    fn filter_limit_truncates() {
        let records = [json!({"a": 1}), json!({"a": 2}), json!({"a": 3})];
        let out = RecordFilter::all().limit(2).apply(records.iter());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn name_validation() {
        assert!(valid_name("SalesOrders"));
        assert!(valid_name("0000500001"));
        assert!(!valid_name(""));
        assert!(!valid_name(".."));
        assert!(!valid_name("../etc"));
        assert!(!valid_name("a/b"));
    }
}
