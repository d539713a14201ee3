//! Whole-document record tree.
//!
//! # Responsibility
//! - Decode the persisted JSON document into Year/Month/Day maps.
//! - Provide insert and pruning delete over the in-memory copy.
//!
//! # Invariants
//! - `remove` prunes an emptied Month, then an emptied Year.
//! - Decoding accepts sparse arrays wherever the document store turned an
//!   integer-keyed object into one.

use super::record::RecordPath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Day key -> raw leaf value.
pub type DayEntries = BTreeMap<String, Value>;
/// Month key -> day entries.
pub type MonthEntries = BTreeMap<String, DayEntries>;

/// Decode failure for a persisted document that is not shaped as a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDecodeError {
    /// Slash-separated location of the offending node (`/` for root).
    pub location: String,
    pub message: String,
}

impl Display for TreeDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid record tree at `{}`: {}", self.location, self.message)
    }
}

impl Error for TreeDecodeError {}

/// Full Year -> Month -> Day -> leaf mapping; the root of persisted state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct RecordTree {
    years: BTreeMap<String, MonthEntries>,
}

impl RecordTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a persisted document. `null` decodes to an empty tree.
    pub fn from_document(document: Value) -> Result<Self, TreeDecodeError> {
        let mut years = BTreeMap::new();
        for (year, months_value) in container_entries(document, "/")? {
            let year_location = format!("/{year}");
            let mut months = MonthEntries::new();
            for (month, days_value) in container_entries(months_value, &year_location)? {
                let month_location = format!("{year_location}/{month}");
                let days = container_entries(days_value, &month_location)?
                    .into_iter()
                    .collect::<DayEntries>();
                months.insert(month, days);
            }
            years.insert(year, months);
        }
        Ok(Self { years })
    }

    /// Encodes the whole tree as one JSON document.
    pub fn to_document(&self) -> Value {
        let years = self
            .years
            .iter()
            .map(|(year, months)| {
                let months = months
                    .iter()
                    .map(|(month, days)| {
                        let days = days
                            .iter()
                            .map(|(day, value)| (day.clone(), value.clone()))
                            .collect::<Map<String, Value>>();
                        (month.clone(), Value::Object(days))
                    })
                    .collect::<Map<String, Value>>();
                (year.clone(), Value::Object(months))
            })
            .collect::<Map<String, Value>>();
        Value::Object(years)
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Iterates years in stored order.
    pub fn years(&self) -> impl DoubleEndedIterator<Item = (&String, &MonthEntries)> {
        self.years.iter()
    }

    pub fn get(&self, path: &RecordPath) -> Option<&Value> {
        self.years
            .get(&path.year)
            .and_then(|months| months.get(&path.month))
            .and_then(|days| days.get(&path.day))
    }

    pub fn contains(&self, path: &RecordPath) -> bool {
        self.get(path).is_some()
    }

    /// Number of Day leaves across the tree.
    pub fn leaf_count(&self) -> usize {
        self.years
            .values()
            .flat_map(|months| months.values())
            .map(|days| days.len())
            .sum()
    }

    /// Sets one leaf, creating Year/Month nodes as needed.
    ///
    /// Returns the previous value at that path (last write wins).
    pub fn insert(&mut self, path: &RecordPath, value: Value) -> Option<Value> {
        self.years
            .entry(path.year.clone())
            .or_default()
            .entry(path.month.clone())
            .or_default()
            .insert(path.day.clone(), value)
    }

    /// Removes one leaf and prunes emptied Month and Year nodes.
    ///
    /// Returns `None` and leaves the tree unchanged when the path is absent.
    pub fn remove(&mut self, path: &RecordPath) -> Option<Value> {
        let months = self.years.get_mut(&path.year)?;
        let days = months.get_mut(&path.month)?;
        let removed = days.remove(&path.day)?;

        if days.is_empty() {
            months.remove(&path.month);
        }
        if months.is_empty() {
            self.years.remove(&path.year);
        }
        Some(removed)
    }
}

impl TryFrom<Value> for RecordTree {
    type Error = TreeDecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_document(value)
    }
}

impl From<RecordTree> for Value {
    fn from(value: RecordTree) -> Self {
        value.to_document()
    }
}

/// Lists `(key, child)` pairs of an object or sparse array node.
///
/// `null` is an absent node; `null` children are skipped.
fn container_entries(
    node: Value,
    location: &str,
) -> Result<Vec<(String, Value)>, TreeDecodeError> {
    match node {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .filter(|(_, child)| !child.is_null())
            .collect()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter(|(_, child)| !child.is_null())
            .map(|(index, child)| (index.to_string(), child))
            .collect()),
        other => Err(TreeDecodeError {
            location: location.to_string(),
            message: format!("expected object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
