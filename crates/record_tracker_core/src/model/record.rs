//! Leaf tags, month vocabulary and validated record inputs.
//!
//! # Responsibility
//! - Map raw JSON leaves to `LeafTag` through one normalization function.
//! - Validate add/delete inputs before they reach the store.
//!
//! # Invariants
//! - `"x"` is compared strictly; `1` is compared loosely (number, `true`,
//!   a numeric string including `0x`/`0o`/`0b` literals, or a
//!   single-element array whose element is one of those).
//! - New records are always written in canonical form (`"x"` or `1`).

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw leaf value for a natural record.
pub const NATURAL_RAW: &str = "x";
/// Raw leaf value for a self-marked record.
pub const SELF_MARKED_RAW: i64 = 1;

/// Categorical tag stored at a Day node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafTag {
    /// Stored as the string `"x"`.
    Natural,
    /// Stored as `1` (or anything loosely equal to it).
    SelfMarked,
    /// Any other persisted value. Counted separately, never as a category.
    Unrecognized,
}

impl LeafTag {
    /// Normalizes one persisted leaf.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(raw) if raw == NATURAL_RAW => Self::Natural,
            other if loosely_equals_one(other) => Self::SelfMarked,
            _ => Self::Unrecognized,
        }
    }

    /// Parses a form/CLI value selector (`x` or `1`).
    pub fn parse_input(input: &str) -> Option<Self> {
        match input.trim() {
            NATURAL_RAW => Some(Self::Natural),
            "1" => Some(Self::SelfMarked),
            _ => None,
        }
    }

    /// Canonical value written for this tag. `None` for `Unrecognized`.
    pub fn canonical_value(self) -> Option<Value> {
        match self {
            Self::Natural => Some(Value::String(NATURAL_RAW.to_string())),
            Self::SelfMarked => Some(Value::from(SELF_MARKED_RAW)),
            Self::Unrecognized => None,
        }
    }

    /// Display label used by summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Natural => "Natural N",
            Self::SelfMarked => "Self F",
            Self::Unrecognized => "Unrecognized",
        }
    }

    pub fn is_categorical(self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

fn loosely_equals_one(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Null | Value::Object(_) => false,
        other => primitive_number(other) == Some(1.0),
    }
}

/// Numeric value of a leaf once it is flattened to text.
///
/// Arrays flatten to their comma-joined elements, so only an empty or
/// single-element array can be numeric. Booleans flatten to words.
fn primitive_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => numeric_string_value(raw),
        Value::Null => Some(0.0),
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [single] => primitive_number(single),
            _ => None,
        },
        Value::Bool(_) | Value::Object(_) => None,
    }
}

fn numeric_string_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    if let Some((digits, radix)) = radix_literal(trimmed) {
        // Prefixed literals take no sign and no separators.
        if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
            return None;
        }
        return u64::from_str_radix(digits, radix)
            .ok()
            .map(|parsed| parsed as f64);
    }
    // Rust accepts spellings like `inf` and `nan` that are not numeric here.
    if trimmed
        .chars()
        .any(|ch| ch.is_ascii_alphabetic() && ch != 'e' && ch != 'E')
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn radix_literal(trimmed: &str) -> Option<(&str, u32)> {
    let rest = trimmed.strip_prefix('0')?;
    let mut chars = rest.chars();
    let radix = match chars.next()? {
        'x' | 'X' => 16,
        'o' | 'O' => 8,
        'b' | 'B' => 2,
        _ => return None,
    };
    Some((chars.as_str(), radix))
}

/// The twelve month keys accepted on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Parses an exact three-letter abbreviation (`Jan`..`Dec`).
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|month| month.as_str() == raw.trim())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jan => "Jan",
            Self::Feb => "Feb",
            Self::Mar => "Mar",
            Self::Apr => "Apr",
            Self::May => "May",
            Self::Jun => "Jun",
            Self::Jul => "Jul",
            Self::Aug => "Aug",
            Self::Sep => "Sep",
            Self::Oct => "Oct",
            Self::Nov => "Nov",
            Self::Dec => "Dec",
        }
    }

    /// Zero-based calendar position.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Calendar sort rank for a stored month key; unknown keys rank after `Dec`.
pub fn month_rank(key: &str) -> usize {
    Month::parse(key).map_or(Month::ALL.len(), Month::index)
}

/// Input validation failures, raised before any store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Required field is blank after trim.
    MissingField(&'static str),
    /// Month is not one of `Jan`..`Dec`.
    InvalidMonth(String),
    /// Value selector is neither `x` nor `1`.
    UnsupportedValue(String),
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field `{field}` is empty"),
            Self::InvalidMonth(value) => {
                write!(f, "month `{value}` is not one of Jan..Dec")
            }
            Self::UnsupportedValue(value) => {
                write!(f, "value `{value}` is not supported; expected `x` or `1`")
            }
        }
    }
}

impl Error for RecordValidationError {}

/// Address of one Day leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordPath {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl RecordPath {
    /// Builds a path from trimmed, non-blank segments.
    pub fn new(
        year: impl AsRef<str>,
        month: impl AsRef<str>,
        day: impl AsRef<str>,
    ) -> Result<Self, RecordValidationError> {
        Ok(Self {
            year: required("year", year.as_ref())?,
            month: required("month", month.as_ref())?,
            day: required("day", day.as_ref())?,
        })
    }

    /// Builds a path from segments exactly as given.
    ///
    /// Only for addressing stored keys that carry surrounding whitespace;
    /// new records always go through `new`.
    pub fn verbatim(year: &str, month: &str, day: &str) -> Self {
        Self {
            year: year.to_string(),
            month: month.to_string(),
            day: day.to_string(),
        }
    }
}

impl Display for RecordPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.year, self.month, self.day)
    }
}

/// A validated record ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub path: RecordPath,
    pub tag: LeafTag,
}

impl NewRecord {
    /// Validates raw add-form input.
    ///
    /// # Errors
    /// - `MissingField` for any blank field, checked in form order.
    /// - `InvalidMonth` when month is not an abbreviation.
    /// - `UnsupportedValue` when value is not `x` or `1`.
    pub fn parse(
        year: &str,
        month: &str,
        day: &str,
        value: &str,
    ) -> Result<Self, RecordValidationError> {
        let path = RecordPath::new(year, month, day)?;
        let value = required("value", value)?;

        if Month::parse(&path.month).is_none() {
            return Err(RecordValidationError::InvalidMonth(path.month));
        }
        let tag = LeafTag::parse_input(&value)
            .ok_or(RecordValidationError::UnsupportedValue(value))?;

        Ok(Self { path, tag })
    }

    /// Canonical leaf value to store.
    pub fn value(&self) -> Value {
        // `parse` never yields `Unrecognized`.
        self.tag.canonical_value().unwrap_or(Value::Null)
    }
}

fn required(field: &'static str, raw: &str) -> Result<String, RecordValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RecordValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}
