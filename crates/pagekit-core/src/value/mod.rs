#[cfg(test)]
mod tests;

use num_bigint::BigInt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

///
/// Value
///
/// Runtime scalar carried by criteria, parameter bindings, and the
/// in-memory evaluator. Collections surface as `List`; absent data is
/// `Null`. Interpretation (coercion, casting, pattern matching) happens
/// in later passes, never at construction.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    IntBig(BigInt),
    Text(String),
    Enum(String),
    Date(Date),
    Time(Time),
    DateTime(PrimitiveDateTime),
    DateTimeTz(OffsetDateTime),
    List(Vec<Self>),
}

///
/// TextMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextMode {
    Cs, // case-sensitive
    Ci, // case-insensitive
}

impl Value {
    /// True when this value is the null marker.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True when this value carries a numeric payload.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Decimal(_) | Self::IntBig(_))
    }

    /// Textual rendering used by string casts and LIKE evaluation.
    ///
    /// `Null` and `List` have no textual form.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::List(_) => None,
            Self::Bool(b) => Some(if *b { "true".into() } else { "false".into() }),
            Self::Int(n) => Some(n.to_string()),
            Self::Decimal(d) => Some(d.normalize().to_string()),
            Self::IntBig(n) => Some(n.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Enum(name) => Some(name.clone()),
            Self::Date(d) => Some(format_date(*d)),
            Self::Time(t) => Some(format_time(*t)),
            Self::DateTime(dt) => Some(format!("{}T{}Z", format_date(dt.date()), format_time(dt.time()))),
            Self::DateTimeTz(dt) => Some(format!(
                "{}T{}{}",
                format_date(dt.date()),
                format_time(dt.time()),
                format_offset(dt.offset())
            )),
        }
    }

    /// Parse a truthy payload: booleans, non-zero numbers, or truthy text.
    #[must_use]
    pub fn truthy(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(n) => Some(*n != 0),
            Self::Decimal(d) => Some(!d.is_zero()),
            Self::IntBig(n) => Some(*n != BigInt::from(0)),
            Self::Text(s) | Self::Enum(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" | "on" => Some(true),
                "false" | "f" | "no" | "n" | "0" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Typed comparison: strict within a variant, widening across the
    /// numeric variants. Returns `None` when ordering is undefined.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) | (Self::Enum(a), Self::Enum(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::DateTimeTz(a), Self::DateTimeTz(b)) => Some(a.cmp(b)),
            _ if self.is_numeric() && other.is_numeric() => self.cmp_numeric(other),
            _ => None,
        }
    }

    /// Widening comparison across `Int`, `Decimal`, and `IntBig`.
    #[must_use]
    pub fn cmp_numeric(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::IntBig(a), Self::IntBig(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::IntBig(b)) => Some(BigInt::from(*a).cmp(b)),
            (Self::IntBig(a), Self::Int(b)) => Some(a.cmp(&BigInt::from(*b))),
            (Self::Int(a), Self::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (Self::Decimal(a), Self::Int(b)) => Some(a.cmp(&Decimal::from(*b))),
            (Self::IntBig(a), Self::Decimal(b)) => cmp_big_decimal(a, b),
            (Self::Decimal(a), Self::IntBig(b)) => cmp_big_decimal(b, a).map(Ordering::reverse),
            _ => None,
        }
    }

    /// Equality under numeric widening and strict variant rules otherwise.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        if self.is_numeric() && other.is_numeric() {
            return self.cmp_numeric(other) == Some(Ordering::Equal);
        }

        self == other
    }

    /// Text equality under the requested mode, defined only for values
    /// with a textual form.
    #[must_use]
    pub fn text_eq(&self, other: &str, mode: TextMode) -> Option<bool> {
        let text = self.to_text()?;
        Some(match mode {
            TextMode::Cs => text == other,
            TextMode::Ci => casefold(&text) == casefold(other),
        })
    }

    /// Substring containment under the requested mode.
    #[must_use]
    pub fn text_contains(&self, needle: &str, mode: TextMode) -> Option<bool> {
        let text = self.to_text()?;
        Some(match mode {
            TextMode::Cs => text.contains(needle),
            TextMode::Ci => casefold(&text).contains(&casefold(needle)),
        })
    }

    /// Prefix match under the requested mode.
    #[must_use]
    pub fn text_starts_with(&self, prefix: &str, mode: TextMode) -> Option<bool> {
        let text = self.to_text()?;
        Some(match mode {
            TextMode::Cs => text.starts_with(prefix),
            TextMode::Ci => casefold(&text).starts_with(&casefold(prefix)),
        })
    }

    /// Suffix match under the requested mode.
    #[must_use]
    pub fn text_ends_with(&self, suffix: &str, mode: TextMode) -> Option<bool> {
        let text = self.to_text()?;
        Some(match mode {
            TextMode::Cs => text.ends_with(suffix),
            TextMode::Ci => casefold(&text).ends_with(&casefold(suffix)),
        })
    }

    /// Canonical total ordering for result sorting and deterministic
    /// serialization. Falls back to variant rank when typed comparison
    /// is undefined, so the ordering is total.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        if let Some(ordering) = self.compare(other) {
            return ordering;
        }

        let rank = self.canonical_rank().cmp(&other.canonical_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                for (left, right) in a.iter().zip(b.iter()) {
                    let cmp = left.canonical_cmp(right);
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => Ordering::Equal,
        }
    }

    const fn canonical_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Decimal(_) => 3,
            Self::IntBig(_) => 4,
            Self::Text(_) => 5,
            Self::Enum(_) => 6,
            Self::Date(_) => 7,
            Self::Time(_) => 8,
            Self::DateTime(_) => 9,
            Self::DateTimeTz(_) => 10,
            Self::List(_) => 11,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            other => {
                // Display and to_text agree for every non-null scalar.
                let text = other.to_text().unwrap_or_default();
                write!(f, "{text}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Self::IntBig(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<V: Into<Self>> From<Vec<V>> for Value {
    fn from(value: Vec<V>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Self>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// ASCII fast path, Unicode fallback; both sides of every case-insensitive
/// comparison pass through here.
#[must_use]
pub fn casefold(input: &str) -> String {
    if input.is_ascii() {
        return input.to_ascii_lowercase();
    }

    input.to_lowercase()
}

// Decimal magnitude is bounded well inside i128, so out-of-range big
// integers dominate by sign.
fn cmp_big_decimal(big: &BigInt, dec: &Decimal) -> Option<Ordering> {
    i128::try_from(big).map_or_else(
        |_| {
            if *big > BigInt::from(0) {
                Some(Ordering::Greater)
            } else {
                Some(Ordering::Less)
            }
        },
        |n| {
            Decimal::try_from_i128_with_scale(n, 0)
                .ok()
                .map(|d| d.cmp(dec))
        },
    )
}

fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn format_time(time: Time) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        time.hour(),
        time.minute(),
        time.second()
    )
}

fn format_offset(offset: time::UtcOffset) -> String {
    let (hours, minutes, _) = offset.as_hms();
    format!("{:+03}:{:02}", hours, minutes.abs())
}
