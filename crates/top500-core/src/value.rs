//! Value normalisation for numeric cells scraped from TOP500 pages.
//!
//! TOP500 renders magnitudes with thousands separators and a unit suffix,
//! e.g. `"4,866,560 GB"`, `"24,607.00 kW (Submitted)"` or `"1.5 PFlop/s"`.
//! [`Quantity::parse`] splits such a cell into a normalised [`Amount`] and a
//! known [`Unit`]; anything it cannot split is left to the caller to keep as
//! raw text.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?[0-9][0-9,]*(?:\.[0-9]+)?)\s*(.*)$").expect("valid quantity regex")
});

static TRAILING_NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*$").expect("valid note regex"));

/// A decimal magnitude with thousands separators removed and redundant zeros trimmed.
///
/// `"1,572,480"` → `1572480`, `"24,607.00"` → `24607`, `"007.50"` → `7.5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    /// Parse a plain decimal, tolerating `,` separators and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.contains('.') && (frac_part.is_empty() || !frac_part.bytes().all(|b| b.is_ascii_digit())) {
            return None;
        }

        let int_part = int_part.trim_start_matches('0');
        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let frac_part = frac_part.trim_end_matches('0');

        let mut out = String::with_capacity(int_part.len() + frac_part.len() + 2);
        let is_zero = int_part == "0" && frac_part.is_empty();
        if negative && !is_zero {
            out.push('-');
        }
        out.push_str(int_part);
        if !frac_part.is_empty() {
            out.push('.');
            out.push_str(frac_part);
        }
        Some(Self(out))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Explicitly signed form (`+1.5`, `-3`), as Wikibase quantities expect.
    pub fn signed(&self) -> String {
        if self.0.starts_with('-') {
            self.0.clone()
        } else {
            format!("+{}", self.0)
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unit suffixes that appear on TOP500 system pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "GB")]
    Gigabyte,
    #[serde(rename = "TB")]
    Terabyte,
    #[serde(rename = "PB")]
    Petabyte,
    #[serde(rename = "kW")]
    Kilowatt,
    #[serde(rename = "MW")]
    Megawatt,
    #[serde(rename = "GHz")]
    Gigahertz,
    #[serde(rename = "GFlop/s")]
    GigaFlops,
    #[serde(rename = "TFlop/s")]
    TeraFlops,
    #[serde(rename = "PFlop/s")]
    PetaFlops,
    #[serde(rename = "EFlop/s")]
    ExaFlops,
}

impl Unit {
    /// Recognise a unit suffix. Flop/s units accept the older `GFlops` spelling.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let s = suffix.trim();
        let unit = match s {
            "GB" | "GiB" => Self::Gigabyte,
            "TB" | "TiB" => Self::Terabyte,
            "PB" | "PiB" => Self::Petabyte,
            "kW" | "KW" => Self::Kilowatt,
            "MW" => Self::Megawatt,
            "GHz" => Self::Gigahertz,
            _ => match s.to_ascii_lowercase().as_str() {
                "gflop/s" | "gflops" => Self::GigaFlops,
                "tflop/s" | "tflops" => Self::TeraFlops,
                "pflop/s" | "pflops" => Self::PetaFlops,
                "eflop/s" | "eflops" => Self::ExaFlops,
                _ => return None,
            },
        };
        Some(unit)
    }

    /// Canonical suffix, also the key used to resolve the unit's entity.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Gigabyte => "GB",
            Self::Terabyte => "TB",
            Self::Petabyte => "PB",
            Self::Kilowatt => "kW",
            Self::Megawatt => "MW",
            Self::Gigahertz => "GHz",
            Self::GigaFlops => "GFlop/s",
            Self::TeraFlops => "TFlop/s",
            Self::PetaFlops => "PFlop/s",
            Self::ExaFlops => "EFlop/s",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A magnitude with an optional unit. Counts (cores, years) carry no unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: Amount,
    pub unit: Option<Unit>,
}

impl Quantity {
    pub fn new(amount: Amount, unit: Option<Unit>) -> Self {
        Self { amount, unit }
    }

    /// Split a table cell into magnitude and unit.
    ///
    /// A trailing parenthetical note (`"(Submitted)"`) is dropped first.
    /// Returns `None` if the cell does not start with a number or the
    /// remainder is not a known unit suffix.
    pub fn parse(cell: &str) -> Option<Self> {
        let cell = TRAILING_NOTE_RE.replace(cell.trim(), "");
        let caps = QUANTITY_RE.captures(cell.trim())?;
        let amount = Amount::parse(caps.get(1)?.as_str())?;
        let suffix = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        let unit = if suffix.is_empty() {
            None
        } else {
            Some(Unit::from_suffix(suffix)?)
        };
        Some(Self { amount, unit })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{} {}", self.amount, unit),
            None => write!(f, "{}", self.amount),
        }
    }
}

/// Month-precision date of a TOP500 list edition (`11/2023`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListDate {
    pub year: i32,
    pub month: u32,
}

impl ListDate {
    /// Parse `mm/YYYY` (the rank table format) or `YYYY-MM`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let date = NaiveDate::parse_from_str(&format!("01/{raw}"), "%d/%m/%Y")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
            .ok()?;
        Some(Self {
            year: date.year(),
            month: date.month(),
        })
    }
}

impl fmt::Display for ListDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
