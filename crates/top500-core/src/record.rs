//! Scraped TOP500 system records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;
use crate::value::{ListDate, Quantity};

/// Numeric TOP500 system identifier (`/system/<id>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(pub u32);

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SystemId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidSystemId(s.to_string()));
        }
        s.parse()
            .map(SystemId)
            .map_err(|_| CoreError::InvalidSystemId(s.to_string()))
    }
}

/// Row labels recognised in the system specification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Site,
    Manufacturer,
    Cores,
    Memory,
    Processor,
    Interconnect,
    InstallationYear,
    PowerConsumption,
    OperatingSystem,
    Compiler,
    MathLibrary,
    Mpi,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Site,
        Field::Manufacturer,
        Field::Cores,
        Field::Memory,
        Field::Processor,
        Field::Interconnect,
        Field::InstallationYear,
        Field::PowerConsumption,
        Field::OperatingSystem,
        Field::Compiler,
        Field::MathLibrary,
        Field::Mpi,
    ];

    /// Match a normalised row label (whitespace collapsed, `:` removed).
    pub fn from_label(label: &str) -> Option<Self> {
        let field = match label.trim() {
            "Site" => Self::Site,
            "Manufacturer" => Self::Manufacturer,
            "Cores" => Self::Cores,
            "Memory" => Self::Memory,
            "Processor" => Self::Processor,
            "Interconnect" => Self::Interconnect,
            "Installation Year" => Self::InstallationYear,
            "Power Consumption" | "Power" => Self::PowerConsumption,
            "Operating System" => Self::OperatingSystem,
            "Compiler" => Self::Compiler,
            "Math Library" => Self::MathLibrary,
            "MPI" => Self::Mpi,
            _ => return None,
        };
        Some(field)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Site => "Site",
            Self::Manufacturer => "Manufacturer",
            Self::Cores => "Cores",
            Self::Memory => "Memory",
            Self::Processor => "Processor",
            Self::Interconnect => "Interconnect",
            Self::InstallationYear => "Installation Year",
            Self::PowerConsumption => "Power Consumption",
            Self::OperatingSystem => "Operating System",
            Self::Compiler => "Compiler",
            Self::MathLibrary => "Math Library",
            Self::Mpi => "MPI",
        }
    }

    /// Fields whose cells are expected to hold a magnitude.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Cores | Self::Memory | Self::InstallationYear | Self::PowerConsumption
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A parsed specification-table value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    Quantity(Quantity),
    Text(String),
}

impl FieldValue {
    /// Text form of the value, used for entity lookups.
    pub fn text(&self) -> String {
        match self {
            Self::Quantity(q) => q.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Performance metrics reported per ranking entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Achieved Linpack performance.
    Rmax,
    /// Theoretical peak performance.
    Rpeak,
}

impl Metric {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Rmax" => Some(Self::Rmax),
            "Rpeak" => Some(Self::Rpeak),
            _ => None,
        }
    }

    /// Key used to resolve the role entity of the metric.
    pub fn role_key(self) -> &'static str {
        match self {
            Self::Rmax => "rmax",
            Self::Rpeak => "rpeak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub metric: Metric,
    pub value: Quantity,
}

/// One row of the rank history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub date: Option<ListDate>,
    pub measurements: Vec<Measurement>,
}

impl RankingEntry {
    pub fn measurement(&self, metric: Metric) -> Option<&Quantity> {
        self.measurements
            .iter()
            .find(|m| m.metric == metric)
            .map(|m| &m.value)
    }
}

/// Everything scraped from one `/system/<id>` page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: SystemId,
    pub name: String,
    pub platform: Option<String>,
    pub fields: BTreeMap<Field, FieldValue>,
    pub rankings: Vec<RankingEntry>,
}

impl Record {
    pub fn new(id: SystemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            platform: None,
            fields: BTreeMap::new(),
            rankings: Vec::new(),
        }
    }

    pub fn field(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }
}
