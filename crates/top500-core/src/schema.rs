//! Target property schema and the static field → property mapping.
//!
//! Every property the importer writes is an enumerated [`Property`] with a
//! fixed datatype. [`MAPPINGS`] ties specification-table fields to those
//! properties; [`Schema::validate_mappings`] rejects a mapping whose value
//! kind cannot produce the property's datatype, so a bad table fails at
//! startup instead of on the first write.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;
use crate::record::Field;

fn is_entity_id(s: &str, prefix: char) -> bool {
    let mut chars = s.chars();
    chars.next() == Some(prefix) && s.len() > 1 && chars.all(|c| c.is_ascii_digit())
}

/// Wikibase item id (`Q42`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ItemId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if is_entity_id(s, 'Q') {
            Ok(Self(s.to_string()))
        } else {
            Err(CoreError::InvalidItemId(s.to_string()))
        }
    }
}

impl TryFrom<String> for ItemId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wikibase property id (`P176`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyId(String);

impl PropertyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PropertyId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if is_entity_id(s, 'P') {
            Ok(Self(s.to_string()))
        } else {
            Err(CoreError::InvalidPropertyId(s.to_string()))
        }
    }
}

impl TryFrom<String> for PropertyId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PropertyId> for String {
    fn from(id: PropertyId) -> Self {
        id.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Datatype a property accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Item,
    Quantity,
    Time,
    String,
}

/// Properties the importer knows how to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    InstanceOf,
    Manufacturer,
    Location,
    Cores,
    Memory,
    Cpu,
    Power,
    OperatingSystem,
    Platform,
    Top500Id,
    Performance,
    HasRole,
    PointInTime,
}

impl Property {
    pub const ALL: [Property; 13] = [
        Property::InstanceOf,
        Property::Manufacturer,
        Property::Location,
        Property::Cores,
        Property::Memory,
        Property::Cpu,
        Property::Power,
        Property::OperatingSystem,
        Property::Platform,
        Property::Top500Id,
        Property::Performance,
        Property::HasRole,
        Property::PointInTime,
    ];

    /// Config key used to override the property id.
    pub fn key(self) -> &'static str {
        match self {
            Self::InstanceOf => "instance_of",
            Self::Manufacturer => "manufacturer",
            Self::Location => "location",
            Self::Cores => "cores",
            Self::Memory => "memory",
            Self::Cpu => "cpu",
            Self::Power => "power",
            Self::OperatingSystem => "os",
            Self::Platform => "platform",
            Self::Top500Id => "top500_id",
            Self::Performance => "performance",
            Self::HasRole => "has_role",
            Self::PointInTime => "point_in_time",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Wikidata property id.
    pub fn default_id(self) -> &'static str {
        match self {
            Self::InstanceOf => "P31",
            Self::Manufacturer => "P176",
            Self::Location => "P276",
            Self::Cores => "P1141",
            Self::Memory => "P2928",
            Self::Cpu => "P880",
            Self::Power => "P2791",
            Self::OperatingSystem => "P306",
            Self::Platform => "P400",
            Self::Top500Id => "P7307",
            Self::Performance => "P2148",
            Self::HasRole => "P2868",
            Self::PointInTime => "P585",
        }
    }

    pub fn datatype(self) -> DataType {
        match self {
            Self::InstanceOf
            | Self::Manufacturer
            | Self::Location
            | Self::Cpu
            | Self::OperatingSystem
            | Self::Platform
            | Self::HasRole => DataType::Item,
            Self::Cores | Self::Memory | Self::Power | Self::Performance => DataType::Quantity,
            Self::Top500Id => DataType::String,
            Self::PointInTime => DataType::Time,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How a scraped value is turned into a claim value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Magnitude plus optional unit.
    Quantity,
    /// Free text, written as a string.
    Text,
    /// Label resolved to an item through the entity lookup.
    Entity,
}

impl ValueKind {
    pub fn fits(self, datatype: DataType) -> bool {
        matches!(
            (self, datatype),
            (Self::Quantity, DataType::Quantity)
                | (Self::Text, DataType::String)
                | (Self::Entity, DataType::Item)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub field: Field,
    pub property: Property,
    pub kind: ValueKind,
}

const fn map(field: Field, property: Property, kind: ValueKind) -> Mapping {
    Mapping {
        field,
        property,
        kind,
    }
}

/// Specification-table fields that become claims, in write order.
///
/// Fields not listed here (interconnect, compiler, ...) are scraped but dropped.
pub const MAPPINGS: &[Mapping] = &[
    map(Field::Manufacturer, Property::Manufacturer, ValueKind::Entity),
    map(Field::Site, Property::Location, ValueKind::Entity),
    map(Field::Cores, Property::Cores, ValueKind::Quantity),
    map(Field::Memory, Property::Memory, ValueKind::Quantity),
    map(Field::Processor, Property::Cpu, ValueKind::Entity),
    map(Field::PowerConsumption, Property::Power, ValueKind::Quantity),
    map(Field::OperatingSystem, Property::OperatingSystem, ValueKind::Entity),
];

/// Resolved property ids for one target instance.
#[derive(Debug, Clone)]
pub struct Schema {
    ids: HashMap<Property, PropertyId>,
}

impl Default for Schema {
    fn default() -> Self {
        let ids = Property::ALL
            .into_iter()
            .map(|p| (p, PropertyId(p.default_id().to_string())))
            .collect();
        Self { ids }
    }
}

impl Schema {
    /// Start from the Wikidata ids and apply per-instance overrides keyed by
    /// [`Property::key`].
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, CoreError> {
        let mut schema = Self::default();
        for (key, id) in overrides {
            let property =
                Property::from_key(key).ok_or_else(|| CoreError::UnknownProperty(key.clone()))?;
            schema.ids.insert(property, id.parse()?);
        }
        Self::validate_mappings(MAPPINGS)?;
        Ok(schema)
    }

    pub fn id(&self, property: Property) -> &PropertyId {
        &self.ids[&property]
    }

    /// Check every mapping's value kind against its property's datatype.
    pub fn validate_mappings(mappings: &[Mapping]) -> Result<(), CoreError> {
        for m in mappings {
            let datatype = m.property.datatype();
            if !m.kind.fits(datatype) {
                return Err(CoreError::SchemaMismatch {
                    field: m.field.label().to_string(),
                    property: m.property.key().to_string(),
                    kind: m.kind,
                    datatype,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_validate() {
        assert!("Q42".parse::<ItemId>().is_ok());
        assert!("P176".parse::<PropertyId>().is_ok());
        assert!("Q".parse::<ItemId>().is_err());
        assert!("P176".parse::<ItemId>().is_err());
        assert!("q42".parse::<ItemId>().is_err());
        assert!("P17x".parse::<PropertyId>().is_err());
        assert!("Q99999999999999999999999".parse::<ItemId>().is_ok());
    }

    #[test]
    fn static_mappings_fit_schema() {
        assert!(Schema::validate_mappings(MAPPINGS).is_ok());
    }

    #[test]
    fn mismatched_mapping_is_rejected() {
        let bad = [map(Field::Cores, Property::Manufacturer, ValueKind::Quantity)];
        let err = Schema::validate_mappings(&bad).unwrap_err();
        assert!(matches!(err, CoreError::SchemaMismatch { .. }));
    }

    #[test]
    fn overrides_replace_default_ids() {
        let mut overrides = BTreeMap::new();
        overrides.insert("performance".to_string(), "P9999".to_string());
        let schema = Schema::with_overrides(&overrides).unwrap();
        assert_eq!(schema.id(Property::Performance).as_str(), "P9999");
        assert_eq!(schema.id(Property::Manufacturer).as_str(), "P176");
    }

    #[test]
    fn unknown_override_key_fails() {
        let mut overrides = BTreeMap::new();
        overrides.insert("bus".to_string(), "P1".to_string());
        assert!(matches!(
            Schema::with_overrides(&overrides),
            Err(CoreError::UnknownProperty(k)) if k == "bus"
        ));
    }

    #[test]
    fn bad_override_id_fails() {
        let mut overrides = BTreeMap::new();
        overrides.insert("memory".to_string(), "Q5".to_string());
        assert!(matches!(
            Schema::with_overrides(&overrides),
            Err(CoreError::InvalidPropertyId(_))
        ));
    }

    #[test]
    fn property_keys_roundtrip() {
        for p in Property::ALL {
            assert_eq!(Property::from_key(p.key()), Some(p));
        }
    }
}
