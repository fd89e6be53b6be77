//! Claims to be written to the knowledge base.

use crate::schema::{ItemId, PropertyId};
use crate::value::{Amount, ListDate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimValue {
    Item(ItemId),
    Quantity {
        amount: Amount,
        unit: Option<ItemId>,
    },
    /// Month precision.
    Time(ListDate),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualifier {
    pub property: PropertyId,
    pub value: ClaimValue,
}

/// A single property-value assertion, optionally qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub property: PropertyId,
    pub value: ClaimValue,
    pub qualifiers: Vec<Qualifier>,
}

impl Claim {
    pub fn new(property: PropertyId, value: ClaimValue) -> Self {
        Self {
            property,
            value,
            qualifiers: Vec::new(),
        }
    }

    pub fn with_qualifier(mut self, property: PropertyId, value: ClaimValue) -> Self {
        self.qualifiers.push(Qualifier { property, value });
        self
    }

    pub fn qualifier(&self, property: &PropertyId) -> Option<&ClaimValue> {
        self.qualifiers
            .iter()
            .find(|q| &q.property == property)
            .map(|q| &q.value)
    }
}

/// Group claims by property, keeping the first-seen property order and the
/// claim order inside each group.
pub fn group_by_property(claims: Vec<Claim>) -> Vec<(PropertyId, Vec<Claim>)> {
    let mut groups: Vec<(PropertyId, Vec<Claim>)> = Vec::new();
    for claim in claims {
        match groups.iter_mut().find(|(p, _)| *p == claim.property) {
            Some((_, group)) => group.push(claim),
            None => groups.push((claim.property.clone(), vec![claim])),
        }
    }
    groups
}
