//! Label → item resolution for entity-valued fields, units, and roles.

use std::collections::{BTreeMap, HashMap};

use crate::CoreError;
use crate::schema::ItemId;

/// Built-in Wikidata entities. Config `entities` entries extend or replace these.
const DEFAULT_ENTITIES: &[(&str, &str)] = &[
    ("supercomputer", "Q121117"),
    // units
    ("GB", "Q79738"),
    ("TB", "Q79741"),
    ("PB", "Q79744"),
    ("kW", "Q3249"),
    ("MW", "Q6982035"),
    ("GHz", "Q3276763"),
    ("GFlop/s", "Q3355198"),
    ("TFlop/s", "Q3355199"),
    ("PFlop/s", "Q3355200"),
    ("EFlop/s", "Q3355201"),
    // performance roles
    ("rmax", "Q67124296"),
    ("rpeak", "Q67124297"),
    // operating systems
    ("Linux", "Q388"),
    ("CentOS", "Q207542"),
    ("Red Hat Enterprise Linux", "Q215273"),
    ("SUSE Linux Enterprise Server", "Q1759336"),
    ("Cray Linux Environment", "Q5182722"),
    ("AIX", "Q269856"),
    // manufacturers
    ("IBM", "Q37156"),
    ("HPE", "Q20012808"),
    ("Hewlett Packard Enterprise", "Q20012808"),
    ("Cray Inc.", "Q1141473"),
    ("Fujitsu", "Q26708"),
    ("Lenovo", "Q210539"),
    ("Dell EMC", "Q27992768"),
    ("NVIDIA", "Q182477"),
    ("NEC", "Q219990"),
    ("Atos", "Q666893"),
    ("Sugon", "Q7635965"),
    ("Inspur", "Q6038117"),
];

fn normalize(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case- and whitespace-insensitive label lookup.
#[derive(Debug, Clone)]
pub struct EntityLookup {
    items: HashMap<String, ItemId>,
}

impl Default for EntityLookup {
    fn default() -> Self {
        let items = DEFAULT_ENTITIES
            .iter()
            .filter_map(|(label, id)| Some((normalize(label), id.parse().ok()?)))
            .collect();
        Self { items }
    }
}

impl EntityLookup {
    /// Lookup with no built-in entities.
    pub fn empty() -> Self {
        Self {
            items: HashMap::new(),
        }
    }

    /// Defaults plus `overrides` (label → `Q` id).
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, CoreError> {
        let mut lookup = Self::default();
        for (label, id) in overrides {
            lookup.insert(label, id.parse()?);
        }
        Ok(lookup)
    }

    pub fn insert(&mut self, label: &str, item: ItemId) {
        self.items.insert(normalize(label), item);
    }

    pub fn resolve(&self, label: &str) -> Option<&ItemId> {
        self.items.get(&normalize(label))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
