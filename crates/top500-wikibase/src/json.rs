//! Wikibase JSON for snaks and statements.
//!
//! Quantity units are entity URIs (`<concept_uri>Q11573`), `"1"` when the
//! quantity is unitless. Times are month precision in the proleptic
//! Gregorian calendar.

use serde_json::{Map, Value, json};
use top500_core::{Claim, ClaimValue, ItemId, ListDate, PropertyId};

const GREGORIAN: &str = "http://www.wikidata.org/entity/Q1985727";
const PRECISION_MONTH: u8 = 10;

/// Encodes claim values against a fixed entity URI prefix.
#[derive(Debug, Clone)]
pub struct Encoder {
    concept_uri: String,
}

impl Encoder {
    /// `concept_uri` like `http://www.wikidata.org/entity/` (trailing slash optional).
    pub fn new(concept_uri: &str) -> Self {
        let mut concept_uri = concept_uri.trim_end_matches('/').to_string();
        concept_uri.push('/');
        Self { concept_uri }
    }

    pub fn entity_uri(&self, item: &ItemId) -> String {
        format!("{}{}", self.concept_uri, item)
    }

    pub fn datavalue(&self, value: &ClaimValue) -> Value {
        match value {
            ClaimValue::Item(item) => json!({
                "type": "wikibase-entityid",
                "value": item_value(item),
            }),
            ClaimValue::Quantity { amount, unit } => json!({
                "type": "quantity",
                "value": {
                    "amount": amount.signed(),
                    "unit": unit.as_ref().map_or_else(|| "1".to_string(), |u| self.entity_uri(u)),
                },
            }),
            ClaimValue::Time(date) => json!({
                "type": "time",
                "value": time_value(*date),
            }),
            ClaimValue::String(s) => json!({
                "type": "string",
                "value": s,
            }),
        }
    }

    pub fn snak(&self, property: &PropertyId, value: &ClaimValue) -> Value {
        json!({
            "snaktype": "value",
            "property": property.as_str(),
            "datavalue": self.datavalue(value),
        })
    }

    /// Full statement for `wbsetclaim`, qualifiers included.
    pub fn statement(&self, guid: &str, claim: &Claim) -> Value {
        let mut statement = json!({
            "id": guid,
            "type": "statement",
            "rank": "normal",
            "mainsnak": self.snak(&claim.property, &claim.value),
        });
        if !claim.qualifiers.is_empty() {
            let mut qualifiers: Map<String, Value> = Map::new();
            let mut order: Vec<&str> = Vec::new();
            for q in &claim.qualifiers {
                let snak = self.snak(&q.property, &q.value);
                match qualifiers.get_mut(q.property.as_str()) {
                    Some(Value::Array(snaks)) => snaks.push(snak),
                    _ => {
                        order.push(q.property.as_str());
                        qualifiers.insert(q.property.as_str().to_string(), Value::Array(vec![snak]));
                    }
                }
            }
            statement["qualifiers"] = Value::Object(qualifiers);
            statement["qualifiers-order"] = json!(order);
        }
        statement
    }
}

fn item_value(item: &ItemId) -> Value {
    json!({
        "entity-type": "item",
        "id": item.as_str(),
    })
}

fn time_value(date: ListDate) -> Value {
    json!({
        "time": format!("+{:04}-{:02}-00T00:00:00Z", date.year, date.month),
        "timezone": 0,
        "before": 0,
        "after": 0,
        "precision": PRECISION_MONTH,
        "calendarmodel": GREGORIAN,
    })
}

/// Statement GUID in the `Q42$<uuid>` form Wikibase expects.
pub fn statement_guid(item: &ItemId) -> String {
    format!("{}${}", item, uuid::Uuid::new_v4())
}

/// `labels` object for `wbeditentity`.
pub fn labels(labels: &[(String, String)]) -> Value {
    let mut out = Map::new();
    for (language, value) in labels {
        out.insert(language.clone(), json!({ "language": language, "value": value }));
    }
    Value::Object(out)
}
