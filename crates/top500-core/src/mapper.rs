//! Field Mapper: parsed [`Record`] → [`Claim`]s against the static schema.

use tracing::debug;

use crate::claim::{Claim, ClaimValue};
use crate::entities::EntityLookup;
use crate::record::{FieldValue, Measurement, RankingEntry, Record};
use crate::schema::{ItemId, MAPPINGS, Mapping, Property, Schema, ValueKind};
use crate::value::Quantity;

/// Turns records into claims. Built once per process from the config.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    schema: Schema,
    entities: EntityLookup,
    instance_of: Option<ItemId>,
}

impl FieldMapper {
    pub fn new(schema: Schema, entities: EntityLookup, instance_of: Option<ItemId>) -> Self {
        Self {
            schema,
            entities,
            instance_of,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Map a record to claims in write order: instance of, mapped table
    /// fields, platform, TOP500 id, then one performance claim per metric of
    /// every ranking entry.
    ///
    /// Values that cannot be expressed (unresolved entity, degraded numeric,
    /// unknown unit) are dropped, never reported as errors.
    pub fn map(&self, record: &Record) -> Vec<Claim> {
        let mut claims = Vec::new();

        if let Some(item) = &self.instance_of {
            claims.push(self.claim(Property::InstanceOf, ClaimValue::Item(item.clone())));
        }

        for mapping in MAPPINGS {
            let Some(value) = record.field(mapping.field) else {
                continue;
            };
            match self.map_field(mapping, value) {
                Some(v) => claims.push(self.claim(mapping.property, v)),
                None => debug!(
                    id = %record.id,
                    field = %mapping.field,
                    value = %value.text(),
                    "dropping unmappable value"
                ),
            }
        }

        if let Some(platform) = &record.platform {
            match self.entities.resolve(platform) {
                Some(item) => claims.push(self.claim(Property::Platform, ClaimValue::Item(item.clone()))),
                None => debug!(id = %record.id, platform = %platform, "unknown platform"),
            }
        }

        claims.push(self.claim(Property::Top500Id, ClaimValue::String(record.id.to_string())));

        for entry in &record.rankings {
            for m in &entry.measurements {
                if let Some(claim) = self.performance(entry, m) {
                    claims.push(claim);
                }
            }
        }

        claims
    }

    fn claim(&self, property: Property, value: ClaimValue) -> Claim {
        Claim::new(self.schema.id(property).clone(), value)
    }

    fn map_field(&self, mapping: &Mapping, value: &FieldValue) -> Option<ClaimValue> {
        match (mapping.kind, value) {
            (ValueKind::Quantity, FieldValue::Quantity(q)) => self.quantity(q),
            (ValueKind::Quantity, FieldValue::Text(_)) => None,
            (ValueKind::Text, v) => Some(ClaimValue::String(v.text())),
            (ValueKind::Entity, v) => self.entities.resolve(&v.text()).cloned().map(ClaimValue::Item),
        }
    }

    fn quantity(&self, q: &Quantity) -> Option<ClaimValue> {
        let unit = match q.unit {
            Some(u) => Some(self.entities.resolve(u.symbol())?.clone()),
            None => None,
        };
        Some(ClaimValue::Quantity {
            amount: q.amount.clone(),
            unit,
        })
    }

    /// Performance claim for one metric of a ranking entry. A role or date
    /// that cannot be expressed leaves its qualifier out; the claim stays.
    fn performance(&self, entry: &RankingEntry, m: &Measurement) -> Option<Claim> {
        let value = self.quantity(&m.value)?;
        let mut claim = self.claim(Property::Performance, value);

        match self.entities.resolve(m.metric.role_key()) {
            Some(role) => {
                claim = claim.with_qualifier(
                    self.schema.id(Property::HasRole).clone(),
                    ClaimValue::Item(role.clone()),
                );
            }
            None => debug!(metric = ?m.metric, "no role entity, qualifier omitted"),
        }
        if let Some(date) = entry.date {
            claim = claim.with_qualifier(
                self.schema.id(Property::PointInTime).clone(),
                ClaimValue::Time(date),
            );
        }
        Some(claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, Metric, SystemId};
    use crate::value::{Amount, ListDate, Unit};

    fn acme_mapper() -> FieldMapper {
        let mut entities = EntityLookup::default();
        entities.insert("Acme Corp", "Q1001".parse().unwrap());
        FieldMapper::new(Schema::default(), entities, None)
    }

    fn acme_record() -> Record {
        let mut record = Record::new(SystemId(123), "Acme One");
        record
            .fields
            .insert(Field::Manufacturer, FieldValue::Text("Acme Corp".into()));
        record.rankings.push(RankingEntry {
            rank: 1,
            date: ListDate::parse("11/2023"),
            measurements: vec![Measurement {
                metric: Metric::Rmax,
                value: Quantity::new(Amount::parse("1.5").unwrap(), Some(Unit::PetaFlops)),
            }],
        });
        record
    }

    fn with_property<'a>(claims: &'a [Claim], schema: &Schema, p: Property) -> Vec<&'a Claim> {
        claims.iter().filter(|c| &c.property == schema.id(p)).collect()
    }

    #[test]
    fn manufacturer_and_rmax_scenario() {
        let mapper = acme_mapper();
        let schema = mapper.schema().clone();
        let claims = mapper.map(&acme_record());

        let manufacturer = with_property(&claims, &schema, Property::Manufacturer);
        assert_eq!(manufacturer.len(), 1);
        assert_eq!(manufacturer[0].value, ClaimValue::Item("Q1001".parse().unwrap()));

        let perf = with_property(&claims, &schema, Property::Performance);
        assert_eq!(perf.len(), 1, "Rpeak absent, so only the Rmax claim");
        let claim = perf[0];
        assert_eq!(
            claim.value,
            ClaimValue::Quantity {
                amount: Amount::parse("1.5").unwrap(),
                unit: Some("Q3355200".parse().unwrap()),
            }
        );
        assert_eq!(
            claim.qualifier(schema.id(Property::HasRole)),
            Some(&ClaimValue::Item("Q67124296".parse().unwrap()))
        );
        assert_eq!(
            claim.qualifier(schema.id(Property::PointInTime)),
            Some(&ClaimValue::Time(ListDate { year: 2023, month: 11 }))
        );
    }

    #[test]
    fn both_metrics_share_the_date() {
        let mapper = acme_mapper();
        let schema = mapper.schema().clone();
        let mut record = acme_record();
        record.rankings[0].measurements.push(Measurement {
            metric: Metric::Rpeak,
            value: Quantity::new(Amount::parse("2").unwrap(), Some(Unit::PetaFlops)),
        });

        let claims = mapper.map(&record);
        let perf = with_property(&claims, &schema, Property::Performance);
        assert_eq!(perf.len(), 2);
        let date = schema.id(Property::PointInTime);
        assert_eq!(perf[0].qualifier(date), perf[1].qualifier(date));
        assert_ne!(
            perf[0].qualifier(schema.id(Property::HasRole)),
            perf[1].qualifier(schema.id(Property::HasRole))
        );
    }

    #[test]
    fn top500_id_always_present() {
        let mapper = acme_mapper();
        let claims = mapper.map(&Record::new(SystemId(42), "Bare"));
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].value, ClaimValue::String("42".into()));
    }

    #[test]
    fn instance_of_comes_first() {
        let mapper = FieldMapper::new(
            Schema::default(),
            EntityLookup::default(),
            Some("Q121117".parse().unwrap()),
        );
        let claims = mapper.map(&acme_record());
        assert_eq!(claims[0].property.as_str(), "P31");
    }

    #[test]
    fn unresolved_and_degraded_values_are_dropped() {
        let mapper = acme_mapper();
        let schema = mapper.schema().clone();
        let mut record = Record::new(SystemId(5), "Odd");
        record
            .fields
            .insert(Field::OperatingSystem, FieldValue::Text("Plan 9".into()));
        record
            .fields
            .insert(Field::Memory, FieldValue::Text("unknown".into()));
        record
            .fields
            .insert(Field::Interconnect, FieldValue::Text("Slingshot-11".into()));
        record.fields.insert(
            Field::Cores,
            FieldValue::Quantity(Quantity::new(Amount::parse("1024").unwrap(), None)),
        );

        let claims = mapper.map(&record);
        assert!(with_property(&claims, &schema, Property::OperatingSystem).is_empty());
        assert!(with_property(&claims, &schema, Property::Memory).is_empty());
        let cores = with_property(&claims, &schema, Property::Cores);
        assert_eq!(
            cores[0].value,
            ClaimValue::Quantity {
                amount: Amount::parse("1024").unwrap(),
                unit: None
            }
        );
        // cores + TOP500 id
        assert_eq!(claims.len(), 2);
    }

    #[test]
    fn missing_role_entity_keeps_claim() {
        let mut entities = EntityLookup::empty();
        entities.insert("PFlop/s", "Q3355200".parse().unwrap());
        let mapper = FieldMapper::new(Schema::default(), entities, None);
        let schema = mapper.schema().clone();

        let claims = mapper.map(&acme_record());
        let perf = with_property(&claims, &schema, Property::Performance);
        assert_eq!(perf.len(), 1);
        assert_eq!(perf[0].qualifiers.len(), 1);
        assert!(perf[0].qualifier(schema.id(Property::PointInTime)).is_some());
    }

    #[test]
    fn platform_resolves_through_lookup() {
        let mut entities = EntityLookup::default();
        entities.insert("HPE Cray EX235a", "Q2002".parse().unwrap());
        let mapper = FieldMapper::new(Schema::default(), entities, None);
        let mut record = Record::new(SystemId(9), "Frontier");
        record.platform = Some("HPE Cray EX235a".into());

        let claims = mapper.map(&record);
        assert_eq!(claims[0].property.as_str(), "P400");
        assert_eq!(claims[0].value, ClaimValue::Item("Q2002".parse().unwrap()));
    }
}
