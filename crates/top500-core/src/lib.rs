//! Domain types for the TOP500 importer: scraped records, the property schema,
//! the field mapper, and importer configuration.

pub mod claim;
pub mod config;
pub mod entities;
mod error;
pub mod mapper;
pub mod record;
pub mod schema;
pub mod value;

pub use claim::{Claim, ClaimValue, Qualifier};
pub use config::{ImporterConfig, ShardConfig};
pub use entities::EntityLookup;
pub use error::CoreError;
pub use mapper::FieldMapper;
pub use record::{Field, FieldValue, Measurement, Metric, RankingEntry, Record, SystemId};
pub use schema::{DataType, ItemId, Mapping, Property, PropertyId, Schema, ValueKind};
pub use value::{Amount, ListDate, Quantity, Unit};
