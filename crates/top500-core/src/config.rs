//! Importer configuration, loaded from a JSON file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::CoreError;
use crate::entities::EntityLookup;
use crate::mapper::FieldMapper;
use crate::schema::{ItemId, Schema};

pub const DEFAULT_CONFIG_NAME: &str = "top500-importer.json";

/// Static partition settings for mass mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardConfig {
    pub modulus: u32,
    pub first_id: u32,
    pub last_id: u32,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            modulus: 1,
            first_id: 1,
            last_id: 200_000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Wikibase `api.php` endpoint.
    pub api_url: String,
    /// Prefix of entity URIs, used for quantity units.
    pub concept_uri: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub top500_url: String,
    /// Item id or entity label every imported item is an instance of.
    pub instance_of: Option<String>,
    pub label_languages: Vec<String>,
    pub edit_summary: String,
    /// Page that lists items created in mass mode.
    pub log_page: Option<String>,
    /// Page holding the bot's running/stopped/error state.
    pub status_page: Option<String>,
    pub redis_url: Option<String>,
    pub shard: ShardConfig,
    /// Property id overrides keyed by property name (`"performance": "P1234"`).
    pub properties: BTreeMap<String, String>,
    /// Extra entity labels (`"Acme Corp": "Q1001"`).
    pub entities: BTreeMap<String, String>,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            api_url: "https://www.wikidata.org/w/api.php".into(),
            concept_uri: "http://www.wikidata.org/entity/".into(),
            username: None,
            password: None,
            top500_url: "https://www.top500.org".into(),
            instance_of: Some("supercomputer".into()),
            label_languages: vec!["en".into(), "es".into()],
            edit_summary: "edited using [[:d:User:TOP500 importer|TOP500 importer]]".into(),
            log_page: None,
            status_page: None,
            redis_url: None,
            shard: ShardConfig::default(),
            properties: BTreeMap::new(),
            entities: BTreeMap::new(),
        }
    }
}

impl ImporterConfig {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn schema(&self) -> Result<Schema, CoreError> {
        Schema::with_overrides(&self.properties)
    }

    pub fn entity_lookup(&self) -> Result<EntityLookup, CoreError> {
        EntityLookup::with_overrides(&self.entities)
    }

    /// `instance_of` as an item: taken literally if it is a `Q` id, otherwise
    /// resolved as an entity label.
    pub fn instance_of_item(&self, entities: &EntityLookup) -> Result<Option<ItemId>, CoreError> {
        let Some(raw) = self.instance_of.as_deref() else {
            return Ok(None);
        };
        if let Ok(item) = raw.parse::<ItemId>() {
            return Ok(Some(item));
        }
        entities
            .resolve(raw)
            .cloned()
            .map(Some)
            .ok_or_else(|| CoreError::InvalidItemId(raw.to_string()))
    }

    /// Build the Field Mapper, validating property and entity overrides.
    pub fn mapper(&self) -> Result<FieldMapper, CoreError> {
        let schema = self.schema()?;
        let entities = self.entity_lookup()?;
        let instance_of = self.instance_of_item(&entities)?;
        Ok(FieldMapper::new(schema, entities, instance_of))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "username": "Bot@import", "shard": {{ "modulus": 8 }}, "entities": {{ "Acme Corp": "Q1001" }} }}"#
        )
        .unwrap();

        let config = ImporterConfig::load(file.path()).unwrap();
        assert_eq!(config.username.as_deref(), Some("Bot@import"));
        assert_eq!(config.shard.modulus, 8);
        assert_eq!(config.shard.first_id, 1);
        assert_eq!(config.top500_url, "https://www.top500.org");
        assert_eq!(config.label_languages, ["en", "es"]);
        assert!(config.mapper().is_ok());
    }

    #[test]
    fn missing_file_errors() {
        let result = ImporterConfig::load(Path::new("/nonexistent/top500-importer.json"));
        assert!(matches!(result, Err(CoreError::ConfigNotFound(_))));
    }

    #[test]
    fn malformed_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            ImporterConfig::load(file.path()),
            Err(CoreError::Json(_))
        ));
    }

    #[test]
    fn instance_of_accepts_label_or_id() {
        let entities = EntityLookup::default();
        let mut config = ImporterConfig::default();
        assert_eq!(
            config.instance_of_item(&entities).unwrap().unwrap().as_str(),
            "Q121117"
        );

        config.instance_of = Some("Q5".into());
        assert_eq!(config.instance_of_item(&entities).unwrap().unwrap().as_str(), "Q5");

        config.instance_of = Some("mainframe".into());
        assert!(config.instance_of_item(&entities).is_err());

        config.instance_of = None;
        assert!(config.instance_of_item(&entities).unwrap().is_none());
    }

    #[test]
    fn bad_property_override_fails_mapper() {
        let mut config = ImporterConfig::default();
        config.properties.insert("bogus".into(), "P1".into());
        assert!(config.mapper().is_err());
    }
}
