use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use top500_core::{Claim, ItemId, PropertyId};
use tracing::{debug, info};

use crate::json::{self, Encoder};
use crate::{Session, WikibaseError};

/// The knowledge-base operations the importer needs.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Whether `item` already has at least one statement for `property`.
    async fn has_claim(&self, item: &ItemId, property: &PropertyId) -> Result<bool, WikibaseError>;

    /// Add one statement, qualifiers included. Single attempt.
    async fn write_claim(&self, item: &ItemId, claim: &Claim) -> Result<(), WikibaseError>;

    /// First item with a `property` statement equal to `value`.
    async fn find_item(&self, property: &PropertyId, value: &str) -> Result<Option<ItemId>, WikibaseError>;

    /// New item with the given `(language, label)` pairs.
    async fn create_item(&self, labels: &[(String, String)]) -> Result<ItemId, WikibaseError>;

    /// Current wikitext of `title`, `None` when the page does not exist.
    async fn page_text(&self, title: &str) -> Result<Option<String>, WikibaseError>;

    async fn set_page_text(&self, title: &str, text: &str, summary: &str) -> Result<(), WikibaseError>;
}

/// Bot state written to the status page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStatus {
    Running,
    Stopped,
    Error,
}

impl BotStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// [`KnowledgeBase`] over the Wikibase action API.
pub struct WikibaseClient {
    session: Session,
    encoder: Encoder,
    summary: String,
}

impl WikibaseClient {
    pub fn new(session: Session, concept_uri: &str, summary: impl Into<String>) -> Self {
        Self {
            session,
            encoder: Encoder::new(concept_uri),
            summary: summary.into(),
        }
    }

    pub async fn logout(&mut self) -> Result<(), WikibaseError> {
        self.session.logout().await
    }

    pub async fn set_status(&self, page: &str, status: BotStatus) -> Result<(), WikibaseError> {
        let summary = format!("update bot status: {status}");
        self.set_page_text(page, status.as_str(), &summary).await
    }
}

#[async_trait]
impl KnowledgeBase for WikibaseClient {
    async fn has_claim(&self, item: &ItemId, property: &PropertyId) -> Result<bool, WikibaseError> {
        let body = self
            .session
            .get(&[
                ("action", "wbgetclaims"),
                ("entity", item.as_str()),
                ("property", property.as_str()),
            ])
            .await?;
        let exists = claims_present(&body, property)?;
        debug!(item = %item, property = %property, exists, "existence check");
        Ok(exists)
    }

    async fn write_claim(&self, item: &ItemId, claim: &Claim) -> Result<(), WikibaseError> {
        let guid = json::statement_guid(item);
        let statement = serde_json::to_string(&self.encoder.statement(&guid, claim))?;
        self.session
            .post_with_token(&[
                ("action", "wbsetclaim"),
                ("claim", statement.as_str()),
                ("summary", self.summary.as_str()),
                ("bot", "1"),
            ])
            .await?;
        info!(item = %item, property = %claim.property, guid = %guid, "claim written");
        Ok(())
    }

    async fn find_item(&self, property: &PropertyId, value: &str) -> Result<Option<ItemId>, WikibaseError> {
        let query = format!("haswbstatement:{property}={value}");
        let body = self
            .session
            .get(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query.as_str()),
                ("srlimit", "1"),
            ])
            .await?;
        first_search_hit(&body)
    }

    async fn create_item(&self, labels: &[(String, String)]) -> Result<ItemId, WikibaseError> {
        let data = serde_json::to_string(&serde_json::json!({ "labels": json::labels(labels) }))?;
        let body = self
            .session
            .post_with_token(&[
                ("action", "wbeditentity"),
                ("new", "item"),
                ("data", data.as_str()),
                ("summary", self.summary.as_str()),
                ("bot", "1"),
            ])
            .await?;
        let id = body["entity"]["id"]
            .as_str()
            .ok_or_else(|| WikibaseError::UnexpectedResponse("wbeditentity returned no entity id".into()))?;
        let item = parse_item(id)?;
        info!(item = %item, "item created");
        Ok(item)
    }

    async fn page_text(&self, title: &str) -> Result<Option<String>, WikibaseError> {
        let body = self
            .session
            .get(&[
                ("action", "query"),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("titles", title),
            ])
            .await?;
        page_content(&body)
    }

    async fn set_page_text(&self, title: &str, text: &str, summary: &str) -> Result<(), WikibaseError> {
        self.session
            .post_with_token(&[
                ("action", "edit"),
                ("title", title),
                ("text", text),
                ("summary", summary),
                ("minor", "1"),
                ("bot", "1"),
            ])
            .await?;
        Ok(())
    }
}

fn parse_item(raw: &str) -> Result<ItemId, WikibaseError> {
    raw.parse()
        .map_err(|_| WikibaseError::UnexpectedResponse(format!("not an item id: {raw}")))
}

/// `wbgetclaims` body → whether any statement exists for `property`.
fn claims_present(body: &Value, property: &PropertyId) -> Result<bool, WikibaseError> {
    let claims = body
        .get("claims")
        .ok_or_else(|| WikibaseError::UnexpectedResponse("wbgetclaims returned no claims".into()))?;
    Ok(claims
        .get(property.as_str())
        .and_then(Value::as_array)
        .is_some_and(|statements| !statements.is_empty()))
}

/// `prop=revisions` body (formatversion 2) → main slot wikitext.
fn page_content(body: &Value) -> Result<Option<String>, WikibaseError> {
    let page = body["query"]["pages"]
        .as_array()
        .and_then(|pages| pages.first())
        .ok_or_else(|| WikibaseError::UnexpectedResponse("query returned no pages".into()))?;
    if page["missing"].as_bool().unwrap_or(false) {
        return Ok(None);
    }
    page["revisions"][0]["slots"]["main"]["content"]
        .as_str()
        .map(|text| Some(text.to_string()))
        .ok_or_else(|| WikibaseError::UnexpectedResponse("revision without content".into()))
}

/// Search hit titles are `Q42` on Wikidata and `Item:Q42` on instances that
/// keep items in a named namespace.
fn first_search_hit(body: &Value) -> Result<Option<ItemId>, WikibaseError> {
    let Some(hit) = body["query"]["search"].as_array().and_then(|hits| hits.first()) else {
        return Ok(None);
    };
    let title = hit["title"]
        .as_str()
        .ok_or_else(|| WikibaseError::UnexpectedResponse("search hit without title".into()))?;
    let id = title.rsplit_once(':').map_or(title, |(_, id)| id);
    parse_item(id).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pid(s: &str) -> PropertyId {
        s.parse().unwrap()
    }

    #[test]
    fn claims_present_checks_requested_property() {
        let body = json!({ "claims": { "P176": [ { "id": "Q999$a" } ] } });
        assert!(claims_present(&body, &pid("P176")).unwrap());
        assert!(!claims_present(&body, &pid("P2148")).unwrap());
        assert!(!claims_present(&json!({ "claims": { "P176": [] } }), &pid("P176")).unwrap());
        assert!(!claims_present(&json!({ "claims": [] }), &pid("P176")).unwrap());
    }

    #[test]
    fn claims_missing_is_an_error() {
        assert!(matches!(
            claims_present(&json!({}), &pid("P176")),
            Err(WikibaseError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn search_hit_with_namespace() {
        let body = json!({ "query": { "search": [ { "ns": 120, "title": "Item:Q1234" } ] } });
        assert_eq!(first_search_hit(&body).unwrap().unwrap().as_str(), "Q1234");

        let body = json!({ "query": { "search": [ { "ns": 0, "title": "Q77" } ] } });
        assert_eq!(first_search_hit(&body).unwrap().unwrap().as_str(), "Q77");
    }

    #[test]
    fn no_search_hits() {
        let body = json!({ "query": { "search": [] } });
        assert!(first_search_hit(&body).unwrap().is_none());
    }

    #[test]
    fn search_hit_that_is_not_an_item() {
        let body = json!({ "query": { "search": [ { "title": "Talk:Frontier" } ] } });
        assert!(first_search_hit(&body).is_err());
    }

    #[test]
    fn page_content_reads_main_slot() {
        let body = json!({ "query": { "pages": [ {
            "title": "User:Bot/Log",
            "revisions": [ { "slots": { "main": { "content": "* {{q|Q1}}\n<!-- End List -->\n" } } } ]
        } ] } });
        assert_eq!(
            page_content(&body).unwrap().as_deref(),
            Some("* {{q|Q1}}\n<!-- End List -->\n")
        );
    }

    #[test]
    fn missing_page_has_no_content() {
        let body = json!({ "query": { "pages": [ { "title": "User:Bot/Log", "missing": true } ] } });
        assert!(page_content(&body).unwrap().is_none());
        assert!(page_content(&json!({ "query": {} })).is_err());
    }

    #[test]
    fn status_strings() {
        assert_eq!(BotStatus::Running.to_string(), "running");
        assert_eq!(BotStatus::Stopped.as_str(), "stopped");
        assert_eq!(BotStatus::Error.as_str(), "error");
    }
}
