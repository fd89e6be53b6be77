//! Wikibase action API client used to check and write TOP500 claims.

mod client;
mod error;
pub mod json;
mod session;

pub use client::{BotStatus, KnowledgeBase, WikibaseClient};
pub use error::WikibaseError;
pub use session::Session;
