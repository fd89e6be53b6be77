//! Import pipeline: fetch → parse → map → per-property check → write.

use thiserror::Error;
use top500_core::{Claim, FieldMapper, ItemId, Property, Record, SystemId, claim::group_by_property};
use top500_scrape::{FetchError, PageSource, ParseError, parse_record};
use top500_store::{ShardCoordinator, ShardStore};
use top500_wikibase::{KnowledgeBase, WikibaseError};
use tracing::{debug, error, info, warn};

const END_OF_LIST: &str = "<!-- End List -->";

#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("could not resolve target item: {0}")]
    Target(#[source] WikibaseError),
}

/// Outcome of writing one record's claims.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Claims left out because their existence check errored.
    pub unchecked: usize,
}

impl WriteSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Every claim was either written or confirmed present.
    pub fn is_complete(&self) -> bool {
        self.is_clean() && self.unchecked == 0
    }

    fn add(&mut self, other: &WriteSummary) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.unchecked += other.unchecked;
    }
}

/// Totals over a mass run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MassReport {
    pub imported: usize,
    pub already_done: usize,
    pub not_found: usize,
    pub failed: usize,
    pub claims: WriteSummary,
}

/// Mass-mode settings for items that do not exist yet.
#[derive(Debug, Clone, Default)]
pub struct MassOptions {
    pub label_languages: Vec<String>,
    pub log_page: Option<String>,
}

pub struct Importer<'a> {
    source: &'a dyn PageSource,
    kb: &'a dyn KnowledgeBase,
    mapper: &'a FieldMapper,
}

impl<'a> Importer<'a> {
    pub fn new(source: &'a dyn PageSource, kb: &'a dyn KnowledgeBase, mapper: &'a FieldMapper) -> Self {
        Self { source, kb, mapper }
    }

    /// Import system `id` into the given `item`.
    pub async fn import_one(&self, id: SystemId, item: &ItemId) -> Result<WriteSummary, ImportError> {
        let record = self.load_record(id, None).await?;
        let summary = self.write_claims(item, self.mapper.map(&record)).await;
        info!(
            id = %id,
            item = %item,
            written = summary.written,
            skipped = summary.skipped,
            failed = summary.failed,
            unchecked = summary.unchecked,
            "import finished"
        );
        Ok(summary)
    }

    /// Write `claims` to `item`, checking each property once before its
    /// group is written. A property that is already set, or whose check
    /// fails, is left out as a whole.
    pub async fn write_claims(&self, item: &ItemId, claims: Vec<Claim>) -> WriteSummary {
        let mut summary = WriteSummary::default();
        for (property, group) in group_by_property(claims) {
            match self.kb.has_claim(item, &property).await {
                Ok(false) => {}
                Ok(true) => {
                    debug!(item = %item, property = %property, "already set, skipping");
                    summary.skipped += group.len();
                    continue;
                }
                Err(e) => {
                    warn!(item = %item, property = %property, error = %e, "existence check failed, skipping");
                    summary.unchecked += group.len();
                    continue;
                }
            }
            for claim in &group {
                match self.kb.write_claim(item, claim).await {
                    Ok(()) => summary.written += 1,
                    Err(e) => {
                        error!(item = %item, property = %property, error = %e, "claim write failed");
                        summary.failed += 1;
                    }
                }
            }
        }
        summary
    }

    /// Process every id of the coordinator's shard that is not marked done.
    ///
    /// An id is marked once every claim is written or already present, or
    /// the page does not exist; anything else leaves it for the next run.
    pub async fn run_mass(&self, coordinator: &ShardCoordinator, options: &MassOptions) -> MassReport {
        let mut report = MassReport::default();
        let plan = coordinator.plan();
        info!(modulus = plan.modulus(), offset = plan.offset(), "mass import started");

        for id in coordinator.assigned() {
            if !coordinator.is_pending(id).await {
                report.already_done += 1;
                continue;
            }
            match self.import_mass_one(id, coordinator.store(), options).await {
                Ok(summary) => {
                    report.claims.add(&summary);
                    if summary.is_complete() {
                        report.imported += 1;
                        coordinator.mark_done(id).await;
                    } else {
                        report.failed += 1;
                    }
                }
                Err(ImportError::Fetch(FetchError::NotFound(_))) => {
                    debug!(id = %id, "no such system");
                    report.not_found += 1;
                    coordinator.mark_done(id).await;
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "import failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            imported = report.imported,
            already_done = report.already_done,
            not_found = report.not_found,
            failed = report.failed,
            written = report.claims.written,
            unchecked = report.claims.unchecked,
            "mass import finished"
        );
        report
    }

    async fn import_mass_one(
        &self,
        id: SystemId,
        store: &dyn ShardStore,
        options: &MassOptions,
    ) -> Result<WriteSummary, ImportError> {
        let record = self.load_record(id, Some(store)).await?;
        let item = self
            .resolve_target(&record, options)
            .await
            .map_err(ImportError::Target)?;
        Ok(self.write_claims(&item, self.mapper.map(&record)).await)
    }

    /// Record from the cache when present, otherwise fetched, parsed and cached.
    async fn load_record(&self, id: SystemId, cache: Option<&dyn ShardStore>) -> Result<Record, ImportError> {
        if let Some(store) = cache {
            match store.cached_record(id).await {
                Ok(Some(record)) => {
                    debug!(id = %id, "record from cache");
                    return Ok(record);
                }
                Ok(None) => {}
                Err(e) => debug!(id = %id, error = %e, "record cache unavailable"),
            }
        }

        let html = self.source.fetch_page(id).await?;
        let record = parse_record(id, &html)?;

        if let Some(store) = cache {
            if let Err(e) = store.cache_record(&record).await {
                debug!(id = %id, error = %e, "could not cache record");
            }
        }
        Ok(record)
    }

    /// Item already carrying this system's TOP500 id, or a new labelled item.
    async fn resolve_target(&self, record: &Record, options: &MassOptions) -> Result<ItemId, WikibaseError> {
        let top500_id = self.mapper.schema().id(Property::Top500Id);
        if let Some(item) = self.kb.find_item(top500_id, &record.id.to_string()).await? {
            debug!(id = %record.id, item = %item, "existing item");
            return Ok(item);
        }

        let labels: Vec<(String, String)> = options
            .label_languages
            .iter()
            .map(|lang| (lang.clone(), record.name.clone()))
            .collect();
        let item = self.kb.create_item(&labels).await?;
        info!(id = %record.id, item = %item, name = %record.name, "created item");

        if let Some(page) = &options.log_page {
            let summary = format!("Item [[{item}]] created for TOP500 system {}", record.id);
            if let Err(e) = self.log_item(page, &item, &summary).await {
                warn!(page = %page, item = %item, error = %e, "could not update log page");
            }
        }
        Ok(item)
    }

    async fn log_item(&self, page: &str, item: &ItemId, summary: &str) -> Result<(), WikibaseError> {
        let existing = self.kb.page_text(page).await?.unwrap_or_default();
        self.kb.set_page_text(page, &log_page_text(&existing, item), summary).await
    }
}

/// `existing` with `* {{q|item}}` added as the last entry before the
/// end-of-list marker. The marker is appended when missing.
fn log_page_text(existing: &str, item: &ItemId) -> String {
    let mut text = existing.replace(END_OF_LIST, "").trim_end().to_string();
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(&format!("* {{{{q|{item}}}}}\n{END_OF_LIST}\n"));
    text
}
