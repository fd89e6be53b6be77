mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, ArgGroup, Parser};
use top500_core::config::DEFAULT_CONFIG_NAME;
use top500_core::{ImporterConfig, ItemId, SystemId};
use top500_scrape::Top500Fetcher;
use top500_store::{MemoryStore, RedisStore, ShardCoordinator, ShardPlan, ShardStore};
use top500_wikibase::{BotStatus, Session, WikibaseClient};
use tracing::{error, info, warn};

use crate::pipeline::{Importer, MassOptions};

#[derive(Parser, Debug)]
#[command(name = "top500-importer", version, about = "Import TOP500 supercomputer data into Wikibase")]
#[command(group(ArgGroup::new("mode").required(true).args(["item", "mass"])))]
struct Cli {
    /// Target item for a single import.
    #[arg(short = 'i', long, value_name = "ITEM", requires = "top500_id")]
    item: Option<String>,

    /// TOP500 system id for a single import.
    #[arg(short = 't', long = "top500-id", value_name = "ID", requires = "item")]
    top500_id: Option<String>,

    /// Process every id assigned to this shard offset.
    #[arg(long, value_name = "OFFSET")]
    mass: Option<u32>,

    /// Number of shards; overrides `shard.modulus` from the config.
    #[arg(long, value_name = "MODULUS", requires = "mass")]
    shards: Option<u32>,

    #[arg(long, env = "TOP500_CONFIG", default_value = DEFAULT_CONFIG_NAME)]
    config: PathBuf,

    #[arg(long, env = "TOP500_BOT_USER")]
    user: Option<String>,

    #[arg(long, env = "TOP500_BOT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Coordination store, e.g. `redis://localhost:6379/0`.
    #[arg(long, env = "TOP500_REDIS_URL")]
    redis: Option<String>,

    /// -v for debug output, -vv for trace.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

enum Mode {
    Single { id: SystemId, item: ItemId },
    Mass { offset: u32 },
}

impl Cli {
    fn mode(&self) -> anyhow::Result<Mode> {
        match (&self.item, &self.top500_id, self.mass) {
            (Some(item), Some(id), None) => Ok(Mode::Single {
                id: id.parse().context("invalid TOP500 id")?,
                item: item.parse().context("invalid target item")?,
            }),
            (None, None, Some(offset)) => Ok(Mode::Mass { offset }),
            _ => anyhow::bail!("use either -i/-t or --mass"),
        }
    }

    fn apply(&self, config: &mut ImporterConfig) {
        if let Some(user) = &self.user {
            config.username = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if let Some(url) = &self.redis {
            config.redis_url = Some(url.clone());
        }
        if let Some(modulus) = self.shards {
            config.shard.modulus = modulus;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    info!("top500-importer v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// Errors returned here are configuration or login failures; import
/// failures are reported through the exit code.
async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mode = cli.mode()?;
    let mut config = ImporterConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cli.apply(&mut config);
    let mapper = config.mapper().context("invalid configuration")?;

    let username = config.username.as_deref().context("no bot username configured")?;
    let password = config.password.as_deref().context("no bot password configured")?;
    let mut session = Session::new(&config.api_url).context("building HTTP client")?;
    session.login(username, password).await.context("login failed")?;

    let fetcher = Top500Fetcher::new(session.http(), &config.top500_url);
    let mut kb = WikibaseClient::new(session, &config.concept_uri, config.edit_summary.clone());
    set_status(&kb, &config, BotStatus::Running).await;

    let outcome = match mode {
        Mode::Single { id, item } => {
            let importer = Importer::new(&fetcher, &kb, &mapper);
            match importer.import_one(id, &item).await {
                Ok(summary) if summary.is_clean() => Ok(true),
                Ok(summary) => {
                    error!(id = %id, item = %item, failed = summary.failed, "some claims were not written");
                    Ok(false)
                }
                Err(e) => {
                    error!(id = %id, item = %item, error = %e, "import failed");
                    Ok(false)
                }
            }
        }
        Mode::Mass { offset } => run_mass(&fetcher, &kb, &mapper, &config, offset).await,
    };

    let status = match outcome {
        Ok(true) => BotStatus::Stopped,
        _ => BotStatus::Error,
    };
    set_status(&kb, &config, status).await;
    if let Err(e) = kb.logout().await {
        warn!(error = %e, "logout failed");
    }
    outcome.map(|ok| if ok { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

async fn run_mass(
    fetcher: &Top500Fetcher,
    kb: &WikibaseClient,
    mapper: &top500_core::FieldMapper,
    config: &ImporterConfig,
    offset: u32,
) -> anyhow::Result<bool> {
    let shard = &config.shard;
    let plan = ShardPlan::new(shard.modulus, offset, shard.first_id, shard.last_id)
        .context("invalid shard settings")?;
    let store = open_store(config.redis_url.as_deref()).await;
    let coordinator = ShardCoordinator::new(plan, store);
    let options = MassOptions {
        label_languages: config.label_languages.clone(),
        log_page: config.log_page.clone(),
    };

    Importer::new(fetcher, kb, mapper)
        .run_mass(&coordinator, &options)
        .await;
    Ok(true)
}

/// Redis when configured and reachable, otherwise a process-local store.
async fn open_store(url: Option<&str>) -> Arc<dyn ShardStore> {
    let Some(url) = url else {
        return Arc::new(MemoryStore::new());
    };
    match RedisStore::connect(url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(url, error = %e, "coordination store unavailable, continuing without it");
            Arc::new(MemoryStore::new())
        }
    }
}

async fn set_status(kb: &WikibaseClient, config: &ImporterConfig, status: BotStatus) {
    let Some(page) = config.status_page.as_deref() else {
        return;
    };
    if let Err(e) = kb.set_status(page, status).await {
        warn!(page, status = %status, error = %e, "could not update status page");
    }
}
