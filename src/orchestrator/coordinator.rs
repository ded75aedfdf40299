//! Harvest coordinator - main per-item orchestration logic
//!
//! This module contains the run loop that coordinates:
//! - Loading the link list snapshot, or producing it once by discovery
//! - Skipping items already in the checkpoint store
//! - Driving each remaining item through resolution and retrieval
//! - Recording every outcome to exactly one of the checkpoint store or failure log
//! - Stopping cleanly on interrupt

use crate::config::Config;
use crate::crawler::{build_http_client, CatalogCrawler, CatalogSelectors, Pacer, PageFetcher};
use crate::output::RunSummary;
use crate::pipeline::ResolutionPipeline;
use crate::retriever::{ResourceRetriever, RetrievalOutcome};
use crate::state::ItemState;
use crate::storage::{build_snapshot, load_snapshot, write_snapshot, LineLog};
use crate::{ConfigError, HarvestError};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// How one attempted item ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Downloaded,
    AlreadyPresent,
    Failed,
}

/// Main harvest coordinator
pub struct Orchestrator {
    config: Arc<Config>,
    selectors: CatalogSelectors,
    fetcher: PageFetcher,
    retriever: ResourceRetriever,
    checkpoint: LineLog,
    failures: LineLog,
    rediscover: bool,
}

impl Orchestrator {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `rediscover` - Re-crawl the catalog even if a link list exists
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Selectors compiled, client built, state files opened
    /// * `Err(HarvestError)` - Failed to initialize
    pub fn new(config: Config, rediscover: bool) -> Result<Self, HarvestError> {
        let selectors = CatalogSelectors::compile(&config.catalog)?;

        let client = build_http_client(&config.http)?;
        let pacer = Arc::new(Pacer::from_millis(config.http.request_delay_ms));
        let fetcher =
            PageFetcher::with_client(client.clone(), Arc::clone(&pacer), &config.http)?;
        let retriever = ResourceRetriever::new(
            client,
            pacer,
            &config.output.download_dir,
            Duration::from_secs(config.http.download_timeout_secs),
        )
        .with_fallback_name(config.catalog.unknown_title.clone())
        .with_progress_bar(config.output.progress_bar);

        if !Path::new(&config.output.download_dir).exists() {
            std::fs::create_dir_all(&config.output.download_dir)?;
            tracing::info!("Created download directory {}", config.output.download_dir);
        }

        let checkpoint = LineLog::open(&config.output.checkpoint_path)?;
        let failures = LineLog::open(&config.output.failure_log_path)?;

        Ok(Self {
            config: Arc::new(config),
            selectors,
            fetcher,
            retriever,
            checkpoint,
            failures,
            rediscover,
        })
    }

    /// Runs until every item has been processed
    pub async fn run(&self) -> Result<RunSummary, HarvestError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs until every item has been processed or `shutdown` completes
    ///
    /// On shutdown the in-flight item is abandoned: nothing is recorded for
    /// it and any partially written file is removed, so the next run simply
    /// retries it.
    ///
    /// # Errors
    ///
    /// Only failures that threaten resumability abort the run: persistence
    /// errors and an unwritable link list. Per-item failures go to the
    /// failure log and the run continues.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<RunSummary, HarvestError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = RunSummary::default();

        let items = tokio::select! {
            items = self.load_or_discover() => items?,
            () = &mut shutdown => {
                tracing::warn!("Interrupted during discovery; link list not written");
                summary.interrupted = true;
                return Ok(summary);
            }
        };

        summary.total = items.len();
        if items.is_empty() {
            tracing::warn!("No items found, nothing to do");
            return Ok(summary);
        }

        let completed = self.checkpoint.load()?;
        tracing::info!(
            "Starting run: {} items, {} already completed",
            items.len(),
            items.iter().filter(|item| completed.contains(*item)).count()
        );

        for (index, item) in items.iter().enumerate() {
            tracing::info!("--- [{}/{}] {} ---", index + 1, summary.total, item);

            if completed.contains(item) {
                tracing::debug!("Already completed, skipping");
                summary.skipped += 1;
                continue;
            }

            let outcome = tokio::select! {
                outcome = self.process_item(item) => outcome?,
                () = &mut shutdown => {
                    tracing::warn!("Interrupted while processing {}", item);
                    summary.interrupted = true;
                    break;
                }
            };

            summary.attempted += 1;
            match outcome {
                ItemOutcome::Downloaded => summary.downloaded += 1,
                ItemOutcome::AlreadyPresent => summary.already_present += 1,
                ItemOutcome::Failed => summary.failed += 1,
            }
        }

        tracing::info!(
            "Run finished: {} attempted, {} completed, {} failed, {} skipped",
            summary.attempted,
            summary.completed(),
            summary.failed,
            summary.skipped
        );

        Ok(summary)
    }

    /// Loads the link list, running discovery first if there is none
    ///
    /// An empty discovery result is not persisted, so a catalog outage does
    /// not leave behind a link list that would make every later run a no-op.
    pub async fn load_or_discover(&self) -> Result<Vec<String>, HarvestError> {
        let path = Path::new(&self.config.output.link_list_path);

        if self.rediscover {
            tracing::info!("Rediscovering items; {} will be replaced", path.display());
        } else if let Some(items) = load_snapshot(path)? {
            tracing::info!("Loaded {} item references from {}", items.len(), path.display());
            return Ok(items);
        } else {
            tracing::info!("No link list at {}, discovering items", path.display());
        }

        let roots = self.roots()?;
        let crawler = CatalogCrawler::new(&self.fetcher, &self.selectors)
            .with_href_fragments(self.config.catalog.item_href_contains.clone());
        let items = build_snapshot(crawler.discover(&roots).await);

        if items.is_empty() {
            tracing::warn!("Discovery found no items; link list not written");
            return Ok(items);
        }

        write_snapshot(path, &items)?;
        tracing::info!(
            "Saved {} unique item references to {}",
            items.len(),
            path.display()
        );

        Ok(items)
    }

    fn roots(&self) -> Result<Vec<Url>, HarvestError> {
        self.config
            .catalog
            .roots
            .iter()
            .map(|root| {
                Url::parse(root).map_err(|e| {
                    HarvestError::from(ConfigError::InvalidUrl(format!(
                        "Invalid root URL '{}': {}",
                        root, e
                    )))
                })
            })
            .collect()
    }

    /// Resolves and retrieves one item, then records the outcome
    async fn process_item(&self, item: &str) -> Result<ItemOutcome, HarvestError> {
        let pipeline = ResolutionPipeline::new(
            &self.fetcher,
            &self.selectors,
            &self.config.catalog.unknown_title,
        );

        let state = ItemState::Pending.transition(ItemState::Resolving)?;
        let resource = match pipeline.resolve(item).await {
            Ok(resource) => resource,
            Err(failure) => {
                tracing::warn!("  [!] {}", failure);
                return self.record_failure(state, item, None);
            }
        };

        let state = state.transition(ItemState::Retrieving)?;
        match self.retriever.retrieve(&resource).await {
            RetrievalOutcome::Downloaded { .. } => {
                self.record_completion(state, item)?;
                Ok(ItemOutcome::Downloaded)
            }
            RetrievalOutcome::AlreadyPresent(_) => {
                self.record_completion(state, item)?;
                Ok(ItemOutcome::AlreadyPresent)
            }
            RetrievalOutcome::Failed(e) => {
                tracing::warn!("  [!] Download failed: {}", e);
                self.record_failure(state, item, Some(resource.resource_url.as_str()))
            }
        }
    }

    fn record_completion(&self, state: ItemState, item: &str) -> Result<(), HarvestError> {
        let state = state.transition(ItemState::Completed)?;
        self.checkpoint.append(item)?;
        tracing::debug!("{} is {}", item, state);
        Ok(())
    }

    /// Appends the failed resource address (if resolution got that far) and the item
    fn record_failure(
        &self,
        state: ItemState,
        item: &str,
        resource_url: Option<&str>,
    ) -> Result<ItemOutcome, HarvestError> {
        let state = state.transition(ItemState::Failed)?;
        if let Some(url) = resource_url {
            self.failures.append(url)?;
        }
        self.failures.append(item)?;
        tracing::info!(
            "  [!] {} is {}, recorded in {}",
            item,
            state,
            self.failures.path().display()
        );
        Ok(ItemOutcome::Failed)
    }
}
