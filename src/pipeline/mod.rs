//! Resolution pipeline
//!
//! Turns an item reference into a retrievable resource address by walking
//! three dependent landing pages:
//!
//! 1. Intro page: item title and the download entry link
//! 2. Info page: the download trigger link
//! 3. Trigger page: the final resource address
//! 4. Handoff of `(address, title)` to the retriever
//!
//! The pipeline never retries. A failed item is retried by a later run, since
//! nothing is checkpointed for it.

mod stage;

pub use stage::{ResolutionFailure, ResolutionState, ResolvedResource, Stage};

use crate::crawler::{first_link, first_text, CatalogSelectors, FetchedPage, PageFetcher};
use crate::PageError;
use scraper::Html;
use url::Url;

/// Drives one item through the resolution state machine
pub struct ResolutionPipeline<'a> {
    fetcher: &'a PageFetcher,
    selectors: &'a CatalogSelectors,
    unknown_title: &'a str,
}

impl<'a> ResolutionPipeline<'a> {
    /// Creates a pipeline
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Page fetcher; its pacer spaces out the stage requests
    /// * `selectors` - Compiled catalog selectors
    /// * `unknown_title` - Display name used when the intro page has no title
    pub fn new(
        fetcher: &'a PageFetcher,
        selectors: &'a CatalogSelectors,
        unknown_title: &'a str,
    ) -> Self {
        Self {
            fetcher,
            selectors,
            unknown_title,
        }
    }

    /// Resolves an item reference to its final resource
    ///
    /// # Returns
    ///
    /// * `Ok(ResolvedResource)` - Final address and display name
    /// * `Err(ResolutionFailure)` - The stage that failed and why
    pub async fn resolve(&self, item: &str) -> Result<ResolvedResource, ResolutionFailure> {
        let mut state = ResolutionState::start(item);
        loop {
            state = match state {
                ResolutionState::Resolved(resource) => return Ok(resource),
                pending => self.advance(pending).await?,
            };
        }
    }

    /// Runs the stage the given state is waiting on
    pub async fn advance(
        &self,
        state: ResolutionState,
    ) -> Result<ResolutionState, ResolutionFailure> {
        match state {
            ResolutionState::Intro { item } => {
                let url = Url::parse(&item).map_err(|e| {
                    ResolutionFailure::new(
                        Stage::Intro,
                        PageError::Unreachable {
                            url: item.clone(),
                            reason: format!("Invalid item address: {}", e),
                        },
                    )
                })?;

                tracing::info!(
                    "  [{}/{}] Visiting intro page: {}",
                    Stage::Intro.position(),
                    Stage::STEPS,
                    url
                );
                let page = self.fetch(Stage::Intro, &url).await?;

                let (title, entry) = {
                    let document = Html::parse_document(&page.body);
                    (
                        first_text(&document, &self.selectors.title),
                        first_link(&document, &page.url, &self.selectors.entry),
                    )
                };

                let entry = entry.ok_or_else(|| missing(Stage::Intro, &page, "download entry link"))?;
                let display_name = match title {
                    Some(title) => title,
                    None => {
                        tracing::warn!("  No title on {}, using '{}'", page.url, self.unknown_title);
                        self.unknown_title.to_string()
                    }
                };
                tracing::info!("  [+] Title: '{}'", display_name);

                Ok(ResolutionState::Info {
                    item,
                    entry,
                    display_name,
                })
            }

            ResolutionState::Info {
                item,
                entry,
                display_name,
            } => {
                tracing::info!(
                    "  [{}/{}] Visiting download info page: {}",
                    Stage::Info.position(),
                    Stage::STEPS,
                    entry
                );
                let page = self.fetch(Stage::Info, &entry).await?;
                let trigger = self
                    .select_link(&page, &self.selectors.trigger)
                    .ok_or_else(|| missing(Stage::Info, &page, "trigger link"))?;

                Ok(ResolutionState::Trigger {
                    item,
                    trigger,
                    display_name,
                })
            }

            ResolutionState::Trigger {
                item,
                trigger,
                display_name,
            } => {
                tracing::info!(
                    "  [{}/{}] Reading download trigger page: {}",
                    Stage::Trigger.position(),
                    Stage::STEPS,
                    trigger
                );
                let page = self.fetch(Stage::Trigger, &trigger).await?;
                let resource_url = self
                    .select_link(&page, &self.selectors.resource)
                    .ok_or_else(|| missing(Stage::Trigger, &page, "resource link"))?;
                tracing::info!("  [+] Resource address: {}", resource_url);

                Ok(ResolutionState::Resolved(ResolvedResource {
                    item,
                    resource_url,
                    display_name,
                }))
            }

            resolved @ ResolutionState::Resolved(_) => Ok(resolved),
        }
    }

    async fn fetch(&self, stage: Stage, url: &Url) -> Result<FetchedPage, ResolutionFailure> {
        self.fetcher
            .fetch(url)
            .await
            .map_err(|error| ResolutionFailure::new(stage, error))
    }

    fn select_link(&self, page: &FetchedPage, selector: &scraper::Selector) -> Option<Url> {
        let document = Html::parse_document(&page.body);
        first_link(&document, &page.url, selector)
    }
}

fn missing(stage: Stage, page: &FetchedPage, element: &'static str) -> ResolutionFailure {
    ResolutionFailure::new(
        stage,
        PageError::ExtractionMissing {
            url: page.url.to_string(),
            element,
        },
    )
}
