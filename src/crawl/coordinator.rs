//! Crawl coordination - the main loop
//!
//! The coordinator owns the frontier, the visited set for the current run
//! and the injected collaborators (fetcher, locator, store). Each
//! iteration pops one URL and either clears its flag without fetching,
//! scrapes it, or - on an empty frontier - reseeds from the store. The
//! loop is bounded by an iteration cap so a run always terminates; a run
//! that hits the cap resumes from the persisted frontier next time.

use crate::config::Config;
use crate::crawl::fetcher::{courtesy_delay, Fetcher};
use crate::crawl::frontier::Frontier;
use crate::crawl::{policy, reseed::reseed};
use crate::rank::{self, RankTable};
use crate::store::Store;
use crate::tree::{self, TaxonId, TreeLocator};
use crate::CrawlError;
use scraper::Html;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Reseeding found nothing left to explore
    Converged,

    /// The iteration cap was reached; resume on the next invocation
    IterationCap,

    /// A shutdown was requested between iterations
    ShutdownRequested,
}

/// Outcome of a completed (non-fatal) run
#[derive(Debug)]
pub struct CrawlSummary {
    pub pages_fetched: u64,
    pub taxa_merged: u64,
    pub iterations: u32,
    pub reason: StopReason,
}

/// Main crawler coordinator
pub struct Coordinator<F, L, S> {
    config: Config,
    fetcher: F,
    locator: L,
    store: S,
    ranks: RankTable,
    frontier: Frontier,
    visited: HashSet<String>,
    in_flight: Option<String>,
    shutdown: Arc<AtomicBool>,
}

impl<F, L, S> Coordinator<F, L, S>
where
    F: Fetcher,
    L: TreeLocator,
    S: Store,
{
    /// Creates a coordinator, loading the persisted frontier
    ///
    /// An empty frontier is seeded with the configured root taxon's tree
    /// URL.
    pub fn new(config: Config, fetcher: F, locator: L, store: S) -> crate::Result<Self> {
        let mut frontier = Frontier::load(&config.output.queue_path)?;

        if frontier.is_empty() {
            let seed = crate::url::tree_url(&config.site.base_url, config.site.seed_taxon_id);
            tracing::info!(%seed, "frontier empty, seeding");
            frontier.push(seed);
        } else {
            tracing::info!(urls = frontier.len(), "resuming persisted frontier");
        }

        Ok(Self {
            config,
            fetcher,
            locator,
            store,
            ranks: RankTable::biolib(),
            frontier,
            visited: HashSet::new(),
            in_flight: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that pauses the run at the next iteration boundary
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Read access to the store, mainly for inspection after a run
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the crawl loop until convergence, the iteration cap, a
    /// shutdown request or a fatal error
    ///
    /// The frontier is written back to its queue file on every exit path,
    /// the in-flight URL included, so an aborted run resumes from the
    /// same point.
    pub async fn run(&mut self) -> crate::Result<CrawlSummary> {
        let outcome = self.drive().await;
        let flushed = self.frontier.persist(self.in_flight.as_deref());

        let summary = outcome?;
        flushed?;
        Ok(summary)
    }

    async fn drive(&mut self) -> crate::Result<CrawlSummary> {
        let mut pages_fetched = 0u64;
        let mut taxa_merged = 0u64;
        let max_iterations = self.config.crawler.max_iterations;

        for iteration in 0..max_iterations {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown requested, pausing crawl");
                return Ok(CrawlSummary {
                    pages_fetched,
                    taxa_merged,
                    iterations: iteration,
                    reason: StopReason::ShutdownRequested,
                });
            }

            let Some(url) = self.frontier.pop() else {
                let added = reseed(&self.store, &mut self.frontier, &self.config.site.base_url)?;
                tracing::info!(added, "reseeded frontier from store");
                if added == 0 {
                    return Ok(CrawlSummary {
                        pages_fetched,
                        taxa_merged,
                        iterations: iteration,
                        reason: StopReason::Converged,
                    });
                }
                continue;
            };

            if self.visited.contains(&url) {
                tracing::debug!(%url, "already visited this run");
                self.clear_flag(&url)?;
                continue;
            }
            if !policy::should_visit(&url, &self.store)? {
                tracing::debug!(%url, "already scraped, skipping");
                self.clear_flag(&url)?;
                continue;
            }

            self.in_flight = Some(url.clone());
            courtesy_delay(&self.config.crawler).await;
            taxa_merged += self.scrape(&url).await?;
            pages_fetched += 1;
            self.visited.insert(url);
            self.in_flight = None;
        }

        tracing::info!(max_iterations, "iteration cap reached, pausing crawl");
        Ok(CrawlSummary {
            pages_fetched,
            taxa_merged,
            iterations: max_iterations,
            reason: StopReason::IterationCap,
        })
    }

    /// Fetches and merges one tree page; returns the number of records merged
    async fn scrape(&mut self, url: &str) -> crate::Result<u64> {
        let page_id =
            crate::url::taxon_id(url).ok_or_else(|| CrawlError::NoTaxonId(url.to_string()))?;

        let response = self.fetcher.get(url).await?;
        tracing::info!(%url, status = response.status, "fetched");
        if response.status != 200 {
            return Err(CrawlError::BadStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let doc = Html::parse_document(&response.body);
        let Some(region) = self.locator.tree_region(&doc) else {
            return self.handle_missing_tree(url, page_id);
        };

        let mut merged = 0u64;
        for parsed in tree::taxons(region, Some(page_id), &self.ranks) {
            let (id, mut taxon) = parsed?;
            if id == page_id {
                // The page links to itself; never expand it again
                taxon.to_visit = false;
            }
            if self.store.find(id)?.is_some() {
                // Re-discovery never re-opens exploration
                taxon.to_visit = false;
            }
            self.store.upsert(id, &taxon)?;
            merged += 1;
        }

        if let Some(href) = self.locator.next_page(&doc) {
            let next = crate::url::resolve(&self.config.site.base_url, &href)?;
            tracing::debug!(%next, "following pagination");
            self.frontier.push(next);
        }

        tracing::info!(%url, merged, "page merged");
        Ok(merged)
    }

    /// A page without a tree region: retry once with a widened rank
    /// filter, or mark the node done if this fetch already was the retry
    fn handle_missing_tree(&mut self, url: &str, page_id: TaxonId) -> crate::Result<u64> {
        if crate::url::has_widened_filter(url) {
            tracing::info!(%url, "no tree after widened filter, marking explored");
            self.store.clear_to_visit(page_id)?;
            return Ok(0);
        }

        let level = match self.store.find(page_id)? {
            Some(record) => record.level + rank::WIDEN_OFFSET,
            None => rank::SPECIES_THRESHOLD,
        };
        let widened = crate::url::widened_url(&self.config.site.base_url, page_id, level);
        tracing::info!(%url, %widened, "no tree, retrying with widened filter");
        self.frontier.push(widened);
        Ok(0)
    }

    fn clear_flag(&mut self, url: &str) -> crate::Result<()> {
        let id = crate::url::taxon_id(url).ok_or_else(|| CrawlError::NoTaxonId(url.to_string()))?;
        self.store.clear_to_visit(id)?;
        Ok(())
    }
}

/// Runs a complete crawl with the production collaborators
pub async fn run_crawl(config: Config) -> crate::Result<CrawlSummary> {
    use crate::crawl::fetcher::HttpFetcher;
    use crate::store::SqliteStore;
    use crate::tree::BiolibLocator;
    use std::path::Path;

    let store = SqliteStore::new(Path::new(&config.output.database_path))?;
    let fetcher = HttpFetcher::new(&config.site.user_agent)?;
    let mut coordinator = Coordinator::new(config, fetcher, BiolibLocator, store)?;

    let shutdown = coordinator.shutdown_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing current page");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    let summary = coordinator.run().await?;
    tracing::info!(
        pages = summary.pages_fetched,
        taxa = summary.taxa_merged,
        reason = ?summary.reason,
        "crawl run finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, OutputConfig, SiteConfig};
    use crate::crawl::fetcher::FetchResponse;
    use crate::store::SqliteStore;
    use crate::tree::{BiolibLocator, Taxon};
    use std::collections::HashMap;
    use tempfile::TempDir;

    const BASE: &str = "https://www.biolib.cz";

    /// Serves canned bodies; unknown URLs get a 404
    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
            }
        }
    }

    impl Fetcher for FakeFetcher {
        async fn get(&self, url: &str) -> crate::Result<FetchResponse> {
            match self.pages.get(url) {
                Some(body) => Ok(FetchResponse {
                    status: 200,
                    body: body.clone(),
                }),
                None => Ok(FetchResponse {
                    status: 404,
                    body: String::new(),
                }),
            }
        }
    }

    fn test_config(dir: &TempDir, seed: TaxonId, max_iterations: u32) -> Config {
        Config {
            crawler: CrawlerConfig {
                max_iterations,
                delay_base_ms: 0,
                delay_sigma_ms: 0,
                delay_cap_ms: 0,
            },
            site: SiteConfig {
                base_url: BASE.to_string(),
                seed_taxon_id: seed,
                user_agent: "taxocrawl-test".to_string(),
            },
            output: OutputConfig {
                database_path: dir
                    .path()
                    .join("taxa.db")
                    .to_string_lossy()
                    .into_owned(),
                queue_path: dir
                    .path()
                    .join("queue.txt")
                    .to_string_lossy()
                    .into_owned(),
            },
        }
    }

    fn page(inner: &str) -> String {
        format!(
            r#"<html><body><div class="treeareadiv">{}</div></body></html>"#,
            inner
        )
    }

    fn coordinator(
        dir: &TempDir,
        seed: TaxonId,
        max_iterations: u32,
        pages: &[(&str, &str)],
        store: SqliteStore,
    ) -> Coordinator<FakeFetcher, BiolibLocator, SqliteStore> {
        let config = test_config(dir, seed, max_iterations);
        Coordinator::new(config, FakeFetcher::new(pages), BiolibLocator, store).unwrap()
    }

    #[tokio::test]
    async fn test_crawl_discovers_inline_tree_and_converges() {
        let dir = TempDir::new().unwrap();
        let seed_page = page(
            r#"<div class="treediv">čeleď <a href="/cz/taxon/id101/">Rosaceae</a> - <b>růžovité</b><br/>
                <div class="treeenddiv">rod <a href="/cz/taxon/id102/">Rosa</a><br/></div>
            </div>"#,
        );
        let pages = [("https://www.biolib.cz/cz/taxontree/id100/", seed_page.as_str())];

        let mut coordinator = coordinator(
            &dir,
            100,
            50,
            &pages,
            SqliteStore::new_in_memory().unwrap(),
        );
        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.reason, StopReason::Converged);
        assert_eq!(summary.pages_fetched, 1);
        assert_eq!(summary.taxa_merged, 2);

        let family = coordinator.store().find(101).unwrap().unwrap();
        assert_eq!(family.level, 110);
        assert_eq!(family.name_cs.as_deref(), Some("růžovité"));
        assert_eq!(family.parent, Some(100));
        // Its child was visible inline
        assert!(!family.to_visit);

        let genus = coordinator.store().find(102).unwrap().unwrap();
        assert_eq!(genus.parent, Some(101));
        // Genus level (130) is below the species threshold but outside
        // the reseeding range, so the run still converges
        assert!(genus.to_visit);
    }

    #[tokio::test]
    async fn test_reseed_fetches_widened_page_then_converges() {
        let dir = TempDir::new().unwrap();
        let seed_page = page(
            r#"<div class="treeenddiv">čeleď <a href="/cz/taxon/id110/">Rosaceae</a><br/></div>"#,
        );
        let widened_page = page(
            r#"<div class="treeenddiv">druh <a href="/cz/taxon/id111/">Rosa canina</a><br/></div>"#,
        );
        let pages = [
            ("https://www.biolib.cz/cz/taxontree/id100/", seed_page.as_str()),
            (
                "https://www.biolib.cz/cz/taxontree/id110/?count=100&treetaxcat=150",
                widened_page.as_str(),
            ),
        ];

        let mut coordinator = coordinator(
            &dir,
            100,
            50,
            &pages,
            SqliteStore::new_in_memory().unwrap(),
        );
        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.reason, StopReason::Converged);
        assert_eq!(summary.pages_fetched, 2);

        let species = coordinator.store().find(111).unwrap().unwrap();
        assert_eq!(species.parent, Some(110));
        assert!(!species.to_visit);

        // The family was reseeded, fetched once and then cleared when the
        // widened URL came around again
        let family = coordinator.store().find(110).unwrap().unwrap();
        assert!(!family.to_visit);
    }

    #[tokio::test]
    async fn test_missing_tree_triggers_widened_retry() {
        let dir = TempDir::new().unwrap();
        let empty = "<html><body><p>no results</p></body></html>";

        // The stored family has level 110, so the retry filter is 130
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .upsert(
                100,
                &Taxon {
                    level: 110,
                    name: "Rosaceae".to_string(),
                    name_cs: None,
                    parent: None,
                    to_visit: true,
                },
            )
            .unwrap();

        let pages = [
            ("https://www.biolib.cz/cz/taxontree/id100/", empty),
            (
                "https://www.biolib.cz/cz/taxontree/id100/?count=100&treetaxcat=130",
                empty,
            ),
        ];

        let mut coordinator = coordinator(&dir, 100, 50, &pages, store);
        let summary = coordinator.run().await.unwrap();

        // Second miss is a true dead end: flag cleared, no loop
        assert_eq!(summary.reason, StopReason::Converged);
        assert_eq!(summary.pages_fetched, 2);
        assert!(!coordinator.store().find(100).unwrap().unwrap().to_visit);
    }

    #[tokio::test]
    async fn test_self_link_is_never_expanded() {
        let dir = TempDir::new().unwrap();
        let seed_page = page(
            r#"<div class="treeenddiv">čeleď <a href="/cz/taxon/id100/">Rosaceae</a><br/></div>"#,
        );
        let pages = [("https://www.biolib.cz/cz/taxontree/id100/", seed_page.as_str())];

        let mut coordinator = coordinator(
            &dir,
            100,
            50,
            &pages,
            SqliteStore::new_in_memory().unwrap(),
        );
        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.reason, StopReason::Converged);
        let record = coordinator.store().find(100).unwrap().unwrap();
        assert!(!record.to_visit);
    }

    #[tokio::test]
    async fn test_rediscovery_never_reopens_exploration() {
        let dir = TempDir::new().unwrap();
        let seed_page = page(
            r#"<div class="treeenddiv">čeleď <a href="/cz/taxon/id120/">Rosaceae</a><br/></div>"#,
        );
        let pages = [("https://www.biolib.cz/cz/taxontree/id100/", seed_page.as_str())];

        // Already stored and fully explored
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .upsert(
                120,
                &Taxon {
                    level: 110,
                    name: "Rosaceae".to_string(),
                    name_cs: None,
                    parent: None,
                    to_visit: false,
                },
            )
            .unwrap();

        let mut coordinator = coordinator(&dir, 100, 50, &pages, store);
        coordinator.run().await.unwrap();

        // The parse alone would have set to_visit (no inline children),
        // but a re-discovery must not re-open the record
        let record = coordinator.store().find(120).unwrap().unwrap();
        assert!(!record.to_visit);
    }

    #[tokio::test]
    async fn test_bad_status_is_fatal_and_preserves_frontier() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(
            &dir,
            100,
            50,
            &[],
            SqliteStore::new_in_memory().unwrap(),
        );

        let result = coordinator.run().await;
        assert!(matches!(result, Err(CrawlError::BadStatus { status: 404, .. })));

        // The in-flight seed URL survives for the next run
        let queue = std::fs::read_to_string(dir.path().join("queue.txt")).unwrap();
        assert_eq!(queue.trim(), "https://www.biolib.cz/cz/taxontree/id100/");
    }

    #[tokio::test]
    async fn test_iteration_cap_pauses_run_with_pagination_pending() {
        let dir = TempDir::new().unwrap();
        let seed_page = r#"<html><body><div class="treeareadiv">
                <div class="treeenddiv">druh <a href="/cz/taxon/id101/">Rosa canina</a><br/></div>
            </div>
            <a href="/cz/taxontree/id100/?pg=2">Další &gt;&gt;</a></body></html>"#;
        let pages = [("https://www.biolib.cz/cz/taxontree/id100/", seed_page)];

        let mut coordinator = coordinator(
            &dir,
            100,
            1,
            &pages,
            SqliteStore::new_in_memory().unwrap(),
        );
        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.reason, StopReason::IterationCap);
        assert_eq!(summary.pages_fetched, 1);

        // The pagination follow-up is parked in the queue file
        let queue = std::fs::read_to_string(dir.path().join("queue.txt")).unwrap();
        assert_eq!(
            queue.trim(),
            "https://www.biolib.cz/cz/taxontree/id100/?pg=2"
        );
    }
}
