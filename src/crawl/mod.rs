//! Crawl loop and its collaborators
//!
//! This module contains the crawl-state machine:
//! - the durable frontier queue with restart persistence
//! - the revisit policy deciding which popped URLs still need a fetch
//! - the reseeder that refills an empty frontier from the store
//! - the coordinator driving pop, fetch, parse, merge and pagination

mod coordinator;
mod fetcher;
mod frontier;
mod policy;
mod reseed;

pub use coordinator::{run_crawl, Coordinator, CrawlSummary, StopReason};
pub use fetcher::{courtesy_delay, FetchResponse, Fetcher, HttpFetcher};
pub use frontier::Frontier;
pub use policy::should_visit;
pub use reseed::reseed;
