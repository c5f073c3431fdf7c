//! Taxonomy tree model and page-structure parsing
//!
//! This module contains the taxon record type, the structural parser that
//! walks one fetched tree page, and the locator that finds the tree region
//! and pagination link on a page.

mod locate;
mod parser;

pub use locate::{BiolibLocator, TreeLocator};
pub use parser::{taxons, TaxonIter};

/// Globally unique taxon identifier, taken from the site's `id{N}` segments
pub type TaxonId = i64;

/// One node of the classification hierarchy, as parsed from a tree page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxon {
    /// Numeric rank depth; [`crate::rank::UNRANKED`] when the page shows no label
    pub level: i32,

    /// Primary (latin) display name
    pub name: String,

    /// Secondary (vernacular) display name, when the page shows one
    pub name_cs: Option<String>,

    /// Parent taxon id; absent for roots and for nodes whose sibling run
    /// was detached from its apparent parent by a continuation marker
    pub parent: Option<TaxonId>,

    /// True while the node's subtree is not yet known to be fully expanded
    pub to_visit: bool,
}
