//! Locating the structural tree region on a fetched page
//!
//! Pages that the site's automatic rank filter left empty have no tree
//! region at all; the crawl loop reacts to that by retrying with a
//! widened filter. The locator also finds the "next page" link for
//! paginated listings.

use scraper::{ElementRef, Html, Selector};

/// Anchor text of the site's pagination link
const NEXT_PAGE_LABEL: &str = "Další >>";

/// Finds the structural elements the crawl loop cares about
///
/// Injected into the coordinator so tests can substitute page layouts.
pub trait TreeLocator {
    /// Root of the tree region, or None when the page shows no tree
    fn tree_region<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>>;

    /// Raw href of the "next page" link, if the listing is paginated
    fn next_page(&self, doc: &Html) -> Option<String>;
}

/// Locator for the production BioLib page layout
#[derive(Debug, Default)]
pub struct BiolibLocator;

impl TreeLocator for BiolibLocator {
    fn tree_region<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        let selector = Selector::parse("div.treeareadiv").ok()?;
        doc.select(&selector).next()
    }

    fn next_page(&self, doc: &Html) -> Option<String> {
        let selector = Selector::parse("a[href]").ok()?;
        doc.select(&selector)
            .find(|a| a.text().collect::<String>().trim() == NEXT_PAGE_LABEL)
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    }
}
