//! URL forms for the taxonomy tree view
//!
//! Every frontier entry targets a taxon tree page and carries the taxon id
//! in its path (`.../taxontree/id{N}/`). The widened form appends a page
//! size and a rank-category filter to force the site to show children the
//! default view hides.

use crate::tree::TaxonId;
use url::Url;

/// Query parameter marking a widened-filter fetch
const FILTER_PARAM: &str = "treetaxcat";

/// Page size requested on widened and reseeded fetches
const PAGE_SIZE: u32 = 100;

/// Builds the base tree-view URL for a taxon
pub fn tree_url(base: &str, id: TaxonId) -> String {
    format!("{}/cz/taxontree/id{}/", base.trim_end_matches('/'), id)
}

/// Builds a widened-filter tree URL showing categories down to `level`
pub fn widened_url(base: &str, id: TaxonId, level: i32) -> String {
    format!(
        "{}?count={}&{}={}",
        tree_url(base, id),
        PAGE_SIZE,
        FILTER_PARAM,
        level
    )
}

/// Returns true if the URL already carries the widened-filter marker
pub fn has_widened_filter(url: &str) -> bool {
    url.contains(FILTER_PARAM)
}

/// Extracts the taxon id from a tree or taxon URL
///
/// Matches the first `/id{digits}/` path segment. Returns None for URLs
/// that do not address a taxon.
pub fn taxon_id(url: &str) -> Option<TaxonId> {
    let mut rest = url;
    while let Some(pos) = rest.find("/id") {
        let tail = &rest[pos + 3..];
        let digits = tail
            .char_indices()
            .take_while(|(_, c)| c.is_ascii_digit())
            .count();
        if digits > 0 && tail[digits..].starts_with('/') {
            return tail[..digits].parse().ok();
        }
        rest = tail;
    }
    None
}

/// Resolves a possibly-relative href against the site base
pub fn resolve(base: &str, href: &str) -> crate::Result<String> {
    let joined = Url::parse(base)?.join(href)?;
    Ok(joined.to_string())
}
