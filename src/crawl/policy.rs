//! Revisit policy
//!
//! Decides whether a popped URL still needs a fetch. Filtered and
//! paginated views (anything carrying query parameters or multiple ids)
//! are always distinct fetch operations; plain tree pages defer to the
//! stored `to_visit` flag.

use crate::store::Store;
use crate::CrawlError;

/// Returns true when the URL must still be fetched
pub fn should_visit<S: Store>(url: &str, store: &S) -> crate::Result<bool> {
    if url.contains('?') || url.contains(',') {
        return Ok(true);
    }

    let id = crate::url::taxon_id(url).ok_or_else(|| CrawlError::NoTaxonId(url.to_string()))?;
    let visit = match store.find(id)? {
        None => true,
        Some(record) => record.to_visit,
    };
    Ok(visit)
}
