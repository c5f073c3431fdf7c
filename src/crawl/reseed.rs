//! Reseeding an exhausted frontier from the store
//!
//! When the queue runs dry the crawl is not necessarily done: taxa
//! discovered as unexpanded children still wait for a deeper fetch. The
//! reseeder turns each of them into a widened, paginated tree URL,
//! preferring the subtrees with the fewest known children (those are the
//! most likely to be incomplete).

use crate::crawl::Frontier;
use crate::rank;
use crate::store::Store;

/// Refills the frontier from the store; returns the number of URLs added
///
/// Zero additions means every taxon below the broad-group threshold is
/// fully explored and the crawl has converged.
pub fn reseed<S: Store>(store: &S, frontier: &mut Frontier, base: &str) -> crate::Result<usize> {
    let pending = store.pending_exploration(rank::BROAD_GROUP_THRESHOLD)?;

    let mut added = 0;
    for taxon in pending {
        let url = crate::url::widened_url(base, taxon.id, rank::SPECIES_THRESHOLD);
        if frontier.push(url) {
            added += 1;
        }
    }
    Ok(added)
}
