//! Listing feed — flattens the paginated listings endpoint.

use tracing::{debug, error, info};

use crate::market::{MarketplaceApi, RawListing};

/// Pull up to `max_pages` pages of listings, in page order.
///
/// Stops at the first empty page. A failed page is logged and treated as
/// the end of the feed; whatever was collected so far is returned.
pub async fn collect_listings(api: &dyn MarketplaceApi, max_pages: u32) -> Vec<RawListing> {
    let mut listings = Vec::new();

    for page in 0..max_pages {
        debug!(page = page + 1, "Fetching listings page");
        match api.fetch_listings_page(page).await {
            Ok(batch) if batch.is_empty() => {
                debug!(page = page + 1, "Empty page, feed exhausted");
                break;
            }
            Ok(batch) => listings.extend(batch),
            Err(e) => {
                error!(page = page + 1, error = %e, "Failed to fetch listings page");
                break;
            }
        }
    }

    info!(count = listings.len(), "Listings collected");
    listings
}
