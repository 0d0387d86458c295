//! Paginated image collection.
//!
//! The provider caps a single listing at 50 entries, so a larger quota is
//! met with several sequential batches. Each batch is filtered against what
//! has already been collected and against the allowed formats; collection
//! stops as soon as the source looks exhausted.

use std::collections::HashSet;

use crate::domain::{ContentProvider, ImageQuery, ImageRecord, PageRef};

pub const BATCH_SIZE: usize = 50;

const ALLOWED_EXTENSIONS: [&str; 6] = [".svg", ".gif", ".jpg", ".jpeg", ".png", ".webp"];

/// Extension check only; the url itself is kept as returned.
pub fn has_allowed_extension(url: &str) -> bool {
    let lower = url.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Collect up to `limit` unique, allowed-format images for `page`.
///
/// A failing batch is logged and skipped; images gathered so far are never
/// discarded. Returns fewer than `limit` records when the source runs dry,
/// and an empty collection (without calling the provider) when `limit <= 0`.
pub async fn collect_images(provider: &dyn ContentProvider, page: &PageRef, limit: i64) -> Vec<ImageRecord> {
    let limit = usize::try_from(limit).unwrap_or(0);
    let batches = limit.div_ceil(BATCH_SIZE);
    let mut collected: Vec<ImageRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for batch in 0..batches {
        if collected.len() >= limit {
            break;
        }
        let requested = BATCH_SIZE.min(limit - collected.len());
        tracing::debug!(page = %page.title, batch = batch + 1, batches, requested, "fetching image batch");

        let raw = match provider.images(page, ImageQuery::exact(requested)).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(page = %page.title, batch = batch + 1, error = %e, "image batch failed, continuing");
                continue;
            }
        };
        if raw.is_empty() {
            break;
        }

        let raw_len = raw.len();
        let mut added = 0;
        for image in raw {
            if added == requested {
                break;
            }
            if has_allowed_extension(&image.url) && seen.insert(image.url.clone()) {
                collected.push(image);
                added += 1;
            }
        }
        if added == 0 {
            // Everything was a duplicate or an unsupported format: asking
            // again would return the same thing.
            break;
        }
        tracing::debug!(page = %page.title, collected = collected.len(), limit, "image batch merged");

        if raw_len < requested {
            break;
        }
    }

    tracing::info!(page = %page.title, total = collected.len(), limit, "image collection finished");
    collected
}
