use anyhow::Result;
use tracing::{error, warn};

use super::{
    store::{CatalogStore, CharacteristicSchema, FacetCache},
    summarize, FacetResult,
};
use crate::settings::FilterSettings;

pub(super) fn cache_key(category: u32) -> String {
    format!("filters:category:{category}")
}

/// Filters of an unnarrowed category, served from the cache when possible.
///
/// Data-access failures are logged and yield the empty result. An empty
/// category is never cached.
pub(super) fn compute<S>(store: &S, settings: &FilterSettings, category: u32) -> FacetResult
where
    S: CatalogStore + CharacteristicSchema + FacetCache,
{
    let key = cache_key(category);
    match store.get(&key) {
        Ok(Some(bytes)) => match bincode::deserialize(&bytes) {
            Ok(result) => return result,
            Err(e) => warn!("Discarding unreadable cached filters of category {category}. {e}"),
        },
        Ok(None) => {}
        Err(e) => error!("Problem while reading cached filters of category {category}. {e:#}"),
    }

    let result = match assemble(store, settings, category) {
        Ok(Some(result)) => result,
        Ok(None) => return FacetResult::default(),
        Err(e) => {
            error!("Problem while computing filters of category {category}. {e:#}");
            return FacetResult::default();
        }
    };

    match bincode::serialize(&result) {
        Ok(bytes) => {
            if let Err(e) = store.set_with_ttl(&key, &bytes, settings.cache_ttl()) {
                error!("Problem while caching filters of category {category}. {e:#}");
            }
        }
        Err(e) => error!("Problem while encoding filters of category {category}. {e}"),
    }
    result
}

fn assemble<S>(store: &S, settings: &FilterSettings, category: u32) -> Result<Option<FacetResult>>
where
    S: CatalogStore + CharacteristicSchema,
{
    let products = store.products_in_category(category)?;
    if products.is_empty() {
        return Ok(None);
    }
    summarize(store, settings, category, &products, &products).map(Some)
}
