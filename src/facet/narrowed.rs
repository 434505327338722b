use std::collections::{BTreeSet, HashSet};

use anyhow::Result;
use tracing::{error, warn};

use super::{
    selection::value_matches,
    store::{CatalogStore, CharacteristicSchema},
    summarize, FacetResult, FilterSelection,
};
use crate::{
    database::Product,
    settings::{FilterSettings, ValueMatching},
};

/// Filters of a category under an active selection. Never cached.
///
/// Every axis of the category is recounted over the narrowed products,
/// including the ones the selection constrains, so siblings of a selected
/// value show how many products would remain.
pub(super) fn compute<S>(
    store: &S,
    settings: &FilterSettings,
    category: u32,
    selection: &FilterSelection,
) -> FacetResult
where
    S: CatalogStore + CharacteristicSchema,
{
    match assemble(store, settings, category, selection) {
        Ok(Some(result)) => result,
        Ok(None) => FacetResult::default(),
        Err(e) => {
            error!("Problem while computing narrowed filters of category {category}. {e:#}");
            FacetResult::default()
        }
    }
}

fn assemble<S>(
    store: &S,
    settings: &FilterSettings,
    category: u32,
    selection: &FilterSelection,
) -> Result<Option<FacetResult>>
where
    S: CatalogStore + CharacteristicSchema,
{
    let products = store.products_in_category(category)?;
    let candidates = candidates(store, settings.value_matching, category, &products, selection)?;
    if candidates.is_empty() {
        return Ok(None);
    }
    summarize(store, settings, category, &products, &candidates).map(Some)
}

/// Products of `category` satisfying every dimension of `selection`.
///
/// Characteristic slugs the category does not define are ignored.
pub(super) fn candidates<S>(
    store: &S,
    matching: ValueMatching,
    category: u32,
    products: &[Product],
    selection: &FilterSelection,
) -> Result<Vec<Product>>
where
    S: CharacteristicSchema + CatalogStore,
{
    let mut candidates: Vec<Product> = products
        .iter()
        .filter(|p| selection.admits_price(p.price) && selection.admits_brand(&p.brand))
        .cloned()
        .collect();
    if selection.characteristics.values().all(BTreeSet::is_empty) {
        return Ok(candidates);
    }

    let axes = store.filterable_types_for_category(category)?;
    for (slug, selected) in &selection.characteristics {
        if candidates.is_empty() {
            break;
        }
        if selected.is_empty() {
            continue;
        }
        let Some(axis) = axes.iter().find(|axis| axis.slug == *slug) else {
            warn!("Ignoring filter on {slug:?}, not a characteristic of category {category}");
            continue;
        };
        let ids: HashSet<u32> = candidates.iter().map(|p| p.id).collect();
        let satisfied: HashSet<u32> = store
            .assignments(axis.id, Some(&ids))?
            .into_iter()
            .filter(|a| value_matches(matching, &a.value, selected))
            .map(|a| a.product)
            .collect();
        candidates.retain(|p| satisfied.contains(&p.id));
    }
    Ok(candidates)
}
