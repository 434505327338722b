//! Faceted filtering of a product category.
//!
//! Given a category and an optional [`FilterSelection`], the engine reports
//! the price range, brand counts and per-characteristic option counts of the
//! matching products. The unnarrowed result of a category is cached; a
//! narrowed one is always recomputed.

mod aggregate;
mod baseline;
mod narrowed;
mod selection;
pub(crate) mod store;

use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::error;

pub(crate) use self::selection::FilterSelection;
use self::store::{CatalogStore, CharacteristicSchema, FacetCache};
use crate::{
    database::{Category, Product},
    settings::FilterSettings,
};

#[derive(Debug, thiserror::Error)]
pub(crate) enum FacetError {
    #[error("category not found: {0}")]
    CategoryNotFound(String),
}

/// Whole-unit bounds of the matching prices: the minimum rounded down and
/// the maximum rounded up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct PriceRange {
    pub(crate) min: i64,
    pub(crate) max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct FacetOption {
    pub(crate) value: String,
    pub(crate) label: String,
    pub(crate) count: usize,
}

impl FacetOption {
    fn new(value: &str, count: usize) -> Self {
        Self {
            value: value.to_string(),
            label: value.to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct CharacteristicFacet {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) slug: String,
    pub(crate) options: Vec<FacetOption>,
}

/// The default value is the result for "no matching products".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct FacetResult {
    pub(crate) price_range: PriceRange,
    pub(crate) brands: Vec<FacetOption>,
    pub(crate) characteristics: Vec<CharacteristicFacet>,
}

/// Splits a raw characteristic value into its tokens. `"DDR4, DDR5"` holds
/// two tokens; blank tokens are dropped.
pub(crate) fn split_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|token| !token.is_empty())
}

/// Descending by count; ties keep their current order.
fn sort_by_count(options: &mut [FacetOption]) {
    options.sort_by(|a, b| b.count.cmp(&a.count));
}

fn price_range(products: &[Product]) -> Result<PriceRange> {
    let prices = products.iter().map(|p| p.price);
    let (Some(min), Some(max)) = (prices.clone().reduce(f64::min), prices.reduce(f64::max)) else {
        return Ok(PriceRange::default());
    };
    Ok(PriceRange {
        min: min
            .floor()
            .to_i64()
            .with_context(|| format!("price {min} out of range"))?,
        max: max
            .ceil()
            .to_i64()
            .with_context(|| format!("price {max} out of range"))?,
    })
}

fn brand_options(products: &[Product]) -> Vec<FacetOption> {
    let mut options: Vec<_> = products
        .iter()
        .filter(|p| !p.brand.is_empty())
        .fold(BTreeMap::new(), |mut acc, p| {
            *acc.entry(p.brand.as_str()).or_insert(0) += 1;
            acc
        })
        .into_iter()
        .map(|(brand, count)| FacetOption::new(brand, count))
        .collect();
    sort_by_count(&mut options);
    options
}

/// Facets of `candidates`, a non-empty subset of `category_products`.
///
/// Axes are listed by position. An axis is left out only when it has no
/// values at all; zero-count options of a surviving axis are kept.
fn summarize<S>(
    store: &S,
    settings: &FilterSettings,
    category: u32,
    category_products: &[Product],
    candidates: &[Product],
) -> Result<FacetResult>
where
    S: CatalogStore + CharacteristicSchema,
{
    let category_ids: HashSet<u32> = category_products.iter().map(|p| p.id).collect();
    let candidate_ids: HashSet<u32> = candidates.iter().map(|p| p.id).collect();

    let mut characteristics = Vec::new();
    for axis in store.filterable_types_for_category(category)? {
        let options = aggregate::axis_options(
            store,
            settings.vocabulary_scope,
            axis.id,
            &category_ids,
            &candidate_ids,
        )?;
        if options.is_empty() {
            continue;
        }
        characteristics.push(CharacteristicFacet {
            id: axis.id,
            name: axis.name,
            slug: axis.slug,
            options,
        });
    }

    Ok(FacetResult {
        price_range: price_range(candidates)?,
        brands: brand_options(candidates),
        characteristics,
    })
}

#[derive(Clone)]
pub(crate) struct FacetEngine<S> {
    store: S,
    settings: FilterSettings,
}

impl<S> FacetEngine<S>
where
    S: CatalogStore + CharacteristicSchema + FacetCache,
{
    pub(crate) fn new(store: S, settings: FilterSettings) -> Self {
        Self { store, settings }
    }

    /// Facets of the category named by `identifier` (a slug or an id).
    ///
    /// Without a selection, or with an empty one, the cached baseline is
    /// used. Only an unknown category is an error; any other failure is
    /// logged and reported as the empty result.
    pub(crate) fn filters(
        &self,
        identifier: &str,
        selection: Option<&FilterSelection>,
    ) -> Result<FacetResult, FacetError> {
        let Some(category) = self.resolve(identifier)? else {
            return Ok(FacetResult::default());
        };
        Ok(match selection.filter(|s| !s.is_empty()) {
            None => baseline::compute(&self.store, &self.settings, category.id),
            Some(selection) => {
                narrowed::compute(&self.store, &self.settings, category.id, selection)
            }
        })
    }

    /// Products of the category matching `selection`, cheapest first.
    pub(crate) fn products(
        &self,
        identifier: &str,
        selection: Option<&FilterSelection>,
    ) -> Result<Vec<Product>, FacetError> {
        let Some(category) = self.resolve(identifier)? else {
            return Ok(Vec::new());
        };
        let selection = selection.cloned().unwrap_or_default();
        let products = self
            .store
            .products_in_category(category.id)
            .and_then(|products| {
                narrowed::candidates(
                    &self.store,
                    self.settings.value_matching,
                    category.id,
                    &products,
                    &selection,
                )
            });
        match products {
            Ok(mut products) => {
                products.sort_by(|a, b| a.price.total_cmp(&b.price).then(a.id.cmp(&b.id)));
                Ok(products)
            }
            Err(e) => {
                error!("Problem while listing products of category {}. {e:#}", category.id);
                Ok(Vec::new())
            }
        }
    }

    /// The category and its direct sub-categories.
    pub(crate) fn category(&self, identifier: &str) -> Result<Option<(Category, Vec<Category>)>> {
        let Some(category) = self.store.resolve_category(identifier)? else {
            return Ok(None);
        };
        let children = self.store.subcategories(category.id)?;
        Ok(Some((category, children)))
    }

    /// `Ok(None)` when the store could not be read.
    fn resolve(&self, identifier: &str) -> Result<Option<Category>, FacetError> {
        match self.store.resolve_category(identifier) {
            Ok(Some(category)) => Ok(Some(category)),
            Ok(None) => Err(FacetError::CategoryNotFound(identifier.to_string())),
            Err(e) => {
                error!("Problem while resolving category {identifier:?}. {e:#}");
                Ok(None)
            }
        }
    }
}
