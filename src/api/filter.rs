use std::collections::{BTreeMap, BTreeSet};

use async_graphql::{Context, InputObject, Object, Result, SimpleObject};

use super::Engine;
use crate::facet::{self, FilterSelection};

#[derive(InputObject, Debug, Default)]
pub(crate) struct FilterSelectionInput {
    /// Lowest price to include. (inclusive)
    price_min: Option<f64>,
    /// Highest price to include. (inclusive)
    price_max: Option<f64>,
    /// Brands to include. A product matches if it has any of them.
    brands: Option<Vec<String>>,
    /// Characteristic values to include, per characteristic slug.
    characteristics: Option<Vec<CharacteristicSelectionInput>>,
}

#[derive(InputObject, Debug)]
pub(crate) struct CharacteristicSelectionInput {
    slug: String,
    /// A product matches if it has any of these values.
    values: Vec<String>,
}

/// Trimmed values; blank ones are dropped, as stored values never hold them.
fn trimmed(values: Vec<String>) -> impl Iterator<Item = String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<FilterSelectionInput> for FilterSelection {
    fn from(input: FilterSelectionInput) -> Self {
        let characteristics = input.characteristics.unwrap_or_default().into_iter().fold(
            BTreeMap::<String, BTreeSet<String>>::new(),
            |mut acc, c| {
                acc.entry(c.slug).or_default().extend(trimmed(c.values));
                acc
            },
        );
        Self {
            price_min: input.price_min,
            price_max: input.price_max,
            brands: input.brands.map(|brands| trimmed(brands).collect()),
            characteristics,
        }
    }
}

#[derive(SimpleObject)]
pub(crate) struct PriceRange {
    min: i64,
    max: i64,
}

#[derive(SimpleObject)]
pub(crate) struct FacetOption {
    value: String,
    label: String,
    /// The number of matching products with this value.
    count: usize,
}

#[derive(SimpleObject)]
pub(crate) struct CharacteristicFacet {
    id: u32,
    name: String,
    slug: String,
    /// Options ordered by descending count.
    options: Vec<FacetOption>,
}

#[derive(SimpleObject)]
pub(crate) struct FacetResult {
    /// The price range of the matching products, `{0, 0}` when none match.
    price_range: PriceRange,
    /// Brands of the matching products, ordered by descending count.
    brands: Vec<FacetOption>,
    /// Characteristic axes of the category, ordered by position.
    characteristics: Vec<CharacteristicFacet>,
}

impl From<facet::FacetOption> for FacetOption {
    fn from(option: facet::FacetOption) -> Self {
        Self {
            value: option.value,
            label: option.label,
            count: option.count,
        }
    }
}

impl From<facet::FacetResult> for FacetResult {
    fn from(result: facet::FacetResult) -> Self {
        Self {
            price_range: PriceRange {
                min: result.price_range.min,
                max: result.price_range.max,
            },
            brands: result.brands.into_iter().map(FacetOption::from).collect(),
            characteristics: result
                .characteristics
                .into_iter()
                .map(|c| CharacteristicFacet {
                    id: c.id,
                    name: c.name,
                    slug: c.slug,
                    options: c.options.into_iter().map(FacetOption::from).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Default)]
pub(super) struct FilterQuery;

#[Object]
impl FilterQuery {
    /// Filter axes of a category with live counts.
    ///
    /// `category` is a slug or an id. Without a selection the result is
    /// served from the cache when possible.
    #[allow(clippy::unused_async)]
    async fn filters(
        &self,
        ctx: &Context<'_>,
        category: String,
        selection: Option<FilterSelectionInput>,
    ) -> Result<FacetResult> {
        let engine = ctx.data::<Engine>()?;
        let selection = selection.map(FilterSelection::from);
        Ok(engine.filters(&category, selection.as_ref())?.into())
    }
}
