use std::collections::{BTreeMap, BTreeSet};

use crate::settings::ValueMatching;

use super::split_tokens;

/// The filters a shopper has applied to a category listing.
///
/// Every dimension is optional. Brands are OR-ed with each other, values of
/// one characteristic are OR-ed with each other, and dimensions are AND-ed.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FilterSelection {
    pub(crate) price_min: Option<f64>,
    pub(crate) price_max: Option<f64>,
    pub(crate) brands: Option<Vec<String>>,
    /// Characteristic slug to the selected values.
    pub(crate) characteristics: BTreeMap<String, BTreeSet<String>>,
}

impl FilterSelection {
    /// Returns `true` if nothing narrows the category.
    pub(crate) fn is_empty(&self) -> bool {
        self.price_min.is_none()
            && self.price_max.is_none()
            && self.brands.as_ref().is_none_or(Vec::is_empty)
            && self.characteristics.values().all(BTreeSet::is_empty)
    }

    pub(crate) fn admits_price(&self, price: f64) -> bool {
        self.price_min.is_none_or(|min| price >= min)
            && self.price_max.is_none_or(|max| price <= max)
    }

    pub(crate) fn admits_brand(&self, brand: &str) -> bool {
        match &self.brands {
            Some(brands) if !brands.is_empty() => brands.iter().any(|b| b == brand),
            _ => true,
        }
    }
}

/// Returns `true` if the stored raw `value` satisfies one of `selected`.
pub(crate) fn value_matches(
    matching: ValueMatching,
    value: &str,
    selected: &BTreeSet<String>,
) -> bool {
    match matching {
        ValueMatching::Exact => selected.contains(value),
        ValueMatching::Token => split_tokens(value).any(|token| selected.contains(token)),
    }
}
