//! Per-axis value counting.

use std::collections::{HashMap, HashSet};

use anyhow::Result;

use super::{sort_by_count, split_tokens, store::CatalogStore, FacetOption};
use crate::{database::Assignment, settings::VocabularyScope};

/// The tokens an axis offers, in the order they were first recorded.
#[derive(Debug, Default)]
pub(super) struct Vocabulary {
    tokens: Vec<String>,
}

impl Vocabulary {
    /// Collects the distinct tokens of `values`. A composite value never
    /// enters as a whole, only through its tokens.
    pub(super) fn from_raw_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        for token in values.into_iter().flat_map(split_tokens) {
            if seen.insert(token) {
                tokens.push(token.to_string());
            }
        }
        Self { tokens }
    }

    pub(super) fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Counts, for every vocabulary token, the distinct products whose
/// assignments carry it. Tokens outside the vocabulary are ignored.
pub(super) fn count_options(
    vocabulary: &Vocabulary,
    assignments: &[Assignment],
) -> Vec<FacetOption> {
    let mut holders: HashMap<&str, HashSet<u32>> = HashMap::new();
    for assignment in assignments {
        for token in split_tokens(&assignment.value) {
            holders.entry(token).or_default().insert(assignment.product);
        }
    }

    let mut options: Vec<_> = vocabulary
        .tokens
        .iter()
        .map(|token| {
            let count = holders.get(token.as_str()).map_or(0, HashSet::len);
            FacetOption::new(token, count)
        })
        .collect();
    sort_by_count(&mut options);
    options
}

/// Option list of one characteristic axis over `candidates`.
///
/// `candidates` must be a subset of `category_products`; the vocabulary is
/// drawn from the latter (or from the whole catalog under
/// [`VocabularyScope::Global`]) so that options the candidates lack still
/// show up with a zero count.
pub(super) fn axis_options<S>(
    store: &S,
    scope: VocabularyScope,
    characteristic: u32,
    category_products: &HashSet<u32>,
    candidates: &HashSet<u32>,
) -> Result<Vec<FacetOption>>
where
    S: CatalogStore,
{
    let counted = store.assignments(characteristic, Some(candidates))?;
    let vocabulary = match scope {
        VocabularyScope::Global => {
            let values = store.values_ever_assigned(characteristic)?;
            Vocabulary::from_raw_values(values.iter().map(String::as_str))
        }
        VocabularyScope::Category if candidates.len() == category_products.len() => {
            Vocabulary::from_raw_values(counted.iter().map(|a| a.value.as_str()))
        }
        VocabularyScope::Category => {
            let values = store.assignments(characteristic, Some(category_products))?;
            Vocabulary::from_raw_values(values.iter().map(|a| a.value.as_str()))
        }
    };
    if vocabulary.is_empty() {
        return Ok(Vec::new());
    }
    Ok(count_options(&vocabulary, &counted))
}
