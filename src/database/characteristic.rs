use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{compose_key, id_at, Database};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub(crate) struct CharacteristicType {
    pub(crate) id: u32,
    pub(crate) name: String,
    /// Stable key used by filter selections.
    pub(crate) slug: String,
}

/// A characteristic type as bound to one category.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilterableType {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) slug: String,
    pub(crate) position: u32,
}

/// One raw value recorded for a product. The value may be composite, see
/// [`crate::facet::split_tokens`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Assignment {
    pub(crate) product: u32,
    pub(crate) value: String,
}

impl Database {
    pub(crate) fn insert_characteristic(&self, characteristic: &CharacteristicType) -> Result<()> {
        let key = compose_key(&[characteristic.id]);
        if let Some(old) = self.characteristic(characteristic.id)? {
            if old.slug != characteristic.slug
                && self.characteristic_slugs.get(old.slug.as_bytes())?.as_deref()
                    == Some(key.as_slice())
            {
                self.characteristic_slugs.remove(old.slug.as_bytes())?;
            }
        }
        Database::insert(&key, characteristic, &self.characteristics)?;
        self.characteristic_slugs
            .insert(characteristic.slug.as_bytes(), key)?;
        Ok(())
    }

    pub(crate) fn characteristic(&self, id: u32) -> Result<Option<CharacteristicType>> {
        Database::select(&compose_key(&[id]), &self.characteristics)
    }

    pub(crate) fn characteristic_by_slug(&self, slug: &str) -> Result<Option<CharacteristicType>> {
        match self.characteristic_slugs.get(slug.as_bytes())? {
            Some(key) => Database::select(&key, &self.characteristics),
            None => Ok(None),
        }
    }

    /// Makes `characteristic` filterable in `category` at `position`,
    /// replacing any earlier binding of the same pair.
    pub(crate) fn bind_characteristic(
        &self,
        category: u32,
        characteristic: u32,
        position: u32,
    ) -> Result<()> {
        for entry in self
            .category_characteristics
            .scan_prefix(compose_key(&[category]))
        {
            let (key, _) = entry?;
            if id_at(&key, 2)? == characteristic {
                self.category_characteristics.remove(key)?;
            }
        }
        self.category_characteristics
            .insert(compose_key(&[category, position, characteristic]), Vec::new())?;
        Ok(())
    }

    /// Characteristic types bound to `category`, ascending by position.
    pub(crate) fn category_characteristics(&self, category: u32) -> Result<Vec<FilterableType>> {
        let mut types = Vec::new();
        for entry in self
            .category_characteristics
            .scan_prefix(compose_key(&[category]))
        {
            let (key, _) = entry?;
            let position = id_at(&key, 1)?;
            let id = id_at(&key, 2)?;
            let characteristic = self
                .characteristic(id)?
                .with_context(|| format!("characteristic {id} is bound but missing"))?;
            types.push(FilterableType {
                id,
                name: characteristic.name,
                slug: characteristic.slug,
                position,
            });
        }
        Ok(types)
    }

    /// Records one more raw value of `characteristic` for `product`.
    pub(crate) fn assign(&self, product: u32, characteristic: u32, value: &str) -> Result<()> {
        let sequence = self
            .assignments
            .scan_prefix(compose_key(&[characteristic, product]))
            .count();
        let key = compose_key(&[characteristic, product, u32::try_from(sequence)?]);
        Database::insert(&key, &value, &self.assignments)
    }

    /// Drops every value recorded for `product`, whatever the characteristic.
    pub(crate) fn unassign_product(&self, product: u32) -> Result<()> {
        for entry in self.assignments.iter() {
            let (key, _) = entry?;
            if id_at(&key, 1)? == product {
                self.assignments.remove(key)?;
            }
        }
        Ok(())
    }

    /// Raw values of `characteristic`, restricted to `products` when given.
    pub(crate) fn select_assignments(
        &self,
        characteristic: u32,
        products: Option<&HashSet<u32>>,
    ) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::new();
        for entry in self
            .assignments
            .scan_prefix(compose_key(&[characteristic]))
        {
            let (key, val) = entry?;
            let product = id_at(&key, 1)?;
            if products.is_some_and(|ids| !ids.contains(&product)) {
                continue;
            }
            assignments.push(Assignment {
                product,
                value: bincode::deserialize(&val)?,
            });
        }
        Ok(assignments)
    }

    /// Distinct raw values ever recorded for `characteristic`, in the order
    /// they are first seen.
    pub(crate) fn assigned_values(&self, characteristic: u32) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        Ok(self
            .select_assignments(characteristic, None)?
            .into_iter()
            .filter_map(|a| seen.insert(a.value.clone()).then_some(a.value))
            .collect())
    }
}
