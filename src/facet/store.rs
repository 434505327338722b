//! The data the facet engine reads, and the cache it writes baselines to.

use std::{collections::HashSet, time::Duration};

use anyhow::Result;

use crate::database::{Assignment, Category, Database, FilterableType, Product};

pub(crate) trait CatalogStore {
    /// Resolves a category slug or numeric id.
    fn resolve_category(&self, identifier: &str) -> Result<Option<Category>>;

    fn subcategories(&self, category: u32) -> Result<Vec<Category>>;

    fn products_in_category(&self, category: u32) -> Result<Vec<Product>>;

    /// Raw values of a characteristic type, restricted to `products` when
    /// given.
    fn assignments(
        &self,
        characteristic: u32,
        products: Option<&HashSet<u32>>,
    ) -> Result<Vec<Assignment>>;

    fn values_ever_assigned(&self, characteristic: u32) -> Result<Vec<String>>;
}

pub(crate) trait CharacteristicSchema {
    /// Filterable types of a category, ascending by position.
    fn filterable_types_for_category(&self, category: u32) -> Result<Vec<FilterableType>>;
}

pub(crate) trait FacetCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
}

impl CatalogStore for Database {
    fn resolve_category(&self, identifier: &str) -> Result<Option<Category>> {
        self.category(identifier)
    }

    fn subcategories(&self, category: u32) -> Result<Vec<Category>> {
        Database::subcategories(self, category)
    }

    fn products_in_category(&self, category: u32) -> Result<Vec<Product>> {
        self.products_by_category(category)
    }

    fn assignments(
        &self,
        characteristic: u32,
        products: Option<&HashSet<u32>>,
    ) -> Result<Vec<Assignment>> {
        self.select_assignments(characteristic, products)
    }

    fn values_ever_assigned(&self, characteristic: u32) -> Result<Vec<String>> {
        self.assigned_values(characteristic)
    }
}

impl CharacteristicSchema for Database {
    fn filterable_types_for_category(&self, category: u32) -> Result<Vec<FilterableType>> {
        self.category_characteristics(category)
    }
}

impl FacetCache for Database {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.cache_get(key)
    }

    fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.cache_set(key, value, ttl)
    }
}
