use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{compose_key, id_at, Database};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub(crate) struct Product {
    pub(crate) id: u32,
    pub(crate) category: u32,
    pub(crate) name: String,
    pub(crate) price: f64,
    /// Empty when the product has no brand.
    pub(crate) brand: String,
}

impl Database {
    pub(crate) fn insert_product(&self, product: &Product) -> Result<()> {
        if let Some(previous) = self.product(product.id)? {
            self.category_products
                .remove(compose_key(&[previous.category, previous.id]))?;
        }
        Database::insert(&compose_key(&[product.id]), product, &self.products)?;
        self.category_products
            .insert(compose_key(&[product.category, product.id]), Vec::new())?;
        Ok(())
    }

    pub(crate) fn product(&self, id: u32) -> Result<Option<Product>> {
        Database::select(&compose_key(&[id]), &self.products)
    }

    /// Products directly owned by `category`, in id order.
    pub(crate) fn products_by_category(&self, category: u32) -> Result<Vec<Product>> {
        let mut products = Vec::new();
        for entry in self.category_products.scan_prefix(compose_key(&[category])) {
            let (key, _) = entry?;
            let id = id_at(&key, 1)?;
            let product = self
                .product(id)?
                .with_context(|| format!("product {id} is indexed but missing"))?;
            products.push(product);
        }
        Ok(products)
    }
}
