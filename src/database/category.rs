use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{compose_key, Database};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub(crate) struct Category {
    pub(crate) id: u32,
    pub(crate) slug: String,
    pub(crate) name: String,
    pub(crate) parent: Option<u32>,
}

impl Database {
    pub(crate) fn insert_category(&self, category: &Category) -> Result<()> {
        let key = compose_key(&[category.id]);
        if let Some(old) = self.category_by_id(category.id)? {
            if old.slug != category.slug
                && self.category_slugs.get(old.slug.as_bytes())?.as_deref() == Some(key.as_slice())
            {
                self.category_slugs.remove(old.slug.as_bytes())?;
            }
        }
        Database::insert(&key, category, &self.categories)?;
        self.category_slugs
            .insert(category.slug.as_bytes(), key.as_slice())?;
        Ok(())
    }

    pub(crate) fn category_by_id(&self, id: u32) -> Result<Option<Category>> {
        Database::select(&compose_key(&[id]), &self.categories)
    }

    /// Resolves a category by slug, falling back to a numeric id.
    pub(crate) fn category(&self, identifier: &str) -> Result<Option<Category>> {
        if let Some(key) = self.category_slugs.get(identifier.as_bytes())? {
            return Database::select(&key, &self.categories);
        }
        match identifier.trim().parse::<u32>() {
            Ok(id) => self.category_by_id(id),
            Err(_) => Ok(None),
        }
    }

    pub(crate) fn subcategories(&self, id: u32) -> Result<Vec<Category>> {
        let mut children = Vec::new();
        for entry in self.categories.iter() {
            let (_, val) = entry?;
            let category: Category = bincode::deserialize(&val)?;
            if category.parent == Some(id) {
                children.push(category);
            }
        }
        Ok(children)
    }
}
