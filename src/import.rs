//! Loads a catalog JSON document into the database.

use std::{
    collections::{BTreeMap, HashSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::database::{Category, CharacteristicType, Database, Product};

#[derive(Debug, Deserialize)]
pub(crate) struct Catalog {
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    characteristics: Vec<CharacteristicEntry>,
    #[serde(default)]
    products: Vec<ProductEntry>,
}

#[derive(Debug, Deserialize)]
struct CharacteristicEntry {
    id: u32,
    name: String,
    slug: String,
    #[serde(default)]
    categories: Vec<Binding>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    category: u32,
    position: u32,
}

#[derive(Debug, Deserialize)]
struct ProductEntry {
    id: u32,
    category: u32,
    name: String,
    price: f64,
    #[serde(default)]
    brand: String,
    /// Characteristic slug to one raw value, or to several.
    #[serde(default)]
    characteristics: BTreeMap<String, RawValues>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValues {
    One(String),
    Many(Vec<String>),
}

impl RawValues {
    fn into_vec(self) -> Vec<String> {
        match self {
            RawValues::One(value) => vec![value],
            RawValues::Many(values) => values,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ImportSummary {
    pub(crate) categories: usize,
    pub(crate) characteristics: usize,
    pub(crate) products: usize,
}

pub(crate) fn load_file(db: &Database, path: &Path) -> Result<ImportSummary> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let catalog: Catalog = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("invalid catalog in {}", path.display()))?;
    let summary = load(db, catalog)?;
    info!(
        "Imported {} categories, {} characteristics and {} products from {}",
        summary.categories,
        summary.characteristics,
        summary.products,
        path.display()
    );
    Ok(summary)
}

/// Writes `catalog` into `db`, then drops every cached filter result.
///
/// Nothing is written unless every category and characteristic the catalog
/// refers to is either part of it or already stored.
pub(crate) fn load(db: &Database, catalog: Catalog) -> Result<ImportSummary> {
    validate(db, &catalog)?;
    let written = write(db, catalog);
    db.clear_cache()?;
    written
}

fn validate(db: &Database, catalog: &Catalog) -> Result<()> {
    let categories: HashSet<u32> = catalog.categories.iter().map(|c| c.id).collect();
    let category_known = |id: u32| -> Result<bool> {
        Ok(categories.contains(&id) || db.category_by_id(id)?.is_some())
    };
    let redefined: HashSet<u32> = catalog.characteristics.iter().map(|c| c.id).collect();
    let slugs: HashSet<&str> = catalog
        .characteristics
        .iter()
        .map(|c| c.slug.as_str())
        .collect();

    for entry in &catalog.characteristics {
        for binding in &entry.categories {
            if !category_known(binding.category)? {
                bail!(
                    "characteristic {} is bound to unknown category {}",
                    entry.id,
                    binding.category
                );
            }
        }
    }

    for entry in &catalog.products {
        if !category_known(entry.category)? {
            bail!("product {} belongs to unknown category {}", entry.id, entry.category);
        }
        for slug in entry.characteristics.keys() {
            // A stored slug is about to go away if its characteristic is
            // redefined by this catalog.
            let stored = db
                .characteristic_by_slug(slug)?
                .is_some_and(|c| !redefined.contains(&c.id));
            if !stored && !slugs.contains(slug.as_str()) {
                bail!("product {} uses unknown characteristic {slug:?}", entry.id);
            }
        }
    }
    Ok(())
}

fn write(db: &Database, catalog: Catalog) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for category in &catalog.categories {
        db.insert_category(category)?;
        summary.categories += 1;
    }

    for entry in catalog.characteristics {
        db.insert_characteristic(&CharacteristicType {
            id: entry.id,
            name: entry.name,
            slug: entry.slug,
        })?;
        for binding in entry.categories {
            db.bind_characteristic(binding.category, entry.id, binding.position)?;
        }
        summary.characteristics += 1;
    }

    for entry in catalog.products {
        db.insert_product(&Product {
            id: entry.id,
            category: entry.category,
            name: entry.name,
            price: entry.price,
            brand: entry.brand.trim().to_string(),
        })?;
        // The catalog entry carries the complete set of values.
        db.unassign_product(entry.id)?;
        for (slug, values) in entry.characteristics {
            let characteristic = db
                .characteristic_by_slug(&slug)?
                .with_context(|| {
                    format!("product {} uses unknown characteristic {slug:?}", entry.id)
                })?;
            for value in values.into_vec() {
                db.assign(entry.id, characteristic.id, &value)?;
            }
        }
        summary.products += 1;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{load, load_file, Catalog, ImportSummary};
    use crate::{
        database::Database,
        facet::FacetEngine,
        settings::FilterSettings,
    };

    const CATALOG: &str = r#"{
        "categories": [
            {"id": 1, "slug": "memory", "name": "Memory", "parent": null}
        ],
        "characteristics": [
            {"id": 1, "name": "Standard", "slug": "standard",
             "categories": [{"category": 1, "position": 1}]}
        ],
        "products": [
            {"id": 1, "category": 1, "name": "Fury", "price": 5490.0,
             "brand": "Kingston", "characteristics": {"standard": "DDR4"}},
            {"id": 2, "category": 1, "name": "Vengeance", "price": 7990.9,
             "brand": " Corsair ", "characteristics": {"standard": ["DDR4, DDR5"]}},
            {"id": 3, "category": 1, "name": "Generic", "price": 1990.0}
        ]
    }"#;

    #[test]
    fn import_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(&dir.path().join("db")).unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(CATALOG.as_bytes())
            .unwrap();

        let summary = load_file(&db, &path).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                categories: 1,
                characteristics: 1,
                products: 3
            }
        );
        assert_eq!(db.product(2).unwrap().unwrap().brand, "Corsair");
        assert_eq!(db.products_by_category(1).unwrap().len(), 3);
        assert_eq!(db.select_assignments(1, None).unwrap().len(), 2);
    }

    #[test]
    fn import_invalidates_cached_filters() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path()).unwrap();
        let engine = FacetEngine::new(db.clone(), FilterSettings::default());

        let catalog: Catalog = serde_json::from_str(CATALOG).unwrap();
        load(&db, catalog).unwrap();
        let before = engine.filters("memory", None).unwrap();
        assert_eq!(before.price_range.max, 7991);

        let more: Catalog = serde_json::from_str(
            r#"{"products": [{"id": 4, "category": 1, "name": "Dominator", "price": 12000.0}]}"#,
        )
        .unwrap();
        load(&db, more).unwrap();
        let after = engine.filters("memory", None).unwrap();
        assert_eq!(after.price_range.max, 12000);
    }

    #[test]
    fn unknown_references_fail() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path()).unwrap();

        let orphan: Catalog = serde_json::from_str(
            r#"{"products": [{"id": 1, "category": 9, "name": "Orphan", "price": 1.0}]}"#,
        )
        .unwrap();
        assert!(load(&db, orphan).is_err());

        let catalog: Catalog = serde_json::from_str(
            r#"{
                "categories": [{"id": 1, "slug": "memory", "name": "Memory", "parent": null}],
                "products": [{"id": 1, "category": 1, "name": "X", "price": 1.0,
                              "characteristics": {"latency": "CL16"}}]
            }"#,
        )
        .unwrap();
        assert!(load(&db, catalog).is_err());
        assert!(db.category("memory").unwrap().is_none());
    }

    #[test]
    fn reimport_replaces_values() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path()).unwrap();
        let engine = FacetEngine::new(db.clone(), FilterSettings::default());

        load(&db, serde_json::from_str(CATALOG).unwrap()).unwrap();
        load(&db, serde_json::from_str(CATALOG).unwrap()).unwrap();
        assert_eq!(db.select_assignments(1, None).unwrap().len(), 2);

        let changed = CATALOG.replace(
            r#""characteristics": {"standard": "DDR4"}"#,
            r#""characteristics": {"standard": "DDR5"}"#,
        );
        load(&db, serde_json::from_str(&changed).unwrap()).unwrap();
        let values: Vec<_> = db
            .select_assignments(1, Some(&[1].into_iter().collect()))
            .unwrap()
            .into_iter()
            .map(|a| a.value)
            .collect();
        assert_eq!(values, ["DDR5"]);

        let result = engine.filters("memory", None).unwrap();
        let options: Vec<_> = result.characteristics[0]
            .options
            .iter()
            .map(|o| (o.value.as_str(), o.count))
            .collect();
        assert_eq!(options, [("DDR5", 2), ("DDR4", 1)]);
    }

    #[test]
    fn failed_import_leaves_no_stale_filters() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path()).unwrap();
        let engine = FacetEngine::new(db.clone(), FilterSettings::default());

        load(&db, serde_json::from_str(CATALOG).unwrap()).unwrap();
        assert_eq!(engine.filters("memory", None).unwrap().price_range.max, 7991);

        let broken: Catalog = serde_json::from_str(
            r#"{"products": [
                {"id": 4, "category": 1, "name": "Dominator", "price": 12000.0},
                {"id": 5, "category": 9, "name": "Orphan", "price": 1.0}
            ]}"#,
        )
        .unwrap();
        assert!(load(&db, broken).is_err());
        assert!(db.product(4).unwrap().is_none());
        assert_eq!(db.products_by_category(1).unwrap().len(), 3);
        assert_eq!(engine.filters("memory", None).unwrap().price_range.max, 7991);
    }

    #[test]
    fn renamed_characteristic_in_same_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path()).unwrap();
        load(&db, serde_json::from_str(CATALOG).unwrap()).unwrap();

        let renamed: Catalog = serde_json::from_str(
            r#"{
                "characteristics": [{"id": 1, "name": "Type", "slug": "memory-type"}],
                "products": [{"id": 1, "category": 1, "name": "Fury", "price": 5490.0,
                              "characteristics": {"standard": "DDR4"}}]
            }"#,
        )
        .unwrap();
        assert!(load(&db, renamed).is_err());
        assert!(db.characteristic_by_slug("standard").unwrap().is_some());
    }
}
