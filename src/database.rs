pub(crate) mod cache;
pub(crate) mod category;
pub(crate) mod characteristic;
pub(crate) mod product;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use sled::{Db, Tree};

pub(crate) use self::{
    category::Category,
    characteristic::{Assignment, CharacteristicType, FilterableType},
    product::Product,
};

const CATEGORY_TREE: &str = "categories";
const CATEGORY_SLUG_TREE: &str = "category_slugs";
const PRODUCT_TREE: &str = "products";
const CATEGORY_PRODUCT_TREE: &str = "category_products";
const CHARACTERISTIC_TREE: &str = "characteristics";
const CHARACTERISTIC_SLUG_TREE: &str = "characteristic_slugs";
const CATEGORY_CHARACTERISTIC_TREE: &str = "category_characteristics";
const ASSIGNMENT_TREE: &str = "assignments";
const CACHE_TREE: &str = "facet_cache";

#[derive(Clone)]
pub(crate) struct Database {
    #[allow(unused)]
    db: Db,
    categories: Tree,
    category_slugs: Tree,
    products: Tree,
    category_products: Tree,
    characteristics: Tree,
    characteristic_slugs: Tree,
    category_characteristics: Tree,
    assignments: Tree,
    cache: Tree,
}

impl Database {
    fn connect_db(path: &Path) -> Result<Db> {
        sled::open(path).with_context(|| format!("cannot open database at {}", path.display()))
    }

    fn connect_tree(db: &Db, t_name: &str) -> Result<Tree> {
        Ok(db.open_tree(bincode::serialize(t_name)?)?)
    }

    pub(crate) fn connect(path: &Path) -> Result<Database> {
        let db = Database::connect_db(path)?;
        Ok(Database {
            categories: Database::connect_tree(&db, CATEGORY_TREE)?,
            category_slugs: Database::connect_tree(&db, CATEGORY_SLUG_TREE)?,
            products: Database::connect_tree(&db, PRODUCT_TREE)?,
            category_products: Database::connect_tree(&db, CATEGORY_PRODUCT_TREE)?,
            characteristics: Database::connect_tree(&db, CHARACTERISTIC_TREE)?,
            characteristic_slugs: Database::connect_tree(&db, CHARACTERISTIC_SLUG_TREE)?,
            category_characteristics: Database::connect_tree(&db, CATEGORY_CHARACTERISTIC_TREE)?,
            assignments: Database::connect_tree(&db, ASSIGNMENT_TREE)?,
            cache: Database::connect_tree(&db, CACHE_TREE)?,
            db,
        })
    }

    fn insert<T: Serialize>(key: &[u8], val: &T, tree: &Tree) -> Result<()> {
        tree.insert(key, bincode::serialize(val)?)?;
        Ok(())
    }

    fn select<T: DeserializeOwned>(key: &[u8], tree: &Tree) -> Result<Option<T>> {
        match tree.get(key)? {
            Some(val) => Ok(Some(bincode::deserialize(&val)?)),
            None => Ok(None),
        }
    }
}

/// Builds a composite key out of big-endian ids, so that sled's byte order
/// matches numeric order.
pub(crate) fn compose_key(ids: &[u32]) -> Vec<u8> {
    ids.iter().flat_map(|id| id.to_be_bytes()).collect()
}

/// Reads the `index`-th id of a key built by [`compose_key`].
pub(crate) fn id_at(key: &[u8], index: usize) -> Result<u32> {
    let start = index * 4;
    let bytes = key
        .get(start..start + 4)
        .with_context(|| format!("invalid key in database: {key:02x?}"))?;
    Ok(u32::from_be_bytes(bytes.try_into()?))
}

#[cfg(test)]
pub(crate) mod fixture {
    //! A small PC-parts catalog shared by the engine and API tests.

    use super::{Category, CharacteristicType, Database, Product};

    pub(crate) const MEMORY: u32 = 1;
    pub(crate) const COOLERS: u32 = 2;
    pub(crate) const EMPTY: u32 = 3;
    pub(crate) const COMPONENTS: u32 = 4;

    pub(crate) const STANDARD: u32 = 10;
    pub(crate) const CAPACITY: u32 = 11;
    pub(crate) const SOCKET: u32 = 12;
    pub(crate) const COLOR: u32 = 13;

    pub(crate) fn category(id: u32, slug: &str, parent: Option<u32>) -> Category {
        Category {
            id,
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            parent,
        }
    }

    pub(crate) fn product(id: u32, category: u32, price: f64, brand: &str) -> Product {
        Product {
            id,
            category,
            name: format!("product-{id}"),
            price,
            brand: brand.to_string(),
        }
    }

    fn characteristic(id: u32, slug: &str) -> CharacteristicType {
        CharacteristicType {
            id,
            name: slug.to_uppercase(),
            slug: slug.to_string(),
        }
    }

    /// Memory modules:
    ///
    /// | id | price | brand    | standard    | capacity |
    /// |----|-------|----------|-------------|----------|
    /// | 1  | 10000 | Kingston | DDR4        | 16GB     |
    /// | 2  | 20000 | Kingston | DDR4, DDR5  | 32GB     |
    /// | 3  | 30000 | Corsair  | DDR5        | 32GB     |
    /// | 4  | 15000 | (none)   | DDR5        | 16GB     |
    ///
    /// Coolers carry their own socket axis plus a single DDR3 standard. The
    /// color axis is bound to memory but never assigned there.
    pub(crate) fn populate(db: &Database) {
        db.insert_category(&category(COMPONENTS, "components", None))
            .unwrap();
        db.insert_category(&category(MEMORY, "memory", Some(COMPONENTS)))
            .unwrap();
        db.insert_category(&category(COOLERS, "coolers", Some(COMPONENTS)))
            .unwrap();
        db.insert_category(&category(EMPTY, "empty", Some(COMPONENTS)))
            .unwrap();

        for (id, slug) in [
            (STANDARD, "standard"),
            (CAPACITY, "capacity"),
            (SOCKET, "socket"),
            (COLOR, "color"),
        ] {
            db.insert_characteristic(&characteristic(id, slug)).unwrap();
        }
        db.bind_characteristic(MEMORY, STANDARD, 1).unwrap();
        db.bind_characteristic(MEMORY, CAPACITY, 2).unwrap();
        db.bind_characteristic(MEMORY, COLOR, 3).unwrap();
        db.bind_characteristic(COOLERS, SOCKET, 1).unwrap();
        db.bind_characteristic(COOLERS, STANDARD, 2).unwrap();
        db.bind_characteristic(EMPTY, STANDARD, 1).unwrap();

        let memory = [
            (1, 10_000.0, "Kingston", "DDR4", "16GB"),
            (2, 20_000.0, "Kingston", "DDR4, DDR5", "32GB"),
            (3, 30_000.0, "Corsair", "DDR5", "32GB"),
            (4, 15_000.0, "", "DDR5", "16GB"),
        ];
        for (id, price, brand, standard, capacity) in memory {
            db.insert_product(&product(id, MEMORY, price, brand))
                .unwrap();
            db.assign(id, STANDARD, standard).unwrap();
            db.assign(id, CAPACITY, capacity).unwrap();
        }

        db.insert_product(&product(5, COOLERS, 4_500.5, "Noctua"))
            .unwrap();
        db.assign(5, SOCKET, "AM4, AM5").unwrap();
        db.insert_product(&product(6, COOLERS, 3_200.0, "Arctic"))
            .unwrap();
        db.assign(6, SOCKET, "LGA1700").unwrap();
        // A standard that only ever shows up outside of memory.
        db.assign(6, STANDARD, "DDR3").unwrap();
    }
}
