use async_graphql::{Context, Object, Result, SimpleObject};

use super::{filter::FilterSelectionInput, Engine};
use crate::{database, facet::FilterSelection};

#[derive(SimpleObject)]
pub(crate) struct Category {
    id: u32,
    slug: String,
    name: String,
    parent: Option<u32>,
    /// Direct sub-categories. Products of a sub-category are not part of
    /// its parent's filters.
    subcategories: Vec<Subcategory>,
}

#[derive(SimpleObject)]
pub(crate) struct Subcategory {
    id: u32,
    slug: String,
    name: String,
}

#[derive(SimpleObject)]
pub(crate) struct Product {
    id: u32,
    name: String,
    price: f64,
    brand: Option<String>,
}

impl From<database::Product> for Product {
    fn from(product: database::Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            brand: (!product.brand.is_empty()).then_some(product.brand),
        }
    }
}

#[derive(Default)]
pub(super) struct CatalogQuery;

#[Object]
impl CatalogQuery {
    #[allow(clippy::unused_async)]
    async fn category(&self, ctx: &Context<'_>, identifier: String) -> Result<Option<Category>> {
        let engine = ctx.data::<Engine>()?;
        let Some((category, children)) = engine.category(&identifier)? else {
            return Ok(None);
        };
        Ok(Some(Category {
            id: category.id,
            slug: category.slug,
            name: category.name,
            parent: category.parent,
            subcategories: children
                .into_iter()
                .map(|c| Subcategory {
                    id: c.id,
                    slug: c.slug,
                    name: c.name,
                })
                .collect(),
        }))
    }

    /// Products of a category matching `selection`, cheapest first.
    #[allow(clippy::unused_async)]
    async fn products(
        &self,
        ctx: &Context<'_>,
        category: String,
        selection: Option<FilterSelectionInput>,
    ) -> Result<Vec<Product>> {
        let engine = ctx.data::<Engine>()?;
        let selection = selection.map(FilterSelection::from);
        Ok(engine
            .products(&category, selection.as_ref())?
            .into_iter()
            .map(Product::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::api::TestSchema;

    #[tokio::test]
    async fn category_with_subcategories() {
        let schema = TestSchema::new();
        let query = r#"
        {
            category(identifier: "components") {
                slug
                parent
                subcategories { slug }
            }
        }"#;
        let data = schema.execute(query).await.data.into_json().unwrap();
        assert_eq!(
            data["category"],
            json!({
                "slug": "components",
                "parent": null,
                "subcategories": [{"slug": "memory"}, {"slug": "coolers"}, {"slug": "empty"}]
            })
        );

        let query = r#"{ category(identifier: "gpus") { slug } }"#;
        let data = schema.execute(query).await.data.into_json().unwrap();
        assert_eq!(data["category"], json!(null));
    }

    #[tokio::test]
    async fn products_by_brand() {
        let schema = TestSchema::new();
        let query = r#"
        {
            products(category: "memory", selection: {brands: ["Kingston"]}) {
                id
                brand
            }
        }"#;
        let data = schema.execute(query).await.data.into_json().unwrap();
        assert_eq!(
            data["products"],
            json!([{"id": 1, "brand": "Kingston"}, {"id": 2, "brand": "Kingston"}])
        );
    }

    #[tokio::test]
    async fn unbranded_product() {
        let schema = TestSchema::new();
        let query = r#"
        {
            products(category: "memory", selection: {priceMax: 15000, priceMin: 15000}) {
                id
                price
                brand
            }
        }"#;
        let data = schema.execute(query).await.data.into_json().unwrap();
        assert_eq!(
            data["products"],
            json!([{"id": 4, "price": 15000.0, "brand": null}])
        );
    }
}
