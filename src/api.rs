mod catalog;
mod filter;

use async_graphql::{EmptyMutation, EmptySubscription, MergedObject};

use crate::{database::Database, facet::FacetEngine};

pub(crate) type Engine = FacetEngine<Database>;

/// A set of queries defined in the schema.
///
/// This is exposed only for [`Schema`], and not used directly.
#[derive(Default, MergedObject)]
pub(crate) struct Query(catalog::CatalogQuery, filter::FilterQuery);

pub(crate) type Schema = async_graphql::Schema<Query, EmptyMutation, EmptySubscription>;

pub(crate) fn schema(engine: Engine) -> Schema {
    Schema::build(Query::default(), EmptyMutation, EmptySubscription)
        .data(engine)
        .finish()
}

#[cfg(test)]
struct TestSchema {
    _dir: tempfile::TempDir, // to prevent the data directory from being deleted while the test is running
    db: Database,
    schema: Schema,
}

#[cfg(test)]
impl TestSchema {
    fn new() -> Self {
        let db_dir = tempfile::tempdir().unwrap();
        let db = Database::connect(db_dir.path()).unwrap();
        crate::database::fixture::populate(&db);
        let engine = FacetEngine::new(db.clone(), crate::settings::FilterSettings::default());
        let schema = schema(engine);
        Self {
            _dir: db_dir,
            db,
            schema,
        }
    }

    async fn execute(&self, query: &str) -> async_graphql::Response {
        let request: async_graphql::Request = query.into();
        self.schema.execute(request).await
    }
}
