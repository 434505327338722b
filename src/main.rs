mod api;
mod database;
mod facet;
mod import;
mod settings;
mod web;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::{
    database::Database,
    facet::FacetEngine,
    settings::{Args, Settings},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let settings = Settings::from_file(&args.config)
        .with_context(|| format!("Problem while loading {}", args.config.display()))?;

    let database = Database::connect(&settings.database.path)?;
    if let Some(path) = &args.import {
        import::load_file(&database, path)?;
    }

    let engine = FacetEngine::new(database, settings.filter);
    let schema = api::schema(engine);
    let tls = args.cert.zip(args.key);

    info!("Storefront filters listening on {}", settings.web.address);
    web::serve(schema, settings.web.address, tls).await;
    Ok(())
}
