//! Loads products from a JSON file into the catalogue.
//!
//! Usage: `seed_catalog <products.json>` with `DATABASE_URL` set. The whole
//! file is validated before anything is written.

use std::{env, fs, io, process};

use storefront_domain::config::DatabaseConfig;
use storefront_storage::seed::{seed_catalog, SeedError};
use storefront_storage::StorageBuilder;

#[tokio::main]
async fn main() -> io::Result<()> {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: seed_catalog <products.json>");
        process::exit(2);
    };

    if let Err(err) = seed(&path).await {
        eprintln!("[seed_catalog] failed: {err}");
        return Err(io::Error::other(err.to_string()));
    }

    Ok(())
}

async fn seed(path: &str) -> Result<(), SeedError> {
    let raw = fs::read_to_string(path)?;
    let config = DatabaseConfig::load_from_env()?;
    let storage = StorageBuilder::from_config(&config).build().await?;

    for stored in seed_catalog(&storage, &raw).await? {
        println!("inserted product {} ({})", stored.id, stored.name);
    }

    Ok(())
}
