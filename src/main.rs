//! Artisan command runner.
//!
//! Loads `.artisanrc.toml`, registers the built-in commands and dispatches
//! argv. Startup never depends on a config file being present.

use std::{env, error::Error};

use artisan::{Artisan, config::Config, tracing_config};
use tracing::instrument;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::discover()?;
    tracing_config::init(&config.logging, config.app.debug)?;

    let mut artisan = build(config)?;

    let argv: Vec<String> = env::args().collect();
    artisan.parse(&argv).await.enforce().await;

    Ok(())
}

#[instrument(skip(config))]
fn build(config: Config) -> Result<Artisan, Box<dyn Error>> {
    let mut artisan = Artisan::new("artisan", config);
    artisan.register_builtin_commands()?;

    Ok(artisan)
}
