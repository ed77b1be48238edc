//! Console front-end: setup check, authorization, inventory, download run.

mod progress;

use std::path::Path;

use crate::api::ApiClient;
use crate::auth::{Authorizer, Credentials};
use crate::config::AppConfig;
use crate::error::Result;
use crate::inventory;
use crate::pipeline::Pipeline;
use crate::state::DownloadState;

use progress::{ConsoleProgress, print_summary};

/// Runs the whole tool: authorize, inventory the library, download every
/// unfiled item into the archive.
///
/// A missing client identity file is not an error: the setup instructions
/// are printed and the run ends successfully.
///
/// # Errors
///
/// Returns an error on authorization failure, an inventory request failure,
/// or an unwritable progress file. Per-item download failures are reported
/// in the summary instead.
pub async fn run(config: AppConfig) -> Result<()> {
    if !config.paths.credentials_file.exists() {
        print_setup_instructions(&config.paths.credentials_file);
        return Ok(());
    }

    let credentials = Credentials::load(&config.paths.credentials_file)?;
    let authorizer = Authorizer::new(
        credentials,
        config.paths.token_file.clone(),
        config.endpoints.clone(),
    );
    let token = authorizer.authorize().await?;
    authorizer.validate(&token).await;

    let client = ApiClient::new(token.access_token, config.paths.token_file.clone());

    println!("Scanning albums for filed items...");
    let inventory = inventory::build(&client, &config.endpoints).await?;
    println!("  {} filed item(s) across all albums", inventory.filed_ids.len());
    println!("  {} item(s) in the library", inventory.all_items.len());

    let unfiled = inventory.unfiled();
    println!("Found {} unfiled item(s)", unfiled.len());
    if unfiled.is_empty() {
        println!("No unfiled items to download.");
        return Ok(());
    }

    let mut state = DownloadState::load(&config.paths.state_file)?;
    if !state.is_empty() {
        println!("Resuming: {} item(s) already archived", state.len());
    }

    let reporter = ConsoleProgress::new(unfiled.len());
    let pipeline = Pipeline::new(
        client.http(),
        config.paths.archive_file.clone(),
        config.paths.temp_dir.clone(),
        config.paths.state_file.clone(),
    );
    let stats = pipeline.run(&unfiled, &mut state, &reporter).await?;
    reporter.finish();

    print_summary(&stats, &config.paths.archive_file);
    Ok(())
}

fn print_setup_instructions(credentials_file: &Path) {
    println!("ERROR: {} not found!", credentials_file.display());
    println!();
    println!("Please follow these steps:");
    println!("  1. Go to https://console.cloud.google.com/");
    println!("  2. Create a new project");
    println!("  3. Enable the 'Photos Library API'");
    println!("  4. Create OAuth 2.0 credentials (Desktop app)");
    println!(
        "  5. Download them as '{}' next to this binary",
        credentials_file.display()
    );
}
