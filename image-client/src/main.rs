use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;

use image_client::{api::HttpBackend, config::ClientConfig, controller::Controller};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the image service. Defaults to IMAGE_CLIENT_API_URL, then http://localhost:8000
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the current catalog
    List,

    /// Import a public Google Drive folder, then render the refreshed catalog
    Import { folder_url: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init_from_env(Env::default().default_filter_or("warn"));

    let args = Args::parse();
    let config = ClientConfig::from_env().context("invalid environment")?;
    let api_url = args.api_url.unwrap_or(config.api_url);
    log::info!("Using image service at {}", &api_url);

    let controller = Controller::new(HttpBackend::new(&api_url));
    controller.activate().await;

    if let Command::Import { folder_url } = &args.command {
        if let Err(err) = controller.import_and_refresh(folder_url).await {
            log::warn!("import not completed: {}", err);
        }
    }

    println!("{}", controller.render().await);

    if controller.snapshot().await.has_error() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
