// fitflix-seo: apply, render and check page head metadata
//
// `render` works entirely in memory. `apply`, `inspect` and `verify` drive a
// headless Chrome and always shut it down before exiting.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use fitflix_seo::{
    BrowserSession, Config, HeadSnapshot, MemoryHead, PageHead, SeoMetadataManager,
    extract_head_snapshot, load_yaml_config, load_yaml_config_from,
};

#[derive(Parser)]
#[command(name = "fitflix-seo", version, about = "Fitflix page head metadata tools")]
struct Cli {
    /// Config file (defaults to config.yaml in the package root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the head fragment a route's view produces
    Render {
        route: String,
    },
    /// Open a page in Chrome, apply a route's metadata and print the result
    Apply {
        route: String,
        /// Page to open (defaults to the route on the site base URL)
        #[arg(long)]
        url: Option<String>,
        /// Tear the view down again before reading the head back
        #[arg(long)]
        leave: bool,
    },
    /// Print the head metadata of a live page as JSON
    Inspect {
        url: String,
        /// Wait for this selector before reading (for client-rendered heads)
        #[arg(long)]
        wait_for: Option<String>,
    },
    /// Compare a live page's head with a route's metadata
    Verify {
        route: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        wait_for: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => load_yaml_config_from(path)?,
        None => load_yaml_config()?,
    };

    match cli.command {
        Command::Render { route } => {
            print!("{}", render_route(&config, &route).await?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Apply { route, url, leave } => {
            let session = BrowserSession::new(config.browser.clone());
            let result = apply_route(&session, &config, &route, url, leave).await;
            session.shutdown().await;
            print_json(&result?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Inspect { url, wait_for } => {
            let session = BrowserSession::new(config.browser.clone());
            let result = snapshot_url(&session, &url, wait_for.as_deref()).await;
            session.shutdown().await;
            print_json(&result?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { route, url, wait_for } => {
            let record = config.record_for(&route)?;
            let url = match url {
                Some(url) => url,
                None => config.site.route_url(&route)?,
            };
            let session = BrowserSession::new(config.browser.clone());
            let result = snapshot_url(&session, &url, wait_for.as_deref()).await;
            session.shutdown().await;

            let issues = result?.verify(record, &config.site);
            if issues.is_empty() {
                println!("{url}: head matches {route}");
                return Ok(ExitCode::SUCCESS);
            }
            for issue in &issues {
                println!("{issue}");
            }
            Ok(ExitCode::from(1))
        }
    }
}

async fn render_route(config: &Config, route: &str) -> Result<String> {
    let record = config.record_for(route)?;
    let head = MemoryHead::new(config.site.route_url(route)?);
    let mut manager = SeoMetadataManager::new(head, config.site.clone());
    let Ok(()) = manager.activate(record).await;
    Ok(manager.head().render_html())
}

async fn apply_route(
    session: &BrowserSession,
    config: &Config,
    route: &str,
    url: Option<String>,
    leave: bool,
) -> Result<HeadSnapshot> {
    let record = config.record_for(route)?;
    let url = match url {
        Some(url) => url,
        None => config.site.route_url(route)?,
    };

    let page = session.open_page(&url, None, None).await?;
    let mut manager = SeoMetadataManager::new(PageHead::new(page.clone()), config.site.clone());

    let view = manager.enter(record).await?;
    if leave {
        view.leave().await?;
    } else {
        view.detach();
    }

    extract_head_snapshot(&page).await
}

async fn snapshot_url(session: &BrowserSession, url: &str, wait_for: Option<&str>) -> Result<HeadSnapshot> {
    let page = session.open_page(url, None, wait_for).await?;
    extract_head_snapshot(&page)
        .await
        .with_context(|| format!("Failed to read head of {url}"))
}

fn print_json(snapshot: &HeadSnapshot) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}
