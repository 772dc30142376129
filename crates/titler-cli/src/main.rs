use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use titler_arxiv::citation::page_citation;
use titler_arxiv::identifiers::is_pdf_path;
use titler_arxiv::{ArxivClient, InboundSignal, SessionOptions, extract_id, open_session, parse_location};
use titler_core::clipboard::build_and_copy;
use titler_core::{
    Clipboard, Document, Location, MemoryClipboard, Page, SystemClipboard, TitlerConfig,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "arxiv-titler",
    about = "Readable titles and citation snippets for arXiv papers",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting ARXIV_TITLER_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and print the title of a paper page.
    Title { url: String },

    /// Copy a citation snippet for a PDF page to the clipboard.
    Cite {
        url: String,
        /// Print the HTML and plain-text flavours instead of copying.
        #[arg(long)]
        print: bool,
    },

    /// Run a live page session. Reads JSON signals from stdin, one per line,
    /// and prints the final document at EOF.
    Run {
        url: String,
        /// Use a saved HTML snapshot instead of fetching the page.
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file path.
    Path,
    /// Show the effective configuration.
    Show,
    /// Write the default configuration to disk.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    let json_output = cli.json || std::env::var("ARXIV_TITLER_JSON").as_deref() == Ok("1");

    let config = TitlerConfig::load().context("failed to load config")?;
    init_tracing(&config.log.level);

    match cli.command {
        Commands::Title { url } => {
            let client = ArxivClient::from_config(&config.api)?;
            let location = parse_location(&url)?;
            let title = resolve_title(&client, &config, &url, &location).await?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "url": url, "title": title },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{title}");
            }
        }

        Commands::Cite { url, print } => {
            let client = ArxivClient::from_config(&config.api)?;
            let location = parse_location(&url)?;
            extract_id(&location.pathname)
                .with_context(|| format!("{url} is not an arXiv PDF page"))?;
            let title = resolve_title(&client, &config, &url, &location).await?;

            let mut page = Page::new(location, Document::skeleton());
            page.inject_title(&title);
            let segments = page_citation(&page)?;

            let mut memory = MemoryClipboard::default();
            let mut system = SystemClipboard::holding();
            let clipboard: &mut dyn Clipboard = if print { &mut memory } else { &mut system };
            if !print {
                info!("copying citation; the clipboard is held until another program takes it");
            }
            build_and_copy(&mut page.document, &segments, clipboard)
                .context("failed to copy citation")?;
            let dur = start.elapsed().as_millis();

            match memory.contents {
                Some(content) if json_output => print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "title": title, "html": content.html, "plain": content.plain },
                    "meta": { "duration_ms": dur }
                }))?,
                Some(content) => {
                    println!("{}", content.html);
                    println!("{}", content.plain);
                }
                None if json_output => print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "title": title, "copied": true },
                    "meta": { "duration_ms": dur }
                }))?,
                None => println!("Copied citation for \"{title}\""),
            }
        }

        Commands::Run { url, html } => {
            let client = Arc::new(ArxivClient::from_config(&config.api)?);
            let options = SessionOptions::from_config(&config)?;
            let location = parse_location(&url)?;
            let document = load_document(&client, &location, html.as_deref()).await?;

            let mut session = open_session(
                Page::new(location, document),
                client,
                Box::new(SystemClipboard::new()),
                options,
            );
            let handle = session.handle();

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                match InboundSignal::from_line(&line) {
                    Some(signal) => {
                        debug!(?signal, "relaying signal to page");
                        handle.signal(signal);
                    }
                    None => debug!(%line, "ignoring input line"),
                }
            }

            // Let an in-flight lookup land before tearing the page down.
            let resolved = session.resolved().await;
            let page = session.close().await?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "resolved": resolved,
                        "title": page.title(),
                        "html": page.document.to_html(),
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{}", page.document.to_html());
            }
        }

        Commands::Config { action } => {
            let path = TitlerConfig::config_path();
            match action {
                ConfigAction::Path => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
                ConfigAction::Show => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":config}))?;
                    } else {
                        print!("{}", toml_string(&config)?);
                    }
                }
                ConfigAction::Init { force } => {
                    if path.exists() && !force {
                        anyhow::bail!(
                            "config already exists at {} (use --force to overwrite)",
                            path.display()
                        );
                    }
                    TitlerConfig::default().save_to(&path)?;
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                    } else {
                        println!("Wrote default config to {}", path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// PDF pages go to the API; anything else is read from its title element.
async fn resolve_title(
    client: &ArxivClient,
    config: &TitlerConfig,
    url: &str,
    location: &Location,
) -> Result<String> {
    if is_pdf_path(&location.pathname) {
        let id = extract_id(&location.pathname)?;
        Ok(client.fetch_title(&id).await?)
    } else {
        Ok(client
            .fetch_landing_title(url, &config.page.title_class)
            .await?)
    }
}

async fn load_document(
    client: &ArxivClient,
    location: &Location,
    snapshot: Option<&std::path::Path>,
) -> Result<Document> {
    if let Some(path) = snapshot {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok(Document::parse_html(&html));
    }

    if is_pdf_path(&location.pathname) {
        // A viewer tab starts out titled with the file name.
        let mut document = Document::skeleton();
        titler_core::inject_title(&mut document, location.last_segment());
        return Ok(document);
    }

    Ok(client.fetch_document(&location.href()).await?)
}

fn toml_string(config: &TitlerConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
