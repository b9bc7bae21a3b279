//! fontl CLI (made by FontLab https://www.fontlab.com/)

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use log::{debug, info};

use fontl_core::catalog::{Catalog, CatalogOptions, DuplicatePolicy};
use fontl_core::output::{write_json_pretty, write_ndjson, write_plain};

pub mod page;
pub mod server;

/// CLI entrypoint for fontl.
#[derive(Debug, Parser)]
#[command(
    name = "fontl",
    about = "Font catalog with metadata sidecars and a CSS/font server (made by FontLab https://www.fontlab.com/)"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the catalog, font files and generated CSS over HTTP
    Serve(ServeArgs),
    /// Scan the directory and print the catalog
    List(ListArgs),
}

#[derive(Debug, Args)]
struct CatalogArgs {
    /// Directory containing fonts
    #[arg(
        short = 'd',
        long = "dir",
        env = "FONTL_DIR",
        default_value = ".",
        value_hint = ValueHint::DirPath
    )]
    dir: PathBuf,

    /// Keep the last file seen when two folders hold the same filename
    #[arg(long = "allow-duplicates", env = "FONTL_ALLOW_DUPLICATES", action = ArgAction::SetTrue)]
    allow_duplicates: bool,

    /// Follow symlinks while walking the directory
    #[arg(long = "follow-symlinks", action = ArgAction::SetTrue)]
    follow_symlinks: bool,
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    /// Port to listen on
    #[arg(short = 'p', long = "port", env = "FONTL_PORT", default_value_t = 8080)]
    port: u16,

    /// Address to bind to
    #[arg(long = "bind", env = "FONTL_BIND", default_value = "0.0.0.0")]
    bind: String,
}

#[derive(Debug, Args)]
struct ListArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::List(args) => run_list(args),
    }
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let addr = bind_addr(&args.bind, args.port);

    info!(
        "starting server on {addr}, serving {} fonts from {}",
        catalog.len(),
        catalog.root().display()
    );
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(server::serve(&addr, Arc::new(catalog)))
}

fn run_list(args: ListArgs) -> Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let listing = catalog.listing();

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.ndjson {
        write_ndjson(&listing, &mut handle)?;
    } else if args.json {
        write_json_pretty(&listing, &mut handle)?;
    } else {
        write_plain(&listing, &mut handle)?;
    }
    handle.flush()?;

    Ok(())
}

fn catalog_options(args: &CatalogArgs) -> CatalogOptions {
    let duplicates = if args.allow_duplicates {
        DuplicatePolicy::LastWins
    } else {
        DuplicatePolicy::Reject
    };
    CatalogOptions::default()
        .follow_symlinks(args.follow_symlinks)
        .duplicates(duplicates)
}

fn load_catalog(args: &CatalogArgs) -> Result<Catalog> {
    let catalog = Catalog::with_options(&args.dir, catalog_options(args));
    catalog
        .load()
        .with_context(|| format!("failed to load fonts from {}", args.dir.display()))?;
    for entry in catalog.entries() {
        debug!("{} -> {}", entry.filename, entry.path.display());
    }
    Ok(catalog)
}

fn bind_addr(bind: &str, port: u16) -> String {
    if bind.contains(':') && !bind.starts_with('[') {
        format!("[{bind}]:{port}")
    } else {
        format!("{bind}:{port}")
    }
}
