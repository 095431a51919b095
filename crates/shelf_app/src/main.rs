//! `shelf`: archive web articles as PDFs from the command line.
mod cli;
mod commands;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use shelf_engine::{
    Archiver, EngineHandle, ExtractionChain, ManifestStore, ReqwestFetcher, ShelfConfig,
    StoreConfig, WkhtmltopdfRenderer,
};
use shelf_logging::{shelf_error, shelf_info};

use cli::{Args, Command};

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            shelf_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let mut config = ShelfConfig::from_env().context("invalid configuration")?;
    if let Some(dir) = args.data_dir {
        config.store = StoreConfig::new(dir);
    }
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        config.log_level
    };
    shelf_logging::initialize(config.log.clone(), level);

    let store = Arc::new(ManifestStore::new(config.store.clone()));
    store.ensure_dirs().with_context(|| {
        format!("cannot use data directory {:?}", config.store.data_dir)
    })?;
    if config.sweep_orphans_on_start {
        let removed = store.sweep_orphans(Duration::from_secs(300))?;
        shelf_info!("Startup sweep removed {} file(s)", removed);
    }

    let mut out = io::stdout().lock();
    match args.command {
        Command::Add { urls } => {
            let renderer = WkhtmltopdfRenderer::new(config.render.clone())
                .context("PDF rendering is unavailable")?;
            let archiver = Archiver::new(
                Arc::new(ReqwestFetcher::new(config.fetch.clone())),
                ExtractionChain::for_mode(config.extraction),
                Arc::new(renderer),
                store,
            );
            let engine = EngineHandle::new(Arc::new(archiver));
            commands::add(&engine, &urls, &mut out)
        }
        Command::List { page, json } => commands::list(&store, page, json, &mut out),
        Command::Show { id } => commands::show(&store, &id, &mut out),
        Command::Path { id } => commands::path(&store, &id, &mut out),
        Command::Delete { id } => commands::delete(&store, &id, &mut out),
        Command::Sweep { min_age_secs } => {
            commands::sweep(&store, Duration::from_secs(min_age_secs), &mut out)
        }
    }
}
