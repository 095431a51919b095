use std::collections::HashMap;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use shelf_core::{download_filename, format_saved_date, validate_submitted_url, ReadingListPage};
use shelf_engine::{EngineEvent, EngineHandle, JobId, ManifestStore};
use shelf_logging::{shelf_debug, shelf_info};

pub const NOT_FOUND: &str = "Article not found";

/// Validates and archives every URL; fails if any of them failed.
pub fn add(engine: &EngineHandle, urls: &[String], out: &mut impl Write) -> Result<ExitCode> {
    let mut failed = 0usize;
    let mut pending: HashMap<JobId, String> = HashMap::new();

    for (job_id, raw) in (1..).zip(urls) {
        match validate_submitted_url(raw) {
            Ok(url) => {
                engine.enqueue(job_id, url.clone());
                pending.insert(job_id, url);
            }
            Err(err) => {
                writeln!(out, "skipped {raw:?}: {err}")?;
                failed += 1;
            }
        }
    }

    while !pending.is_empty() {
        let Some(event) = engine.recv() else {
            anyhow::bail!("archive engine stopped with {} job(s) pending", pending.len());
        };
        match event {
            EngineEvent::Progress(progress) => {
                shelf_debug!("job {} {:?}", progress.job_id, progress.stage);
            }
            EngineEvent::JobCompleted { job_id, result } => {
                let url = pending.remove(&job_id).unwrap_or_default();
                match result {
                    Ok(record) => writeln!(out, "saved {}  {}  ({})", record.id, record.title, url)?,
                    Err(failure) => {
                        writeln!(out, "failed {url}: {failure}")?;
                        failed += 1;
                    }
                }
            }
        }
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn list(store: &ManifestStore, page: usize, json: bool, out: &mut impl Write) -> Result<ExitCode> {
    if json {
        let records = store.list_newest_first()?;
        serde_json::to_writer_pretty(&mut *out, &records).context("failed to write JSON")?;
        writeln!(out)?;
        return Ok(ExitCode::SUCCESS);
    }

    let view = ReadingListPage::build(store.load_all()?, page);
    if view.total == 0 {
        writeln!(out, "No articles saved yet.")?;
        return Ok(ExitCode::SUCCESS);
    }
    for row in &view.rows {
        writeln!(
            out,
            "{}  {}  {} ({})",
            row.id, row.formatted_date, row.title, row.domain
        )?;
    }
    writeln!(
        out,
        "page {} of {} ({} articles)",
        view.page, view.total_pages, view.total
    )?;
    Ok(ExitCode::SUCCESS)
}

pub fn show(store: &ManifestStore, id: &str, out: &mut impl Write) -> Result<ExitCode> {
    let Some(record) = store.get_article(id)? else {
        return not_found(out);
    };
    writeln!(out, "id:       {}", record.id)?;
    writeln!(out, "title:    {}", record.title)?;
    writeln!(out, "url:      {}", record.url)?;
    writeln!(out, "domain:   {}", record.domain)?;
    writeln!(out, "saved:    {}", format_saved_date(&record.saved_at))?;
    writeln!(out, "file:     {}", record.filename)?;
    writeln!(out, "download: {}", download_filename(&record.title))?;
    Ok(ExitCode::SUCCESS)
}

pub fn path(store: &ManifestStore, id: &str, out: &mut impl Write) -> Result<ExitCode> {
    match store.blob_path(id)? {
        Some(blob) if blob.exists() => {
            writeln!(out, "{}", blob.display())?;
            Ok(ExitCode::SUCCESS)
        }
        _ => not_found(out),
    }
}

pub fn delete(store: &ManifestStore, id: &str, out: &mut impl Write) -> Result<ExitCode> {
    if !store.delete_article(id)? {
        return not_found(out);
    }
    writeln!(out, "deleted {id}")?;
    Ok(ExitCode::SUCCESS)
}

pub fn sweep(store: &ManifestStore, min_age: Duration, out: &mut impl Write) -> Result<ExitCode> {
    let removed = store.sweep_orphans(min_age)?;
    shelf_info!("Sweep removed {} file(s)", removed);
    writeln!(out, "removed {removed} unreferenced file(s)")?;
    Ok(ExitCode::SUCCESS)
}

fn not_found(out: &mut impl Write) -> Result<ExitCode> {
    writeln!(out, "{NOT_FOUND}")?;
    Ok(ExitCode::FAILURE)
}
