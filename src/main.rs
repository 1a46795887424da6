mod db;
mod flatten;
mod identity;
mod parser;
mod scraper;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::warn;

use crate::scraper::ScrapeOutcome;

#[derive(Parser)]
#[command(name = "bodyspace_scraper", about = "BodySpace workout log scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and parse workout log pages from a URL file
    Scrape {
        /// JSON file of log URLs (strings, or objects with url/month/month_date/year)
        #[arg(long)]
        urls_file: PathBuf,
        /// Pages fetched concurrently per batch
        #[arg(long, default_value = "10")]
        batch_size: usize,
        /// Max pages to scrape (default: all unscraped)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Flatten parsed pages into the relational tables
    Flatten {
        /// Max pages to flatten (default: all unflattened)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Scrape + flatten in one pipeline
    Run {
        #[arg(long)]
        urls_file: PathBuf,
        #[arg(long, default_value = "10")]
        batch_size: usize,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show scraping statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape {
            urls_file,
            batch_size,
            limit,
        } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            scrape(&conn, &urls_file, batch_size, limit).await
        }
        Commands::Flatten { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unflattened(&conn, limit)?;
            if pages.is_empty() {
                println!("No unflattened pages. Run 'scrape' first.");
                return Ok(());
            }
            println!("Flattening {} pages...", pages.len());
            let counts = flatten_pages(&conn, &pages)?;
            counts.print();
            Ok(())
        }
        Commands::Run {
            urls_file,
            batch_size,
            limit,
        } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;

            let t_scrape = Instant::now();
            scrape(&conn, &urls_file, batch_size, limit).await?;
            println!("Scrape phase took {:.1}s", t_scrape.elapsed().as_secs_f64());

            let t_flatten = Instant::now();
            let pages = db::fetch_unflattened(&conn, None)?;
            if pages.is_empty() {
                println!("Nothing to flatten (all scraped pages failed).");
                return Ok(());
            }
            println!("Flattening {} pages...", pages.len());
            let counts = flatten_pages(&conn, &pages)?;
            println!("Flattened in {:.1}s", t_flatten.elapsed().as_secs_f64());
            counts.print();
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Pages:              {}", s.pages);
            println!("Parsed:             {}", s.parsed);
            println!("Errors:             {}", s.errors);
            println!("Workouts:           {}", s.workouts);
            println!("Workout components: {}", s.workout_components);
            println!("Sets:               {}", s.sets);
            println!("Set components:     {}", s.set_components);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// A URL file entry: either a bare URL string or an object carrying the
/// link-page date fields that `created_at` is rebuilt from.
struct UrlEntry {
    url: String,
    date_fields: Option<serde_json::Map<String, Value>>,
}

fn load_url_entries(path: &PathBuf) -> Result<Vec<UrlEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let values: Vec<Value> = serde_json::from_str(&raw)?;

    let mut entries = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::String(url) => entries.push(UrlEntry {
                url,
                date_fields: None,
            }),
            Value::Object(map) => {
                let url = map
                    .get("url")
                    .and_then(Value::as_str)
                    .context("url entry object without a \"url\" field")?
                    .to_string();
                entries.push(UrlEntry {
                    url,
                    date_fields: Some(map),
                });
            }
            other => anyhow::bail!("unsupported url entry: {other}"),
        }
    }
    Ok(entries)
}

async fn scrape(
    conn: &rusqlite::Connection,
    urls_file: &PathBuf,
    batch_size: usize,
    limit: Option<usize>,
) -> Result<()> {
    let mut entries = load_url_entries(urls_file)?;

    let seen = db::fetch_scraped_urls(conn)?;
    entries.retain(|e| !seen.contains(&e.url));
    if let Some(n) = limit {
        entries.truncate(n);
    }
    if entries.is_empty() {
        println!("No new URLs to scrape.");
        return Ok(());
    }

    println!("Scraping {} pages...", entries.len());
    let urls: Vec<String> = entries.iter().map(|e| e.url.clone()).collect();
    let outcomes = scraper::scrape_workouts(&urls, batch_size).await?;

    let mut rows = Vec::with_capacity(outcomes.len());
    let mut ok = 0usize;
    let mut errors = 0usize;
    for (outcome, entry) in outcomes.into_iter().zip(entries) {
        match outcome {
            ScrapeOutcome::Parsed(workout) => {
                ok += 1;
                let username = workout.username.clone();
                let mut json = serde_json::to_value(&*workout)?;
                // Carry the link-page date fields alongside the parsed tree.
                if let (Value::Object(obj), Some(dates)) = (&mut json, entry.date_fields) {
                    for key in ["month", "month_date", "year"] {
                        if let Some(v) = dates.get(key) {
                            obj.insert(key.to_string(), v.clone());
                        }
                    }
                }
                rows.push(db::PageRow {
                    url: entry.url,
                    username: Some(username),
                    parsed_json: Some(serde_json::to_string(&json)?),
                    error: None,
                });
            }
            ScrapeOutcome::Failed { url, reason } => {
                errors += 1;
                rows.push(db::PageRow {
                    url,
                    username: None,
                    parsed_json: None,
                    error: Some(reason),
                });
            }
        }
    }

    let saved = db::save_pages(conn, &rows)?;
    println!("Done: {} saved ({} ok, {} errors).", saved, ok, errors);
    Ok(())
}

struct FlattenCounts {
    workouts: usize,
    workout_components: usize,
    sets: usize,
    set_components: usize,
}

impl FlattenCounts {
    fn print(&self) {
        println!(
            "Saved {} workouts, {} components, {} sets, {} set components.",
            self.workouts, self.workout_components, self.sets, self.set_components,
        );
    }
}

fn flatten_pages(conn: &rusqlite::Connection, pages: &[String]) -> Result<FlattenCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = FlattenCounts {
        workouts: 0,
        workout_components: 0,
        sets: 0,
        set_components: 0,
    };

    for chunk in pages.chunks(500) {
        let workouts: Vec<Value> = chunk
            .par_iter()
            .filter_map(|json| match serde_json::from_str(json) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("skipping undecodable page: {}", e);
                    None
                }
            })
            .collect();

        let tables = flatten::flatten_workout_tree(&workouts, &identity::Plaintext);
        counts.workouts += tables.workouts.len();
        counts.workout_components += tables.workout_components.len();
        counts.sets += tables.sets.len();
        counts.set_components += tables.set_components.len();
        db::save_flattened(conn, &tables)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
