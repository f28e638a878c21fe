use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod error;
mod flatten;
mod model;
mod pipeline;
mod record;
mod schedule;
mod selection;
mod table;

use client::{GameCache, StatsApi};
use config::{Cli, Command, FlattenArgs, Format, GlobalArgs, OutputArgs};
use pipeline::{Pipeline, PipelineReport};
use record::FlatRecord;
use schedule::ScheduleQuery;
use selection::{pitch_mix, PitchSelection};
use table::Table;

/// Commands that work in the data directory log to `{data_dir}/log.txt`;
/// the rest log to stderr and leave the directory alone.
fn init_logging(log_dir: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);

    let installed = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            let log_path = dir.join("log.txt");
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .with_context(|| format!("opening {}", log_path.display()))?;
            subscriber.with_writer(Mutex::new(log_file)).try_init()
        }
        None => subscriber.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|err| anyhow::anyhow!("failed to initialize tracing subscriber: {err}"))
}

fn write_table(table: &Table, output: &OutputArgs) -> Result<()> {
    let writer: Box<dyn Write> = match &output.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    match output.format {
        Format::Json => table.write_json(&mut writer, output.output.is_none())?,
        Format::Ndjson => table.write_ndjson(&mut writer)?,
    }
    writer.write_all(b"\n")?;
    writer.flush()?;

    if let Some(path) = &output.output {
        info!(path = %path.display(), rows = table.num_rows(), "Wrote table");
    }
    Ok(())
}

fn print_report(table: &Table, report: &PipelineReport) {
    eprintln!(
        "{} games flattened, {} skipped, {} rows x {} columns",
        report.games_flattened,
        report.games_skipped.len(),
        report.rows,
        table.num_columns()
    );
    for skipped in &report.games_skipped {
        eprintln!("  skipped {}: {}", skipped.game_pk, skipped.reason);
    }
    if table.is_empty() {
        warn!("Table has no rows");
    }
}

async fn fetch_and_flatten(
    global: &GlobalArgs,
    api: &StatsApi,
    cache: &GameCache,
    game_pks: &[i64],
    flatten: &FlattenArgs,
    output: &OutputArgs,
) -> Result<()> {
    let fetched = client::fetch_games(api, Some(cache), game_pks, global.concurrency, !global.quiet);
    let (table, report) = Pipeline::new(flatten.options(), flatten.on_error)
        .run_stream(fetched)
        .await?;
    write_table(&table, output)?;
    print_report(&table, &report);
    Ok(())
}

fn read_records(path: &Path) -> Result<Vec<FlatRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut records = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("{} line {}", path.display(), number + 1))?;
        records.push(record);
    }
    Ok(records)
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli { global, command } = Cli::parse();
    init_logging(command.uses_data_dir().then_some(global.data_dir.as_path()))?;

    let api = StatsApi::new(global.api_url.as_str()).with_timeout(Duration::from_secs(global.timeout));
    let cache = GameCache::new(&global.data_dir);

    match command {
        Command::Schedule { query } => {
            let query = ScheduleQuery::from(&query);
            query.validate()?;
            let games = api.schedule(&query).await?;
            println!("{}", serde_json::to_string_pretty(&games)?);
        }
        Command::Get { query, flatten, output } => {
            let query = ScheduleQuery::from(&query);
            query.validate()?;
            let games = api.schedule(&query).await?;
            let game_pks: Vec<i64> = games.iter().map(|game| game.game_pk).collect();

            let cached = cache.cached_games(Some(query.season))?.len();
            println!("Processing season {} ({} games, {} already cached)", query.season, game_pks.len(), cached);
            info!(season = query.season, games = game_pks.len(), cached, "Processing season");

            fetch_and_flatten(&global, &api, &cache, &game_pks, &flatten, &output).await?;
        }
        Command::Getone { game_pk, flatten, output } => {
            fetch_and_flatten(&global, &api, &cache, &[game_pk], &flatten, &output).await?;
        }
        Command::Flatten { season, flatten, output } => {
            let cached = cache.cached_games(season)?;
            info!(games = cached.len(), "Flattening cached games");

            let progress = if global.quiet {
                ProgressBar::hidden()
            } else {
                ProgressBar::new(cached.len() as u64)
            };
            progress.set_style(ProgressStyle::default_bar().template(client::PROGRESS_TEMPLATE)?);
            let documents = cached
                .iter()
                .progress_with(progress)
                .map(|(game_pk, path)| (*game_pk, cache.load(path)));

            let (table, report) = Pipeline::new(flatten.options(), flatten.on_error).run(documents)?;
            write_table(&table, &output)?;
            print_report(&table, &report);
        }
        Command::Mix { input, pitcher, start_date, end_date, batter_hands } => {
            let records = read_records(&input)?;
            let selection = PitchSelection { start_date, end_date, batter_hands, ..PitchSelection::new(pitcher) };
            let pitches = selection.select(&records);
            info!(pitcher, pitches = pitches.len(), "Selected pitches");

            let mix = pitch_mix(&pitches);
            println!("{}", serde_json::to_string_pretty(&mix)?);
        }
    }

    Ok(())
}
