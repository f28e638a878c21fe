use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Datelike;
use futures::stream::{self, Stream, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::model::{GameDocument, ScheduleResponse};
use crate::schedule::{self, ScheduleQuery, ScheduledGame};

pub const STATS_API_URL: &str = "https://statsapi.mlb.com";

pub const PROGRESS_TEMPLATE: &str = "{wide_bar} {pos}/{len} | elapsed: {elapsed_precise}, eta: {eta_precise}";

/// Thin client over the public statsapi endpoints this tool reads.
#[derive(Debug, Clone)]
pub struct StatsApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for StatsApi {
    fn default() -> Self {
        Self::new(STATS_API_URL)
    }
}

/// A game feed as received, kept next to its decoded form so it can be cached verbatim.
#[derive(Debug, Clone)]
pub struct RawGame {
    pub game_pk: i64,
    pub body: String,
    pub document: GameDocument,
}

impl StatsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("mlb-pitch-table/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn schedule(&self, query: &ScheduleQuery) -> Result<Vec<ScheduledGame>, FetchError> {
        let url = format!("{}{}", self.base_url, query.path());
        info!(%url, "Getting schedule");
        let body = self.get_text(&url).await?;
        let response: ScheduleResponse =
            serde_json::from_str(&body).map_err(|source| FetchError::Decode { origin: url, source })?;

        Ok(schedule::resolve(response, query))
    }

    pub async fn game_feed(&self, game_pk: i64) -> Result<RawGame, FetchError> {
        let url = format!("{}/api/v1.1/game/{game_pk}/feed/live", self.base_url);
        debug!(%url, "Getting game");
        let body = self.get_text(&url).await?;
        let document = decode_game(&url, &body)?;

        Ok(RawGame { game_pk, body, document })
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| FetchError::Http { url: url.to_owned(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_owned(), status });
        }

        response
            .text()
            .await
            .map_err(|source| FetchError::Http { url: url.to_owned(), source })
    }
}

pub fn decode_game(origin: &str, body: &str) -> Result<GameDocument, FetchError> {
    serde_json::from_str(body).map_err(|source| FetchError::Decode { origin: origin.to_owned(), source })
}

/// Raw game feeds on disk, laid out as `{dir}/{season}/{gamePk}.json`.
#[derive(Debug, Clone)]
pub struct GameCache {
    dir: PathBuf,
}

impl GameCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn store(&self, raw: &RawGame) -> Result<PathBuf, FetchError> {
        let season = raw
            .document
            .official_date()
            .map_or_else(|| "unknown".to_string(), |date| date.year().to_string());
        let season_dir = self.dir.join(season);
        std::fs::create_dir_all(&season_dir).map_err(|source| io_error(&season_dir, source))?;

        let path = season_dir.join(format!("{}.json", raw.game_pk));
        std::fs::write(&path, &raw.body).map_err(|source| io_error(&path, source))?;
        debug!(path = %path.display(), "Saved game");

        Ok(path)
    }

    pub fn find(&self, game_pk: i64) -> Result<Option<PathBuf>, FetchError> {
        let pattern = format!("{}/*/{game_pk}.json", glob::Pattern::escape(&self.dir.to_string_lossy()));
        Ok(glob(&pattern)?.filter_map(Result::ok).next())
    }

    pub fn load(&self, path: &Path) -> Result<GameDocument, FetchError> {
        let body = std::fs::read_to_string(path).map_err(|source| io_error(path, source))?;
        decode_game(&path.display().to_string(), &body)
    }

    /// Cached games for one season (or all seasons), ordered by game id.
    pub fn cached_games(&self, season: Option<u16>) -> Result<Vec<(i64, PathBuf)>, FetchError> {
        let season = season.map_or_else(|| "*".to_string(), |s| s.to_string());
        let pattern = format!("{}/{season}/*.json", glob::Pattern::escape(&self.dir.to_string_lossy()));

        let mut games = Vec::new();
        for entry in glob(&pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    warn!(%err, "Unreadable cache entry");
                    continue;
                }
            };
            let game_pk = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<i64>().ok());
            match game_pk {
                Some(game_pk) => games.push((game_pk, path)),
                None => debug!(path = %path.display(), "Skipping non-game file"),
            }
        }
        games.sort();

        Ok(games)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Io { path: path.display().to_string(), source }
}

/// Loads a game from the cache when present, otherwise fetches and caches it.
pub async fn get_game(api: &StatsApi, cache: Option<&GameCache>, game_pk: i64) -> Result<GameDocument, FetchError> {
    if let Some(cache) = cache {
        if let Some(path) = cache.find(game_pk)? {
            debug!(game_pk, path = %path.display(), "Cache hit");
            return cache.load(&path);
        }
    }

    let raw = api.game_feed(game_pk).await?;
    if let Some(cache) = cache {
        cache.store(&raw)?;
    }

    Ok(raw.document)
}

/// Fetches every game with at most `concurrency` requests in flight. Results
/// come back in input order, each as soon as it and every game before it are
/// ready.
pub fn fetch_games<'a>(
    api: &'a StatsApi,
    cache: Option<&'a GameCache>,
    game_pks: &'a [i64],
    concurrency: usize,
    show_progress: bool,
) -> impl Stream<Item = (i64, Result<GameDocument, FetchError>)> + 'a {
    let progress = if show_progress {
        ProgressBar::new(game_pks.len() as u64)
    } else {
        ProgressBar::hidden()
    }
    .with_finish(ProgressFinish::AndClear);
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
        progress.set_style(style);
    }

    stream::iter(game_pks.iter().copied())
        .map(move |game_pk| {
            let progress = progress.clone();
            async move {
                let result = get_game(api, cache, game_pk).await;
                if let Err(err) = &result {
                    warn!(game_pk, %err, "Could not get game");
                }
                progress.inc(1);
                (game_pk, result)
            }
        })
        .buffered(concurrency.max(1))
}
