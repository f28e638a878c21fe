use chrono::NaiveDate;
use thiserror::Error;

/// A game document that cannot be flattened at all.
#[derive(Error, Debug)]
pub enum FlattenError {
    #[error("Game {} is missing required path \"{path}\"", display_pk(.game_pk))]
    MissingPath {
        game_pk: Option<i64>,
        path: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Column lengths differ: {}", format_lengths(.lengths))]
    LengthMismatch {
        lengths: Vec<(String, usize)>,
    },

    #[error("Duplicate column \"{0}\"")]
    DuplicateColumn(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Could not decode {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cache I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Bad cache pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Start date {start} is after end date {end}")]
    InvertedRange {
        start: NaiveDate,
        end: NaiveDate,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Fetching game {game_pk} failed")]
    Fetch {
        game_pk: i64,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

fn display_pk(game_pk: &Option<i64>) -> String {
    match game_pk {
        Some(pk) => pk.to_string(),
        None => "<unknown>".to_string(),
    }
}

fn format_lengths(lengths: &[(String, usize)]) -> String {
    lengths
        .iter()
        .map(|(name, len)| format!("{name}={len}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_reports_every_column() {
        let err = AssembleError::LengthMismatch {
            lengths: vec![("game_id".to_string(), 3), ("balls".to_string(), 2)],
        };
        assert_eq!(err.to_string(), "Column lengths differ: game_id=3, balls=2");
    }

    #[test]
    fn missing_path_names_the_game() {
        let err = FlattenError::MissingPath { game_pk: Some(745_123), path: "gameData.teams" };
        assert_eq!(err.to_string(), "Game 745123 is missing required path \"gameData.teams\"");

        let err = FlattenError::MissingPath { game_pk: None, path: "liveData.plays.allPlays" };
        assert!(err.to_string().contains("<unknown>"));
    }
}
