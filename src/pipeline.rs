//! Flattens a batch of games one at a time, in input order, and assembles the
//! result into a single table.
use clap::ValueEnum;
use futures::{pin_mut, Stream, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{FetchError, PipelineError};
use crate::flatten::{flatten_game, FlattenOptions};
use crate::model::GameDocument;
use crate::table::{Assembler, GameBatch, Table};

/// What to do with a game that cannot be fetched or flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FailurePolicy {
    /// Log the game and leave it out of the table.
    #[default]
    Skip,
    /// Stop the whole batch.
    Abort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub games_flattened: usize,
    pub games_skipped: Vec<SkippedGame>,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedGame {
    pub game_pk: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline {
    pub options: FlattenOptions,
    pub policy: FailurePolicy,
}

impl Pipeline {
    pub fn new(options: FlattenOptions, policy: FailurePolicy) -> Self {
        Self { options, policy }
    }

    /// Flattens games as the iterator yields them; only one document is held at a time.
    pub fn run<I>(&self, games: I) -> Result<(Table, PipelineReport), PipelineError>
    where
        I: IntoIterator<Item = (i64, Result<GameDocument, FetchError>)>,
    {
        let mut assembler = Assembler::new();
        let mut report = PipelineReport::default();

        for (game_pk, fetched) in games {
            self.accept(&mut assembler, &mut report, game_pk, fetched)?;
        }

        finish(assembler, report)
    }

    /// Like [`Pipeline::run`], flattening each game as soon as the stream yields it.
    /// On abort the stream is dropped, so requests still in flight are cancelled.
    pub async fn run_stream<S>(&self, games: S) -> Result<(Table, PipelineReport), PipelineError>
    where
        S: Stream<Item = (i64, Result<GameDocument, FetchError>)>,
    {
        let mut assembler = Assembler::new();
        let mut report = PipelineReport::default();

        pin_mut!(games);
        while let Some((game_pk, fetched)) = games.next().await {
            self.accept(&mut assembler, &mut report, game_pk, fetched)?;
        }

        finish(assembler, report)
    }

    fn accept(
        &self,
        assembler: &mut Assembler,
        report: &mut PipelineReport,
        game_pk: i64,
        fetched: Result<GameDocument, FetchError>,
    ) -> Result<(), PipelineError> {
        let document = match fetched {
            Ok(document) => document,
            Err(source) => {
                if self.policy == FailurePolicy::Abort {
                    return Err(PipelineError::Fetch { game_pk, source });
                }
                warn!(game_pk, err = %source, "Skipping game that could not be fetched");
                report.games_skipped.push(SkippedGame { game_pk, reason: source.to_string() });
                return Ok(());
            }
        };

        match flatten_game(&document, &self.options) {
            Ok(records) => assembler.push(GameBatch { game_pk, records }),
            Err(err) if self.policy == FailurePolicy::Skip => {
                warn!(game_pk, %err, "Skipping game that could not be flattened");
                report.games_skipped.push(SkippedGame { game_pk, reason: err.to_string() });
            }
            Err(err) => return Err(err.into()),
        }

        Ok(())
    }
}

fn finish(assembler: Assembler, mut report: PipelineReport) -> Result<(Table, PipelineReport), PipelineError> {
    report.games_flattened = assembler.games();
    let table = assembler.finish()?;
    report.rows = table.num_rows();
    info!(
        games = report.games_flattened,
        skipped = report.games_skipped.len(),
        rows = report.rows,
        "Assembled table"
    );

    Ok((table, report))
}
