//! Command-line configuration. Every option can also be set from the
//! environment where noted.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::client::STATS_API_URL;
use crate::flatten::FlattenOptions;
use crate::pipeline::FailurePolicy;
use crate::schedule::{GameState, GameType};
use crate::selection::BatterHands;

#[derive(Debug, Parser)]
#[command(name = "mlb-pitch-table")]
#[command(about = "Download MLB game feeds and flatten them into a pitch-by-pitch table")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Directory holding cached game feeds and the log file
    #[arg(long, global = true, env = "MLB_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Base URL of the stats API
    #[arg(long, global = true, env = "STATSAPI_URL", default_value = STATS_API_URL)]
    pub api_url: String,

    /// Maximum number of game feeds requested at once
    #[arg(long, global = true, default_value_t = 4)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the games a season's schedule resolves to
    Schedule {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Fetch every scheduled game of a season and build the table
    Get {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        flatten: FlattenArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch a single game and build its table
    Getone {
        game_pk: i64,

        #[command(flatten)]
        flatten: FlattenArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Build the table from cached game feeds without touching the network
    Flatten {
        /// Only games cached under this season
        #[arg(long)]
        season: Option<u16>,

        #[command(flatten)]
        flatten: FlattenArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Summarize one pitcher's pitch mix from an NDJSON table
    Mix {
        /// Table written by `--format ndjson`
        input: PathBuf,

        #[arg(long)]
        pitcher: i64,

        /// First game date to include (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<chrono::NaiveDate>,

        /// Last game date to include (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<chrono::NaiveDate>,

        #[arg(long, value_enum, default_value_t = BatterHands::All)]
        batter_hands: BatterHands,
    },
}

impl Command {
    /// `mix` reads a table file and never touches the cache or log directory.
    pub fn uses_data_dir(&self) -> bool {
        !matches!(self, Command::Mix { .. })
    }
}

#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    pub season: u16,

    #[arg(long, default_value_t = 1)]
    pub sport_id: u32,

    #[arg(long, value_enum, default_value_t = GameType::Regular)]
    pub game_type: GameType,

    #[arg(long, value_enum, default_value_t = GameState::Final)]
    pub state: GameState,

    /// First official date to include (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<chrono::NaiveDate>,

    /// Last official date to include (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<chrono::NaiveDate>,
}

impl From<&QueryArgs> for crate::schedule::ScheduleQuery {
    fn from(args: &QueryArgs) -> Self {
        Self {
            season: args.season,
            sport_id: args.sport_id,
            game_type: args.game_type,
            start_date: args.start_date,
            end_date: args.end_date,
            state: args.state,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct FlattenArgs {
    /// Do not emit a separate row when an at-bat reaches four balls
    #[arg(long)]
    pub no_walk_markers: bool,

    /// Keep the play result on the at-bat's last row even when a walk row carries it
    #[arg(long)]
    pub duplicate_walk_result: bool,

    /// What to do with a game that cannot be fetched or flattened
    #[arg(long, value_enum, default_value_t = FailurePolicy::Skip)]
    pub on_error: FailurePolicy,
}

impl FlattenArgs {
    pub fn options(&self) -> FlattenOptions {
        FlattenOptions {
            walk_markers: !self.no_walk_markers,
            duplicate_walk_result: self.duplicate_walk_result,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// One object of column arrays
    #[default]
    Json,
    /// One object per row
    Ndjson,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Write the table here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,
}
