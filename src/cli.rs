use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Build, inspect, and exercise cached map sets.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = TracingFormat::Pretty)]
    pub tracing: TracingFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a map set from a JSON record file and print its canonical XML form
    Render {
        records: PathBuf,
        #[arg(long)]
        name: String,
        /// Cache key to build under (defaults to the name)
        #[arg(long)]
        key: Option<String>,
    },
    /// Resolve a data value against a map set
    Lookup {
        records: PathBuf,
        #[arg(long)]
        name: String,
        /// A plain value, or a JSON object for structured map sets
        value: String,
    },
    /// Step a simulated clock through each refresh mode and a bulk refresh
    RefreshDemo,
}
