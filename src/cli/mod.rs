//! Command-line parsing for the treasury yield dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the reshaping code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::SeriesName;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ty", version, about = "Treasury Yield Tracker (FRED-based)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(SourceArgs),
    /// Print the month-end summary table.
    Table(SourceArgs),
    /// Print an ASCII chart of the yield series.
    Plot(PlotArgs),
    /// Write the long table and/or the month-end summary to CSV.
    Export(ExportArgs),
    /// Ask one question about the yield table.
    Ask(AskArgs),
}

/// Where the data comes from and which window to show.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Read a wide CSV (date + one column per series) instead of fetching FRED.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Series to include (repeatable). Defaults to the whole catalog.
    #[arg(long = "series", value_enum)]
    pub series: Vec<SeriesName>,

    /// First date requested from FRED.
    #[arg(long, default_value = "2000-01-01")]
    pub observation_start: NaiveDate,

    /// Chart rows before this date are dropped.
    #[arg(long = "from", default_value = "2022-09-01")]
    pub chart_from: NaiveDate,

    /// Summary rows before this date are dropped before grouping by month.
    #[arg(long, default_value = "2022-01-01")]
    pub summary_from: NaiveDate,

    /// Chat model used by the question-answering agent.
    #[arg(long, default_value = "gpt-4o")]
    pub model: String,

    /// Table rows before this date are not sent to the agent.
    #[arg(long, default_value = "2022-01-01")]
    pub agent_from: NaiveDate,
}

/// Options for the ASCII chart.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show only this series (the axis range still covers every series).
    #[arg(long, value_enum)]
    pub only: Option<SeriesName>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for CSV exports.
#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Long-format CSV (`date,series,value`).
    #[arg(long, value_name = "CSV")]
    pub long: Option<PathBuf>,

    /// Month-end summary CSV.
    #[arg(long = "month-end", value_name = "CSV")]
    pub month_end: Option<PathBuf>,
}

/// Options for a one-shot question.
#[derive(Debug, Args, Clone)]
pub struct AskArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// The question, e.g. "What was the 10 year yield at the end of 2023?"
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}
