//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the yield table (FRED or CSV)
//! - reshapes it for charting and the month-end summary
//! - prints tables/plots, writes exports, or launches the TUI

use clap::Parser;

use crate::agent::{ChatCompletionsAgent, Conversation};
use crate::cli::{AskArgs, Command, ExportArgs, PlotArgs, SourceArgs};
use crate::domain::{DashboardConfig, SeriesName};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `ty` binary.
pub fn run() -> Result<(), AppError> {
    // We want `ty` and `ty --from 2023-01-01` to behave like `ty tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => crate::tui::run(dashboard_config_from_args(&args)),
        Command::Table(args) => handle_table(args),
        Command::Plot(args) => handle_plot(args),
        Command::Export(args) => handle_export(args),
        Command::Ask(args) => handle_ask(args),
    }
}

fn handle_table(args: SourceArgs) -> Result<(), AppError> {
    let config = dashboard_config_from_args(&args);
    let data = pipeline::run_dashboard(&config)?;

    println!("{}", crate::report::format_as_of(&data.table));
    println!("{}", crate::report::format_axis_range(&data.axis));
    println!();
    print!("{}", crate::report::format_month_end_table(&data.summary));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let config = dashboard_config_from_args(&args.source);
    let data = pipeline::run_dashboard(&config)?;

    let visible = crate::reshape::filter_selection(&data.long, args.only.into());
    let plot = crate::plot::render_ascii_plot(&visible, &data.axis, args.width, args.height);
    print!("{plot}");
    println!("{}", crate::report::format_as_of(&data.table));
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    if args.long.is_none() && args.month_end.is_none() {
        return Err(AppError::new(2, "Nothing to export: pass --long and/or --month-end."));
    }

    let config = dashboard_config_from_args(&args.source);
    let data = pipeline::run_dashboard(&config)?;

    if let Some(path) = &args.long {
        crate::io::write_long_csv(path, &data.long)?;
        println!("Wrote {} observations to {}", data.long.len(), path.display());
    }
    if let Some(path) = &args.month_end {
        crate::io::write_month_end_csv(path, &data.summary)?;
        println!("Wrote {} months to {}", data.summary.rows.len(), path.display());
    }
    Ok(())
}

fn handle_ask(args: AskArgs) -> Result<(), AppError> {
    let config = dashboard_config_from_args(&args.source);
    let table = pipeline::load_table(&config)?;
    let agent = ChatCompletionsAgent::from_env(&config.agent_model, config.agent_context_floor)?;

    let question = args.question.join(" ");
    let convo = crate::agent::ask(&agent, &table, &Conversation::new(), &question)?;
    if let Some(reply) = convo.last() {
        println!("{}", reply.content);
    }
    Ok(())
}

pub fn dashboard_config_from_args(args: &SourceArgs) -> DashboardConfig {
    // Keep catalog order regardless of flag order.
    let mut series = if args.series.is_empty() {
        SeriesName::ALL.to_vec()
    } else {
        args.series.clone()
    };
    series.sort();
    series.dedup();

    DashboardConfig {
        csv_path: args.csv.clone(),
        observation_start: args.observation_start,
        series,
        chart_floor: Some(args.chart_from),
        summary_floor: Some(args.summary_from),
        agent_model: args.model.clone(),
        agent_context_floor: Some(args.agent_from),
    }
}

/// Rewrite argv so `ty` defaults to `ty tui`.
///
/// Rules:
/// - `ty`                      -> `ty tui`
/// - `ty --from 2023-01-01`    -> `ty tui --from 2023-01-01`
/// - `ty --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "table" | "plot" | "export" | "ask");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
