#![forbid(unsafe_code)]
//! Maps IT-asset inventories: loads YAML asset files, validates them
//! against the type registry, and writes graphviz views plus an issue
//! report to the output directory.

mod load;
mod pipeline;

use clap::Parser;
use inframap_model::Severity;
use inframap_render::{
    render_json, render_text_summary, DeniedGraphvizRunner, DotGraphvizRunner, GraphvizRunner,
    Theme,
};
use pipeline::{CliError, ExitCode, RunOptions, RunSummary};
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "inframap")]
#[command(about = "Generate dependency maps and validation reports for IT-asset inventories")]
struct Cli {
    /// Asset inventory .yaml files to read
    #[arg(long = "assets", value_name = "FILE", required = true, num_args = 1..)]
    assets: Vec<PathBuf>,
    /// Output folder
    #[arg(long, default_value = "asset_inventory")]
    output: PathBuf,
    /// Color theme, `light` or `dark`
    #[arg(long, default_value = "light")]
    theme: String,
    /// Trim the run to assets leading to a type matching this regex
    #[arg(long, value_name = "TYPE")]
    leaf_type: Option<String>,
    /// Invert --leaf-type: keep assets not leading to it
    #[arg(long, default_value_t = false)]
    leaf_negate: bool,
    /// Override the "updated" timestamp in titles, mostly for testing
    #[arg(long, value_name = "WHEN")]
    updated: Option<String>,
    /// Type registry TOML file replacing the builtin catalog
    #[arg(long, value_name = "TOML")]
    registry: Option<PathBuf>,
    /// Print the issue report as JSON instead of a text summary
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Invoke graphviz `dot` to render an SVG per view
    #[arg(long, default_value_t = false)]
    render_svg: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ProcessExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ProcessExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err}");
            ProcessExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let theme = Theme::by_name(&cli.theme)
        .ok_or_else(|| CliError::Usage(format!("unknown theme `{}`", cli.theme)))?;
    let options = RunOptions {
        assets: cli.assets,
        output: cli.output,
        theme,
        leaf_type: cli.leaf_type,
        leaf_negate: cli.leaf_negate,
        updated: cli.updated,
        registry: cli.registry,
        render_svg: cli.render_svg,
    };
    let graphviz: Box<dyn GraphvizRunner> = if options.render_svg {
        Box::new(DotGraphvizRunner)
    } else {
        Box::new(DeniedGraphvizRunner)
    };

    let summary = pipeline::run(&options, graphviz.as_ref())?;
    print_summary(&summary, cli.json)?;

    if summary.report.worst() == Some(Severity::Error) {
        Ok(ExitCode::Validation)
    } else {
        Ok(ExitCode::Success)
    }
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<(), CliError> {
    if json {
        let text = render_json(&summary.report).map_err(|e| CliError::Internal(e.to_string()))?;
        println!("{text}");
    } else {
        println!(
            "{}: {} assets ({} archived), {} views written",
            summary.title, summary.asset_count, summary.archived_count, summary.views_written
        );
        println!("{}", render_text_summary(&summary.report));
    }
    Ok(())
}
