//! Tether Runner
//!
//! Evaluates a script file or inline source with the bridge installed and
//! prints the completion value.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tether_script::{ScriptRuntime, Value};
use tether_services::{Session, Settings};

#[derive(Parser)]
#[command(name = "tether", version, about = "Run JavaScript against live host data")]
struct Cli {
    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Evaluate this source instead of a file
    #[arg(short, long, conflicts_with = "script")]
    eval: Option<String>,

    /// Print the completion value as JSON
    #[arg(long)]
    json: bool,

    /// Script file to execute
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Settings::default(),
    };
    tracing_subscriber::fmt()
        .with_max_level(settings.log_level()?)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("Tether v{}", tether_core::VERSION);

    let code = run(&cli, &settings)?;
    if let Some(code) = code {
        std::process::exit(code);
    }
    Ok(())
}

/// Run the requested script; returns the exit code it asked for, if any.
fn run(cli: &Cli, settings: &Settings) -> Result<Option<i32>> {
    let script = ScriptRuntime::with_config(settings.engine.clone()).context("starting script runtime")?;
    let session = Session::new();
    session.install(&script).context("installing session globals")?;

    let value = match (&cli.eval, &cli.script) {
        (Some(source), _) => script.execute(source).context("evaluating inline source")?,
        (None, Some(path)) => script
            .execute_file(path)
            .with_context(|| format!("running {}", path.display()))?,
        (None, None) => bail!("nothing to run: pass a script file or --eval <source>"),
    };

    print_value(&value, cli.json)?;
    Ok(session.exit_code())
}

fn print_value(value: &Value, json: bool) -> Result<()> {
    if json {
        let rendered = match value.to_json() {
            Some(json) => serde_json::to_string_pretty(&json).context("rendering result as JSON")?,
            None => "null".to_string(),
        };
        println!("{rendered}");
    } else if !value.is_undefined() {
        println!("{value}");
    }
    Ok(())
}
