//! Inspect json attribute declarations and report the compiled bindings.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use json_attributes::inspect::{Inspector, load_documents};
use json_attributes::{AttributeDeclarer, DeclarationSettings};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `inspect-attributes` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "inspect-attributes",
    about = "Run json attribute declarations and print the compiled bindings",
    version
)]
struct CliArgs {
    /// Declaration document (one object or an array of objects).
    #[arg(long = "declarations", value_name = "path")]
    declarations: PathBuf,
    /// Database connection URL. Falls back to `JSON_ATTRIBUTES_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> ExitCode {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            if let Err(write_err) = writeln!(io::stderr().lock(), "{error}") {
                drop(write_err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(error) if is_informational(&error) => error.exit(),
        Err(error) => return Err(error.into()),
    };
    let settings = DeclarationSettings::load_from_iter([OsString::from("inspect-attributes")])
        .map_err(|error| format!("load settings: {error}"))?;
    let database_url = args.database_url.or_else(|| settings.database_url.clone());

    let declarer = AttributeDeclarer::global(settings.policy());
    let documents = load_documents(&args.declarations)?;
    let report = Inspector::new(declarer, database_url).run(&documents)?;

    write!(io::stdout().lock(), "{report}")?;
    Ok(!report.has_failures())
}

/// Help and version requests are answered by clap and exit successfully.
fn is_informational(error: &clap::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}
