use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_taxscan::app::App;
use kira_taxscan::config::{ConfigLoader, EnvVars, PartialParameters};
use kira_taxscan::error::KiraError;
use kira_taxscan::ncbi::NcbiHttpClient;
use kira_taxscan::output::{ConsoleOutput, JsonOutput, OutputMode};
use kira_taxscan::prompt::Console;
use kira_taxscan::store::OutputStore;

#[derive(Parser)]
#[command(name = "kira-taxscan")]
#[command(
    about = "Search NCBI nucleotide records by taxonomy id and length range, save them as CSV and plot their lengths"
)]
#[command(version, author)]
struct Cli {
    /// Contact email sent to NCBI (env: NCBI_EMAIL)
    #[arg(long)]
    email: Option<String>,

    /// NCBI API key (env: NCBI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Taxonomy id, e.g. 9606 or txid9606
    #[arg(long)]
    taxid: Option<String>,

    /// Minimum sequence length (inclusive)
    #[arg(long)]
    min_len: Option<String>,

    /// Maximum sequence length (inclusive)
    #[arg(long)]
    max_len: Option<String>,

    /// Directory for the CSV and PNG outputs
    #[arg(long)]
    output_dir: Option<Utf8PathBuf>,

    /// JSON config file (default: ./kira-taxscan.json, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Never prompt; print the run summary as JSON
    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output_mode = OutputMode::from_flag(cli.non_interactive);
    if let Err(report) = run(cli, output_mode) {
        output_mode.print_error(&report);
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::InvalidTaxId(_)
        | KiraError::InvalidLength(_)
        | KiraError::InvalidLengthRange { .. }
        | KiraError::MissingParameter(_)
        | KiraError::Prompt(_)
        | KiraError::ConfigRead(_)
        | KiraError::ConfigParse(_) => 2,
        KiraError::NcbiHttp(_) | KiraError::NcbiStatus { .. } | KiraError::NcbiResponse(_) => 3,
        _ => 1,
    }
}

fn run(cli: Cli, output_mode: OutputMode) -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::load(cli.config.as_deref())?;
    let resolved = ConfigLoader::resolve_config(config, &EnvVars::from_process());

    let partial = PartialParameters {
        email: cli.email,
        api_key: cli.api_key,
        tax_id: cli.taxid,
        min_len: cli.min_len,
        max_len: cli.max_len,
    }
    .with_config(&resolved);
    let parameters = match output_mode {
        OutputMode::Interactive => Console::stdio().complete(partial)?,
        OutputMode::NonInteractive => partial.require()?,
    };
    let (credentials, query) = parameters.into_request()?;

    let output_dir = cli.output_dir.unwrap_or(resolved.output_dir);
    let ncbi = NcbiHttpClient::new(credentials, &resolved.client)?;
    let app = App::new(ncbi, OutputStore::new(output_dir));

    match output_mode {
        OutputMode::NonInteractive => {
            let outcome = app.run(&query, &JsonOutput)?;
            JsonOutput::print_outcome(&outcome).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let outcome = app.run(&query, &ConsoleOutput)?;
            ConsoleOutput::print_outcome(&outcome);
        }
    }
    Ok(())
}
