use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid taxonomy id: {0}")]
    #[diagnostic(help("use a numeric NCBI taxonomy id such as 9606 or txid9606"))]
    InvalidTaxId(String),

    #[error("invalid sequence length: {0}")]
    InvalidLength(String),

    #[error("minimum length {min} is greater than maximum length {max}")]
    InvalidLengthRange { min: u64, max: u64 },

    #[error("missing required parameter: {0}")]
    #[diagnostic(help("pass it as a flag or drop --non-interactive to be prompted"))]
    MissingParameter(&'static str),

    #[error("failed to read console input: {0}")]
    Prompt(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("NCBI request failed: {0}")]
    NcbiHttp(String),

    #[error("NCBI returned status {status}: {message}")]
    NcbiStatus { status: u16, message: String },

    #[error("unexpected NCBI response: {0}")]
    NcbiResponse(String),

    #[error("failed to parse GenBank records: {0}")]
    RecordParse(String),

    #[error("failed to write CSV table: {0}")]
    CsvWrite(String),

    #[error("failed to render plot: {0}")]
    PlotRender(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
