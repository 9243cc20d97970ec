use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Columns not found: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Failed to process file: {0}")]
    Parse(String),

    #[error("No data found for the selected filters")]
    EmptyResult,

    #[error("No franchise selected")]
    NoSelection,

    #[error("Failed to build report: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<csv::Error> for DashError {
    fn from(e: csv::Error) -> Self {
        DashError::Parse(e.to_string())
    }
}

impl From<calamine::Error> for DashError {
    fn from(e: calamine::Error) -> Self {
        DashError::Parse(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for DashError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        DashError::Export(e.to_string())
    }
}

impl From<tracing_subscriber::util::TryInitError> for DashError {
    fn from(e: tracing_subscriber::util::TryInitError) -> Self {
        DashError::Logging(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
