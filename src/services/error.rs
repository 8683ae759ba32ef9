use thiserror::Error;

/// Failure taxonomy of the conversion pipeline. Any variant aborts the whole batch.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("{0}")]
    MissingInput(String),

    #[error("could not decode '{file}': {reason}")]
    Decode { file: String, reason: String },

    #[error("could not parse '{file}' at line {line}: {reason}")]
    Parse {
        file: String,
        line: u64,
        reason: String,
    },

    #[error("no data rows found in the uploaded files")]
    NoData,

    #[error("could not build workbook: {0}")]
    Export(String),

    #[error("scratch storage failed for '{file}': {source}")]
    Scratch {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ingestion task failed: {0}")]
    Task(String),
}

impl ConvertError {
    pub fn missing_file_part() -> Self {
        ConvertError::MissingInput("No file part".to_string())
    }

    pub fn no_selected_file() -> Self {
        ConvertError::MissingInput("No selected file".to_string())
    }

    /// True for errors caused by the caller rather than by processing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ConvertError::MissingInput(_))
    }

    /// Pipeline stage name used in logs.
    pub fn stage(&self) -> &'static str {
        match self {
            ConvertError::MissingInput(_) => "input",
            ConvertError::Decode { .. } => "decode",
            ConvertError::Parse { .. } => "parse",
            ConvertError::NoData => "aggregate",
            ConvertError::Export(_) => "export",
            ConvertError::Scratch { .. } => "scratch",
            ConvertError::Task(_) => "ingest",
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for ConvertError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ConvertError::Export(e.to_string())
    }
}
