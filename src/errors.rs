use thiserror::Error;

/// Tagged error used throughout the core and its CLI adapter.
///
/// Each variant corresponds to one of the error Kinds in the design (Usage,
/// I/O, File-not-found, Security, Data-format, Analysis-limit, Internal);
/// `exit_code` maps a variant to the process exit status the CLI reports.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("i/o error: {0}")]
    Io(#[source] std::io::Error),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("security error: {0}")]
    Security(String),

    #[error("malformed input: {0}")]
    DataFormat(String),

    #[error("analysis error: {0}")]
    Analysis(String),

    #[error("interrupted")]
    Interrupted,

    #[error("analysis limit exceeded: {0}")]
    AnalysisLimit(String),

    #[error("aborted: {0}")]
    Abort(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::Usage(_) => 1,
            CoreError::Io(_) => 2,
            CoreError::Security(_) => 3,
            CoreError::FileNotFound(_) => 4,
            CoreError::DataFormat(_) => 5,
            CoreError::Analysis(_) => 6,
            CoreError::Interrupted => 7,
            CoreError::AnalysisLimit(_) => 8,
            CoreError::Abort(_) => 98,
            CoreError::Internal(_) => 99,
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
