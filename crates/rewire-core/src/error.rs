use thiserror::Error;

/// Error taxonomy for the engine, per the error handling design (§7):
/// admin-facing errors are surfaced verbatim, instrumented-job-facing
/// errors are minimal, and Checker errors are contained to one expectation.
#[derive(Debug, Error)]
pub enum RewireError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Auth,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),

    /// A logic bug triggered by malformed stored data. The expectation is
    /// skipped for this tick — never panics the CheckerLoop.
    #[error("evaluator error: {0}")]
    Evaluator(String),

    #[error("notifier error: {0}")]
    Notifier(String),

    #[error("params_json malformed: {0}")]
    ParamParse(String),
}

impl RewireError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Auth => 401,
            Self::NotFound(_) => 404,
            Self::Store(_) => 500,
            Self::Evaluator(_) => 500,
            Self::Notifier(_) => 502,
            Self::ParamParse(_) => 400,
        }
    }
}

pub type Result<T> = std::result::Result<T, RewireError>;
