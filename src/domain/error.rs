//! Domain error types.

/// Failure of a single indicator over a bar prefix.
///
/// Indicators never panic or emit NaN on bad input; they return one of these
/// so callers can tell "skip this symbol" apart from "wait for more bars".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("empty bar series")]
    EmptySeries,

    #[error("invalid input for {indicator}: {reason}")]
    InvalidInput {
        indicator: &'static str,
        reason: String,
    },

    #[error("insufficient data for {indicator}: have {have} bars, need {need}")]
    InsufficientData {
        indicator: &'static str,
        have: usize,
        need: usize,
    },
}

impl IndicatorError {
    pub fn insufficient(indicator: &'static str, have: usize, need: usize) -> Self {
        IndicatorError::InsufficientData {
            indicator,
            have,
            need,
        }
    }

    /// True when more history would let the indicator succeed.
    pub fn is_insufficient(&self) -> bool {
        matches!(self, IndicatorError::InsufficientData { .. })
    }
}

/// Top-level error type for stockflow.
#[derive(Debug, thiserror::Error)]
pub enum StockflowError {
    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error("invalid bars for {symbol}: {reason}")]
    InvalidBars { symbol: String, reason: String },

    #[error("missing column {column} for {symbol}")]
    MissingColumn { symbol: String, column: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StockflowError {
    /// True for errors that only mean "not enough history yet".
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, StockflowError::Indicator(e) if e.is_insufficient())
    }
}

impl From<&StockflowError> for std::process::ExitCode {
    fn from(err: &StockflowError) -> Self {
        let code: u8 = match err {
            StockflowError::Io(_) | StockflowError::Report { .. } | StockflowError::Json(_) => 1,
            StockflowError::ConfigParse { .. }
            | StockflowError::ConfigMissing { .. }
            | StockflowError::ConfigInvalid { .. } => 2,
            StockflowError::DataSource { .. } => 3,
            StockflowError::Indicator(_)
            | StockflowError::InvalidBars { .. }
            | StockflowError::MissingColumn { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
