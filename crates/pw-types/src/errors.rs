use thiserror::Error;

/// Main error type for the PromptWeave system
#[derive(Error, Debug)]
pub enum PwError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Consistency violation: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Invocation configuration errors, surfaced before any trial is asked
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid suggestion bounds: lower {lower} must be finite and <= upper {upper}")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error("Batch size must be at least 1")]
    ZeroBatchSize,

    #[error("Unparsable prompt markup: {message}")]
    UnparsableMarkup { message: String },
}

/// Cross-run study consistency errors
#[derive(Error, Debug)]
pub enum ConsistencyError {
    #[error(
        "Study prompt changed: stored {stored:?}, current {current:?}. \
         Set a new study name when you modify the prompt."
    )]
    PromptChanged { stored: String, current: String },
}

/// Optimizer-storage and feedback-surface errors
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Unsupported storage URL: {url}")]
    UnsupportedStorageUrl { url: String },

    #[error("Study {name} could not be loaded: {message}")]
    StudyCorrupted { name: String, message: String },

    #[error("Parameter shape mismatch: {message}")]
    ShapeMismatch { message: String },

    #[error("Sampler proposed {value} for {name}, outside [{lower}, {upper}]")]
    SuggestionOutOfBounds {
        name: String,
        value: f64,
        lower: f64,
        upper: f64,
    },

    #[error("Feedback schema conflict: {message}")]
    SchemaConflict { message: String },
}

/// External render call failures
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render call failed: {message}")]
    Failed { message: String },

    #[error("Render returned {actual} images for {expected} candidates")]
    BatchLengthMismatch { expected: usize, actual: usize },
}

/// Result type alias for PromptWeave operations
pub type PwResult<T> = Result<T, PwError>;
