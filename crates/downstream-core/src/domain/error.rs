//! Error taxonomy for discovery and downstream triggering.

/// Configuration problems, all detected before any repository is triggered.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("you must provide a Github repo search query.")]
    MissingQuery,

    #[error("you must provide your Drone access token.")]
    MissingDroneToken,

    #[error("you must provide your Drone server.")]
    MissingDroneServer,

    #[error("only one of wait and last_successful can be true; choose one")]
    ConflictingModes,

    #[error("unable to parse repository name {0}.")]
    InvalidRepository(String),

    #[error("unable to parse params: invalid param '{0}'; must be KEY=VALUE or file path.")]
    InvalidParam(String),

    #[error("unable to parse params: {path}: {reason}.")]
    ParamFile { path: String, reason: String },

    #[error("param_from_env {0} is not set.")]
    MissingEnvParam(String),
}

/// Failure talking to a remote API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response payload: {0}")]
    Decode(String),
}

/// Run-level errors. Any of these stops the whole run.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unable to search repositories: {0}")]
    Discovery(#[source] RemoteError),

    #[error("timed out waiting on a build for {repository}.")]
    Timeout { repository: String },

    #[error("unable to get latest build for {repository}.")]
    BuildLookup {
        repository: String,
        #[source]
        source: RemoteError,
    },

    #[error("unable to get build list for {repository}.")]
    BuildHistory {
        repository: String,
        #[source]
        source: RemoteError,
    },

    #[error("unable to get last successful build for {repository}.")]
    HistoryExhausted { repository: String },

    #[error("unable to trigger a new build for {repository}.")]
    Trigger {
        repository: String,
        #[source]
        source: RemoteError,
    },
}

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, OrchestrationError>;
