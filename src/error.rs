//! Error types shared by the library's components.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Problems locating, reading or writing the configuration file.
///
/// All of these are fatal: they surface before a client is even built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a per-user config directory")]
    NoConfigDir,

    #[error("config file {0:?} exists already! Use -f to overwrite it.")]
    AlreadyExists(PathBuf),

    #[error("could not access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("rule table has no {0:?} entry")]
    MissingDefaultRule(&'static str),

    #[error("rule table has {count} {name:?} entries, expected one")]
    DuplicateDefaultRule { name: &'static str, count: usize },

    #[error("rule for {tracker:?} has an invalid max_ratio: {max_ratio}")]
    InvalidRatio { tracker: String, max_ratio: f64 },
}

/// A failure talking to the transmission daemon, or making sense of
/// what it sent back.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("could not {action}: {message}")]
    Rpc {
        action: &'static str,
        message: String,
    },

    #[error("transmission refused to {action}: {result}")]
    Rejected {
        action: &'static str,
        result: String,
    },

    #[error("torrent has no field {0:?}")]
    MissingField(&'static str),

    #[error("unknown {field} code {code}")]
    UnknownCode { field: &'static str, code: i64 },
}

/// Reasons a shell command can fail. None of them end the shell.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown function: {0}")]
    UnknownOperand(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("could not write output: {0}")]
    Output(#[from] io::Error),
}
