use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AnnexError {
    #[error("{0} is not a directory")]
    #[diagnostic(help("create it first, or pass --init to let encode-annex create it"))]
    DestinationMissing(String),

    #[error("{0} is not a git repository")]
    #[diagnostic(help("run `git init` in the destination, or pass --init"))]
    NotGitRepository(String),

    #[error("{0} is not a git-annex repository")]
    #[diagnostic(help("run `git annex init` in the destination, or pass --init"))]
    NotAnnexRepository(String),

    #[error("invalid destination path: {0}")]
    InvalidDestination(String),

    #[error("invalid experiment id: {0}")]
    InvalidExperimentId(String),

    #[error("invalid API host: {0}")]
    InvalidHost(String),

    #[error("failed to read credentials file at {0}")]
    CredentialsRead(PathBuf),

    #[error("failed to parse credentials file {path}: {message}")]
    CredentialsParse { path: PathBuf, message: String },

    #[error("ENCODE request failed: {0}")]
    EncodeHttp(String),

    #[error("unable to open {url}: ENCODE returned status {status}")]
    EncodeStatus { url: String, status: u16 },

    #[error("object {id} is not an experiment (types: {types})")]
    NotAnExperiment { id: String, types: String },

    #[error("no allow-list entry for object types: {0}")]
    UnknownObjectType(String),

    #[error("malformed ENCODE object: {0}")]
    MalformedObject(String),

    #[error("failed to start {program}: {message}")]
    CommandSpawn { program: String, message: String },

    #[error("command `{command}` failed: {status}")]
    CommandFailed { command: String, status: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
