use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::config::Verbosity;
use crate::domain::{ExperimentId, MetadataArgument};
use crate::error::AnnexError;

pub const COMMIT_PREFIX: &str = "Annexed encode objects: ";

/// An invocation of `git` or `git-annex`. Everything except `GitInit` runs in
/// the process working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnexCommand {
    GitInit {
        target: PathBuf,
    },
    AnnexInit,
    AddUrl {
        file: String,
        url: String,
        fast: bool,
        verbosity: Verbosity,
    },
    Metadata {
        file: String,
        metadata: Vec<MetadataArgument>,
    },
    Commit {
        message: String,
    },
}

impl AnnexCommand {
    pub fn commit_for(experiments: &[ExperimentId]) -> Self {
        let ids = experiments
            .iter()
            .map(ExperimentId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        AnnexCommand::Commit {
            message: format!("{COMMIT_PREFIX}{ids}"),
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            AnnexCommand::GitInit { .. } | AnnexCommand::Commit { .. } => "git",
            _ => "git-annex",
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            AnnexCommand::GitInit { target } => {
                vec!["init".to_string(), target.to_string_lossy().to_string()]
            }
            AnnexCommand::AnnexInit => vec!["init".to_string()],
            AnnexCommand::AddUrl {
                file,
                url,
                fast,
                verbosity,
            } => {
                let mut args = vec!["addurl".to_string()];
                if let Some(flag) = verbosity.annex_flag() {
                    args.push(flag.to_string());
                }
                if *fast {
                    args.push("--fast".to_string());
                }
                args.extend(["--file".to_string(), file.clone(), url.clone()]);
                args
            }
            AnnexCommand::Metadata { file, metadata } => {
                let mut args = vec!["metadata".to_string(), file.clone()];
                args.extend(metadata.iter().flat_map(MetadataArgument::to_args));
                args
            }
            AnnexCommand::Commit { message } => {
                vec!["commit".to_string(), "-m".to_string(), message.clone()]
            }
        }
    }
}

impl fmt::Display for AnnexCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program())?;
        for arg in self.args() {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

pub trait CommandRunner {
    fn run(&self, command: &AnnexCommand) -> Result<(), AnnexError>;
}

/// Runs commands with the system `git` and `git-annex`, inheriting stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &AnnexCommand) -> Result<(), AnnexError> {
        debug!(%command, "running");
        let program = command.program();
        let status = Command::new(program)
            .args(command.args())
            .status()
            .map_err(|err| AnnexError::CommandSpawn {
                program: program.to_string(),
                message: err.to_string(),
            })?;
        if status.success() {
            return Ok(());
        }
        Err(AnnexError::CommandFailed {
            command: command.to_string(),
            status: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addurl_arguments() {
        let command = AnnexCommand::AddUrl {
            file: "ENCFF000ABC.bam".to_string(),
            url: "https://example.org/files/ENCFF000ABC/@@download/ENCFF000ABC.bam".to_string(),
            fast: true,
            verbosity: Verbosity::Verbose,
        };
        assert_eq!(command.program(), "git-annex");
        assert_eq!(
            command.args(),
            vec![
                "addurl",
                "--verbose",
                "--fast",
                "--file",
                "ENCFF000ABC.bam",
                "https://example.org/files/ENCFF000ABC/@@download/ENCFF000ABC.bam",
            ]
        );
    }

    #[test]
    fn metadata_arguments() {
        let command = AnnexCommand::Metadata {
            file: "a.bam".to_string(),
            metadata: vec![
                MetadataArgument::set("key", "value"),
                MetadataArgument::append("key2", "value2"),
            ],
        };
        assert_eq!(
            command.to_string(),
            "git-annex metadata a.bam -s key=value -s key2+=value2"
        );
    }

    #[test]
    fn commit_lists_every_experiment() {
        let ids: Vec<ExperimentId> = ["ENCSR000AKA", "ENCSR000AKB"]
            .iter()
            .map(|id| id.parse().unwrap())
            .collect();
        assert_eq!(
            AnnexCommand::commit_for(&ids).args(),
            vec!["commit", "-m", "Annexed encode objects: ENCSR000AKA,ENCSR000AKB"]
        );
    }
}
