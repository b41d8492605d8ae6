use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::annex::{AnnexCommand, CommandRunner};
use crate::config::RunSettings;
use crate::domain::{ExperimentId, TrackedFile};
use crate::encode::EncodeClient;
use crate::error::AnnexError;
use crate::fs_util::{WorkdirGuard, path_present};
use crate::metadata::{AllowList, extract_metadata};

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub experiments: Vec<ExperimentSummary>,
    pub files_tracked: usize,
    pub committed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub id: String,
    pub files: Vec<FileOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file: String,
    pub url: String,
    pub action: FileAction,
    pub metadata_fields: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Added,
    Existing,
}

pub struct App<C: EncodeClient, R: CommandRunner> {
    client: C,
    runner: R,
    allow_list: AllowList,
    settings: RunSettings,
}

impl<C: EncodeClient, R: CommandRunner> App<C, R> {
    pub fn new(client: C, runner: R, allow_list: AllowList, settings: RunSettings) -> Self {
        Self {
            client,
            runner,
            allow_list,
            settings,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Fetches and annexes every experiment in order, then commits once if
    /// anything new was added. The destination must already be verified.
    pub fn run(&self, experiments: &[ExperimentId]) -> Result<RunSummary, AnnexError> {
        let mut summaries = Vec::new();
        let mut files_tracked = 0usize;

        for id in experiments {
            info!(experiment = %id, "fetching");
            let experiment = self.client.fetch_experiment(id)?;
            let files = {
                let _guard = WorkdirGuard::enter(self.settings.destination.as_std_path())?;
                self.register_files(&experiment)?
            };
            files_tracked += files
                .iter()
                .filter(|outcome| outcome.action == FileAction::Added)
                .count();
            summaries.push(ExperimentSummary {
                id: id.to_string(),
                files,
            });
        }

        let committed = files_tracked > 0;
        if committed {
            self.commit(experiments)?;
        }

        Ok(RunSummary {
            experiments: summaries,
            files_tracked,
            committed,
        })
    }

    /// Annexes the files of one experiment. Commands run in the current
    /// directory, so callers enter the destination first.
    pub fn register_files(&self, experiment: &Value) -> Result<Vec<FileOutcome>, AnnexError> {
        let experiment_metadata = extract_metadata(experiment, &self.allow_list)?;
        let files = match experiment.get("files") {
            None => {
                warn!("experiment has no files field");
                return Ok(Vec::new());
            }
            Some(Value::Array(files)) => files,
            Some(other) => {
                return Err(AnnexError::MalformedObject(format!(
                    "files is not a list: {other}"
                )));
            }
        };

        let mut outcomes = Vec::with_capacity(files.len());
        for file_object in files {
            let href = file_object
                .get("href")
                .and_then(Value::as_str)
                .ok_or_else(|| AnnexError::MalformedObject("file without href".to_string()))?;
            let tracked = TrackedFile::from_href(href)?;
            let url = self.client.download_url(&tracked.href);

            let action = if path_present(self.settings.destination.join(&tracked.name).as_std_path())
            {
                info!(file = %tracked.name, "already present; refreshing metadata");
                FileAction::Existing
            } else {
                info!(file = %tracked.name, %url, "adding");
                self.runner.run(&AnnexCommand::AddUrl {
                    file: tracked.name.clone(),
                    url: url.clone(),
                    fast: self.settings.fast,
                    verbosity: self.settings.verbosity,
                })?;
                FileAction::Added
            };

            let mut metadata = experiment_metadata.clone();
            metadata.extend(extract_metadata(file_object, &self.allow_list)?);
            let metadata_fields = metadata.len();
            self.runner.run(&AnnexCommand::Metadata {
                file: tracked.name.clone(),
                metadata,
            })?;

            outcomes.push(FileOutcome {
                file: tracked.name,
                url,
                action,
                metadata_fields,
            });
        }
        Ok(outcomes)
    }

    fn commit(&self, experiments: &[ExperimentId]) -> Result<(), AnnexError> {
        let _guard = WorkdirGuard::enter(self.settings.destination.as_std_path())?;
        self.runner.run(&AnnexCommand::commit_for(experiments))
    }
}
