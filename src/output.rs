use std::io::{self, Write};

use serde::Serialize;

use crate::app::{FileAction, RunSummary};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(render_summary(summary).as_bytes())
    }
}

pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    for experiment in &summary.experiments {
        out.push_str(&format!("{} ({} files)\n", experiment.id, experiment.files.len()));
        for file in &experiment.files {
            let action = match file.action {
                FileAction::Added => "added",
                FileAction::Existing => "existing",
            };
            out.push_str(&format!(
                "  {action:<8} {} ({} metadata fields)\n",
                file.file, file.metadata_fields
            ));
        }
    }
    let commit = if summary.committed { "committed" } else { "nothing to commit" };
    out.push_str(&format!("{} new files tracked, {commit}\n", summary.files_tracked));
    out
}
