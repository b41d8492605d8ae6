use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::AnnexError;

fn experiment_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9:_.\-]*$").expect("experiment id pattern is valid")
    })
}

/// An experiment accession, uuid or alias as accepted by `/experiments/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExperimentId(String);

impl ExperimentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExperimentId {
    type Err = AnnexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if !experiment_id_pattern().is_match(trimmed) {
            return Err(AnnexError::InvalidExperimentId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// One `git-annex metadata` assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum MetadataArgument {
    Set { key: String, value: String },
    Append { key: String, value: String },
}

impl MetadataArgument {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        MetadataArgument::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn append(key: impl Into<String>, value: impl Into<String>) -> Self {
        MetadataArgument::Append {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            MetadataArgument::Set { key, .. } | MetadataArgument::Append { key, .. } => key,
        }
    }

    /// The `-s <assignment>` token pair passed on the command line.
    pub fn to_args(&self) -> [String; 2] {
        ["-s".to_string(), self.to_string()]
    }
}

impl fmt::Display for MetadataArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataArgument::Set { key, value } => write!(f, "{key}={value}"),
            MetadataArgument::Append { key, value } => write!(f, "{key}+={value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedFile {
    pub name: String,
    pub href: String,
}

impl TrackedFile {
    pub fn from_href(href: &str) -> Result<Self, AnnexError> {
        let name = href
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .ok_or_else(|| AnnexError::MalformedObject(format!("href has no file name: {href}")))?;
        Ok(Self {
            name: name.to_string(),
            href: href.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_experiment_id_valid() {
        let id: ExperimentId = " ENCSR000AKA ".parse().unwrap();
        assert_eq!(id.as_str(), "ENCSR000AKA");
    }

    #[test]
    fn parse_experiment_id_rejects_paths() {
        let err = "../files".parse::<ExperimentId>().unwrap_err();
        assert_matches!(err, AnnexError::InvalidExperimentId(_));
        let err = "ENCSR/000".parse::<ExperimentId>().unwrap_err();
        assert_matches!(err, AnnexError::InvalidExperimentId(_));
    }

    #[test]
    fn metadata_argument_rendering() {
        assert_eq!(
            MetadataArgument::set("assay_term_name", "ChIP-seq").to_args(),
            ["-s".to_string(), "assay_term_name=ChIP-seq".to_string()]
        );
        assert_eq!(
            MetadataArgument::append("dbxrefs", "GEO:GSM1").to_string(),
            "dbxrefs+=GEO:GSM1"
        );
    }

    #[test]
    fn tracked_file_name_from_href() {
        let file = TrackedFile::from_href("/files/ENCFF000ABC/@@download/ENCFF000ABC.bam").unwrap();
        assert_eq!(file.name, "ENCFF000ABC.bam");
        assert_matches!(
            TrackedFile::from_href("/files/ENCFF000ABC/"),
            Err(AnnexError::MalformedObject(_))
        );
    }
}
