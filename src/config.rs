use camino::Utf8PathBuf;
use tracing_subscriber::EnvFilter;

use crate::error::AnnexError;

pub const DEFAULT_HOST: &str = "www.encodeproject.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Verbose,
    Debug,
}

impl Verbosity {
    pub fn from_flags(verbose: u8, debug: bool) -> Self {
        if debug || verbose >= 2 {
            Verbosity::Debug
        } else if verbose == 1 {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }

    pub fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Verbose => "info",
            Verbosity::Debug => "debug",
        }
    }

    /// `RUST_LOG` wins over the command-line flags when it is set.
    pub fn env_filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.filter_directive()))
    }

    /// Flag forwarded to `git-annex addurl` so its chatter follows ours.
    pub fn annex_flag(self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => None,
            Verbosity::Verbose => Some("--verbose"),
            Verbosity::Debug => Some("--debug"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub destination: Utf8PathBuf,
    pub host: String,
    pub fast: bool,
    pub verbosity: Verbosity,
}

impl RunSettings {
    pub fn resolve(
        destination: Option<&str>,
        host: &str,
        fast: bool,
        verbosity: Verbosity,
    ) -> Result<Self, AnnexError> {
        let cwd = std::env::current_dir().map_err(|err| AnnexError::Filesystem(err.to_string()))?;
        let destination = match destination {
            Some(path) => cwd.join(path),
            None => cwd,
        };
        let destination = Utf8PathBuf::from_path_buf(destination)
            .map_err(|path| AnnexError::InvalidDestination(path.display().to_string()))?;

        Ok(Self {
            destination,
            host: normalize_host(host)?,
            fast,
            verbosity,
        })
    }
}

pub fn normalize_host(host: &str) -> Result<String, AnnexError> {
    let trimmed = host.trim();
    let bare = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');
    if bare.is_empty() || bare.contains('/') || bare.chars().any(char::is_whitespace) {
        return Err(AnnexError::InvalidHost(host.to_string()));
    }
    Ok(bare.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(0, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(2, false), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(0, true), Verbosity::Debug);
        assert_eq!(Verbosity::Quiet.annex_flag(), None);
        assert_eq!(Verbosity::Debug.annex_flag(), Some("--debug"));
    }

    #[test]
    fn normalize_host_strips_scheme() {
        assert_eq!(
            normalize_host("https://www.encodeproject.org/").unwrap(),
            "www.encodeproject.org"
        );
        assert_eq!(normalize_host("example.org").unwrap(), "example.org");
        assert_matches!(normalize_host(" "), Err(AnnexError::InvalidHost(_)));
        assert_matches!(
            normalize_host("example.org/experiments"),
            Err(AnnexError::InvalidHost(_))
        );
    }
}
