//! Host-keyed basic-auth credentials from a netrc file.
//!
//! The file is looked up at `$NETRC`, falling back to `~/.netrc`. A missing
//! file or a host without an entry is not an error: requests simply go out
//! unauthenticated.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::debug;

use crate::error::AnnexError;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
struct Entry {
    login: Option<String>,
    password: Option<String>,
}

impl Entry {
    fn credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            login: self.login.clone()?,
            password: self.password.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Netrc {
    machines: Vec<(String, Entry)>,
    default: Option<Entry>,
}

/// Splits netrc text into tokens. Tokens may span lines, may be wrapped in
/// double quotes, and may escape any character with a backslash.
struct Lexer<'a> {
    rest: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(content: &'a str) -> Self {
        Self { rest: content }
    }

    fn next_token(&mut self) -> Option<String> {
        loop {
            self.rest = self.rest.trim_start();
            if !self.rest.starts_with('#') {
                break;
            }
            self.rest = self.rest.split_once('\n').map_or("", |(_, tail)| tail);
        }
        if self.rest.is_empty() {
            return None;
        }

        let quoted = self.rest.starts_with('"');
        let body = if quoted { &self.rest[1..] } else { self.rest };
        let mut token = String::new();
        let mut end = body.len();
        let mut chars = body.char_indices();
        while let Some((index, ch)) = chars.next() {
            match ch {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        token.push(escaped);
                    }
                }
                '"' if quoted => {
                    end = index + 1;
                    break;
                }
                ch if !quoted && ch.is_whitespace() => {
                    end = index;
                    break;
                }
                ch => token.push(ch),
            }
        }
        self.rest = &body[end..];
        Some(token)
    }

    /// Drops the rest of the `macdef` line and the macro body, which runs up
    /// to the next blank line.
    fn skip_macro(&mut self) {
        let mut rest = self.rest.split_once('\n').map_or("", |(_, tail)| tail);
        loop {
            let (line, tail) = rest.split_once('\n').unwrap_or((rest, ""));
            rest = tail;
            if line.trim().is_empty() {
                break;
            }
        }
        self.rest = rest;
    }
}

impl Netrc {
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut netrc = Netrc::default();
        let mut lexer = Lexer::new(content);
        // (machine name, entry); `None` name means the `default` entry
        let mut current: Option<(Option<String>, Entry)> = None;

        while let Some(token) = lexer.next_token() {
            match token.as_str() {
                "machine" => {
                    let name = lexer
                        .next_token()
                        .ok_or_else(|| "machine without a name".to_string())?;
                    netrc.finish(current.take());
                    current = Some((Some(name), Entry::default()));
                }
                "default" => {
                    netrc.finish(current.take());
                    current = Some((None, Entry::default()));
                }
                "login" | "password" | "account" => {
                    let value = lexer
                        .next_token()
                        .ok_or_else(|| format!("{token} without a value"))?;
                    let (_, entry) = current
                        .as_mut()
                        .ok_or_else(|| format!("{token} outside of a machine entry"))?;
                    match token.as_str() {
                        "login" => entry.login = Some(value),
                        "password" => entry.password = Some(value),
                        _ => {}
                    }
                }
                "macdef" => {
                    netrc.finish(current.take());
                    lexer.skip_macro();
                }
                other => return Err(format!("unexpected token `{other}`")),
            }
        }
        netrc.finish(current);
        Ok(netrc)
    }

    fn finish(&mut self, entry: Option<(Option<String>, Entry)>) {
        match entry {
            Some((Some(name), entry)) => self.machines.push((name, entry)),
            Some((None, entry)) => self.default = Some(entry),
            None => {}
        }
    }

    /// First matching `machine` entry, then the `default` entry.
    pub fn authenticator(&self, host: &str) -> Option<Credentials> {
        self.machines
            .iter()
            .find(|(name, _)| name == host)
            .map(|(_, entry)| entry)
            .or(self.default.as_ref())
            .and_then(Entry::credentials)
    }

    pub fn load(path: &Path) -> Result<Option<Self>, AnnexError> {
        if !path.exists() {
            debug!(path = %path.display(), "no netrc file");
            return Ok(None);
        }
        let content =
            fs::read_to_string(path).map_err(|_| AnnexError::CredentialsRead(path.to_path_buf()))?;
        Self::parse(&content)
            .map(Some)
            .map_err(|message| AnnexError::CredentialsParse {
                path: path.to_path_buf(),
                message,
            })
    }
}

pub fn default_netrc_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("NETRC") {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".netrc"))
}

pub fn lookup(host: &str) -> Result<Option<Credentials>, AnnexError> {
    let Some(path) = default_netrc_path() else {
        debug!("unable to resolve home directory; skipping netrc");
        return Ok(None);
    };
    lookup_in(&path, host)
}

pub fn lookup_in(path: &Path, host: &str) -> Result<Option<Credentials>, AnnexError> {
    let credentials = Netrc::load(path)?.and_then(|netrc| netrc.authenticator(host));
    match &credentials {
        Some(found) => debug!(host, login = %found.login, "using netrc credentials"),
        None => debug!(host, "no credentials; requests are unauthenticated"),
    }
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# submitter account
machine www.encodeproject.org
    login ABCDEFGH
    password s3cret

macdef init
cd /pub
get README

machine test.encodedcc.org login other password pw account lab
default login anonymous password guest
";

    #[test]
    fn finds_machine_entry() {
        let netrc = Netrc::parse(SAMPLE).unwrap();
        let creds = netrc.authenticator("www.encodeproject.org").unwrap();
        assert_eq!(creds.login, "ABCDEFGH");
        assert_eq!(creds.password, "s3cret");

        let creds = netrc.authenticator("test.encodedcc.org").unwrap();
        assert_eq!(creds.login, "other");
    }

    #[test]
    fn falls_back_to_default_entry() {
        let netrc = Netrc::parse(SAMPLE).unwrap();
        let creds = netrc.authenticator("example.org").unwrap();
        assert_eq!(creds.login, "anonymous");
    }

    #[test]
    fn no_entry_without_default() {
        let netrc = Netrc::parse("machine a.org login x password y").unwrap();
        assert!(netrc.authenticator("b.org").is_none());
    }

    #[test]
    fn rejects_stray_tokens() {
        assert!(Netrc::parse("login x").is_err());
        assert!(Netrc::parse("machine").is_err());
        assert!(Netrc::parse("machine a.org user x").is_err());
    }

    #[test]
    fn quoted_tokens_and_values_on_following_lines() {
        let netrc = Netrc::parse(
            "machine\n  www.encodeproject.org\nlogin\n\"KEY\"\npassword \"pass word\\\" x\"\n",
        )
        .unwrap();
        let creds = netrc.authenticator("www.encodeproject.org").unwrap();
        assert_eq!(creds.login, "KEY");
        assert_eq!(creds.password, "pass word\" x");
    }

    #[test]
    fn backslash_escapes_in_bare_tokens() {
        let netrc = Netrc::parse(r"machine a.org login me password p\ q").unwrap();
        assert_eq!(netrc.authenticator("a.org").unwrap().password, "p q");
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials {
            login: "user".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
