use std::fs;

use assert_matches::assert_matches;

use encode_annex::credentials::lookup_in;
use encode_annex::error::AnnexError;

#[test]
fn missing_file_means_unauthenticated() {
    let temp = tempfile::tempdir().unwrap();
    let creds = lookup_in(&temp.path().join(".netrc"), "www.encodeproject.org").unwrap();
    assert!(creds.is_none());
}

#[test]
fn reads_host_entry_from_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join(".netrc");
    fs::write(
        &path,
        "machine www.encodeproject.org login KEY password SECRET\n",
    )
    .unwrap();

    let creds = lookup_in(&path, "www.encodeproject.org").unwrap().unwrap();
    assert_eq!(creds.login, "KEY");
    assert_eq!(creds.password, "SECRET");
    assert!(lookup_in(&path, "test.encodedcc.org").unwrap().is_none());
}

#[test]
fn malformed_file_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join(".netrc");
    fs::write(&path, "login KEY\n").unwrap();
    assert_matches!(
        lookup_in(&path, "www.encodeproject.org"),
        Err(AnnexError::CredentialsParse { .. })
    );
}
