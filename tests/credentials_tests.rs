// Tests for the file-backed credential store.

use std::io::Write;

use iris_live::{CredentialStore, FileCredentialStore, StaticCredentials};

#[test]
fn test_reads_trimmed_key_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "  sk-test-key-123  ").unwrap();

    let store = FileCredentialStore::new(file.path());
    assert_eq!(store.api_key().as_deref(), Some("sk-test-key-123"));
}

#[test]
fn test_blank_file_means_no_key() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "   \n").unwrap();

    let store = FileCredentialStore::new(file.path());
    assert!(store.api_key().is_none());
}

#[test]
fn test_missing_file_means_no_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCredentialStore::new(dir.path().join("no-such-key"));
    assert!(store.api_key().is_none());
}

#[test]
fn test_static_store() {
    assert_eq!(
        StaticCredentials::new("abc").api_key().as_deref(),
        Some("abc")
    );
    assert!(StaticCredentials::missing().api_key().is_none());
}
