//! Result sinks for recovered accounts
//!
//! A sink persists one successful authentication. Sink failures are logged
//! by the session callback path and never roll back the success.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use rotauth_core::AuthenticatedAccount;

/// Persistence target for successful authentications.
pub trait AccountSink: Send + Sync {
    fn save(&self, account: &AuthenticatedAccount) -> std::io::Result<()>;
}

/// Appends `username:credential` lines to a file.
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Open the file for appending, creating it if needed.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AccountSink for FileSink {
    fn save(&self, account: &AuthenticatedAccount) -> std::io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| std::io::Error::other("sink lock poisoned"))?;
        writeln!(file, "{}:{}", account.username, account.credential.expose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotauth_core::Credential;

    fn authenticated(username: &str, credential: &str) -> AuthenticatedAccount {
        AuthenticatedAccount {
            username: username.into(),
            credential: Credential::new(credential),
        }
    }

    #[test]
    fn file_sink_writes_username_and_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovered.txt");
        let sink = FileSink::create(&path).unwrap();

        sink.save(&authenticated("alice", "s3cret")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "alice:s3cret\n");
    }

    #[test]
    fn file_sink_appends_across_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovered.txt");
        let sink = FileSink::create(&path).unwrap();

        sink.save(&authenticated("alice", "one")).unwrap();
        sink.save(&authenticated("bob", "two")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "alice:one\nbob:two\n");
    }

    #[test]
    fn file_sink_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovered.txt");
        std::fs::write(&path, "earlier:run\n").unwrap();

        let sink = FileSink::create(&path).unwrap();
        sink.save(&authenticated("alice", "now")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "earlier:run\nalice:now\n");
    }
}
