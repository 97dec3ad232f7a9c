use std::fs;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::KubemanError;

pub const DEFAULT_HISTORY: &str = "history.txt";

/// Append-only log of every line kubeman has run in a directory.
///
/// The file is opened, written, synced and closed for each line so nothing
/// is lost when the process is interrupted between lines.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

impl HistoryLog {
    pub fn new<T: AsRef<Path>>(path: T) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, line: &str) -> Result<(), KubemanError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.sync_all()?;
        Ok(())
    }

    /// all recorded lines, empty if nothing was recorded yet
    pub fn lines(&self) -> Result<Vec<String>, KubemanError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(String::from).collect()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(err) => Err(err.into()),
        }
    }

    pub fn remove(&self) -> Result<(), KubemanError> {
        debug!(path = %self.path.display(), "removing history");
        fs::remove_file(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {

    use super::HistoryLog;

    #[test]
    fn test_append_keeps_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let history = HistoryLog::new(dir.path().join("history.txt"));

        history.append("minikube delete").expect("append");
        history.append("# comment").expect("append");
        history.append("minikube start").expect("append");

        assert_eq!(
            history.lines().expect("lines"),
            vec!["minikube delete", "# comment", "minikube start"]
        );
    }

    #[test]
    fn test_missing_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let history = HistoryLog::new(dir.path().join("history.txt"));

        assert!(history.lines().expect("lines").is_empty());
        assert!(history.remove().is_err());

        history.append("minikube ip").expect("append");
        history.remove().expect("remove");
        assert!(!history.path().exists());
    }
}
