use serde_yaml::Error as SerdeYamlError;
use std::io::Error as IoError;
use tera::Error as TeraError;
use thiserror::Error;

use crate::shell::ShellError;

#[derive(Error, Debug)]
pub enum KubemanError {
    #[error("IO error: {0}")]
    IoError(#[from] IoError),
    #[error("Yaml error: {0}")]
    SerdeError(#[from] SerdeYamlError),
    #[error("Template error: {0}")]
    TemplateError(#[from] TeraError),
    #[error("Shell error: {0}")]
    ShellError(#[from] ShellError),
    #[error("gave up waiting for {what} after {attempts} attempts")]
    PollTimeout { what: String, attempts: u32 },
    #[error("interrupted")]
    Cancelled,
    #[error("Unknown error: {0}")]
    Other(String),
}

impl KubemanError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
