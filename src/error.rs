use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    Internal,

    /// The user provided invalid input or asked for something that does not
    /// exist (e.g. a project/env directory that is not there).
    User,

    /// The host is missing something the run depends on, such as the sops
    /// executable or a `.sops.yaml` at the invocation root.
    Environment,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Command-line arguments were missing or malformed.
    Usage,
    /// The `{project}/{env}` target directory does not exist.
    DirectoryNotFound,
    /// The sops executable could not be located.
    ExternalToolMissing,
    /// `.sops.yaml` is absent from the invocation root.
    ConfigMissing,
    /// sops ran but exited unsuccessfully for a file.
    ToolFailed,
    /// sops did not finish within the configured timeout.
    ToolTimeout,
    /// Interaction with the filesystem or a child process failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct SopsBatchError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl SopsBatchError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Renders the message followed by every error in the source chain.
    pub fn chain_message(&self) -> String {
        let mut rendered = self.msg.clone();
        let mut current = StdError::source(self);
        while let Some(cause) = current {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            current = cause.source();
        }
        rendered
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SopsBatchError>;
