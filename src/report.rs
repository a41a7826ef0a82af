//! Error-reporting strategy.
//!
//! Each generation run picks one [`ErrorConvention`]. Under `Silent` a failed
//! populate reports only its [`ErrorKind`]; under `Diagnostic` it also carries a
//! message composed at the innermost failure. Manifest parsing always reports
//! diagnostics and threads a [`ManifestErrors`] accumulator for the key path.

use serde::Deserialize;

use crate::ir::CompilerOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorConvention {
    #[default]
    Silent,
    Diagnostic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingRequiredField,
    TypeMismatch,
    ChoiceNoVariantMatched,
    EnumUnrecognizedValue,
    ListElementInvalid,
    /// Function arguments outside the accepted count.
    ArgumentCount,
}

impl ErrorKind {
    pub fn describe(self) -> &'static str {
        match self {
            ErrorKind::MissingRequiredField => "missing required field",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::ChoiceNoVariantMatched => "no choice variant matched",
            ErrorKind::EnumUnrecognizedValue => "unrecognized enum value",
            ErrorKind::ListElementInvalid => "invalid list element",
            ErrorKind::ArgumentCount => "wrong number of arguments",
        }
    }
}

/// A failed populate. `message` is `None` under the silent convention.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    kind: ErrorKind,
    message: Option<String>,
}

impl Failure {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Re-labels the failure for an enclosing context, wrapping the message
    /// when there is one.
    pub(crate) fn wrap(self, kind: ErrorKind, wrap: impl FnOnce(&str) -> String) -> Failure {
        Failure {
            kind,
            message: self.message.map(|m| wrap(&m)),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => f.write_str(self.kind.describe()),
        }
    }
}

impl std::error::Error for Failure {}

impl ErrorConvention {
    pub fn from_options(options: &CompilerOptions) -> Self {
        if options.generate_error_messages {
            ErrorConvention::Diagnostic
        } else {
            ErrorConvention::Silent
        }
    }

    /// Builds a failure; the message is only rendered when diagnostics are on.
    pub(crate) fn fail(self, kind: ErrorKind, message: impl FnOnce() -> String) -> Failure {
        Failure {
            kind,
            message: match self {
                ErrorConvention::Silent => None,
                ErrorConvention::Diagnostic => Some(message()),
            },
        }
    }
}

/// `'key': message` inside a property, the bare message otherwise.
pub(crate) fn keyed(key: Option<&str>, message: String) -> String {
    match key {
        Some(key) => format!("'{key}': {message}"),
        None => message,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// MANIFEST ACCUMULATOR
// ————————————————————————————————————————————————————————————————————————————

/// Error state threaded by `&mut` through one manifest parse.
///
/// The innermost failure records the message and its key; every enclosing
/// call pushes its own key on the way out, so the path is stored leaf first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ManifestErrors {
    message: String,
    path_reversed: Vec<String>,
}

impl ManifestErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Keys from the root to the failing leaf.
    pub fn path(&self) -> Vec<&str> {
        self.path_reversed.iter().rev().map(String::as_str).collect()
    }

    pub(crate) fn set_message(&mut self, message: String) {
        debug_assert!(self.message.is_empty(), "manifest error already set");
        self.message = message;
    }

    pub(crate) fn push_key(&mut self, key: &str) {
        self.path_reversed.push(key.to_string());
    }

    /// Records the innermost failure at `key`.
    pub(crate) fn fail_at(&mut self, key: &str, message: String) {
        self.set_message(message);
        self.push_key(key);
    }

    /// Renders the final `Error at key 'a.b.c'. message` form.
    pub fn render(&self) -> String {
        debug_assert!(!self.message.is_empty());
        debug_assert!(!self.path_reversed.is_empty());
        format!("Error at key '{}'. {}", self.path().join("."), self.message)
    }
}

/// Final diagnostic of a root manifest parse.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ManifestError {
    pub message: String,
}
