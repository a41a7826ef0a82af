//! Error types for generation, IR loading and codec use.
//!
//! Data errors raised while populating from a generic value are not here;
//! they are ordinary return values described in [`crate::report`].

use thiserror::Error;

use crate::report::Failure;

/// Errors detected while compiling a namespace into codecs.
#[derive(Debug, Error, PartialEq)]
pub enum GenerateError {
    #[error("unknown namespace '{0}'")]
    UnknownNamespace(String),

    #[error("namespace '{0}' is registered twice")]
    DuplicateNamespace(String),

    #[error("'{from}' references unknown type '{target}'")]
    DanglingRef { from: String, target: String },

    #[error("reference cycle detected: {}", .cycle.join(" -> "))]
    RefCycle { cycle: Vec<String> },

    #[error("'{0}' declares a choices type with no variants")]
    EmptyChoices(String),

    #[error("'{0}' declares an enum with no values")]
    EmptyEnum(String),

    /// A type would contain itself through required object properties and
    /// could never be default constructed.
    #[error("'{}' contains itself through required properties", .cycle.join(" -> "))]
    RecursiveRequired { cycle: Vec<String> },

    /// A choices type can be itself through variants alone, so no value
    /// would ever settle on a variant.
    #[error("'{}' contains itself through choices variants", .cycle.join(" -> "))]
    RecursiveChoices { cycle: Vec<String> },

    #[error("manifest type '{name}' must be an object, but it is: {kind}")]
    ManifestRootNotObject { name: String, kind: &'static str },

    #[error("property type not implemented for manifest key '{key}' of '{owner}': {kind}")]
    UnsupportedManifestProperty {
        owner: String,
        key: String,
        kind: &'static str,
    },
}

/// Errors reading an IR document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid IR document at {path}: {source}")]
    Shape {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from using a generated namespace.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("no {what} named '{name}' in namespace '{namespace}'")]
    Unknown {
        what: &'static str,
        name: String,
        namespace: String,
    },

    #[error("'{name}' is {actual}, not {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{function} was not generated for '{name}'")]
    NotGenerated {
        name: String,
        function: &'static str,
    },

    /// Instance data does not have the shape its type describes.
    #[error("'{at}': expected {expected} data, found {found}")]
    ShapeMismatch {
        at: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Populate(#[from] Failure),
}
