//! Schema-driven codecs.
//!
//! A namespace of the schema IR ([`ir`]) is compiled by [`Codegen`] into a
//! [`GeneratedNamespace`]. Its handles construct, clone, populate and
//! serialize runtime instances ([`data`]) against the generic [`Value`] tree,
//! and parse manifest dictionaries with key-path diagnostics.
//!
//! ```
//! use schema_codec::ir::{Namespace, Origin, Property, Type};
//! use schema_codec::{Codegen, Resolver, Value};
//!
//! let nss = vec![Namespace::new("app").with_type(
//!     Type::object([Property::required("n", Type::integer())])
//!         .named("Count")
//!         .with_origin(Origin::json_and_client()),
//! )];
//! let resolver = Resolver::new(&nss).unwrap();
//! let generated = Codegen::new(&resolver).generate("app").unwrap();
//! let count = generated.object("Count").unwrap();
//! let value = Value::from(serde_json::json!({"n": 3}));
//! let object = count.from_value(&value).unwrap();
//! assert_eq!(count.to_value(&object).unwrap(), value);
//! ```

pub mod codegen;
pub mod data;
pub mod error;
pub mod ir;
pub mod load;
pub mod report;
pub mod resolve;
pub mod value;

use anyhow::Context;

pub use codegen::{Codegen, Functions, GeneratedNamespace, GeneratorConfig};
pub use data::{AdditionalProperties, Choice, Data, EnumValue, Object};
pub use error::{CodecError, GenerateError, LoadError};
pub use report::{ErrorConvention, ErrorKind, Failure, ManifestError, ManifestErrors};
pub use resolve::Resolver;
pub use value::{Dict, List, Value};

/// Loads a JSON array of namespaces and generates `namespace` from it.
pub fn generate_from_json(src: &str, namespace: &str) -> anyhow::Result<GeneratedNamespace> {
    let namespaces = load::namespaces_from_str(src).context("failed to load IR document")?;
    let resolver = Resolver::new(&namespaces)?;
    Codegen::new(&resolver)
        .generate(namespace)
        .with_context(|| format!("failed to generate namespace '{namespace}'"))
}
