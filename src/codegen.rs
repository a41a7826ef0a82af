//! Namespace generation.
//!
//! [`Codegen`] compiles one namespace of a resolved IR into a
//! [`GeneratedNamespace`]: a table of ref-free plans plus, per type, the set
//! of [`Functions`] its origin flags select. Codec handles borrowed from the
//! generated namespace run those plans.

pub mod codec;
pub(crate) mod clone;
pub(crate) mod default;
pub(crate) mod enums;
pub mod function;
pub(crate) mod manifest;
pub mod plan;
pub(crate) mod populate;
pub(crate) mod to_value;

use std::collections::HashSet;

use bitflags::bitflags;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{CodecError, GenerateError};
use crate::ir::{Origin, TypeKind};
use crate::report::ErrorConvention;
use crate::resolve::{Resolved, Resolver};

use codec::{ChoicesCodec, EnumCodec, EventCodec, FunctionCodec, ManifestCodec, ObjectCodec};
use function::{EventPlan, FunctionPlan};
use plan::{ObjectPlan, Plan, PlanCompiler, PlanTable, TypeId};

bitflags! {
    /// Functions generated for one type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Functions: u8 {
        /// Default construction; always present.
        const DEFAULT               = 1 << 0;
        const CLONE                 = 1 << 1;
        const POPULATE              = 1 << 2;
        const FROM_VALUE            = 1 << 3;
        const TO_VALUE              = 1 << 4;
        const PARSE_FROM_DICTIONARY = 1 << 5;
    }
}

impl Functions {
    pub fn from_origin(origin: &Origin) -> Self {
        let mut functions = Functions::DEFAULT;
        if origin.from_json {
            functions |= Functions::CLONE | Functions::POPULATE | Functions::FROM_VALUE;
        }
        if origin.from_client {
            functions |= Functions::TO_VALUE;
        }
        functions
    }

    pub(crate) fn name(self) -> &'static str {
        if self == Functions::CLONE {
            "Clone"
        } else if self == Functions::POPULATE {
            "Populate"
        } else if self == Functions::FROM_VALUE {
            "FromValue"
        } else if self == Functions::TO_VALUE {
            "ToValue"
        } else if self == Functions::PARSE_FROM_DICTIONARY {
            "ParseFromDictionary"
        } else {
            "Default"
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Overrides the namespace's `generate_error_messages` option.
    pub error_convention: Option<ErrorConvention>,
}

pub struct Codegen<'r, 'a> {
    resolver: &'r Resolver<'a>,
    config: GeneratorConfig,
}

/// Everything generated for one namespace.
#[derive(Debug)]
pub struct GeneratedNamespace {
    name: String,
    convention: ErrorConvention,
    table: PlanTable,
    /// Declared type name -> defining plan id.
    types: IndexMap<String, TypeId>,
    functions_of: Vec<Functions>,
    manifest: Option<TypeId>,
    functions: IndexMap<String, FunctionPlan>,
    events: IndexMap<String, EventPlan>,
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATION
// ————————————————————————————————————————————————————————————————————————————

impl<'r, 'a> Codegen<'r, 'a> {
    pub fn new(resolver: &'r Resolver<'a>) -> Self {
        Codegen { resolver, config: GeneratorConfig::default() }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn generate(&self, namespace: &str) -> Result<GeneratedNamespace, GenerateError> {
        self.resolver.validate()?;
        let ns = self.resolver.namespace(namespace)?;
        let ns_name = ns.name.as_str();
        let convention = self
            .config
            .error_convention
            .unwrap_or_else(|| ErrorConvention::from_options(&ns.compiler_options));

        let mut compiler = PlanCompiler::new(self.resolver);
        let mut declared = Vec::with_capacity(ns.types.len());
        for (name, ty) in &ns.types {
            let qualified = format!("{ns_name}.{name}");
            let id = compiler.register(
                qualified.clone(),
                qualified,
                Resolved { namespace: ns_name, name: Some(name.as_str()), ty },
            );
            let origin = self.resolver.follow_ref(ns_name, ty)?.ty.origin;
            declared.push((name.clone(), id, origin));
        }

        let manifest = match &ns.manifest_keys {
            Some(root) => {
                let display = root.name.as_deref().unwrap_or("ManifestKeys");
                let resolved = self.resolver.follow_ref(ns_name, root)?;
                if !matches!(resolved.ty.kind, TypeKind::Object { .. }) {
                    return Err(GenerateError::ManifestRootNotObject {
                        name: display.to_string(),
                        kind: resolved.ty.kind.name(),
                    });
                }
                Some(compiler.register(
                    format!("{ns_name}::manifest_keys"),
                    format!("{ns_name}.{display}"),
                    Resolved { namespace: ns_name, name: Some(display), ty: root },
                ))
            }
            None => None,
        };

        let mut functions = IndexMap::new();
        for (name, decl) in &ns.functions {
            let params =
                compiler.compile_object(ns_name, format!("{ns_name}.{name}.params"), decl.params.iter(), None)?;
            let results = match &decl.returns_async {
                Some(ret) => Some(compiler.compile_object(
                    ns_name,
                    format!("{ns_name}.{name}.results"),
                    ret.params.iter(),
                    None,
                )?),
                None => None,
            };
            functions.insert(name.clone(), FunctionPlan { name: name.clone(), params, results });
        }

        let mut events = IndexMap::new();
        for (name, decl) in &ns.events {
            let qualified_name = format!("{ns_name}.{name}");
            let params = compiler.compile_object(ns_name, qualified_name.clone(), decl.params.iter(), None)?;
            events.insert(name.clone(), EventPlan { name: name.clone(), qualified_name, params });
        }

        let table = compiler.finish()?;

        let mut functions_of = vec![Functions::DEFAULT; table.len()];
        let mut types = IndexMap::with_capacity(declared.len());
        for (name, id, origin) in declared {
            let target = table.target_id(&Plan::Named(id)).unwrap_or(id);
            functions_of[target] |= Functions::from_origin(&origin);
            if functions_of[target] == Functions::DEFAULT {
                debug!(namespace = ns_name, ty = %name, "type has no origin flags; only default construction is generated");
            }
            types.insert(name, target);
        }

        if let Some(root) = manifest {
            if let Plan::Object(object) = table.resolve(root) {
                if object.properties.is_empty() {
                    warn!(namespace = ns_name, "manifest keys declare no properties");
                }
                functions_of[root] |= Functions::PARSE_FROM_DICTIONARY;
                let mut visited = HashSet::from([root]);
                mark_manifest(&table, object, &mut functions_of, &mut visited)?;
            }
        }

        for (name, id) in &types {
            debug!(
                namespace = ns_name,
                ty = %name,
                kind = table.kind_name(table.resolve(*id)),
                functions = ?functions_of[*id],
                "generated type"
            );
        }
        debug!(
            namespace = ns_name,
            types = types.len(),
            functions = functions.len(),
            events = events.len(),
            ?convention,
            "generated namespace"
        );

        Ok(GeneratedNamespace {
            name: ns_name.to_string(),
            convention,
            table,
            types,
            functions_of,
            manifest,
            functions,
            events,
        })
    }
}

/// Walks object properties reachable from the manifest root, checking that
/// each kind can be read from a manifest and flagging named objects and
/// choices for manifest parsing. Arrays and choice variants are read through
/// populate and are not descended into.
fn mark_manifest(
    table: &PlanTable,
    object: &ObjectPlan,
    functions_of: &mut [Functions],
    visited: &mut HashSet<TypeId>,
) -> Result<(), GenerateError> {
    for prop in &object.properties {
        let concrete = table.concrete(&prop.plan);
        let target = table.target_id(&prop.plan);
        match concrete {
            Plan::Boolean
            | Plan::Integer
            | Plan::Int64
            | Plan::Double
            | Plan::String
            | Plan::Enum(_)
            | Plan::Array(_) => {}
            Plan::Choices(_) => {
                if let Some(id) = target {
                    functions_of[id] |= Functions::PARSE_FROM_DICTIONARY | Functions::POPULATE;
                }
            }
            Plan::Object(child) => {
                if let Some(id) = target {
                    functions_of[id] |= Functions::PARSE_FROM_DICTIONARY;
                    if !visited.insert(id) {
                        continue;
                    }
                }
                mark_manifest(table, child, functions_of, visited)?;
            }
            other => {
                return Err(GenerateError::UnsupportedManifestProperty {
                    owner: object.name.clone(),
                    key: prop.name.clone(),
                    kind: table.kind_name(other),
                });
            }
        }
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// LOOKUP
// ————————————————————————————————————————————————————————————————————————————

impl GeneratedNamespace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn convention(&self) -> ErrorConvention {
        self.convention
    }

    pub fn table(&self) -> &PlanTable {
        &self.table
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn functions_of(&self, type_name: &str) -> Option<Functions> {
        self.types.get(type_name).map(|id| self.functions_of[*id])
    }

    fn type_id(&self, name: &str) -> Result<TypeId, CodecError> {
        self.types.get(name).copied().ok_or_else(|| CodecError::Unknown {
            what: "type",
            name: name.to_string(),
            namespace: self.name.clone(),
        })
    }

    fn wrong_kind(&self, name: &str, id: TypeId, expected: &'static str) -> CodecError {
        CodecError::WrongKind {
            name: name.to_string(),
            expected,
            actual: self.table.kind_name(self.table.resolve(id)),
        }
    }

    pub fn object(&self, name: &str) -> Result<ObjectCodec<'_>, CodecError> {
        let id = self.type_id(name)?;
        match self.table.resolve(id) {
            Plan::Object(plan) => Ok(ObjectCodec::new(self, id, plan)),
            _ => Err(self.wrong_kind(name, id, "object")),
        }
    }

    pub fn choices(&self, name: &str) -> Result<ChoicesCodec<'_>, CodecError> {
        let id = self.type_id(name)?;
        match self.table.resolve(id) {
            Plan::Choices(plan) => Ok(ChoicesCodec::new(self, id, plan)),
            _ => Err(self.wrong_kind(name, id, "choices")),
        }
    }

    pub fn enumeration(&self, name: &str) -> Result<EnumCodec<'_>, CodecError> {
        let id = self.type_id(name)?;
        match self.table.resolve(id) {
            Plan::Enum(plan) => Ok(EnumCodec::new(plan)),
            _ => Err(self.wrong_kind(name, id, "enum")),
        }
    }

    pub fn manifest(&self) -> Result<ManifestCodec<'_>, CodecError> {
        let unknown = || CodecError::Unknown {
            what: "manifest keys",
            name: "manifest_keys".to_string(),
            namespace: self.name.clone(),
        };
        let id = self.manifest.ok_or_else(unknown)?;
        match self.table.resolve(id) {
            Plan::Object(plan) => Ok(ManifestCodec::new(ObjectCodec::new(self, id, plan))),
            _ => Err(unknown()),
        }
    }

    pub fn function(&self, name: &str) -> Result<FunctionCodec<'_>, CodecError> {
        self.functions
            .get(name)
            .map(|plan| FunctionCodec::new(self, plan))
            .ok_or_else(|| CodecError::Unknown {
                what: "function",
                name: name.to_string(),
                namespace: self.name.clone(),
            })
    }

    pub fn event(&self, name: &str) -> Result<EventCodec<'_>, CodecError> {
        self.events
            .get(name)
            .map(|plan| EventCodec::new(self, plan))
            .ok_or_else(|| CodecError::Unknown {
                what: "event",
                name: name.to_string(),
                namespace: self.name.clone(),
            })
    }

    pub(crate) fn functions_by_id(&self, id: TypeId) -> Functions {
        self.functions_of[id]
    }
}
