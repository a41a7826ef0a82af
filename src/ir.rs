// Schema IR consumed by codegen. Immutable once built; every container keeps
// declaration order.

use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Namespace {
    pub name: String,
    #[serde(default)]
    pub types: IndexMap<String, Type>,
    /// Root manifest type; must be an object.
    #[serde(default)]
    pub manifest_keys: Option<Type>,
    #[serde(default)]
    pub functions: IndexMap<String, FunctionDecl>,
    #[serde(default)]
    pub events: IndexMap<String, EventDecl>,
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub generate_error_messages: bool,
}

/// Which function families a type takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Origin {
    pub from_json: bool,
    pub from_client: bool,
    pub from_manifest_keys: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Type {
    /// Declared name for named types (filled from the namespace key on load).
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: TypeKind,
    #[serde(default)]
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeKind {
    Boolean,
    Integer,
    Int64,
    Double,
    String,
    Any,
    Binary,
    Object {
        #[serde(default)]
        properties: IndexMap<String, Property>,
        #[serde(default)]
        additional_properties: Option<Box<Type>>,
    },
    Array {
        items: Box<Type>,
    },
    Choices {
        choices: Vec<Type>,
    },
    Enum {
        #[serde(rename = "enum")]
        values: Vec<String>,
    },
    Function {
        #[serde(default)]
        serializable: bool,
    },
    /// `Name` resolves in the current namespace, `namespace.Name` across.
    Ref {
        #[serde(rename = "$ref")]
        target: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Property {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(flatten)]
    pub ty: Type,
}

/// A namespace function: its parameters and, optionally, the parameters of
/// the callback it resolves with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionDecl {
    #[serde(skip)]
    pub name: String,
    #[serde(default, deserialize_with = "properties_in_order")]
    pub params: Vec<Property>,
    #[serde(default)]
    pub returns_async: Option<AsyncReturn>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AsyncReturn {
    #[serde(default, deserialize_with = "properties_in_order")]
    pub params: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventDecl {
    #[serde(skip)]
    pub name: String,
    #[serde(default, deserialize_with = "properties_in_order")]
    pub params: Vec<Property>,
}

// Parameter lists are written `{"name": {...}, ...}` like object properties.
fn properties_in_order<'de, D>(de: D) -> Result<Vec<Property>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let map = IndexMap::<String, Property>::deserialize(de)?;
    Ok(map
        .into_iter()
        .map(|(name, mut prop)| {
            prop.name = name;
            prop
        })
        .collect())
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeKind {
    /// Kind name used in labels and generation errors.
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Boolean => "boolean",
            TypeKind::Integer => "integer",
            TypeKind::Int64 => "int64",
            TypeKind::Double => "double",
            TypeKind::String => "string",
            TypeKind::Any => "any",
            TypeKind::Binary => "binary",
            TypeKind::Object { .. } => "object",
            TypeKind::Array { .. } => "array",
            TypeKind::Choices { .. } => "choices",
            TypeKind::Enum { .. } => "enum",
            TypeKind::Function { .. } => "function",
            TypeKind::Ref { .. } => "ref",
        }
    }
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type { name: None, kind, origin: Origin::default() }
    }

    pub fn boolean() -> Self { Self::new(TypeKind::Boolean) }
    pub fn integer() -> Self { Self::new(TypeKind::Integer) }
    pub fn int64() -> Self { Self::new(TypeKind::Int64) }
    pub fn double() -> Self { Self::new(TypeKind::Double) }
    pub fn string() -> Self { Self::new(TypeKind::String) }
    pub fn any() -> Self { Self::new(TypeKind::Any) }
    pub fn binary() -> Self { Self::new(TypeKind::Binary) }

    pub fn array(items: Type) -> Self {
        Self::new(TypeKind::Array { items: Box::new(items) })
    }

    pub fn choices(choices: impl IntoIterator<Item = Type>) -> Self {
        Self::new(TypeKind::Choices { choices: choices.into_iter().collect() })
    }

    pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(TypeKind::Enum { values: values.into_iter().map(Into::into).collect() })
    }

    pub fn function(serializable: bool) -> Self {
        Self::new(TypeKind::Function { serializable })
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self::new(TypeKind::Ref { target: target.into() })
    }

    /// Later properties with a repeated name replace earlier ones.
    pub fn object(properties: impl IntoIterator<Item = Property>) -> Self {
        Self::new(TypeKind::Object {
            properties: properties.into_iter().map(|p| (p.name.clone(), p)).collect(),
            additional_properties: None,
        })
    }

    pub fn with_additional_properties(mut self, ty: Type) -> Self {
        if let TypeKind::Object { additional_properties, .. } = &mut self.kind {
            *additional_properties = Some(Box::new(ty));
        }
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn is_ref(&self) -> bool {
        matches!(self.kind, TypeKind::Ref { .. })
    }
}

impl Property {
    pub fn required(name: impl Into<String>, ty: Type) -> Self {
        Property { name: name.into(), optional: false, ty }
    }

    pub fn optional(name: impl Into<String>, ty: Type) -> Self {
        Property { name: name.into(), optional: true, ty }
    }
}

impl Origin {
    /// Parsed from JSON and sent back to clients.
    pub fn json_and_client() -> Self {
        Origin { from_json: true, from_client: true, from_manifest_keys: false }
    }

    pub fn manifest() -> Self {
        Origin { from_json: false, from_client: false, from_manifest_keys: true }
    }
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, params: Vec<Property>) -> Self {
        FunctionDecl { name: name.into(), params, returns_async: None }
    }

    pub fn with_results(mut self, params: Vec<Property>) -> Self {
        self.returns_async = Some(AsyncReturn { params });
        self
    }
}

impl EventDecl {
    pub fn new(name: impl Into<String>, params: Vec<Property>) -> Self {
        EventDecl { name: name.into(), params }
    }
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Namespace {
            name: name.into(),
            types: IndexMap::new(),
            manifest_keys: None,
            functions: IndexMap::new(),
            events: IndexMap::new(),
            compiler_options: CompilerOptions::default(),
        }
    }

    /// Adds a named type; the type must carry a name.
    pub fn with_type(mut self, ty: Type) -> Self {
        let name = ty.name.clone().unwrap_or_default();
        self.types.insert(name, ty);
        self
    }

    pub fn with_manifest_keys(mut self, ty: Type) -> Self {
        self.manifest_keys = Some(ty);
        self
    }

    pub fn with_function(mut self, function: FunctionDecl) -> Self {
        self.functions.insert(function.name.clone(), function);
        self
    }

    pub fn with_event(mut self, event: EventDecl) -> Self {
        self.events.insert(event.name.clone(), event);
        self
    }

    pub fn with_error_messages(mut self, on: bool) -> Self {
        self.compiler_options.generate_error_messages = on;
        self
    }

    /// Copies map keys into `name` fields after deserialization.
    pub fn assign_names(&mut self) {
        for (name, ty) in self.types.iter_mut() {
            if ty.name.is_none() {
                ty.name = Some(name.clone());
            }
            assign_property_names(ty);
        }
        if let Some(manifest) = &mut self.manifest_keys {
            if manifest.name.is_none() {
                manifest.name = Some("ManifestKeys".to_string());
            }
            assign_property_names(manifest);
        }
        for (name, function) in self.functions.iter_mut() {
            function.name = name.clone();
            for param in &mut function.params {
                assign_property_names(&mut param.ty);
            }
            if let Some(ret) = &mut function.returns_async {
                for param in &mut ret.params {
                    assign_property_names(&mut param.ty);
                }
            }
        }
        for (name, event) in self.events.iter_mut() {
            event.name = name.clone();
            for param in &mut event.params {
                assign_property_names(&mut param.ty);
            }
        }
    }
}

fn assign_property_names(ty: &mut Type) {
    match &mut ty.kind {
        TypeKind::Object { properties, additional_properties } => {
            for (name, prop) in properties.iter_mut() {
                prop.name = name.clone();
                assign_property_names(&mut prop.ty);
            }
            if let Some(extra) = additional_properties {
                assign_property_names(extra);
            }
        }
        TypeKind::Array { items } => assign_property_names(items),
        TypeKind::Choices { choices } => {
            for choice in choices {
                assign_property_names(choice);
            }
        }
        _ => {}
    }
}
