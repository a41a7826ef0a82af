//! Type resolution.
//!
//! A [`Resolver`] is a read-only view over every namespace of a generation
//! run. It follows `Ref` indirection to concrete definitions, across namespaces
//! when the target is qualified, and rejects dangling or cyclic references.

use indexmap::IndexMap;
use tracing::trace;

use crate::error::GenerateError;
use crate::ir::{Namespace, Property, Type, TypeKind};

pub struct Resolver<'a> {
    namespaces: IndexMap<&'a str, &'a Namespace>,
}

/// A concrete (non-`Ref`) type and where it lives.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub namespace: &'a str,
    /// Declared name when the type is a named namespace type.
    pub name: Option<&'a str>,
    pub ty: &'a Type,
}

impl<'a> Resolved<'a> {
    /// `namespace.Name` for named types, `None` for inline ones.
    pub fn qualified_name(&self) -> Option<String> {
        self.name.map(|n| format!("{}.{}", self.namespace, n))
    }
}

impl<'a> Resolver<'a> {
    pub fn new(namespaces: impl IntoIterator<Item = &'a Namespace>) -> Result<Self, GenerateError> {
        let mut map = IndexMap::new();
        for ns in namespaces {
            if map.insert(ns.name.as_str(), ns).is_some() {
                return Err(GenerateError::DuplicateNamespace(ns.name.clone()));
            }
        }
        Ok(Resolver { namespaces: map })
    }

    pub fn namespace(&self, name: &str) -> Result<&'a Namespace, GenerateError> {
        self.namespaces
            .get(name)
            .copied()
            .ok_or_else(|| GenerateError::UnknownNamespace(name.to_string()))
    }

    /// Finds the named type `target` as seen from namespace `from`.
    pub fn lookup(&self, from: &str, target: &str) -> Result<Resolved<'a>, GenerateError> {
        let dangling = || GenerateError::DanglingRef {
            from: from.to_string(),
            target: target.to_string(),
        };
        let home = self.namespace(from)?;
        if let Some((name, ty)) = home.types.get_key_value(target) {
            return Ok(Resolved { namespace: home.name.as_str(), name: Some(name.as_str()), ty });
        }
        let (ns_name, type_name) = target.rsplit_once('.').ok_or_else(dangling)?;
        let ns = self.namespaces.get(ns_name).ok_or_else(dangling)?;
        let (name, ty) = ns.types.get_key_value(type_name).ok_or_else(dangling)?;
        Ok(Resolved { namespace: ns.name.as_str(), name: Some(name.as_str()), ty })
    }

    /// Follows `Ref` chains from `ty` (declared in namespace `from`) to the
    /// first concrete type.
    pub fn follow_ref(&self, from: &'a str, ty: &'a Type) -> Result<Resolved<'a>, GenerateError> {
        let mut current = Resolved { namespace: from, name: ty.name.as_deref(), ty };
        let mut seen: Vec<String> = Vec::new();
        while let TypeKind::Ref { target } = &current.ty.kind {
            let next = self.lookup(current.namespace, target)?;
            let qualified = next.qualified_name().unwrap_or_else(|| target.clone());
            trace!(from = current.namespace, target = %target, resolved = %qualified, "following ref");
            if seen.contains(&qualified) {
                seen.push(qualified);
                return Err(GenerateError::RefCycle { cycle: seen });
            }
            seen.push(qualified);
            current = next;
        }
        Ok(current)
    }

    /// Checks every reference, choices list and enum in every namespace.
    pub fn validate(&self) -> Result<(), GenerateError> {
        for ns in self.namespaces.values().copied() {
            let from = ns.name.as_str();
            for (name, ty) in &ns.types {
                self.validate_type(from, name, ty)?;
            }
            if let Some(manifest) = &ns.manifest_keys {
                self.validate_type(from, manifest.name.as_deref().unwrap_or("manifest_keys"), manifest)?;
            }
            for function in ns.functions.values() {
                self.validate_params(from, &function.name, &function.params)?;
                if let Some(ret) = &function.returns_async {
                    self.validate_params(from, &function.name, &ret.params)?;
                }
            }
            for event in ns.events.values() {
                self.validate_params(from, &event.name, &event.params)?;
            }
        }
        Ok(())
    }

    fn validate_params(&self, from: &'a str, owner: &str, params: &'a [Property]) -> Result<(), GenerateError> {
        for param in params {
            self.validate_type(from, &format!("{owner}.{}", param.name), &param.ty)?;
        }
        Ok(())
    }

    fn validate_type(&self, from: &'a str, at: &str, ty: &'a Type) -> Result<(), GenerateError> {
        match &ty.kind {
            TypeKind::Ref { .. } => {
                self.follow_ref(from, ty)?;
            }
            TypeKind::Object { properties, additional_properties } => {
                for (name, prop) in properties {
                    self.validate_type(from, &format!("{at}.{name}"), &prop.ty)?;
                }
                if let Some(extra) = additional_properties {
                    self.validate_type(from, at, extra)?;
                }
            }
            TypeKind::Array { items } => self.validate_type(from, at, items)?,
            TypeKind::Choices { choices } => {
                if choices.is_empty() {
                    return Err(GenerateError::EmptyChoices(at.to_string()));
                }
                for choice in choices {
                    self.validate_type(from, at, choice)?;
                }
            }
            TypeKind::Enum { values } if values.is_empty() => {
                return Err(GenerateError::EmptyEnum(at.to_string()));
            }
            _ => {}
        }
        Ok(())
    }
}
