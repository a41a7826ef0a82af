//! Plan compilation: IR `Type` -> ref-free conversion strategy.
//!
//! Every reference is resolved once, here. Named targets become
//! `Plan::Named(id)` entries of a [`PlanTable`] so recursive schemas compile to
//! a finite graph; inline types compile in place.

use std::collections::{HashMap, HashSet};

use crate::error::GenerateError;
use crate::ir::{Property, Type, TypeKind};
use crate::resolve::{Resolved, Resolver};
use crate::value::{Value, ValueKind};

pub type TypeId = usize;

#[derive(Debug)]
pub enum Plan {
    Boolean,
    Integer,
    Int64,
    Double,
    String,
    Binary,
    Any,
    Function { serializable: bool },
    Enum(EnumPlan),
    Array(Box<Plan>),
    Object(ObjectPlan),
    Choices(ChoicesPlan),
    Named(TypeId),
}

#[derive(Debug)]
pub struct EnumPlan {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug)]
pub struct ObjectPlan {
    pub name: String,
    pub properties: Vec<PropertyPlan>,
    pub additional: Option<Box<Plan>>,
}

#[derive(Debug)]
pub struct PropertyPlan {
    pub name: String,
    pub optional: bool,
    pub plan: Plan,
}

#[derive(Debug)]
pub struct ChoicesPlan {
    pub name: String,
    pub variants: Vec<VariantPlan>,
}

#[derive(Debug)]
pub struct VariantPlan {
    /// Type name, or kind name for anonymous variants ("integer", "list"...).
    pub label: String,
    pub plan: Plan,
}

#[derive(Debug)]
pub struct NamedPlan {
    pub qualified_name: String,
    pub plan: Plan,
}

/// Every named type reached during one generation run.
#[derive(Debug, Default)]
pub struct PlanTable {
    entries: Vec<NamedPlan>,
}

// ————————————————————————————————————————————————————————————————————————————
// TABLE QUERIES
// ————————————————————————————————————————————————————————————————————————————

impl PlanTable {
    pub fn get(&self, id: TypeId) -> &NamedPlan {
        &self.entries[id]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Follows `Named` hops to the defining plan.
    pub fn concrete<'p>(&'p self, plan: &'p Plan) -> &'p Plan {
        let mut plan = plan;
        while let Plan::Named(id) = plan {
            plan = &self.entries[*id].plan;
        }
        plan
    }

    /// Defining plan of a table entry.
    pub fn resolve(&self, id: TypeId) -> &Plan {
        self.concrete(&self.entries[id].plan)
    }

    /// Id of the last named hop before the defining plan, if any.
    pub fn target_id(&self, plan: &Plan) -> Option<TypeId> {
        let mut plan = plan;
        let mut last = None;
        while let Plan::Named(id) = plan {
            last = Some(*id);
            plan = &self.entries[*id].plan;
        }
        last
    }

    pub fn enum_plan<'p>(&'p self, plan: &'p Plan) -> Option<&'p EnumPlan> {
        match self.concrete(plan) {
            Plan::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_enum(&self, plan: &Plan) -> bool {
        self.enum_plan(plan).is_some()
    }

    /// Kind name used for shape errors on instance data.
    pub fn kind_name(&self, plan: &Plan) -> &'static str {
        match self.concrete(plan) {
            Plan::Boolean => "boolean",
            Plan::Integer => "integer",
            Plan::Int64 => "int64",
            Plan::Double => "double",
            Plan::String => "string",
            Plan::Binary => "binary",
            Plan::Any => "any",
            Plan::Function { .. } => "function",
            Plan::Enum(_) => "enum",
            Plan::Array(_) => "array",
            Plan::Object(_) => "object",
            Plan::Choices(_) => "choices",
            Plan::Named(_) => unreachable!("concrete plans are never named"),
        }
    }

    /// Generic value kind name used in "expected X, got Y" diagnostics.
    pub fn expected_name(&self, plan: &Plan) -> &'static str {
        match self.concrete(plan) {
            Plan::Boolean => "boolean",
            Plan::Integer | Plan::Int64 => "integer",
            Plan::Double => "double",
            Plan::String | Plan::Enum(_) | Plan::Function { serializable: true } => "string",
            Plan::Binary => "binary",
            Plan::Any => "any",
            Plan::Function { serializable: false } | Plan::Object(_) => "dictionary",
            Plan::Array(_) => "list",
            Plan::Choices(_) => "choices",
            Plan::Named(_) => unreachable!("concrete plans are never named"),
        }
    }

    /// The value kind a manifest key of this plan must have; `None` for kinds
    /// manifest parsing does not read directly.
    pub fn manifest_kind(&self, plan: &Plan) -> Option<ValueKind> {
        match self.concrete(plan) {
            Plan::Boolean => Some(ValueKind::Bool),
            Plan::Integer | Plan::Int64 => Some(ValueKind::Int),
            Plan::Double => Some(ValueKind::Double),
            Plan::String | Plan::Enum(_) => Some(ValueKind::String),
            Plan::Array(_) => Some(ValueKind::List),
            Plan::Object(_) => Some(ValueKind::Dict),
            _ => None,
        }
    }

    /// Type-matches-value predicate used to pick a choices variant.
    pub fn value_matches(&self, plan: &Plan, value: &Value) -> bool {
        let kind = value.kind();
        match self.concrete(plan) {
            Plan::Choices(c) => c.variants.iter().any(|v| self.value_matches(&v.plan, value)),
            Plan::Any => true,
            Plan::Boolean => kind == ValueKind::Bool,
            Plan::Integer => kind == ValueKind::Int,
            Plan::Int64 => matches!(kind, ValueKind::Int | ValueKind::Double),
            Plan::Double => kind == ValueKind::Double,
            Plan::String | Plan::Enum(_) | Plan::Function { serializable: true } => {
                kind == ValueKind::String
            }
            Plan::Binary => kind == ValueKind::Binary,
            Plan::Array(_) => kind == ValueKind::List,
            Plan::Object(_) | Plan::Function { serializable: false } => kind == ValueKind::Dict,
            Plan::Named(_) => unreachable!("concrete plans are never named"),
        }
    }

    /// Rejects object types that contain themselves through required
    /// properties: their default instance would be infinite.
    pub fn check_required_cycles(&self) -> Result<(), GenerateError> {
        match self.find_cycle(required_targets) {
            Some(cycle) => Err(GenerateError::RecursiveRequired { cycle }),
            None => Ok(()),
        }
    }

    /// Rejects choices that reach themselves through variants alone: picking
    /// a variant for any value would never terminate.
    pub fn check_choice_cycles(&self) -> Result<(), GenerateError> {
        match self.find_cycle(variant_targets) {
            Some(cycle) => Err(GenerateError::RecursiveChoices { cycle }),
            None => Ok(()),
        }
    }

    fn find_cycle(&self, edges: fn(&Plan, &mut Vec<TypeId>)) -> Option<Vec<String>> {
        let mut clean = HashSet::new();
        (0..self.entries.len()).find_map(|id| self.visit(id, edges, &mut Vec::new(), &mut clean))
    }

    fn visit(
        &self,
        id: TypeId,
        edges: fn(&Plan, &mut Vec<TypeId>),
        stack: &mut Vec<TypeId>,
        clean: &mut HashSet<TypeId>,
    ) -> Option<Vec<String>> {
        if clean.contains(&id) {
            return None;
        }
        if let Some(pos) = stack.iter().position(|&s| s == id) {
            let cycle = stack[pos..]
                .iter()
                .chain(std::iter::once(&id))
                .map(|&s| self.entries[s].qualified_name.clone())
                .collect();
            return Some(cycle);
        }
        let mut targets = Vec::new();
        edges(&self.entries[id].plan, &mut targets);
        stack.push(id);
        for target in targets {
            if let Some(cycle) = self.visit(target, edges, stack, clean) {
                return Some(cycle);
            }
        }
        stack.pop();
        clean.insert(id);
        None
    }
}

/// Named types an object must hold through required properties.
fn required_targets(plan: &Plan, out: &mut Vec<TypeId>) {
    match plan {
        Plan::Named(id) => out.push(*id),
        Plan::Object(object) => {
            for prop in object.properties.iter().filter(|p| !p.optional) {
                required_targets(&prop.plan, out);
            }
        }
        _ => {}
    }
}

/// Named types a choices value may directly be.
fn variant_targets(plan: &Plan, out: &mut Vec<TypeId>) {
    match plan {
        Plan::Named(id) => out.push(*id),
        Plan::Choices(choices) => {
            for variant in &choices.variants {
                variant_targets(&variant.plan, out);
            }
        }
        _ => {}
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COMPILER
// ————————————————————————————————————————————————————————————————————————————

pub(crate) struct PlanCompiler<'r, 'a> {
    resolver: &'r Resolver<'a>,
    ids: HashMap<String, TypeId>,
    entries: Vec<NamedPlan>,
    worklist: Vec<(TypeId, Resolved<'a>)>,
}

impl<'r, 'a> PlanCompiler<'r, 'a> {
    pub fn new(resolver: &'r Resolver<'a>) -> Self {
        PlanCompiler {
            resolver,
            ids: HashMap::new(),
            entries: Vec::new(),
            worklist: Vec::new(),
        }
    }

    /// Id for a named type, queued for compilation on first sight. `key` must
    /// be unique per definition; `display` is what diagnostics show.
    pub fn register(&mut self, key: String, display: String, resolved: Resolved<'a>) -> TypeId {
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = self.entries.len();
        self.entries.push(NamedPlan { qualified_name: display, plan: Plan::Any });
        self.ids.insert(key, id);
        self.worklist.push((id, resolved));
        id
    }

    fn register_resolved(&mut self, resolved: Resolved<'a>) -> Option<TypeId> {
        let qualified = resolved.qualified_name()?;
        Some(self.register(qualified.clone(), qualified, resolved))
    }

    pub fn compile(&mut self, ns: &'a str, ty: &'a Type, owner: &str) -> Result<Plan, GenerateError> {
        Ok(match &ty.kind {
            TypeKind::Boolean => Plan::Boolean,
            TypeKind::Integer => Plan::Integer,
            TypeKind::Int64 => Plan::Int64,
            TypeKind::Double => Plan::Double,
            TypeKind::String => Plan::String,
            TypeKind::Binary => Plan::Binary,
            TypeKind::Any => Plan::Any,
            TypeKind::Function { serializable } => Plan::Function { serializable: *serializable },
            TypeKind::Enum { values } => {
                if values.is_empty() {
                    return Err(GenerateError::EmptyEnum(owner.to_string()));
                }
                Plan::Enum(EnumPlan {
                    name: display_name(ty, owner),
                    values: values.clone(),
                })
            }
            TypeKind::Array { items } => Plan::Array(Box::new(self.compile(ns, items, owner)?)),
            TypeKind::Object { properties, additional_properties } => Plan::Object(self.compile_object(
                ns,
                display_name(ty, owner),
                properties.values(),
                additional_properties.as_deref(),
            )?),
            TypeKind::Choices { choices } => {
                if choices.is_empty() {
                    return Err(GenerateError::EmptyChoices(owner.to_string()));
                }
                let mut variants = Vec::with_capacity(choices.len());
                for choice in choices {
                    variants.push(VariantPlan {
                        label: self.label(ns, choice)?,
                        plan: self.compile(ns, choice, owner)?,
                    });
                }
                Plan::Choices(ChoicesPlan { name: display_name(ty, owner), variants })
            }
            TypeKind::Ref { .. } => {
                let resolved = self.resolver.follow_ref(ns, ty)?;
                match self.register_resolved(resolved) {
                    Some(id) => Plan::Named(id),
                    None => self.compile(resolved.namespace, resolved.ty, owner)?,
                }
            }
        })
    }

    pub fn compile_object(
        &mut self,
        ns: &'a str,
        name: String,
        properties: impl Iterator<Item = &'a Property>,
        additional: Option<&'a Type>,
    ) -> Result<ObjectPlan, GenerateError> {
        let mut plans = Vec::new();
        for prop in properties {
            let owner = format!("{name}.{}", prop.name);
            plans.push(PropertyPlan {
                name: prop.name.clone(),
                optional: prop.optional,
                plan: self.compile(ns, &prop.ty, &owner)?,
            });
        }
        let additional = match additional {
            Some(ty) => Some(Box::new(self.compile(ns, ty, &name)?)),
            None => None,
        };
        Ok(ObjectPlan { name, properties: plans, additional })
    }

    fn label(&self, ns: &'a str, ty: &'a Type) -> Result<String, GenerateError> {
        if let Some(name) = &ty.name {
            return Ok(name.clone());
        }
        Ok(match &ty.kind {
            TypeKind::Ref { .. } => {
                let resolved = self.resolver.follow_ref(ns, ty)?;
                resolved.name.unwrap_or(resolved.ty.kind.name()).to_string()
            }
            kind => kind.name().to_string(),
        })
    }

    /// Compiles every queued named type and returns the finished table.
    pub fn finish(mut self) -> Result<PlanTable, GenerateError> {
        while let Some((id, resolved)) = self.worklist.pop() {
            let owner = self.entries[id].qualified_name.clone();
            let plan = self.compile(resolved.namespace, resolved.ty, &owner)?;
            self.entries[id].plan = plan;
        }
        let table = PlanTable { entries: self.entries };
        table.check_required_cycles()?;
        table.check_choice_cycles()?;
        Ok(table)
    }
}

fn display_name(ty: &Type, owner: &str) -> String {
    ty.name.clone().unwrap_or_else(|| owner.to_string())
}
