//! Generic value -> instance.
//!
//! Every conversion returns a [`Failure`] at the first problem and stops;
//! nothing after the failing property or element is read. Messages are only
//! rendered under [`ErrorConvention::Diagnostic`].

use crate::codegen::default::{default_slot, new_choice, new_object};
use crate::codegen::enums;
use crate::codegen::plan::{ChoicesPlan, EnumPlan, ObjectPlan, Plan, PlanTable, PropertyPlan};
use crate::data::{AdditionalProperties, Choice, Data, EnumValue, Object};
use crate::report::{keyed, ErrorConvention, ErrorKind, Failure};
use crate::value::{merge_dict, Dict, Value};

pub(crate) struct Populator<'t> {
    table: &'t PlanTable,
    convention: ErrorConvention,
}

impl<'t> Populator<'t> {
    pub fn new(table: &'t PlanTable, convention: ErrorConvention) -> Self {
        Populator { table, convention }
    }

    pub fn fail(&self, kind: ErrorKind, message: impl FnOnce() -> String) -> Failure {
        self.convention.fail(kind, message)
    }

    fn mismatch(&self, key: Option<&str>, expected: &str, src: &Value) -> Failure {
        self.fail(ErrorKind::TypeMismatch, || {
            keyed(key, format!("expected {expected}, got {}", src.type_name()))
        })
    }

    // -------------------- objects --------------------

    pub fn populate_object(&self, plan: &ObjectPlan, dict: &Dict, out: &mut Object) -> Result<(), Failure> {
        for prop in plan.properties.iter().filter(|p| p.optional) {
            if self.table.is_enum(&prop.plan) {
                *out.slot_mut(&prop.name) = Some(Data::Enum(EnumValue::NONE));
            }
        }
        for prop in &plan.properties {
            self.populate_property(prop, dict.get(&prop.name), out)?;
        }
        if let Some(extra) = plan.additional.as_deref() {
            self.populate_additional(extra, dict, out)?;
        }
        Ok(())
    }

    /// One declared property; `None` when the source has no such key.
    pub fn populate_property(
        &self,
        prop: &PropertyPlan,
        src: Option<&Value>,
        out: &mut Object,
    ) -> Result<(), Failure> {
        let key = prop.name.as_str();
        let Some(src) = src else {
            if !prop.optional {
                return Err(self.fail(ErrorKind::MissingRequiredField, || format!("'{key}' is required")));
            }
            *out.slot_mut(key) = default_slot(self.table, &prop.plan, true);
            return Ok(());
        };

        let concrete = self.table.concrete(&prop.plan);
        if let Plan::Array(items) = concrete {
            if let Some(e) = self.table.enum_plan(items) {
                let mut converted = Vec::new();
                let result = self.enum_array(e, Some(key), src, &mut converted);
                *out.slot_mut(key) = Some(Data::Array(converted));
                return result;
            }
        }
        if prop.optional && matches!(concrete, Plan::Function { serializable: false }) {
            *out.slot_mut(key) = Some(Data::Function(Value::Dict(Dict::new())));
            return Ok(());
        }

        match self.convert(&prop.plan, Some(key), src) {
            Ok(data) => {
                *out.slot_mut(key) = Some(data);
                Ok(())
            }
            Err(failure) => {
                let slot = out.slot_mut(key);
                match concrete {
                    Plan::Enum(_) => *slot = Some(Data::Enum(EnumValue::NONE)),
                    Plan::Array(_) | Plan::Object(_) | Plan::Choices(_) => {}
                    _ if prop.optional => *slot = None,
                    _ => {}
                }
                Err(failure)
            }
        }
    }

    /// Every entry of `dict`, declared keys included, also goes through the
    /// additional properties type.
    fn populate_additional(&self, extra: &Plan, dict: &Dict, out: &mut Object) -> Result<(), Failure> {
        if matches!(self.table.concrete(extra), Plan::Any) {
            let additional = out.additional_mut();
            if additional.as_any().is_none() {
                *additional = AdditionalProperties::Any(Dict::new());
            }
            if let AdditionalProperties::Any(map) = additional {
                merge_dict(map, dict.clone());
            }
            return Ok(());
        }
        for (key, value) in dict {
            let data = self.convert(extra, Some(key.as_str()), value)?;
            let additional = out.additional_mut();
            if additional.as_typed().is_none() {
                *additional = AdditionalProperties::Typed(Default::default());
            }
            if let AdditionalProperties::Typed(map) = additional {
                map.insert(key.clone(), data);
            }
        }
        Ok(())
    }

    // -------------------- values --------------------

    /// Converts `src` into fresh data of `plan`.
    pub fn convert(&self, plan: &Plan, key: Option<&str>, src: &Value) -> Result<Data, Failure> {
        match self.table.concrete(plan) {
            Plan::Boolean => src.as_bool().map(Data::Boolean).ok_or_else(|| self.mismatch(key, "boolean", src)),
            Plan::Integer => match src {
                Value::Int(i) => Ok(Data::Integer(*i)),
                _ => Err(self.mismatch(key, "integer", src)),
            },
            Plan::Int64 => match src {
                Value::Int(i) => Ok(Data::Int64(*i as i64)),
                Value::Double(d) if is_integral_i64(*d) => Ok(Data::Int64(*d as i64)),
                _ => Err(self.mismatch(key, "integer", src)),
            },
            Plan::Double => src.as_double().map(Data::Double).ok_or_else(|| self.mismatch(key, "double", src)),
            Plan::String | Plan::Function { serializable: true } => src
                .as_str()
                .map(|s| Data::String(s.to_string()))
                .ok_or_else(|| self.mismatch(key, "string", src)),
            Plan::Binary => src
                .as_blob()
                .map(|b| Data::Binary(b.to_vec()))
                .ok_or_else(|| self.mismatch(key, "binary", src)),
            Plan::Any => Ok(Data::Any(src.clone())),
            Plan::Function { serializable: false } => match src {
                Value::Dict(d) if d.is_empty() => Ok(Data::Function(Value::Dict(Dict::new()))),
                _ => Err(self.mismatch(key, "empty dictionary", src)),
            },
            Plan::Enum(e) => self.enum_value(e, key, src).map(Data::Enum),
            Plan::Array(items) => self.array(items, key, src).map(Data::Array),
            Plan::Object(object) => {
                let dict = src.as_dict().ok_or_else(|| self.mismatch(key, "dictionary", src))?;
                let mut out = new_object(self.table, object);
                self.populate_object(object, dict, &mut out)?;
                Ok(Data::Object(out))
            }
            Plan::Choices(choices) => {
                let mut out = new_choice(self.table, choices);
                self.populate_choice(choices, key, src, &mut out)?;
                Ok(Data::Choice(out))
            }
            Plan::Named(_) => unreachable!("concrete plans are never named"),
        }
    }

    fn array(&self, items: &Plan, key: Option<&str>, src: &Value) -> Result<Vec<Data>, Failure> {
        if let Some(e) = self.table.enum_plan(items) {
            let mut out = Vec::new();
            self.enum_array(e, key, src, &mut out)?;
            return Ok(out);
        }
        let list = src.as_list().ok_or_else(|| self.mismatch(key, "list", src))?;
        list.iter()
            .enumerate()
            .map(|(i, item)| {
                self.convert(items, None, item)
                    .map_err(|f| f.wrap(ErrorKind::ListElementInvalid, |m| list_context(key, i, m)))
            })
            .collect()
    }

    // -------------------- enums --------------------

    pub fn enum_value(&self, plan: &EnumPlan, key: Option<&str>, src: &Value) -> Result<EnumValue, Failure> {
        let s = src.as_str().ok_or_else(|| self.mismatch(key, "string", src))?;
        let value = enums::from_string(plan, s);
        if value.is_none() {
            return Err(self.fail(ErrorKind::EnumUnrecognizedValue, || {
                keyed(key, enums::parse_error_message(plan, s))
            }));
        }
        Ok(value)
    }

    /// Converts left to right into `out`. The first bad element is not pushed
    /// and ends the call; elements before it stay in `out`.
    pub fn enum_array(
        &self,
        plan: &EnumPlan,
        key: Option<&str>,
        src: &Value,
        out: &mut Vec<Data>,
    ) -> Result<(), Failure> {
        let list = src.as_list().ok_or_else(|| self.mismatch(key, "list", src))?;
        for (i, item) in list.iter().enumerate() {
            let value = self.enum_value(plan, None, item).map_err(|f| {
                let kind = f.kind();
                f.wrap(kind, |m| list_context(key, i, m))
            })?;
            out.push(Data::Enum(value));
        }
        Ok(())
    }

    // -------------------- choices --------------------

    /// Resets `out`, then populates the first variant whose kind matches
    /// `src`.
    pub fn populate_choice(
        &self,
        plan: &ChoicesPlan,
        key: Option<&str>,
        src: &Value,
        out: &mut Choice,
    ) -> Result<(), Failure> {
        *out = new_choice(self.table, plan);
        for (i, variant) in plan.variants.iter().enumerate() {
            if !self.table.value_matches(&variant.plan, src) {
                continue;
            }
            let data = self.convert(&variant.plan, Some(variant.label.as_str()), src)?;
            out.set(i, data);
            return Ok(());
        }
        Err(self.fail(ErrorKind::ChoiceNoVariantMatched, || {
            let labels: Vec<&str> = plan.variants.iter().map(|v| v.label.as_str()).collect();
            keyed(key, format!("expected {}, got {}", labels.join(" or "), src.type_name()))
        }))
    }
}

fn list_context(key: Option<&str>, index: usize, inner: &str) -> String {
    match key {
        Some(key) => format!("Error at key '{key}': Parsing array failed at index {index}: {inner}"),
        None => format!("Parsing array failed at index {index}: {inner}"),
    }
}

fn is_integral_i64(d: f64) -> bool {
    d.is_finite() && d.fract() == 0.0 && d >= i64::MIN as f64 && d <= i64::MAX as f64
}
