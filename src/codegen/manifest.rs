//! Manifest-style parsing.
//!
//! Unlike populate, every failure here is rendered as a message and located
//! by key path: the failing call records its message and key in the
//! [`ManifestErrors`] accumulator and each enclosing object pushes its own key
//! on the way out. Arrays and choices are read with the diagnostic populator.

use crate::codegen::default::{new_choice, new_object};
use crate::codegen::enums;
use crate::codegen::plan::{ChoicesPlan, ObjectPlan, Plan, PlanTable, PropertyPlan};
use crate::codegen::populate::Populator;
use crate::data::{Choice, Data, EnumValue, Object};
use crate::report::{ErrorConvention, ManifestErrors};
use crate::value::{Dict, Value};

const REQUIRED: &str = "Manifest key is required.";

pub(crate) struct ManifestParser<'t> {
    table: &'t PlanTable,
    populator: Populator<'t>,
}

impl<'t> ManifestParser<'t> {
    pub fn new(table: &'t PlanTable) -> Self {
        ManifestParser {
            table,
            populator: Populator::new(table, ErrorConvention::Diagnostic),
        }
    }

    /// Reads the object stored under `key` of `dict` into `out`.
    pub fn object_at(
        &self,
        plan: &ObjectPlan,
        dict: &Dict,
        key: &str,
        out: &mut Object,
        errors: &mut ManifestErrors,
    ) -> bool {
        let Some(value) = dict.get(key) else {
            errors.fail_at(key, REQUIRED.to_string());
            return false;
        };
        let Some(inner) = value.as_dict() else {
            errors.fail_at(key, type_invalid("dictionary", value));
            return false;
        };
        if !self.parse_object(plan, inner, out, errors) {
            errors.push_key(key);
            return false;
        }
        true
    }

    /// Reads the choice stored under `key` of `dict` into `out`.
    pub fn choice_at(
        &self,
        plan: &ChoicesPlan,
        dict: &Dict,
        key: &str,
        out: &mut Choice,
        errors: &mut ManifestErrors,
    ) -> bool {
        match dict.get(key) {
            Some(value) => self.parse_choice(plan, key, value, out, errors),
            None => {
                errors.fail_at(key, REQUIRED.to_string());
                false
            }
        }
    }

    pub fn parse_object(
        &self,
        plan: &ObjectPlan,
        dict: &Dict,
        out: &mut Object,
        errors: &mut ManifestErrors,
    ) -> bool {
        for prop in &plan.properties {
            match dict.get(&prop.name) {
                Some(value) => {
                    if !self.parse_property(prop, value, out, errors) {
                        return false;
                    }
                }
                None if prop.optional => {
                    *out.slot_mut(&prop.name) = self
                        .table
                        .is_enum(&prop.plan)
                        .then_some(Data::Enum(EnumValue::NONE));
                }
                None => {
                    errors.fail_at(&prop.name, REQUIRED.to_string());
                    return false;
                }
            }
        }
        true
    }

    fn parse_property(
        &self,
        prop: &PropertyPlan,
        value: &Value,
        out: &mut Object,
        errors: &mut ManifestErrors,
    ) -> bool {
        let key = prop.name.as_str();
        let parsed = match self.table.concrete(&prop.plan) {
            Plan::Enum(e) => {
                let Some(s) = value.as_str() else {
                    errors.fail_at(key, type_invalid("string", value));
                    return false;
                };
                let member = enums::from_string(e, s);
                if member.is_none() {
                    errors.fail_at(key, format!("Specified value '{s}' is invalid."));
                    return false;
                }
                Data::Enum(member)
            }
            Plan::Object(object) => {
                let Some(inner) = value.as_dict() else {
                    errors.fail_at(key, type_invalid("dictionary", value));
                    return false;
                };
                let mut child = new_object(self.table, object);
                if !self.parse_object(object, inner, &mut child, errors) {
                    errors.push_key(key);
                    return false;
                }
                Data::Object(child)
            }
            Plan::Choices(choices) => {
                let mut choice = new_choice(self.table, choices);
                if !self.parse_choice(choices, key, value, &mut choice, errors) {
                    return false;
                }
                Data::Choice(choice)
            }
            Plan::Array(_) => {
                if value.as_list().is_none() {
                    errors.fail_at(key, type_invalid("list", value));
                    return false;
                }
                // Converted into a temporary; the field is only assigned on success.
                match self.populator.convert(&prop.plan, None, value) {
                    Ok(data) => data,
                    Err(failure) => {
                        errors.fail_at(key, failure.to_string());
                        return false;
                    }
                }
            }
            concrete => match self.populator.convert(&prop.plan, None, value) {
                Ok(data) => data,
                Err(_) => {
                    let expected = self
                        .table
                        .manifest_kind(concrete)
                        .map(|k| k.name())
                        .unwrap_or(self.table.expected_name(concrete));
                    errors.fail_at(key, type_invalid(expected, value));
                    return false;
                }
            },
        };
        *out.slot_mut(key) = Some(parsed);
        true
    }

    fn parse_choice(
        &self,
        plan: &ChoicesPlan,
        key: &str,
        value: &Value,
        out: &mut Choice,
        errors: &mut ManifestErrors,
    ) -> bool {
        match self.populator.populate_choice(plan, None, value, out) {
            Ok(()) => true,
            Err(failure) => {
                errors.fail_at(key, failure.to_string());
                false
            }
        }
    }
}

fn type_invalid(expected: &str, found: &Value) -> String {
    format!("Type is invalid. Expected {expected}, found {}.", found.type_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf() -> ObjectPlan {
        ObjectPlan {
            name: "C".into(),
            properties: vec![
                PropertyPlan { name: "c".into(), optional: false, plan: Plan::Integer },
                PropertyPlan {
                    name: "mode".into(),
                    optional: true,
                    plan: Plan::Enum(crate::codegen::plan::EnumPlan {
                        name: "Mode".into(),
                        values: vec!["fast".into(), "slow".into()],
                    }),
                },
            ],
            additional: None,
        }
    }

    fn dict(value: serde_json::Value) -> Dict {
        match Value::from(value) {
            Value::Dict(d) => d,
            other => panic!("expected a dictionary, got {other:?}"),
        }
    }

    #[test]
    fn type_mismatch_reports_expected_and_found() {
        let table = PlanTable::default();
        let parser = ManifestParser::new(&table);
        let plan = leaf();
        let mut out = new_object(&table, &plan);
        let mut errors = ManifestErrors::new();
        assert!(!parser.parse_object(&plan, &dict(serde_json::json!({"c": "x"})), &mut out, &mut errors));
        assert_eq!(errors.render(), "Error at key 'c'. Type is invalid. Expected integer, found string.");
    }

    #[test]
    fn bad_enum_reports_specified_value() {
        let table = PlanTable::default();
        let parser = ManifestParser::new(&table);
        let plan = leaf();
        let mut out = new_object(&table, &plan);
        let mut errors = ManifestErrors::new();
        let src = dict(serde_json::json!({"c": 1, "mode": "warp"}));
        assert!(!parser.parse_object(&plan, &src, &mut out, &mut errors));
        assert_eq!(errors.render(), "Error at key 'mode'. Specified value 'warp' is invalid.");
    }

    #[test]
    fn absent_optional_enum_keeps_sentinel() {
        let table = PlanTable::default();
        let parser = ManifestParser::new(&table);
        let plan = leaf();
        let mut out = new_object(&table, &plan);
        let mut errors = ManifestErrors::new();
        assert!(parser.parse_object(&plan, &dict(serde_json::json!({"c": 2})), &mut out, &mut errors));
        assert!(errors.is_empty());
        assert_eq!(out.get("mode"), Some(&Data::Enum(EnumValue::NONE)));
        assert_eq!(out.get("c").and_then(Data::as_int), Some(2));
    }
}
