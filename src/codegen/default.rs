// Default construction.
//
// Enum slots always hold the sentinel, required or not. Optional non-enum
// fields start absent; required ones get the zero value of their kind.

use indexmap::IndexMap;

use crate::codegen::plan::{ChoicesPlan, ObjectPlan, Plan, PlanTable};
use crate::data::{AdditionalProperties, Choice, Data, EnumValue, Object};
use crate::value::{Dict, Value};

/// Initial content of a field slot.
pub(crate) fn default_slot(table: &PlanTable, plan: &Plan, optional: bool) -> Option<Data> {
    if table.is_enum(plan) {
        Some(Data::Enum(EnumValue::NONE))
    } else if optional {
        None
    } else {
        Some(default_data(table, plan))
    }
}

pub(crate) fn default_data(table: &PlanTable, plan: &Plan) -> Data {
    match table.concrete(plan) {
        Plan::Boolean => Data::Boolean(false),
        Plan::Integer => Data::Integer(0),
        Plan::Int64 => Data::Int64(0),
        Plan::Double => Data::Double(0.0),
        Plan::String | Plan::Function { serializable: true } => Data::String(String::new()),
        Plan::Binary => Data::Binary(Vec::new()),
        Plan::Any => Data::Any(Value::None),
        Plan::Function { serializable: false } => Data::Function(Value::Dict(Dict::new())),
        Plan::Enum(_) => Data::Enum(EnumValue::NONE),
        Plan::Array(_) => Data::Array(Vec::new()),
        Plan::Object(object) => Data::Object(new_object(table, object)),
        Plan::Choices(choices) => Data::Choice(new_choice(table, choices)),
        Plan::Named(_) => unreachable!("concrete plans are never named"),
    }
}

pub(crate) fn new_object(table: &PlanTable, plan: &ObjectPlan) -> Object {
    let fields: IndexMap<String, Option<Data>> = plan
        .properties
        .iter()
        .map(|p| (p.name.clone(), default_slot(table, &p.plan, p.optional)))
        .collect();
    Object::with_fields(fields, new_additional(table, plan))
}

pub(crate) fn new_additional(table: &PlanTable, plan: &ObjectPlan) -> AdditionalProperties {
    match plan.additional.as_deref().map(|p| table.concrete(p)) {
        None => AdditionalProperties::Closed,
        Some(Plan::Any) => AdditionalProperties::Any(Dict::new()),
        Some(_) => AdditionalProperties::Typed(IndexMap::new()),
    }
}

/// No variant engaged; enum variants hold the sentinel.
pub(crate) fn new_choice(table: &PlanTable, plan: &ChoicesPlan) -> Choice {
    Choice::with_slots(
        plan.variants
            .iter()
            .map(|v| table.is_enum(&v.plan).then_some(Data::Enum(EnumValue::NONE)))
            .collect(),
    )
}
