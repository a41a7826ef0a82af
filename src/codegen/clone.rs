// Deep copy of instance data, driven by the plan.
//
// Arrays whose items own nested storage (Any, objects, choices,
// non-serializable functions, arrays) are copied element by element; arrays of
// scalars and enums are bulk copied.

use indexmap::IndexMap;

use crate::codegen::plan::{ChoicesPlan, ObjectPlan, Plan, PlanTable};
use crate::data::{AdditionalProperties, Choice, Data, Object};
use crate::error::CodecError;

pub(crate) fn clone_data(table: &PlanTable, plan: &Plan, data: &Data, at: &str) -> Result<Data, CodecError> {
    let mismatch = || CodecError::ShapeMismatch {
        at: at.to_string(),
        expected: table.kind_name(plan),
        found: data.kind_name(),
    };
    Ok(match (table.concrete(plan), data) {
        (Plan::Boolean, Data::Boolean(_))
        | (Plan::Integer, Data::Integer(_))
        | (Plan::Int64, Data::Int64(_))
        | (Plan::Double, Data::Double(_))
        | (Plan::String | Plan::Function { serializable: true }, Data::String(_))
        | (Plan::Binary, Data::Binary(_))
        | (Plan::Enum(_), Data::Enum(_)) => data.copy_scalar().ok_or_else(mismatch)?,
        (Plan::Any, Data::Any(v)) => Data::Any(v.clone()),
        (Plan::Function { serializable: false }, Data::Function(v)) => Data::Function(v.clone()),
        (Plan::Array(items), Data::Array(xs)) => Data::Array(clone_array(table, items, xs, at)?),
        (Plan::Object(object), Data::Object(o)) => Data::Object(clone_object(table, object, o, at)?),
        (Plan::Choices(choices), Data::Choice(c)) => Data::Choice(clone_choice(table, choices, c, at)?),
        _ => return Err(mismatch()),
    })
}

fn clone_array(table: &PlanTable, items: &Plan, xs: &[Data], at: &str) -> Result<Vec<Data>, CodecError> {
    let deep = matches!(
        table.concrete(items),
        Plan::Any
            | Plan::Object(_)
            | Plan::Choices(_)
            | Plan::Array(_)
            | Plan::Function { serializable: false }
    );
    xs.iter()
        .enumerate()
        .map(|(i, x)| {
            if deep {
                clone_data(table, items, x, &format!("{at}[{i}]"))
            } else {
                x.copy_scalar().ok_or_else(|| CodecError::ShapeMismatch {
                    at: format!("{at}[{i}]"),
                    expected: table.kind_name(items),
                    found: x.kind_name(),
                })
            }
        })
        .collect()
}

pub(crate) fn clone_object(
    table: &PlanTable,
    plan: &ObjectPlan,
    src: &Object,
    at: &str,
) -> Result<Object, CodecError> {
    let mut fields = IndexMap::with_capacity(plan.properties.len());
    for prop in &plan.properties {
        let slot = match src.slot(&prop.name).and_then(Option::as_ref) {
            Some(data) => Some(clone_data(table, &prop.plan, data, &format!("{at}.{}", prop.name))?),
            None => None,
        };
        fields.insert(prop.name.clone(), slot);
    }
    let additional = match src.additional() {
        AdditionalProperties::Closed => AdditionalProperties::Closed,
        AdditionalProperties::Any(extra) => AdditionalProperties::Any(extra.clone()),
        AdditionalProperties::Typed(extra) => {
            let item = plan.additional.as_deref().ok_or_else(|| CodecError::ShapeMismatch {
                at: at.to_string(),
                expected: "closed object",
                found: "additional properties",
            })?;
            let mut copy = IndexMap::with_capacity(extra.len());
            for (key, data) in extra {
                copy.insert(key.clone(), clone_data(table, item, data, &format!("{at}.{key}"))?);
            }
            AdditionalProperties::Typed(copy)
        }
    };
    Ok(Object::with_fields(fields, additional))
}

/// Copies every engaged slot; a well-formed choice has exactly one.
pub(crate) fn clone_choice(
    table: &PlanTable,
    plan: &ChoicesPlan,
    src: &Choice,
    at: &str,
) -> Result<Choice, CodecError> {
    let mut slots = Vec::with_capacity(plan.variants.len());
    for (i, variant) in plan.variants.iter().enumerate() {
        slots.push(match src.slots().get(i).and_then(Option::as_ref) {
            Some(data) => Some(clone_data(table, &variant.plan, data, &format!("{at}<{}>", variant.label))?),
            None => None,
        });
    }
    Ok(Choice::with_slots(slots))
}
