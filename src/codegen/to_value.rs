// Instance -> generic value.

use crate::codegen::enums;
use crate::codegen::plan::{ChoicesPlan, ObjectPlan, Plan, PlanTable};
use crate::data::{AdditionalProperties, Choice, Data, Object};
use crate::error::CodecError;
use crate::value::{merge_dict, Dict, Value};

pub(crate) fn to_value(table: &PlanTable, plan: &Plan, data: &Data, at: &str) -> Result<Value, CodecError> {
    let mismatch = || CodecError::ShapeMismatch {
        at: at.to_string(),
        expected: table.kind_name(plan),
        found: data.kind_name(),
    };
    Ok(match (table.concrete(plan), data) {
        (Plan::Boolean, Data::Boolean(b)) => Value::Bool(*b),
        (Plan::Integer, Data::Integer(i)) => Value::Int(*i),
        (Plan::Int64, Data::Int64(i)) => int64_value(*i),
        (Plan::Double, Data::Double(d)) => Value::Double(*d),
        (Plan::String | Plan::Function { serializable: true }, Data::String(s)) => Value::String(s.clone()),
        (Plan::Binary, Data::Binary(b)) => Value::Binary(b.clone()),
        (Plan::Enum(e), Data::Enum(v)) => Value::String(enums::to_string(e, *v).to_string()),
        (Plan::Any, Data::Any(v)) => v.clone(),
        (Plan::Function { serializable: false }, Data::Function(v)) => v.clone(),
        (Plan::Array(items), Data::Array(xs)) => Value::List(
            xs.iter()
                .enumerate()
                .map(|(i, x)| to_value(table, items, x, &format!("{at}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        (Plan::Object(object), Data::Object(o)) => Value::Dict(object_to_dict(table, object, o, at)?),
        (Plan::Choices(choices), Data::Choice(c)) => choice_to_value(table, choices, c, at)?,
        _ => return Err(mismatch()),
    })
}

/// `Int` when the value fits 32 bits, `Double` otherwise.
pub(crate) fn int64_value(i: i64) -> Value {
    match i32::try_from(i) {
        Ok(small) => Value::Int(small),
        Err(_) => Value::Double(i as f64),
    }
}

/// Declared properties in order (required always, optional when present),
/// then additional properties.
pub(crate) fn object_to_dict(
    table: &PlanTable,
    plan: &ObjectPlan,
    object: &Object,
    at: &str,
) -> Result<Dict, CodecError> {
    let mut dict = Dict::new();
    for prop in &plan.properties {
        let path = format!("{at}.{}", prop.name);
        let slot = object.slot(&prop.name).and_then(Option::as_ref);
        if prop.optional && !Data::is_engaged(slot) {
            continue;
        }
        let data = slot.ok_or_else(|| CodecError::ShapeMismatch {
            at: path.clone(),
            expected: table.kind_name(&prop.plan),
            found: "nothing",
        })?;
        dict.insert(prop.name.clone(), to_value(table, &prop.plan, data, &path)?);
    }
    match object.additional() {
        AdditionalProperties::Closed => {}
        AdditionalProperties::Any(extra) => merge_dict(&mut dict, extra.clone()),
        AdditionalProperties::Typed(extra) => {
            let item = plan.additional.as_deref().ok_or_else(|| CodecError::ShapeMismatch {
                at: at.to_string(),
                expected: "closed object",
                found: "additional properties",
            })?;
            for (key, data) in extra {
                dict.insert(key.clone(), to_value(table, item, data, &format!("{at}.{key}"))?);
            }
        }
    }
    Ok(dict)
}

/// Serializes the single engaged variant.
///
/// # Panics
///
/// When zero or several variants are engaged: the instance breaks the choice
/// invariant, which is a programming error rather than bad input.
pub(crate) fn choice_to_value(
    table: &PlanTable,
    plan: &ChoicesPlan,
    choice: &Choice,
    at: &str,
) -> Result<Value, CodecError> {
    let engaged = choice.engaged();
    assert!(
        engaged.len() == 1,
        "choices '{}' at '{at}' must have exactly one variant set, found {}",
        plan.name,
        engaged.len()
    );
    let index = engaged[0];
    let variant = plan.variants.get(index).ok_or_else(|| CodecError::ShapeMismatch {
        at: at.to_string(),
        expected: "declared variant",
        found: "extra slot",
    })?;
    let data = choice.slot(index).ok_or_else(|| CodecError::ShapeMismatch {
        at: at.to_string(),
        expected: table.kind_name(&variant.plan),
        found: "nothing",
    })?;
    to_value(table, &variant.plan, data, &format!("{at}<{}>", variant.label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int64_narrows_when_it_fits() {
        assert_eq!(int64_value(7), Value::Int(7));
        assert_eq!(int64_value(i32::MIN as i64), Value::Int(i32::MIN));
        assert_eq!(int64_value(1 << 40), Value::Double((1u64 << 40) as f64));
    }
}
