// Namespace functions and events: positional parameter lists mapped onto
// object plans.

use crate::codegen::default::new_object;
use crate::codegen::plan::{ObjectPlan, PlanTable};
use crate::codegen::populate::Populator;
use crate::codegen::to_value::to_value;
use crate::data::{Data, Object};
use crate::error::CodecError;
use crate::report::{ErrorKind, Failure};
use crate::value::Value;

#[derive(Debug)]
pub struct FunctionPlan {
    pub name: String,
    pub params: ObjectPlan,
    /// Callback parameters for functions that resolve asynchronously.
    pub results: Option<ObjectPlan>,
}

#[derive(Debug)]
pub struct EventPlan {
    pub name: String,
    pub qualified_name: String,
    pub params: ObjectPlan,
}

/// Populates the parameter object from positional arguments. A missing or
/// `None` argument counts as absent.
pub(crate) fn params_create(
    populator: &Populator<'_>,
    table: &PlanTable,
    params: &ObjectPlan,
    args: &[Value],
) -> Result<Object, Failure> {
    check_argument_count(populator, params, args.len())?;
    let mut out = new_object(table, params);
    for (i, prop) in params.properties.iter().enumerate() {
        let arg = args.get(i).filter(|v| !v.is_none());
        populator.populate_property(prop, arg, &mut out)?;
    }
    Ok(out)
}

fn check_argument_count(populator: &Populator<'_>, params: &ObjectPlan, got: usize) -> Result<(), Failure> {
    let total = params.properties.len();
    let required = params.properties.iter().filter(|p| !p.optional).count();
    let ok = if required == total {
        got == total
    } else if required == 0 {
        got <= total
    } else {
        (required..=total).contains(&got)
    };
    if ok {
        return Ok(());
    }
    Err(populator.fail(ErrorKind::ArgumentCount, || format!("expected {total} arguments, got {got}")))
}

/// Serializes parameters into a positional list. Absent optional values are
/// skipped.
pub(crate) fn params_to_list(
    table: &PlanTable,
    params: &ObjectPlan,
    object: &Object,
) -> Result<Vec<Value>, CodecError> {
    let mut list = Vec::with_capacity(params.properties.len());
    for prop in &params.properties {
        let at = format!("{}.{}", params.name, prop.name);
        let slot = object.slot(&prop.name).and_then(Option::as_ref);
        if prop.optional && !Data::is_engaged(slot) {
            continue;
        }
        let data = slot.ok_or_else(|| CodecError::ShapeMismatch {
            at: at.clone(),
            expected: table.kind_name(&prop.plan),
            found: "nothing",
        })?;
        list.push(to_value(table, &prop.plan, data, &at)?);
    }
    Ok(list)
}
