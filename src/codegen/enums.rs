// Enum <-> string conversion. Members are addressed by declaration order.

use crate::codegen::plan::EnumPlan;
use crate::data::EnumValue;

/// Member name, `""` for the sentinel.
pub(crate) fn to_string(plan: &EnumPlan, value: EnumValue) -> &str {
    value
        .ordinal()
        .and_then(|i| plan.values.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

/// Never fails: unknown input maps to the sentinel.
pub(crate) fn from_string(plan: &EnumPlan, input: &str) -> EnumValue {
    plan.values
        .iter()
        .position(|v| v == input)
        .map(EnumValue::member)
        .unwrap_or(EnumValue::NONE)
}

/// `expected "A" or "B", got "X"`.
pub(crate) fn parse_error_message(plan: &EnumPlan, input: &str) -> String {
    let expected: Vec<String> = plan.values.iter().map(|v| format!("\"{v}\"")).collect();
    format!("expected {}, got \"{input}\"", expected.join(" or "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color() -> EnumPlan {
        EnumPlan {
            name: "Color".into(),
            values: vec!["RED".into(), "GREEN".into(), "BLUE".into()],
        }
    }

    #[test]
    fn string_round_trip_over_members() {
        let plan = color();
        for name in ["RED", "GREEN", "BLUE"] {
            assert_eq!(to_string(&plan, from_string(&plan, name)), name);
        }
        assert_eq!(from_string(&plan, "GREEN"), EnumValue::member(1));
    }

    #[test]
    fn unknown_strings_map_to_sentinel() {
        let plan = color();
        assert_eq!(from_string(&plan, "PURPLE"), EnumValue::NONE);
        assert_eq!(from_string(&plan, "red"), EnumValue::NONE);
        assert_eq!(to_string(&plan, EnumValue::NONE), "");
    }

    #[test]
    fn error_message_lists_members_in_order() {
        assert_eq!(
            parse_error_message(&color(), "PURPLE"),
            "expected \"RED\" or \"GREEN\" or \"BLUE\", got \"PURPLE\""
        );
    }
}
