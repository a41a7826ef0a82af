//! Runtime instances produced and consumed by generated codecs.
//!
//! Instances are deliberately not `Clone`: the generated clone function is the
//! one copy path, so copies follow the deep/shallow policy of their type.

use indexmap::IndexMap;

use crate::value::{Dict, Value};

/// An enum field value. The sentinel ([`EnumValue::NONE`]) stands in for "no
/// value" and never equals a declared member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EnumValue(u32);

impl EnumValue {
    pub const NONE: EnumValue = EnumValue(0);

    /// The member at `ordinal` in declaration order.
    pub fn member(ordinal: usize) -> Self {
        EnumValue(ordinal as u32 + 1)
    }

    pub fn ordinal(self) -> Option<usize> {
        self.0.checked_sub(1).map(|o| o as usize)
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

#[derive(Debug, PartialEq)]
pub enum Data {
    Boolean(bool),
    Integer(i32),
    Int64(i64),
    Double(f64),
    /// Strings and serializable functions.
    String(String),
    Binary(Vec<u8>),
    Enum(EnumValue),
    Any(Value),
    /// Non-serializable function, held as its (empty) dictionary value.
    Function(Value),
    Array(Vec<Data>),
    Object(Object),
    Choice(Choice),
}

/// Open properties of an object beyond its declared ones.
#[derive(Debug, Default, PartialEq)]
pub enum AdditionalProperties {
    #[default]
    Closed,
    Any(Dict),
    Typed(IndexMap<String, Data>),
}

/// Instance of an object type. Fields follow declaration order; `None` marks
/// an absent optional field.
#[derive(Debug, Default, PartialEq)]
pub struct Object {
    fields: IndexMap<String, Option<Data>>,
    additional: AdditionalProperties,
}

/// Instance of a choices type: one slot per variant, at most one engaged in a
/// valid instance.
#[derive(Debug, Default, PartialEq)]
pub struct Choice {
    slots: Vec<Option<Data>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Data {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Data::Boolean(_) => "boolean",
            Data::Integer(_) => "integer",
            Data::Int64(_) => "int64",
            Data::Double(_) => "double",
            Data::String(_) => "string",
            Data::Binary(_) => "binary",
            Data::Enum(_) => "enum",
            Data::Any(_) => "any",
            Data::Function(_) => "function",
            Data::Array(_) => "array",
            Data::Object(_) => "object",
            Data::Choice(_) => "choices",
        }
    }

    /// Copy of leaf data; `None` for anything holding nested storage.
    pub(crate) fn copy_scalar(&self) -> Option<Data> {
        Some(match self {
            Data::Boolean(b) => Data::Boolean(*b),
            Data::Integer(i) => Data::Integer(*i),
            Data::Int64(i) => Data::Int64(*i),
            Data::Double(d) => Data::Double(*d),
            Data::String(s) => Data::String(s.clone()),
            Data::Binary(b) => Data::Binary(b.clone()),
            Data::Enum(e) => Data::Enum(*e),
            _ => return None,
        })
    }

    /// Whether a slot counts as populated. Enum slots hold the sentinel
    /// instead of being empty.
    pub(crate) fn is_engaged(slot: Option<&Data>) -> bool {
        match slot {
            None => false,
            Some(Data::Enum(e)) => !e.is_none(),
            Some(_) => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Data::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Data::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Data::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Data::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<EnumValue> {
        match self {
            Data::Enum(e) => Some(*e),
            _ => None,
        }
    }

    pub fn as_any(&self) -> Option<&Value> {
        match self {
            Data::Any(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Data]> {
        match self {
            Data::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Data>> {
        match self {
            Data::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Data::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Data::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&Choice> {
        match self {
            Data::Choice(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_choice_mut(&mut self) -> Option<&mut Choice> {
        match self {
            Data::Choice(c) => Some(c),
            _ => None,
        }
    }
}

impl From<bool> for Data {
    fn from(b: bool) -> Self {
        Data::Boolean(b)
    }
}

impl From<i32> for Data {
    fn from(i: i32) -> Self {
        Data::Integer(i)
    }
}

impl From<i64> for Data {
    fn from(i: i64) -> Self {
        Data::Int64(i)
    }
}

impl From<f64> for Data {
    fn from(d: f64) -> Self {
        Data::Double(d)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::String(s.to_string())
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Data::String(s)
    }
}

impl From<EnumValue> for Data {
    fn from(e: EnumValue) -> Self {
        Data::Enum(e)
    }
}

impl From<Vec<Data>> for Data {
    fn from(xs: Vec<Data>) -> Self {
        Data::Array(xs)
    }
}

impl From<Object> for Data {
    fn from(o: Object) -> Self {
        Data::Object(o)
    }
}

impl From<Choice> for Data {
    fn from(c: Choice) -> Self {
        Data::Choice(c)
    }
}

impl From<Value> for Data {
    fn from(v: Value) -> Self {
        Data::Any(v)
    }
}

impl Object {
    pub(crate) fn with_fields(
        fields: IndexMap<String, Option<Data>>,
        additional: AdditionalProperties,
    ) -> Self {
        Object { fields, additional }
    }

    /// Field data, or `None` when absent or undeclared.
    pub fn get(&self, name: &str) -> Option<&Data> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Data> {
        self.fields.get_mut(name).and_then(Option::as_mut)
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets a declared field. Returns `false` (and stores nothing) when the
    /// object has no such field.
    pub fn set(&mut self, name: &str, data: impl Into<Data>) -> bool {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = Some(data.into());
                true
            }
            None => false,
        }
    }

    /// Makes an optional field absent.
    pub fn clear(&mut self, name: &str) -> bool {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn additional(&self) -> &AdditionalProperties {
        &self.additional
    }

    pub fn additional_mut(&mut self) -> &mut AdditionalProperties {
        &mut self.additional
    }

    pub(crate) fn slot(&self, name: &str) -> Option<&Option<Data>> {
        self.fields.get(name)
    }

    pub(crate) fn slot_mut(&mut self, name: &str) -> &mut Option<Data> {
        self.fields.entry(name.to_string()).or_insert(None)
    }
}

impl Choice {
    pub(crate) fn with_slots(slots: Vec<Option<Data>>) -> Self {
        Choice { slots }
    }

    pub fn slot(&self, variant: usize) -> Option<&Data> {
        self.slots.get(variant).and_then(Option::as_ref)
    }

    /// Populates `variant`; other slots are left untouched.
    pub fn set(&mut self, variant: usize, data: impl Into<Data>) -> bool {
        match self.slots.get_mut(variant) {
            Some(slot) => {
                *slot = Some(data.into());
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, variant: usize) -> bool {
        match self.slots.get_mut(variant) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    /// Indices of every engaged slot.
    pub fn engaged(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| Data::is_engaged(slot.as_ref()))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slots(&self) -> &[Option<Data>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Data>] {
        &mut self.slots
    }
}

impl AdditionalProperties {
    pub fn as_any(&self) -> Option<&Dict> {
        match self {
            AdditionalProperties::Any(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_typed(&self) -> Option<&IndexMap<String, Data>> {
        match self {
            AdditionalProperties::Typed(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_typed_mut(&mut self) -> Option<&mut IndexMap<String, Data>> {
        match self {
            AdditionalProperties::Typed(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_any_mut(&mut self) -> Option<&mut Dict> {
        match self {
            AdditionalProperties::Any(d) => Some(d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_distinct_from_members() {
        assert!(EnumValue::NONE.is_none());
        assert_eq!(EnumValue::NONE.ordinal(), None);
        assert_eq!(EnumValue::member(0).ordinal(), Some(0));
        assert_ne!(EnumValue::member(0), EnumValue::NONE);
    }

    #[test]
    fn sentinel_enum_slot_is_not_engaged() {
        let choice = Choice::with_slots(vec![Some(Data::Enum(EnumValue::NONE)), None]);
        assert!(choice.engaged().is_empty());
    }

    #[test]
    fn set_refuses_undeclared_fields() {
        let mut fields = IndexMap::new();
        fields.insert("a".to_string(), None);
        let mut object = Object::with_fields(fields, AdditionalProperties::Closed);
        assert!(object.set("a", 1));
        assert!(!object.set("b", 1));
        assert_eq!(object.get("a").and_then(Data::as_int), Some(1));
        assert!(object.clear("a"));
        assert!(!object.is_present("a"));
    }
}
