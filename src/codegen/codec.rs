//! Per-type codec handles.
//!
//! A handle borrows its [`GeneratedNamespace`] and exposes the functions
//! generated for one type. Calling a function the type's origin did not
//! select returns [`CodecError::NotGenerated`].

use crate::codegen::clone::{clone_choice, clone_object};
use crate::codegen::default::{new_choice, new_object};
use crate::codegen::enums;
use crate::codegen::function::{params_create, params_to_list, EventPlan, FunctionPlan};
use crate::codegen::manifest::ManifestParser;
use crate::codegen::plan::{ChoicesPlan, EnumPlan, ObjectPlan, TypeId};
use crate::codegen::populate::Populator;
use crate::codegen::to_value::{choice_to_value, object_to_dict};
use crate::codegen::{Functions, GeneratedNamespace};
use crate::data::{Choice, EnumValue, Object};
use crate::error::CodecError;
use crate::report::{ErrorConvention, ErrorKind, Failure, ManifestError, ManifestErrors};
use crate::value::{Dict, Value};

#[derive(Clone, Copy)]
pub struct ObjectCodec<'g> {
    ns: &'g GeneratedNamespace,
    id: TypeId,
    plan: &'g ObjectPlan,
}

#[derive(Clone, Copy)]
pub struct ChoicesCodec<'g> {
    ns: &'g GeneratedNamespace,
    id: TypeId,
    plan: &'g ChoicesPlan,
}

#[derive(Clone, Copy)]
pub struct EnumCodec<'g> {
    plan: &'g EnumPlan,
}

/// Entry point for the namespace's `manifest_keys` root object.
#[derive(Clone, Copy)]
pub struct ManifestCodec<'g> {
    root: ObjectCodec<'g>,
}

/// Manifest parsing of an object nested under some key.
#[derive(Clone, Copy)]
pub struct ManifestObject<'g> {
    codec: ObjectCodec<'g>,
}

/// Manifest parsing of a choices value nested under some key.
#[derive(Clone, Copy)]
pub struct ManifestChoices<'g> {
    codec: ChoicesCodec<'g>,
}

#[derive(Clone, Copy)]
pub struct FunctionCodec<'g> {
    ns: &'g GeneratedNamespace,
    plan: &'g FunctionPlan,
}

#[derive(Clone, Copy)]
pub struct EventCodec<'g> {
    ns: &'g GeneratedNamespace,
    plan: &'g EventPlan,
}

fn require(ns: &GeneratedNamespace, id: TypeId, name: &str, function: Functions) -> Result<(), CodecError> {
    if ns.functions_by_id(id).contains(function) {
        Ok(())
    } else {
        Err(CodecError::NotGenerated {
            name: name.to_string(),
            function: function.name(),
        })
    }
}

fn populator(ns: &GeneratedNamespace) -> Populator<'_> {
    Populator::new(ns.table(), ns.convention())
}

// ————————————————————————————————————————————————————————————————————————————
// OBJECTS
// ————————————————————————————————————————————————————————————————————————————

impl<'g> ObjectCodec<'g> {
    pub(crate) fn new(ns: &'g GeneratedNamespace, id: TypeId, plan: &'g ObjectPlan) -> Self {
        ObjectCodec { ns, id, plan }
    }

    pub fn name(&self) -> &'g str {
        &self.plan.name
    }

    pub fn functions(&self) -> Functions {
        self.ns.functions_by_id(self.id)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &'g str> {
        self.plan.properties.iter().map(|p| p.name.as_str())
    }

    fn require(&self, function: Functions) -> Result<(), CodecError> {
        require(self.ns, self.id, &self.plan.name, function)
    }

    pub fn new_instance(&self) -> Object {
        new_object(self.ns.table(), self.plan)
    }

    pub fn clone_instance(&self, src: &Object) -> Result<Object, CodecError> {
        self.require(Functions::CLONE)?;
        clone_object(self.ns.table(), self.plan, src, &self.plan.name)
    }

    pub fn populate_from_dict(&self, dict: &Dict, out: &mut Object) -> Result<(), CodecError> {
        self.require(Functions::POPULATE)?;
        populator(self.ns).populate_object(self.plan, dict, out)?;
        Ok(())
    }

    pub fn populate(&self, value: &Value, out: &mut Object) -> Result<(), CodecError> {
        self.require(Functions::POPULATE)?;
        let dict = value.as_dict().ok_or_else(|| not_a_dict(self.ns.convention(), value))?;
        populator(self.ns).populate_object(self.plan, dict, out)?;
        Ok(())
    }

    pub fn from_dict(&self, dict: &Dict) -> Result<Object, CodecError> {
        self.require(Functions::FROM_VALUE)?;
        let mut out = self.new_instance();
        populator(self.ns).populate_object(self.plan, dict, &mut out)?;
        Ok(out)
    }

    pub fn from_value(&self, value: &Value) -> Result<Object, CodecError> {
        self.require(Functions::FROM_VALUE)?;
        let dict = value.as_dict().ok_or_else(|| not_a_dict(self.ns.convention(), value))?;
        let mut out = self.new_instance();
        populator(self.ns).populate_object(self.plan, dict, &mut out)?;
        Ok(out)
    }

    pub fn to_dict(&self, object: &Object) -> Result<Dict, CodecError> {
        self.require(Functions::TO_VALUE)?;
        object_to_dict(self.ns.table(), self.plan, object, &self.plan.name)
    }

    pub fn to_value(&self, object: &Object) -> Result<Value, CodecError> {
        self.to_dict(object).map(Value::Dict)
    }

    pub fn manifest(&self) -> Result<ManifestObject<'g>, CodecError> {
        self.require(Functions::PARSE_FROM_DICTIONARY)?;
        Ok(ManifestObject { codec: *self })
    }
}

fn not_a_dict(convention: ErrorConvention, value: &Value) -> Failure {
    convention.fail(ErrorKind::TypeMismatch, || format!("expected dictionary, got {}", value.type_name()))
}

impl<'g> ManifestObject<'g> {
    /// Parses `dict[key]` into `out`. On failure the error has been recorded
    /// in `errors` with `key` on its path.
    pub fn parse_from_dictionary(
        &self,
        dict: &Dict,
        key: &str,
        out: &mut Object,
        errors: &mut ManifestErrors,
    ) -> bool {
        let table = self.codec.ns.table();
        ManifestParser::new(table).object_at(self.codec.plan, dict, key, out, errors)
    }
}

impl<'g> ManifestCodec<'g> {
    pub(crate) fn new(root: ObjectCodec<'g>) -> Self {
        ManifestCodec { root }
    }

    pub fn object(&self) -> ObjectCodec<'g> {
        self.root
    }

    pub fn new_instance(&self) -> Object {
        self.root.new_instance()
    }

    /// Parses the top-level manifest dictionary.
    pub fn parse(&self, dict: &Dict) -> Result<Object, ManifestError> {
        let mut out = self.new_instance();
        let mut errors = ManifestErrors::new();
        let parser = ManifestParser::new(self.root.ns.table());
        if parser.parse_object(self.root.plan, dict, &mut out, &mut errors) {
            Ok(out)
        } else {
            Err(ManifestError { message: errors.render() })
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CHOICES
// ————————————————————————————————————————————————————————————————————————————

impl<'g> ChoicesCodec<'g> {
    pub(crate) fn new(ns: &'g GeneratedNamespace, id: TypeId, plan: &'g ChoicesPlan) -> Self {
        ChoicesCodec { ns, id, plan }
    }

    pub fn name(&self) -> &'g str {
        &self.plan.name
    }

    pub fn functions(&self) -> Functions {
        self.ns.functions_by_id(self.id)
    }

    fn require(&self, function: Functions) -> Result<(), CodecError> {
        require(self.ns, self.id, &self.plan.name, function)
    }

    /// Position of the variant labelled `label` (type name, or kind name for
    /// anonymous variants).
    pub fn variant_index(&self, label: &str) -> Option<usize> {
        self.plan.variants.iter().position(|v| v.label == label)
    }

    pub fn variant_labels(&self) -> impl Iterator<Item = &'g str> {
        self.plan.variants.iter().map(|v| v.label.as_str())
    }

    pub fn new_instance(&self) -> Choice {
        new_choice(self.ns.table(), self.plan)
    }

    pub fn clone_instance(&self, src: &Choice) -> Result<Choice, CodecError> {
        self.require(Functions::CLONE)?;
        clone_choice(self.ns.table(), self.plan, src, &self.plan.name)
    }

    pub fn populate(&self, value: &Value, out: &mut Choice) -> Result<(), CodecError> {
        self.require(Functions::POPULATE)?;
        populator(self.ns).populate_choice(self.plan, None, value, out)?;
        Ok(())
    }

    pub fn from_value(&self, value: &Value) -> Result<Choice, CodecError> {
        self.require(Functions::FROM_VALUE)?;
        let mut out = self.new_instance();
        populator(self.ns).populate_choice(self.plan, None, value, &mut out)?;
        Ok(out)
    }

    /// # Panics
    ///
    /// When `choice` does not have exactly one variant set.
    pub fn to_value(&self, choice: &Choice) -> Result<Value, CodecError> {
        self.require(Functions::TO_VALUE)?;
        choice_to_value(self.ns.table(), self.plan, choice, &self.plan.name)
    }

    pub fn manifest(&self) -> Result<ManifestChoices<'g>, CodecError> {
        self.require(Functions::PARSE_FROM_DICTIONARY)?;
        Ok(ManifestChoices { codec: *self })
    }
}

impl<'g> ManifestChoices<'g> {
    pub fn parse_from_dictionary(
        &self,
        dict: &Dict,
        key: &str,
        out: &mut Choice,
        errors: &mut ManifestErrors,
    ) -> bool {
        let table = self.codec.ns.table();
        ManifestParser::new(table).choice_at(self.codec.plan, dict, key, out, errors)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENUMS
// ————————————————————————————————————————————————————————————————————————————

impl<'g> EnumCodec<'g> {
    pub(crate) fn new(plan: &'g EnumPlan) -> Self {
        EnumCodec { plan }
    }

    pub fn name(&self) -> &'g str {
        &self.plan.name
    }

    pub fn values(&self) -> &'g [String] {
        &self.plan.values
    }

    pub fn sentinel(&self) -> EnumValue {
        EnumValue::NONE
    }

    pub fn to_string(&self, value: EnumValue) -> &'g str {
        enums::to_string(self.plan, value)
    }

    pub fn from_string(&self, input: &str) -> EnumValue {
        enums::from_string(self.plan, input)
    }

    pub fn parse_error_message(&self, input: &str) -> String {
        enums::parse_error_message(self.plan, input)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FUNCTIONS & EVENTS
// ————————————————————————————————————————————————————————————————————————————

impl<'g> FunctionCodec<'g> {
    pub(crate) fn new(ns: &'g GeneratedNamespace, plan: &'g FunctionPlan) -> Self {
        FunctionCodec { ns, plan }
    }

    pub fn name(&self) -> &'g str {
        &self.plan.name
    }

    /// Builds the parameter object from a positional argument list.
    pub fn params_create(&self, args: &[Value]) -> Result<Object, Failure> {
        params_create(&populator(self.ns), self.ns.table(), &self.plan.params, args)
    }

    /// Fresh callback-results object, ready to be filled and passed to
    /// [`FunctionCodec::results_create`].
    pub fn new_results(&self) -> Result<Object, CodecError> {
        let results = self.results_plan()?;
        Ok(new_object(self.ns.table(), results))
    }

    pub fn results_create(&self, results: &Object) -> Result<Vec<Value>, CodecError> {
        let plan = self.results_plan()?;
        params_to_list(self.ns.table(), plan, results)
    }

    fn results_plan(&self) -> Result<&'g ObjectPlan, CodecError> {
        self.plan.results.as_ref().ok_or_else(|| CodecError::NotGenerated {
            name: self.plan.name.clone(),
            function: "Results::Create",
        })
    }
}

impl<'g> EventCodec<'g> {
    pub(crate) fn new(ns: &'g GeneratedNamespace, plan: &'g EventPlan) -> Self {
        EventCodec { ns, plan }
    }

    /// `namespace.event`.
    pub fn event_name(&self) -> &'g str {
        &self.plan.qualified_name
    }

    pub fn new_args(&self) -> Object {
        new_object(self.ns.table(), &self.plan.params)
    }

    pub fn create(&self, args: &Object) -> Result<Vec<Value>, CodecError> {
        params_to_list(self.ns.table(), &self.plan.params, args)
    }
}
