use std::collections::BTreeSet;

use crate::foundation::core::{Value, ValueType};
use crate::foundation::ids::{EffectId, InputId, OutputId};

/// Declaration of one variable slot, as published by an expression generator or a
/// container surface.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableSpec {
    pub name: String,
    pub value_type: ValueType,
    pub description: String,
    /// Constant held by an input while it is unbound. Ignored for outputs.
    pub default: Option<Value>,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            description: String::new(),
            default: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub(crate) fn default_value(&self) -> Value {
        self.default
            .clone()
            .filter(|v| self.value_type.accepts(v.value_type()))
            .unwrap_or_else(|| Value::default_for(self.value_type))
    }
}

/// Who owns a variable inside a container arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableOwner {
    Effect(EffectId),
    /// Container-level surface variable (container input or output).
    Container,
}

/// Current value source of an input variable.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Constant(Value),
    Output(OutputId),
}

/// Binding sink: holds either a constant or a reference to exactly one output.
#[derive(Clone, Debug)]
pub struct InputVariable {
    pub(crate) id: InputId,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) value_type: ValueType,
    pub(crate) owner: VariableOwner,
    pub(crate) default: Value,
    pub(crate) binding: Binding,
}

impl InputVariable {
    pub(crate) fn from_spec(id: InputId, owner: VariableOwner, spec: &VariableSpec) -> Self {
        let default = spec.default_value();
        Self {
            id,
            name: spec.name.clone(),
            description: spec.description.clone(),
            value_type: spec.value_type,
            owner,
            binding: Binding::Constant(default.clone()),
            default,
        }
    }

    pub fn id(&self) -> InputId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn owner(&self) -> VariableOwner {
        self.owner
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Output this input reads from, if bound to one.
    pub fn bound_output(&self) -> Option<OutputId> {
        match self.binding {
            Binding::Output(out) => Some(out),
            Binding::Constant(_) => None,
        }
    }

    pub fn constant(&self) -> Option<&Value> {
        match &self.binding {
            Binding::Constant(v) => Some(v),
            Binding::Output(_) => None,
        }
    }
}

/// Value source: produced by an effect's expression or declared as a container input.
#[derive(Clone, Debug)]
pub struct OutputVariable {
    pub(crate) id: OutputId,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) value_type: ValueType,
    pub(crate) owner: VariableOwner,
    pub(crate) users: BTreeSet<InputId>,
}

impl OutputVariable {
    pub(crate) fn from_spec(id: OutputId, owner: VariableOwner, spec: &VariableSpec) -> Self {
        Self {
            id,
            name: spec.name.clone(),
            description: spec.description.clone(),
            value_type: spec.value_type,
            owner,
            users: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> OutputId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn owner(&self) -> VariableOwner {
        self.owner
    }

    /// Inputs currently bound to this output.
    pub fn users(&self) -> impl Iterator<Item = InputId> + '_ {
        self.users.iter().copied()
    }
}
