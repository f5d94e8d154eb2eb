use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::foundation::core::{Value, ValueType};
use crate::foundation::ids::{EffectId, GraphId, InputId, OutputId, SubscriptionId};
use crate::graph::effect::{Effect, EffectKind};
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::events::{GraphEvent, Subscribers};
use crate::graph::variable::{
    Binding, InputVariable, OutputVariable, VariableOwner, VariableSpec,
};

/// Named picture component and the output that feeds it.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub(crate) name: String,
    pub(crate) source: Option<OutputId>,
}

impl Channel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<OutputId> {
        self.source
    }
}

#[derive(Clone, Debug)]
struct ContainerInput {
    output: OutputId,
    value: Value,
}

/// Ordered, namespaced pipeline of effects.
///
/// The container is an arena: it owns every effect and variable of its scope, and all
/// cross references (bindings, users, channel sources) are ids into this arena. Effects may
/// only read container inputs and outputs of effects placed earlier in the sequence, so the
/// sequence order is always a valid evaluation order.
pub struct EffectContainer {
    id: GraphId,
    name: String,
    order: Vec<EffectId>,
    effects: Vec<Option<Effect>>,
    inputs: Vec<Option<InputVariable>>,
    outputs: Vec<Option<OutputVariable>>,
    container_inputs: Vec<ContainerInput>,
    container_outputs: Vec<InputId>,
    channels: Vec<Channel>,
    subscribers: Subscribers,
}

impl EffectContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GraphId::fresh(),
            name: name.into(),
            order: Vec::new(),
            effects: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            container_inputs: Vec::new(),
            container_outputs: Vec::new(),
            channels: Vec::new(),
            subscribers: Subscribers::default(),
        }
    }

    /// Container with the given channels already declared.
    pub fn with_channels<S: Into<String>>(
        name: impl Into<String>,
        channels: impl IntoIterator<Item = S>,
    ) -> GraphResult<Self> {
        let mut c = Self::new(name);
        for ch in channels {
            c.add_channel(ch)?;
        }
        Ok(c)
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // ---------------------------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------------------------

    /// Effects in evaluation order.
    pub fn effects(&self) -> impl Iterator<Item = &Effect> + '_ {
        self.order.iter().filter_map(|id| self.effect(*id))
    }

    pub fn effect_ids(&self) -> &[EffectId] {
        &self.order
    }

    pub fn effect(&self, id: EffectId) -> Option<&Effect> {
        if id.graph() != self.id {
            return None;
        }
        self.effects.get(id.index()).and_then(Option::as_ref)
    }

    pub fn position_of(&self, id: EffectId) -> Option<usize> {
        self.order.iter().position(|e| *e == id)
    }

    pub fn find_effect(&self, name: &str) -> Option<EffectId> {
        self.effects().find(|e| e.name == name).map(|e| e.id)
    }

    pub fn input(&self, id: InputId) -> Option<&InputVariable> {
        if id.graph() != self.id {
            return None;
        }
        self.inputs.get(id.index()).and_then(Option::as_ref)
    }

    pub fn output(&self, id: OutputId) -> Option<&OutputVariable> {
        if id.graph() != self.id {
            return None;
        }
        self.outputs.get(id.index()).and_then(Option::as_ref)
    }

    /// Input of `effect` named `name`.
    pub fn effect_input(&self, effect: EffectId, name: &str) -> Option<InputId> {
        let e = self.effect(effect)?;
        e.inputs
            .iter()
            .copied()
            .find(|i| self.input(*i).is_some_and(|v| v.name == name))
    }

    /// Output of `effect` named `name`.
    pub fn effect_output(&self, effect: EffectId, name: &str) -> Option<OutputId> {
        let e = self.effect(effect)?;
        e.outputs
            .iter()
            .copied()
            .find(|o| self.output(*o).is_some_and(|v| v.name == name))
    }

    /// Every live input variable of the arena, container outputs included.
    pub fn input_variables(&self) -> impl Iterator<Item = &InputVariable> + '_ {
        self.inputs.iter().filter_map(Option::as_ref)
    }

    /// Every live output variable of the arena, container inputs included.
    pub fn output_variables(&self) -> impl Iterator<Item = &OutputVariable> + '_ {
        self.outputs.iter().filter_map(Option::as_ref)
    }

    // ---------------------------------------------------------------------------------------
    // Effects
    // ---------------------------------------------------------------------------------------

    /// Insert an effect at `position` in the evaluation sequence.
    pub fn add_effect(&mut self, kind: EffectKind, position: usize) -> GraphResult<EffectId> {
        if position > self.order.len() {
            return Err(GraphError::Position {
                position,
                len: self.order.len(),
            });
        }
        Ok(self.insert_effect(kind, position))
    }

    /// Append an effect at the end of the sequence.
    pub fn push_effect(&mut self, kind: EffectKind) -> EffectId {
        self.insert_effect(kind, self.order.len())
    }

    fn insert_effect(&mut self, kind: EffectKind, position: usize) -> EffectId {
        let id = EffectId::new(self.id, self.effects.len());
        let owner = VariableOwner::Effect(id);
        let inputs = kind
            .input_specs()
            .iter()
            .map(|spec| self.alloc_input(owner, spec))
            .collect();
        let outputs = kind
            .output_specs()
            .iter()
            .map(|spec| self.alloc_output(owner, spec))
            .collect();
        self.effects.push(Some(Effect {
            id,
            name: kind.default_name(),
            kind,
            inputs,
            outputs,
            revision: 0,
        }));
        self.order.insert(position, id);
        self.subscribers.emit(GraphEvent::EffectAdded(id));
        id
    }

    pub fn rename_effect(&mut self, id: EffectId, name: impl Into<String>) -> GraphResult<()> {
        self.effect_mut(id)?.name = name.into();
        Ok(())
    }

    /// Remove an effect, unbinding every input that read one of its outputs and clearing any
    /// channel it fed.
    pub fn remove_effect(&mut self, id: EffectId) -> GraphResult<Effect> {
        let pos = self.position_of(id).ok_or(GraphError::UnknownEffect(id))?;
        let (inputs, outputs) = {
            let e = self.effect(id).ok_or(GraphError::UnknownEffect(id))?;
            (e.inputs.clone(), e.outputs.clone())
        };

        let mut channels_changed = false;
        for out in &outputs {
            self.remove_all_users(*out)?;
            channels_changed |= self.clear_channels_for(*out);
            self.outputs[out.index()] = None;
        }
        for input in &inputs {
            self.release_input(*input);
            self.inputs[input.index()] = None;
        }

        self.order.remove(pos);
        let removed = self.effects[id.index()]
            .take()
            .ok_or(GraphError::UnknownEffect(id))?;
        self.subscribers.emit(GraphEvent::EffectRemoved(id));
        if channels_changed {
            self.subscribers.emit(GraphEvent::ChannelsChanged);
        }
        Ok(removed)
    }

    /// Move an effect to a new position. Fails without changes when any binding would then
    /// point at an effect placed after its user.
    pub fn move_effect(&mut self, id: EffectId, position: usize) -> GraphResult<()> {
        let from = self.position_of(id).ok_or(GraphError::UnknownEffect(id))?;
        if position >= self.order.len() {
            return Err(GraphError::Position {
                position,
                len: self.order.len(),
            });
        }
        let mut order = self.order.clone();
        let moved = order.remove(from);
        order.insert(position, moved);
        self.check_order(&order)?;
        self.order = order;
        self.subscribers.emit(GraphEvent::EffectMoved(id));
        Ok(())
    }

    /// Container inputs plus every output of effects strictly before `effect`.
    pub fn available_outputs_for(&self, effect: EffectId) -> GraphResult<Vec<OutputId>> {
        let pos = self
            .position_of(effect)
            .ok_or(GraphError::UnknownEffect(effect))?;
        let mut out: Vec<OutputId> = self.container_inputs.iter().map(|c| c.output).collect();
        for earlier in &self.order[..pos] {
            if let Some(e) = self.effect(*earlier) {
                out.extend(e.outputs.iter().copied());
            }
        }
        Ok(out)
    }

    // ---------------------------------------------------------------------------------------
    // Bindings
    // ---------------------------------------------------------------------------------------

    /// Replace the binding of `input` with a constant.
    pub fn bind_to_constant(&mut self, input: InputId, value: Value) -> GraphResult<()> {
        let var = self.input_checked(input)?;
        if !var.value_type.accepts(value.value_type()) {
            return Err(GraphError::ConstantType {
                input: var.name.clone(),
                expected: var.value_type,
                found: value.value_type(),
            });
        }
        self.release_input(input);
        if let Some(var) = self.input_mut(input) {
            var.binding = Binding::Constant(value);
        }
        self.notify_variable(input);
        Ok(())
    }

    /// Bind `input` to read from `output`.
    pub fn bind_to_variable(&mut self, input: InputId, output: OutputId) -> GraphResult<()> {
        let in_var = self.input_checked(input)?;
        let out_var = self.output_checked(output)?;
        if !in_var.value_type.accepts(out_var.value_type) {
            return Err(GraphError::TypeMismatch {
                input: in_var.name.clone(),
                expected: in_var.value_type,
                output: out_var.name.clone(),
                found: out_var.value_type,
            });
        }
        if let VariableOwner::Effect(effect) = in_var.owner
            && !self.is_available(effect, output)
        {
            return Err(GraphError::ForwardReference {
                input: in_var.name.clone(),
                output: out_var.name.clone(),
            });
        }

        self.release_input(input);
        self.link(input, output);
        self.notify_variable(input);
        Ok(())
    }

    /// Restore the default constant of `input`.
    pub fn unbind(&mut self, input: InputId) -> GraphResult<()> {
        let default = self.input_checked(input)?.default.clone();
        self.bind_to_constant(input, default)
    }

    /// Forcibly unbind every input reading `output`. Inputs that already moved on are skipped.
    pub fn remove_all_users(&mut self, output: OutputId) -> GraphResult<usize> {
        let users = match self.output_mut(output) {
            Some(var) => std::mem::take(&mut var.users),
            None => return Err(GraphError::UnknownOutput(output)),
        };
        let mut unbound = 0;
        for user in users {
            let Some(var) = self.input_mut(user) else {
                continue;
            };
            if var.binding != Binding::Output(output) {
                continue;
            }
            var.binding = Binding::Constant(var.default.clone());
            unbound += 1;
            self.notify_variable(user);
        }
        Ok(unbound)
    }

    // ---------------------------------------------------------------------------------------
    // Container surface
    // ---------------------------------------------------------------------------------------

    /// Declare a container input: a named source visible to every effect in this container.
    /// Its default is the value used when the container is rendered at top level.
    pub fn add_container_input(&mut self, spec: VariableSpec) -> GraphResult<OutputId> {
        if self.container_input_named(&spec.name).is_some() {
            return Err(GraphError::DuplicateName(spec.name));
        }
        let value = spec.default_value();
        let output = self.alloc_output(VariableOwner::Container, &spec);
        self.container_inputs.push(ContainerInput { output, value });
        self.subscribers.emit(GraphEvent::SurfaceChanged);
        Ok(output)
    }

    pub fn remove_container_input(&mut self, output: OutputId) -> GraphResult<()> {
        let pos = self
            .container_inputs
            .iter()
            .position(|c| c.output == output)
            .ok_or(GraphError::UnknownOutput(output))?;
        self.remove_all_users(output)?;
        let channels_changed = self.clear_channels_for(output);
        self.container_inputs.remove(pos);
        self.outputs[output.index()] = None;
        self.subscribers.emit(GraphEvent::SurfaceChanged);
        if channels_changed {
            self.subscribers.emit(GraphEvent::ChannelsChanged);
        }
        Ok(())
    }

    /// Set the value a container input provides when this container is the render root.
    pub fn set_container_input_value(&mut self, output: OutputId, value: Value) -> GraphResult<()> {
        let ty = self.output_checked(output)?.value_type;
        let name = self.output_checked(output)?.name.clone();
        if !ty.accepts(value.value_type()) {
            return Err(GraphError::ConstantType {
                input: name,
                expected: ty,
                found: value.value_type(),
            });
        }
        let slot = self
            .container_inputs
            .iter_mut()
            .find(|c| c.output == output)
            .ok_or(GraphError::UnknownOutput(output))?;
        slot.value = value;
        self.subscribers.emit(GraphEvent::SurfaceChanged);
        Ok(())
    }

    pub fn container_input_named(&self, name: &str) -> Option<OutputId> {
        self.container_inputs
            .iter()
            .map(|c| c.output)
            .find(|o| self.output(*o).is_some_and(|v| v.name == name))
    }

    /// Container inputs in declaration order.
    pub fn container_inputs(&self) -> impl Iterator<Item = &OutputVariable> + '_ {
        self.container_inputs
            .iter()
            .filter_map(|c| self.output(c.output))
    }

    pub(crate) fn container_input_value(&self, output: OutputId) -> Option<&Value> {
        self.container_inputs
            .iter()
            .find(|c| c.output == output)
            .map(|c| &c.value)
    }

    /// Declare a container output: a named sink that exposes one inner value to the
    /// enclosing scope.
    pub fn add_container_output(&mut self, spec: VariableSpec) -> GraphResult<InputId> {
        if self.container_output_named(&spec.name).is_some() {
            return Err(GraphError::DuplicateName(spec.name));
        }
        let input = self.alloc_input(VariableOwner::Container, &spec);
        self.container_outputs.push(input);
        self.subscribers.emit(GraphEvent::SurfaceChanged);
        Ok(input)
    }

    pub fn remove_container_output(&mut self, input: InputId) -> GraphResult<()> {
        let pos = self
            .container_outputs
            .iter()
            .position(|i| *i == input)
            .ok_or(GraphError::UnknownInput(input))?;
        self.release_input(input);
        self.container_outputs.remove(pos);
        self.inputs[input.index()] = None;
        self.subscribers.emit(GraphEvent::SurfaceChanged);
        Ok(())
    }

    pub fn container_output_named(&self, name: &str) -> Option<InputId> {
        self.container_outputs
            .iter()
            .copied()
            .find(|i| self.input(*i).is_some_and(|v| v.name == name))
    }

    /// Container outputs in declaration order.
    pub fn container_outputs(&self) -> impl Iterator<Item = &InputVariable> + '_ {
        self.container_outputs
            .iter()
            .filter_map(|i| self.input(*i))
    }

    pub(crate) fn input_surface(&self) -> Vec<VariableSpec> {
        self.container_inputs
            .iter()
            .filter_map(|c| {
                let v = self.output(c.output)?;
                Some(VariableSpec {
                    name: v.name.clone(),
                    value_type: v.value_type,
                    description: v.description.clone(),
                    default: Some(c.value.clone()),
                })
            })
            .collect()
    }

    pub(crate) fn output_surface(&self) -> Vec<VariableSpec> {
        self.container_outputs()
            .map(|v| VariableSpec {
                name: v.name.clone(),
                value_type: v.value_type,
                description: v.description.clone(),
                default: None,
            })
            .collect()
    }

    // ---------------------------------------------------------------------------------------
    // Channels
    // ---------------------------------------------------------------------------------------

    pub fn add_channel(&mut self, name: impl Into<String>) -> GraphResult<()> {
        let name = name.into();
        if self.channels.iter().any(|c| c.name == name) {
            return Err(GraphError::DuplicateName(name));
        }
        self.channels.push(Channel { name, source: None });
        self.subscribers.emit(GraphEvent::ChannelsChanged);
        Ok(())
    }

    pub fn remove_channel(&mut self, name: &str) -> GraphResult<()> {
        let pos = self
            .channels
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| GraphError::UnknownChannel(name.to_owned()))?;
        self.channels.remove(pos);
        self.subscribers.emit(GraphEvent::ChannelsChanged);
        Ok(())
    }

    /// Route `source` into channel `name`; `None` leaves the channel unwritten. Channels hold
    /// floats, so the source must be float-compatible.
    pub fn bind_channel(&mut self, name: &str, source: Option<OutputId>) -> GraphResult<()> {
        if let Some(out) = source {
            let var = self.output_checked(out)?;
            if !ValueType::Float.accepts(var.value_type) {
                return Err(GraphError::TypeMismatch {
                    input: format!("channel {name}"),
                    expected: ValueType::Float,
                    output: var.name.clone(),
                    found: var.value_type,
                });
            }
        }
        let ch = self
            .channels
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| GraphError::UnknownChannel(name.to_owned()))?;
        ch.source = source;
        self.subscribers.emit(GraphEvent::ChannelsChanged);
        Ok(())
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    // ---------------------------------------------------------------------------------------
    // Composites
    // ---------------------------------------------------------------------------------------

    pub fn nested(&self, effect: EffectId) -> GraphResult<&EffectContainer> {
        let e = self.effect(effect).ok_or(GraphError::UnknownEffect(effect))?;
        e.nested().ok_or(GraphError::NotComposite(effect))
    }

    /// Edit the nested container of a composite effect, then re-derive the composite's
    /// inputs and outputs from the nested surface. Variables whose name and type survive keep
    /// their bindings; the rest are unbound and dropped.
    pub fn edit_nested<R>(
        &mut self,
        effect: EffectId,
        edit: impl FnOnce(&mut EffectContainer) -> R,
    ) -> GraphResult<R> {
        let nested = match &mut self.effect_mut(effect)?.kind {
            EffectKind::Composite(c) => c,
            EffectKind::Leaf(_) => return Err(GraphError::NotComposite(effect)),
        };
        let result = edit(nested);
        self.sync_composite_surface(effect)?;
        self.effect_mut(effect)?.revision += 1;
        self.subscribers.emit(GraphEvent::NestedChanged(effect));
        Ok(result)
    }

    fn sync_composite_surface(&mut self, effect: EffectId) -> GraphResult<()> {
        let (in_specs, out_specs, old_inputs, old_outputs) = {
            let e = self.effect(effect).ok_or(GraphError::UnknownEffect(effect))?;
            (
                e.kind.input_specs(),
                e.kind.output_specs(),
                e.inputs.clone(),
                e.outputs.clone(),
            )
        };
        let owner = VariableOwner::Effect(effect);

        let mut kept: BTreeSet<InputId> = BTreeSet::new();
        let mut new_inputs = Vec::with_capacity(in_specs.len());
        for spec in &in_specs {
            let reuse = old_inputs.iter().copied().find(|id| {
                !kept.contains(id)
                    && self
                        .input(*id)
                        .is_some_and(|v| v.name == spec.name && v.value_type == spec.value_type)
            });
            let id = match reuse {
                Some(id) => {
                    kept.insert(id);
                    id
                }
                None => self.alloc_input(owner, spec),
            };
            new_inputs.push(id);
        }
        for old in old_inputs.iter().filter(|id| !kept.contains(id)) {
            self.release_input(*old);
            self.inputs[old.index()] = None;
        }

        let mut kept_out: BTreeSet<OutputId> = BTreeSet::new();
        let mut new_outputs = Vec::with_capacity(out_specs.len());
        for spec in &out_specs {
            let reuse = old_outputs.iter().copied().find(|id| {
                !kept_out.contains(id)
                    && self
                        .output(*id)
                        .is_some_and(|v| v.name == spec.name && v.value_type == spec.value_type)
            });
            let id = match reuse {
                Some(id) => {
                    kept_out.insert(id);
                    id
                }
                None => self.alloc_output(owner, spec),
            };
            new_outputs.push(id);
        }
        let mut channels_changed = false;
        for old in old_outputs.iter().filter(|id| !kept_out.contains(id)) {
            self.remove_all_users(*old)?;
            channels_changed |= self.clear_channels_for(*old);
            self.outputs[old.index()] = None;
        }

        let e = self.effect_mut(effect)?;
        e.inputs = new_inputs;
        e.outputs = new_outputs;
        if channels_changed {
            self.subscribers.emit(GraphEvent::ChannelsChanged);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------------
    // Notifications
    // ---------------------------------------------------------------------------------------

    pub fn subscribe(
        &mut self,
        callback: impl Fn(&GraphEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.add(Arc::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    // ---------------------------------------------------------------------------------------
    // Validation and copy
    // ---------------------------------------------------------------------------------------

    /// Check that every binding and channel points at a live source declared no later than
    /// its user.
    pub fn validate(&self) -> GraphResult<()> {
        self.check_order(&self.order)?;
        for input in self.container_outputs() {
            if let Some(out) = input.bound_output() {
                self.output_checked(out)?;
            }
        }
        for ch in &self.channels {
            if let Some(out) = ch.source {
                self.output_checked(out)?;
            }
        }
        Ok(())
    }

    /// Deep structural copy into a fresh arena.
    ///
    /// Sources are visited before their users (container inputs, then effects in order), so
    /// every binding of a copied input is remapped through the table built so far. The copy
    /// never references a variable of `self`.
    pub fn copy(&self) -> EffectContainer {
        let mut copy = EffectContainer::new(self.name.clone());
        let mut remap: HashMap<OutputId, OutputId> = HashMap::new();

        for ci in &self.container_inputs {
            let Some(var) = self.output(ci.output) else {
                continue;
            };
            let spec = VariableSpec {
                name: var.name.clone(),
                value_type: var.value_type,
                description: var.description.clone(),
                default: Some(ci.value.clone()),
            };
            let new_id = copy.alloc_output(VariableOwner::Container, &spec);
            copy.container_inputs.push(ContainerInput {
                output: new_id,
                value: ci.value.clone(),
            });
            remap.insert(ci.output, new_id);
        }

        for effect in self.effects() {
            let new_effect = copy.push_effect(effect.kind.copy());
            let (new_inputs, new_outputs) = match copy.effect_mut(new_effect) {
                Ok(e) => {
                    e.name = effect.name.clone();
                    e.revision = effect.revision;
                    (e.inputs.clone(), e.outputs.clone())
                }
                Err(_) => continue,
            };

            for (orig, new) in effect.inputs.iter().zip(&new_inputs) {
                if let Some(var) = self.input(*orig) {
                    copy.copy_binding(*new, &var.binding, &remap);
                }
            }
            for (orig, new) in effect.outputs.iter().zip(new_outputs) {
                remap.insert(*orig, new);
            }
        }

        for orig in &self.container_outputs {
            let Some(var) = self.input(*orig) else {
                continue;
            };
            let spec = VariableSpec {
                name: var.name.clone(),
                value_type: var.value_type,
                description: var.description.clone(),
                default: Some(var.default.clone()),
            };
            let new_id = copy.alloc_input(VariableOwner::Container, &spec);
            copy.container_outputs.push(new_id);
            copy.copy_binding(new_id, &var.binding, &remap);
        }

        for ch in &self.channels {
            copy.channels.push(Channel {
                name: ch.name.clone(),
                source: ch.source.and_then(|s| remap.get(&s).copied()),
            });
        }
        copy
    }

    fn copy_binding(
        &mut self,
        input: InputId,
        binding: &Binding,
        remap: &HashMap<OutputId, OutputId>,
    ) {
        match binding {
            Binding::Constant(v) => {
                if let Some(var) = self.input_mut(input) {
                    var.binding = Binding::Constant(v.clone());
                }
            }
            Binding::Output(src) => match remap.get(src) {
                Some(mapped) => self.link(input, *mapped),
                None => {
                    tracing::warn!(%src, "binding source missing while copying; input left unbound")
                }
            },
        }
    }

    // ---------------------------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------------------------

    fn alloc_input(&mut self, owner: VariableOwner, spec: &VariableSpec) -> InputId {
        let id = InputId::new(self.id, self.inputs.len());
        self.inputs.push(Some(InputVariable::from_spec(id, owner, spec)));
        id
    }

    fn alloc_output(&mut self, owner: VariableOwner, spec: &VariableSpec) -> OutputId {
        let id = OutputId::new(self.id, self.outputs.len());
        self.outputs.push(Some(OutputVariable::from_spec(id, owner, spec)));
        id
    }

    fn effect_mut(&mut self, id: EffectId) -> GraphResult<&mut Effect> {
        if id.graph() != self.id {
            return Err(GraphError::ForeignVariable(id.to_string()));
        }
        self.effects
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::UnknownEffect(id))
    }

    fn input_mut(&mut self, id: InputId) -> Option<&mut InputVariable> {
        if id.graph() != self.id {
            return None;
        }
        self.inputs.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn output_mut(&mut self, id: OutputId) -> Option<&mut OutputVariable> {
        if id.graph() != self.id {
            return None;
        }
        self.outputs.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn input_checked(&self, id: InputId) -> GraphResult<&InputVariable> {
        if id.graph() != self.id {
            return Err(GraphError::ForeignVariable(id.to_string()));
        }
        self.input(id).ok_or(GraphError::UnknownInput(id))
    }

    fn output_checked(&self, id: OutputId) -> GraphResult<&OutputVariable> {
        if id.graph() != self.id {
            return Err(GraphError::ForeignVariable(id.to_string()));
        }
        self.output(id).ok_or(GraphError::UnknownOutput(id))
    }

    fn is_available(&self, effect: EffectId, output: OutputId) -> bool {
        self.available_outputs_for(effect)
            .is_ok_and(|avail| avail.contains(&output))
    }

    /// Bind without validation; callers guarantee type compatibility and ordering.
    fn link(&mut self, input: InputId, output: OutputId) {
        if let Some(var) = self.input_mut(input) {
            var.binding = Binding::Output(output);
        }
        if let Some(out) = self.output_mut(output) {
            out.users.insert(input);
        }
    }

    /// Drop `input` from the user set of whatever output it is bound to.
    fn release_input(&mut self, input: InputId) {
        let Some(prev) = self.input(input).and_then(InputVariable::bound_output) else {
            return;
        };
        if let Some(out) = self.output_mut(prev) {
            out.users.remove(&input);
        }
    }

    fn clear_channels_for(&mut self, output: OutputId) -> bool {
        let mut changed = false;
        for ch in &mut self.channels {
            if ch.source == Some(output) {
                ch.source = None;
                changed = true;
            }
        }
        changed
    }

    fn notify_variable(&mut self, input: InputId) {
        let effect = match self.input(input).map(|v| v.owner) {
            Some(VariableOwner::Effect(e)) => Some(e),
            _ => None,
        };
        if let Some(e) = effect
            && let Ok(effect) = self.effect_mut(e)
        {
            effect.revision += 1;
        }
        self.subscribers
            .emit(GraphEvent::VariableChanged { effect, input });
    }

    fn check_order(&self, order: &[EffectId]) -> GraphResult<()> {
        let mut visible: BTreeSet<OutputId> =
            self.container_inputs.iter().map(|c| c.output).collect();
        for id in order {
            let e = self.effect(*id).ok_or(GraphError::UnknownEffect(*id))?;
            for input in &e.inputs {
                let Some(var) = self.input(*input) else {
                    continue;
                };
                if let Some(src) = var.bound_output()
                    && !visible.contains(&src)
                {
                    return Err(GraphError::ForwardReference {
                        input: var.name.clone(),
                        output: self
                            .output(src)
                            .map(|o| o.name.clone())
                            .unwrap_or_else(|| src.to_string()),
                    });
                }
            }
            visible.extend(e.outputs.iter().copied());
        }
        Ok(())
    }
}

impl fmt::Debug for EffectContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectContainer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("effects", &self.effects().collect::<Vec<_>>())
            .field("channels", &self.channels)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/container.rs"]
mod tests;
