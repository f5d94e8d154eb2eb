use std::collections::HashMap;

use crate::foundation::core::{Value, ValueType};
use crate::foundation::ids::OutputId;
use crate::graph::container::EffectContainer;
use crate::graph::effect::{Effect, EffectKind};
use crate::graph::error::GraphError;
use crate::graph::variable::{Binding, InputVariable};
use crate::synth::builder::{Location, SourceBuilder, Stage, SynthesizedSource};
use crate::synth::error::SynthError;
use crate::synth::names;
use crate::synth::scope::{EffectScope, ScopedInput, ScopedOutput};

/// An output already emitted into the program.
#[derive(Clone, Debug)]
struct Symbol {
    expr: String,
    stage: Stage,
    value_type: ValueType,
}

type Symbols = HashMap<OutputId, Symbol>;

/// Linearize `container` into a pixel program.
///
/// Effects are visited in sequence order, composites are flattened in place under their own
/// namespace, and every channel with a source receives one write at the end of `@at_pixel`.
#[tracing::instrument(skip(container), fields(container = container.name()))]
pub fn synthesize(
    container: &EffectContainer,
    progress_steps: usize,
) -> Result<SynthesizedSource, SynthError> {
    let mut builder = SourceBuilder::new(
        container.name(),
        container.channel_names(),
        progress_steps,
    );
    let mut symbols = Symbols::new();

    for var in container.container_inputs() {
        let value = container
            .container_input_value(var.id())
            .cloned()
            .unwrap_or_else(|| Value::default_for(var.value_type()));
        let ident = builder.unique_ident(names::CONTAINER_INPUT_PREFIX, "", var.name());
        let init = match value.literal() {
            Some(lit) => lit,
            None => format!("param({})", builder.add_param(value)),
        };
        builder.emit(Location::Fields, format!("let {ident} = {init};"));
        symbols.insert(
            var.id(),
            Symbol {
                expr: ident,
                stage: Stage::Uniform,
                value_type: var.value_type(),
            },
        );
    }

    emit_container(&mut builder, container, None, &mut symbols)?;

    for (k, ch) in container.channels().iter().enumerate() {
        let Some(src) = ch.source() else {
            continue;
        };
        let sym = symbols.get(&src).ok_or_else(|| SynthError::Unresolved {
            effect: container.name().to_owned(),
            input: format!("channel {}", ch.name()),
        })?;
        if !ValueType::Float.accepts(sym.value_type) {
            return Err(SynthError::ChannelType {
                channel: ch.name().to_owned(),
                found: sym.value_type,
            });
        }
        builder.emit(Location::AtPixel, format!("channel[{k}] = {};", sym.expr));
    }

    let source = builder.finish();
    tracing::debug!(
        params = source.params.len(),
        bytes = source.text.len(),
        "synthesized program"
    );
    Ok(source)
}

fn emit_container(
    builder: &mut SourceBuilder,
    container: &EffectContainer,
    parent: Option<&str>,
    symbols: &mut Symbols,
) -> Result<(), SynthError> {
    for (position, effect) in container.effects().enumerate() {
        let namespace = names::effect_namespace(parent, position);
        let mut inputs = Vec::with_capacity(effect.inputs().len());
        for id in effect.inputs() {
            let var = container
                .input(*id)
                .ok_or(GraphError::UnknownInput(*id))?;
            inputs.push(resolve_input(builder, &namespace, effect.name(), var, symbols)?);
        }

        match effect.kind() {
            EffectKind::Leaf(generator) => {
                let mut outputs = Vec::with_capacity(effect.outputs().len());
                for id in effect.outputs() {
                    let var = container
                        .output(*id)
                        .ok_or(GraphError::UnknownOutput(*id))?;
                    outputs.push(ScopedOutput {
                        ident: builder.unique_ident(names::OUTPUT_PREFIX, &namespace, var.name()),
                        value_type: var.value_type(),
                        defined: None,
                    });
                }
                let mut scope =
                    EffectScope::new(builder, effect.name(), &namespace, inputs, outputs);
                generator.generate(&mut scope)?;
                register_outputs(effect, scope.into_outputs(), symbols)?;
            }
            EffectKind::Composite(nested) => {
                for var in nested.container_inputs() {
                    let Some(input) = inputs.iter().find(|i| i.name == var.name()) else {
                        return Err(SynthError::Unresolved {
                            effect: effect.name().to_owned(),
                            input: var.name().to_owned(),
                        });
                    };
                    symbols.insert(
                        var.id(),
                        Symbol {
                            expr: input.expr.clone(),
                            stage: input.stage,
                            value_type: var.value_type(),
                        },
                    );
                }
                emit_container(builder, nested, Some(&namespace), symbols)?;
                emit_composite_outputs(builder, &namespace, effect, container, nested, symbols)?;
            }
        }
    }
    Ok(())
}

fn resolve_input(
    builder: &mut SourceBuilder,
    namespace: &str,
    effect: &str,
    var: &InputVariable,
    symbols: &Symbols,
) -> Result<ScopedInput, SynthError> {
    match var.binding() {
        Binding::Output(src) => {
            let sym = symbols.get(src).ok_or_else(|| SynthError::Unresolved {
                effect: effect.to_owned(),
                input: var.name().to_owned(),
            })?;
            Ok(ScopedInput {
                name: var.name().to_owned(),
                expr: sym.expr.clone(),
                stage: sym.stage,
                constant: None,
            })
        }
        Binding::Constant(value) => Ok(ScopedInput {
            name: var.name().to_owned(),
            expr: builder.constant_expr(namespace, var.name(), value),
            stage: Stage::Uniform,
            constant: Some(value.clone()),
        }),
    }
}

fn register_outputs(
    effect: &Effect,
    outputs: Vec<ScopedOutput>,
    symbols: &mut Symbols,
) -> Result<(), SynthError> {
    for (id, out) in effect.outputs().iter().zip(outputs) {
        let Some(stage) = out.defined else {
            return Err(SynthError::generator(
                effect.name(),
                format!("output `{}` was never defined", out.ident),
            ));
        };
        symbols.insert(
            *id,
            Symbol {
                expr: out.ident,
                stage,
                value_type: out.value_type,
            },
        );
    }
    Ok(())
}

/// Alias each outer output of a composite to whatever feeds the matching nested container
/// output.
fn emit_composite_outputs(
    builder: &mut SourceBuilder,
    namespace: &str,
    effect: &Effect,
    container: &EffectContainer,
    nested: &EffectContainer,
    symbols: &mut Symbols,
) -> Result<(), SynthError> {
    for id in effect.outputs() {
        let outer = container
            .output(*id)
            .ok_or(GraphError::UnknownOutput(*id))?;
        let sink = nested
            .container_output_named(outer.name())
            .and_then(|i| nested.input(i))
            .ok_or_else(|| SynthError::Unresolved {
                effect: effect.name().to_owned(),
                input: outer.name().to_owned(),
            })?;
        let source = resolve_input(builder, namespace, effect.name(), sink, symbols)?;
        let ident = builder.unique_ident(names::OUTPUT_PREFIX, namespace, outer.name());
        builder.emit(
            source.stage.location(),
            format!("let {ident} = {};", source.expr),
        );
        symbols.insert(
            *id,
            Symbol {
                expr: ident,
                stage: source.stage,
                value_type: outer.value_type(),
            },
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/synth/emit.rs"]
mod tests;
