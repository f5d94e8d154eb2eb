use crate::foundation::core::{Value, ValueType};
use crate::graph::effect::ExpressionGenerator;
use crate::graph::variable::VariableSpec;
use crate::program::bytecode::BuiltinId;
use crate::program::lexer::{TokenKind, lex};
use crate::program::parser::parse_expr;
use crate::synth::builder::Stage;
use crate::synth::error::SynthError;
use crate::synth::names;
use crate::synth::scope::EffectScope;

/// Passes one value of any type through; its input is the constant.
#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
    value: Value,
}

impl Constant {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl ExpressionGenerator for Constant {
    fn type_name(&self) -> &str {
        "constant"
    }

    fn inputs(&self) -> Vec<VariableSpec> {
        vec![VariableSpec::new("value", self.value.value_type()).with_default(self.value.clone())]
    }

    fn outputs(&self) -> Vec<VariableSpec> {
        vec![VariableSpec::new("value", self.value.value_type())]
    }

    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError> {
        let value = scope.input(0)?.to_owned();
        scope.define(0, Stage::Uniform, value)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    /// `a + (b - a) * t`
    Mix,
}

/// Binary float operation on inputs `a` and `b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arithmetic {
    op: ArithmeticOp,
}

impl Arithmetic {
    pub fn new(op: ArithmeticOp) -> Self {
        Self { op }
    }

    pub fn op(&self) -> ArithmeticOp {
        self.op
    }
}

impl ExpressionGenerator for Arithmetic {
    fn type_name(&self) -> &str {
        match self.op {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "subtract",
            ArithmeticOp::Mul => "multiply",
            ArithmeticOp::Div => "divide",
            ArithmeticOp::Min => "minimum",
            ArithmeticOp::Max => "maximum",
            ArithmeticOp::Mix => "mix",
        }
    }

    fn inputs(&self) -> Vec<VariableSpec> {
        let unit = matches!(self.op, ArithmeticOp::Mul | ArithmeticOp::Div);
        let mut specs = vec![
            VariableSpec::new("a", ValueType::Float).with_default(Value::Float(0.0)),
            VariableSpec::new("b", ValueType::Float)
                .with_default(Value::Float(if unit { 1.0 } else { 0.0 })),
        ];
        if self.op == ArithmeticOp::Mix {
            specs.push(
                VariableSpec::new("t", ValueType::Float)
                    .with_default(Value::Float(0.5))
                    .describe("0 selects a, 1 selects b"),
            );
        }
        specs
    }

    fn outputs(&self) -> Vec<VariableSpec> {
        vec![VariableSpec::new("value", ValueType::Float)]
    }

    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError> {
        let a = scope.input(0)?.to_owned();
        let b = scope.input(1)?.to_owned();
        let expr = match self.op {
            ArithmeticOp::Add => format!("{a} + {b}"),
            ArithmeticOp::Sub => format!("{a} - {b}"),
            ArithmeticOp::Mul => format!("{a} * {b}"),
            ArithmeticOp::Div => format!("{a} / {b}"),
            ArithmeticOp::Min | ArithmeticOp::Max | ArithmeticOp::Mix => {
                scope.import("math");
                match self.op {
                    ArithmeticOp::Min => format!("min({a}, {b})"),
                    ArithmeticOp::Max => format!("max({a}, {b})"),
                    _ => format!("mix({a}, {b}, {})", scope.input(2)?),
                }
            }
        };
        scope.define(0, Stage::Uniform, expr)?;
        Ok(())
    }
}

/// Input names of [`Expression`], in declaration order.
pub const EXPRESSION_INPUTS: [&str; 4] = ["a", "b", "c", "d"];

/// User formula over float inputs `a` to `d`, written in the pixel program expression
/// syntax. Loop variables such as `x_norm` and every builtin function are available.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    formula: String,
}

impl Expression {
    pub fn new(formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
        }
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }
}

impl ExpressionGenerator for Expression {
    fn type_name(&self) -> &str {
        "expression"
    }

    fn inputs(&self) -> Vec<VariableSpec> {
        EXPRESSION_INPUTS
            .iter()
            .map(|n| VariableSpec::new(*n, ValueType::Float).with_default(Value::Float(0.0)))
            .collect()
    }

    fn outputs(&self) -> Vec<VariableSpec> {
        vec![VariableSpec::new("value", ValueType::Float)]
    }

    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError> {
        let src = self.formula.as_str();
        parse_expr(src).map_err(|e| scope.error(format!("invalid formula: {}", e.explain(src))))?;
        let tokens = lex(src).map_err(|e| scope.error(format!("invalid formula: {e}")))?;

        let mut out = String::with_capacity(src.len() + 16);
        let mut copied = 0;
        let mut stage = Stage::Uniform;
        for (i, tok) in tokens.iter().enumerate() {
            let TokenKind::Ident(name) = &tok.kind else {
                continue;
            };
            let is_call = tokens
                .get(i + 1)
                .is_some_and(|t| t.kind == TokenKind::LParen);
            let replacement = if is_call {
                if BuiltinId::from_name(name).is_none() {
                    return Err(scope.error(format!("unknown function `{name}` in formula")));
                }
                None
            } else if let Some(k) = EXPRESSION_INPUTS.iter().position(|n| *n == name.as_str()) {
                Some(format!("({})", scope.input(k)?))
            } else if names::RESERVED.contains(&name.as_str()) {
                stage = stage.max(match name.as_str() {
                    names::X | names::X_NORM => Stage::Pixel,
                    names::Y | names::Y_NORM => Stage::Row,
                    _ => Stage::Uniform,
                });
                None
            } else {
                return Err(scope.error(format!("unknown variable `{name}` in formula")));
            };
            if let Some(r) = replacement {
                out.push_str(&src[copied..tok.span.start]);
                out.push_str(&r);
                copied = tok.span.end;
            }
        }
        out.push_str(&src[copied..]);

        for module in ["math", "noise", "color"] {
            scope.import(module);
        }
        scope.define(0, stage, format!("({})", out.trim()))?;
        Ok(())
    }
}
