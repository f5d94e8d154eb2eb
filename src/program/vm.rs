use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::core::{Color, Gradient, Value, sample_table};
use crate::program::bytecode::{BuiltinId, Code, ConstVal, Op, Reserved};
use crate::program::error::VmError;
use crate::program::noise;

/// Runtime value of a field, local or stack entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Num(f64),
    Bool(bool),
    Color(Color),
    Gradient(Arc<Gradient>),
    Table(Arc<[f64]>),
}

impl Default for Slot {
    fn default() -> Self {
        Slot::Num(0.0)
    }
}

impl From<&Value> for Slot {
    fn from(v: &Value) -> Self {
        match v {
            Value::Float(f) => Slot::Num(*f),
            Value::Int(i) => Slot::Num(*i as f64),
            Value::Bool(b) => Slot::Bool(*b),
            Value::Color(c) => Slot::Color(*c),
            Value::Gradient(g) => Slot::Gradient(Arc::new(g.clone())),
            Value::Table(t) => Slot::Table(Arc::from(t.as_slice())),
        }
    }
}

impl From<&ConstVal> for Slot {
    fn from(v: &ConstVal) -> Self {
        match v {
            ConstVal::F64(f) => Slot::Num(*f),
            ConstVal::Bool(b) => Slot::Bool(*b),
        }
    }
}

impl Slot {
    fn type_name(&self) -> &'static str {
        match self {
            Slot::Num(_) => "number",
            Slot::Bool(_) => "bool",
            Slot::Color(_) => "color",
            Slot::Gradient(_) => "gradient",
            Slot::Table(_) => "table",
        }
    }

    fn num(&self) -> Result<f64, VmError> {
        match self {
            Slot::Num(v) => Ok(*v),
            other => Err(expected("number", other)),
        }
    }

    fn flag(&self) -> Result<bool, VmError> {
        match self {
            Slot::Bool(b) => Ok(*b),
            other => Err(expected("bool", other)),
        }
    }

    fn color(&self) -> Result<Color, VmError> {
        match self {
            Slot::Color(c) => Ok(*c),
            other => Err(expected("color", other)),
        }
    }
}

fn expected(what: &str, found: &Slot) -> VmError {
    VmError::new(format!("expected {what}, found {}", found.type_name()))
}

/// Loop variables visible to the running code.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Env {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) x_norm: f64,
    pub(crate) y_norm: f64,
    pub(crate) width_f: f64,
    pub(crate) height_f: f64,
    pub(crate) slice_id: f64,
}

impl Env {
    fn get(&self, r: Reserved) -> f64 {
        match r {
            Reserved::X => self.x,
            Reserved::Y => self.y,
            Reserved::XNorm => self.x_norm,
            Reserved::YNorm => self.y_norm,
            Reserved::WidthF => self.width_f,
            Reserved::HeightF => self.height_f,
            Reserved::SliceId => self.slice_id,
        }
    }
}

/// Read-only inputs of one code run.
pub(crate) struct Frame<'a> {
    pub(crate) consts: &'a [ConstVal],
    pub(crate) params: &'a [Slot],
    pub(crate) fields: &'a [Slot],
    pub(crate) env: Env,
}

/// Execute straight-line `code`. `pixel` receives channel writes and may be empty outside
/// pixel sections.
pub(crate) fn run(
    code: &Code,
    frame: &Frame<'_>,
    locals: &mut [Slot],
    stack: &mut Vec<Slot>,
    pixel: &mut [f32],
) -> Result<(), VmError> {
    stack.clear();
    for op in &code.ops {
        match *op {
            Op::PushConst(idx) => {
                let c = frame
                    .consts
                    .get(idx.0 as usize)
                    .ok_or_else(|| VmError::new("constant index out of range"))?;
                stack.push(Slot::from(c));
            }
            Op::LoadParam(i) => stack.push(load(frame.params, i, "parameter")?),
            Op::LoadField(i) => stack.push(load(frame.fields, i, "field")?),
            Op::LoadLocal(i) => stack.push(load(locals, i, "local")?),
            Op::StoreLocal(i) => {
                let v = pop(stack)?;
                let slot = locals
                    .get_mut(i as usize)
                    .ok_or_else(|| VmError::new("local index out of range"))?;
                *slot = v;
            }
            Op::LoadReserved(r) => stack.push(Slot::Num(frame.env.get(r))),

            Op::Neg => {
                let v = pop(stack)?.num()?;
                stack.push(Slot::Num(-v));
            }
            Op::Not => {
                let v = pop(stack)?.flag()?;
                stack.push(Slot::Bool(!v));
            }
            Op::Add => arith(stack, |a, b| a + b)?,
            Op::Sub => arith(stack, |a, b| a - b)?,
            Op::Mul => arith(stack, |a, b| a * b)?,
            Op::Div => arith(stack, |a, b| a / b)?,
            Op::Mod => arith(stack, f64::rem_euclid)?,
            Op::Lt => compare(stack, |a, b| a < b)?,
            Op::Le => compare(stack, |a, b| a <= b)?,
            Op::Gt => compare(stack, |a, b| a > b)?,
            Op::Ge => compare(stack, |a, b| a >= b)?,
            Op::Eq | Op::Ne => {
                let b = pop(stack)?;
                let a = pop(stack)?;
                let eq = match (&a, &b) {
                    (Slot::Num(x), Slot::Num(y)) => x == y,
                    (Slot::Bool(x), Slot::Bool(y)) => x == y,
                    _ => {
                        return Err(VmError::new(format!(
                            "cannot compare {} with {}",
                            a.type_name(),
                            b.type_name()
                        )));
                    }
                };
                stack.push(Slot::Bool(if *op == Op::Eq { eq } else { !eq }));
            }
            Op::And | Op::Or => {
                let b = pop(stack)?.flag()?;
                let a = pop(stack)?.flag()?;
                stack.push(Slot::Bool(if *op == Op::And { a && b } else { a || b }));
            }
            Op::Select => {
                let otherwise = pop(stack)?;
                let then = pop(stack)?;
                let cond = pop(stack)?.flag()?;
                stack.push(if cond { then } else { otherwise });
            }
            Op::CallBuiltin { id, argc } => {
                let argc = usize::from(argc);
                if stack.len() < argc {
                    return Err(VmError::new("stack underflow"));
                }
                let args: SmallVec<[Slot; 4]> = stack.drain(stack.len() - argc..).collect();
                stack.push(call_builtin(id, &args)?);
            }
            Op::WriteChannel(n) => {
                let v = match pop(stack)? {
                    Slot::Num(v) => v as f32,
                    Slot::Bool(b) => f32::from(u8::from(b)),
                    other => return Err(expected("number", &other)),
                };
                let dst = pixel
                    .get_mut(n as usize)
                    .ok_or_else(|| VmError::new(format!("channel {n} out of range")))?;
                *dst = v;
            }
        }
    }
    Ok(())
}

fn load(slots: &[Slot], i: u32, what: &str) -> Result<Slot, VmError> {
    slots
        .get(i as usize)
        .cloned()
        .ok_or_else(|| VmError::new(format!("{what} index {i} out of range")))
}

fn pop(stack: &mut Vec<Slot>) -> Result<Slot, VmError> {
    stack.pop().ok_or_else(|| VmError::new("stack underflow"))
}

fn arith(stack: &mut Vec<Slot>, f: impl Fn(f64, f64) -> f64) -> Result<(), VmError> {
    let b = pop(stack)?.num()?;
    let a = pop(stack)?.num()?;
    stack.push(Slot::Num(f(a, b)));
    Ok(())
}

fn compare(stack: &mut Vec<Slot>, f: impl Fn(f64, f64) -> bool) -> Result<(), VmError> {
    let b = pop(stack)?.num()?;
    let a = pop(stack)?.num()?;
    stack.push(Slot::Bool(f(a, b)));
    Ok(())
}

fn call_builtin(id: BuiltinId, args: &[Slot]) -> Result<Slot, VmError> {
    let n = |i: usize| args[i].num();
    Ok(match id {
        BuiltinId::Min => Slot::Num(n(0)?.min(n(1)?)),
        BuiltinId::Max => Slot::Num(n(0)?.max(n(1)?)),
        // Not `f64::clamp`, which panics on inverted bounds.
        BuiltinId::Clamp => Slot::Num(n(0)?.max(n(1)?).min(n(2)?)),
        BuiltinId::Abs => Slot::Num(n(0)?.abs()),
        BuiltinId::Floor => Slot::Num(n(0)?.floor()),
        BuiltinId::Fract => {
            let v = n(0)?;
            Slot::Num(v - v.floor())
        }
        BuiltinId::Sqrt => Slot::Num(n(0)?.sqrt()),
        BuiltinId::Pow => Slot::Num(n(0)?.powf(n(1)?)),
        BuiltinId::Sin => Slot::Num(n(0)?.sin()),
        BuiltinId::Cos => Slot::Num(n(0)?.cos()),
        BuiltinId::Mix => match (&args[0], &args[1]) {
            (Slot::Color(a), Slot::Color(b)) => Slot::Color(a.lerp(*b, n(2)?)),
            _ => {
                let (a, b, t) = (n(0)?, n(1)?, n(2)?);
                Slot::Num(a + (b - a) * t)
            }
        },
        BuiltinId::Step => Slot::Num(if n(1)? < n(0)? { 0.0 } else { 1.0 }),
        BuiltinId::Smoothstep => {
            let (e0, e1, x) = (n(0)?, n(1)?, n(2)?);
            if e1 == e0 {
                Slot::Num(if x < e0 { 0.0 } else { 1.0 })
            } else {
                let t = ((x - e0) / (e1 - e0)).max(0.0).min(1.0);
                Slot::Num(t * t * (3.0 - 2.0 * t))
            }
        }
        BuiltinId::Lookup => match &args[0] {
            Slot::Table(t) => Slot::Num(sample_table(t, n(1)?)),
            other => return Err(expected("table", other)),
        },
        BuiltinId::Noise => Slot::Num(noise::noise2(n(0)?, n(1)?, n(2)?)),
        BuiltinId::Fbm => Slot::Num(noise::fbm(n(0)?, n(1)?, n(2)?, n(3)?)),
        BuiltinId::Rgba => Slot::Color(Color::rgba(n(0)?, n(1)?, n(2)?, n(3)?)),
        BuiltinId::Red => Slot::Num(args[0].color()?.r),
        BuiltinId::Green => Slot::Num(args[0].color()?.g),
        BuiltinId::Blue => Slot::Num(args[0].color()?.b),
        BuiltinId::Alpha => Slot::Num(args[0].color()?.a),
        BuiltinId::Sample => match &args[0] {
            Slot::Gradient(g) => Slot::Color(g.sample(n(1)?)),
            other => return Err(expected("gradient", other)),
        },
    })
}

#[cfg(test)]
#[path = "../../tests/unit/program/vm.rs"]
mod tests;
