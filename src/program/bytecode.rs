#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConstIdx(pub(crate) u32);

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConstVal {
    F64(f64),
    Bool(bool),
}

/// Loop variables maintained by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reserved {
    X,
    Y,
    XNorm,
    YNorm,
    WidthF,
    HeightF,
    SliceId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Module {
    Math,
    Noise,
    Color,
}

impl Module {
    pub(crate) fn from_name(name: &str) -> Option<Module> {
        match name {
            "math" => Some(Module::Math),
            "noise" => Some(Module::Noise),
            "color" => Some(Module::Color),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuiltinId {
    Min,
    Max,
    Clamp,
    Abs,
    Floor,
    Fract,
    Sqrt,
    Pow,
    Sin,
    Cos,
    Mix,
    Step,
    Smoothstep,
    Lookup,
    Noise,
    Fbm,
    Rgba,
    Red,
    Green,
    Blue,
    Alpha,
    Sample,
}

impl BuiltinId {
    pub(crate) fn from_name(name: &str) -> Option<BuiltinId> {
        Some(match name {
            "min" => BuiltinId::Min,
            "max" => BuiltinId::Max,
            "clamp" => BuiltinId::Clamp,
            "abs" => BuiltinId::Abs,
            "floor" => BuiltinId::Floor,
            "fract" => BuiltinId::Fract,
            "sqrt" => BuiltinId::Sqrt,
            "pow" => BuiltinId::Pow,
            "sin" => BuiltinId::Sin,
            "cos" => BuiltinId::Cos,
            "mix" => BuiltinId::Mix,
            "step" => BuiltinId::Step,
            "smoothstep" => BuiltinId::Smoothstep,
            "lookup" => BuiltinId::Lookup,
            "noise" => BuiltinId::Noise,
            "fbm" => BuiltinId::Fbm,
            "rgba" => BuiltinId::Rgba,
            "red" => BuiltinId::Red,
            "green" => BuiltinId::Green,
            "blue" => BuiltinId::Blue,
            "alpha" => BuiltinId::Alpha,
            "sample" => BuiltinId::Sample,
            _ => return None,
        })
    }

    pub(crate) fn module(self) -> Module {
        match self {
            BuiltinId::Noise | BuiltinId::Fbm => Module::Noise,
            BuiltinId::Rgba
            | BuiltinId::Red
            | BuiltinId::Green
            | BuiltinId::Blue
            | BuiltinId::Alpha
            | BuiltinId::Sample => Module::Color,
            _ => Module::Math,
        }
    }

    pub(crate) fn arity(self) -> u8 {
        match self {
            BuiltinId::Abs
            | BuiltinId::Floor
            | BuiltinId::Fract
            | BuiltinId::Sqrt
            | BuiltinId::Sin
            | BuiltinId::Cos
            | BuiltinId::Red
            | BuiltinId::Green
            | BuiltinId::Blue
            | BuiltinId::Alpha => 1,
            BuiltinId::Min
            | BuiltinId::Max
            | BuiltinId::Pow
            | BuiltinId::Step
            | BuiltinId::Lookup
            | BuiltinId::Sample => 2,
            BuiltinId::Clamp | BuiltinId::Mix | BuiltinId::Smoothstep | BuiltinId::Noise => 3,
            BuiltinId::Fbm | BuiltinId::Rgba => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    PushConst(ConstIdx),
    /// Read a construction parameter (only emitted for `@fields`).
    LoadParam(u32),
    LoadField(u32),
    LoadLocal(u32),
    StoreLocal(u32),
    LoadReserved(Reserved),

    Neg,
    Not,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    /// Pops `otherwise`, `then`, `cond`; pushes the chosen value.
    Select,

    CallBuiltin { id: BuiltinId, argc: u8 },

    /// Pop a value and store it into channel `n` of the current pixel.
    WriteChannel(u32),
}

/// Straight-line code for one program section.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Code {
    pub(crate) ops: Vec<Op>,
}

impl Code {
    pub(crate) fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
