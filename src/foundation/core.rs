use std::fmt;

/// Declared type of a variable slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// 64-bit float.
    Float,
    /// Integer; widened to a float inside synthesized programs.
    Int,
    /// Boolean flag.
    Bool,
    /// Straight-alpha RGBA color.
    Color,
    /// Color gradient sampled by position.
    Gradient,
    /// Lookup table sampled with linear interpolation.
    Table,
}

impl ValueType {
    /// Return `true` when a slot of this type can be bound to a source of type `other`.
    pub fn accepts(self, other: ValueType) -> bool {
        self == other || matches!((self, other), (ValueType::Float, ValueType::Int))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Color => "color",
            Self::Gradient => "gradient",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Straight-alpha color with float components, nominally in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn lerp(self, other: Color, t: f64) -> Color {
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// One color stop of a [`Gradient`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: Color,
}

/// Piecewise-linear color gradient.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    /// Build a gradient; stops are sorted by position, non-finite positions are dropped.
    pub fn new(stops: impl IntoIterator<Item = GradientStop>) -> Self {
        let mut stops: Vec<GradientStop> = stops
            .into_iter()
            .filter(|s| s.position.is_finite())
            .collect();
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { stops }
    }

    /// Two-stop gradient from `from` at 0 to `to` at 1.
    pub fn linear(from: Color, to: Color) -> Self {
        Self::new([
            GradientStop {
                position: 0.0,
                color: from,
            },
            GradientStop {
                position: 1.0,
                color: to,
            },
        ])
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Sample at `t`, clamping to the end stops. An empty gradient is transparent.
    pub fn sample(&self, t: f64) -> Color {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Color::TRANSPARENT;
        };
        if t.is_nan() || t <= first.position {
            return first.color;
        }
        if t >= last.position {
            return last.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.position {
                let span = b.position - a.position;
                if span <= 0.0 {
                    return b.color;
                }
                return a.color.lerp(b.color, (t - a.position) / span);
            }
        }
        last.color
    }
}

/// Sample a lookup table at `t` in `0..=1` with linear interpolation between entries.
pub fn sample_table(table: &[f64], t: f64) -> f64 {
    match table.len() {
        0 => 0.0,
        1 => table[0],
        n => {
            let pos = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) } * (n - 1) as f64;
            let i = (pos.floor() as usize).min(n - 2);
            let frac = pos - i as f64;
            table[i] + (table[i + 1] - table[i]) * frac
        }
    }
}

/// Constant value held by an unbound input variable.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Float(f64),
    Int(i64),
    Bool(bool),
    Color(Color),
    Gradient(Gradient),
    Table(Vec<f64>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Float(_) => ValueType::Float,
            Self::Int(_) => ValueType::Int,
            Self::Bool(_) => ValueType::Bool,
            Self::Color(_) => ValueType::Color,
            Self::Gradient(_) => ValueType::Gradient,
            Self::Table(_) => ValueType::Table,
        }
    }

    /// Zero-like default used when an input is unbound without an explicit default.
    pub fn default_for(ty: ValueType) -> Value {
        match ty {
            ValueType::Float => Value::Float(0.0),
            ValueType::Int => Value::Int(0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Color => Value::Color(Color::TRANSPARENT),
            ValueType::Gradient => Value::Gradient(Gradient::default()),
            ValueType::Table => Value::Table(Vec::new()),
        }
    }

    /// Source literal for primitive-like values; `None` means the value must be passed as a
    /// construction parameter.
    pub fn literal(&self) -> Option<String> {
        match self {
            Self::Float(v) if v.is_finite() => Some(float_literal(*v)),
            Self::Int(v) => Some(float_literal(*v as f64)),
            Self::Bool(v) => Some(v.to_string()),
            _ => None,
        }
    }
}

fn float_literal(v: f64) -> String {
    // `{:?}` always keeps a decimal point or exponent, which the program lexer reads back exactly.
    let s = format!("{v:?}");
    if v < 0.0 { format!("({s})") } else { s }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
