use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

use crate::foundation::core::Value;
use crate::synth::names;

/// Code location inside a synthesized program, in nesting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Location {
    /// Header lines (`use` directives).
    Imports,
    /// Evaluated once when the renderer is constructed.
    Fields,
    /// Once per `calculate_pixels` call.
    BeforeLoop,
    /// Once per row.
    BeforeLine,
    BeforePixel,
    AtPixel,
    AfterPixel,
    AfterLine,
    AfterLoop,
}

impl Location {
    pub const ALL: [Location; 9] = [
        Location::Imports,
        Location::Fields,
        Location::BeforeLoop,
        Location::BeforeLine,
        Location::BeforePixel,
        Location::AtPixel,
        Location::AfterPixel,
        Location::AfterLine,
        Location::AfterLoop,
    ];

    /// Section marker name; `None` for the header.
    pub fn section(self) -> Option<&'static str> {
        match self {
            Location::Imports => None,
            Location::Fields => Some("fields"),
            Location::BeforeLoop => Some("before_loop"),
            Location::BeforeLine => Some("before_line"),
            Location::BeforePixel => Some("before_pixel"),
            Location::AtPixel => Some("at_pixel"),
            Location::AfterPixel => Some("after_pixel"),
            Location::AfterLine => Some("after_line"),
            Location::AfterLoop => Some("after_loop"),
        }
    }

    pub fn from_section(name: &str) -> Option<Location> {
        Location::ALL.into_iter().find(|l| l.section() == Some(name))
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// How often a synthesized value changes during one render call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Same for every pixel of a call.
    Uniform,
    /// Depends on the row only.
    Row,
    /// Depends on the pixel.
    Pixel,
}

impl Stage {
    /// Section where a value of this stage is declared.
    pub fn location(self) -> Location {
        match self {
            Stage::Uniform => Location::BeforeLoop,
            Stage::Row => Location::BeforeLine,
            Stage::Pixel => Location::AtPixel,
        }
    }
}

/// Program text produced from one container, plus everything needed to instantiate it.
#[derive(Clone, Debug)]
pub struct SynthesizedSource {
    pub display_name: String,
    pub text: Arc<str>,
    /// Non-inlineable constants, read back by index with `param(i)`.
    pub params: Arc<[Value]>,
    pub channel_names: Vec<String>,
}

/// Accumulates code fragments per [`Location`] and hands out collision-free identifiers.
#[derive(Debug)]
pub struct SourceBuilder {
    display_name: String,
    channel_names: Vec<String>,
    progress_steps: usize,
    imports: BTreeSet<String>,
    sections: [Vec<String>; 9],
    params: Vec<Value>,
    idents: HashSet<String>,
}

impl SourceBuilder {
    pub fn new(
        display_name: impl Into<String>,
        channel_names: Vec<String>,
        progress_steps: usize,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            channel_names,
            progress_steps,
            imports: BTreeSet::new(),
            sections: Default::default(),
            params: Vec::new(),
            idents: HashSet::new(),
        }
    }

    pub fn emit(&mut self, location: Location, line: impl Into<String>) {
        self.sections[location.slot()].push(line.into());
    }

    /// Request a builtin module (`math`, `noise`, `color`). Repeated requests are merged.
    pub fn import(&mut self, module: &str) {
        self.imports.insert(module.to_owned());
    }

    /// Append a construction parameter and return its index.
    pub fn add_param(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len() - 1
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// `<prefix>_<namespace>_<name>`, suffixed with a counter if already taken.
    pub fn unique_ident(&mut self, prefix: &str, namespace: &str, name: &str) -> String {
        let name = names::sanitize(name);
        let base = if namespace.is_empty() {
            format!("{prefix}_{name}")
        } else {
            format!("{prefix}_{namespace}_{name}")
        };
        let mut ident = base.clone();
        let mut n = 2usize;
        while self.idents.contains(&ident) {
            ident = format!("{base}_{n}");
            n += 1;
        }
        self.idents.insert(ident.clone());
        ident
    }

    /// Expression reading `value`: an inline literal when possible, otherwise a field
    /// initialized from a new construction parameter.
    pub fn constant_expr(&mut self, namespace: &str, name: &str, value: &Value) -> String {
        if let Some(lit) = value.literal() {
            return lit;
        }
        let index = self.add_param(value.clone());
        let ident = self.unique_ident(names::PARAM_PREFIX, namespace, name);
        self.emit(Location::Fields, format!("let {ident} = param({index});"));
        ident
    }

    pub fn finish(self) -> SynthesizedSource {
        let mut text = String::new();
        let _ = writeln!(text, "program \"{}\";", escape(&self.display_name));
        for module in &self.imports {
            let _ = writeln!(text, "use {module};");
        }
        for line in &self.sections[Location::Imports.slot()] {
            let _ = writeln!(text, "{line}");
        }
        let _ = writeln!(text, "channels {};", self.channel_names.len());
        let _ = writeln!(text, "params {};", self.params.len());
        let _ = writeln!(text, "progress {};", self.progress_steps);

        for location in Location::ALL {
            let Some(section) = location.section() else {
                continue;
            };
            let lines = &self.sections[location.slot()];
            if lines.is_empty() {
                continue;
            }
            let _ = writeln!(text, "@{section}");
            for line in lines {
                let _ = writeln!(text, "{line}");
            }
        }

        SynthesizedSource {
            display_name: self.display_name,
            text: Arc::from(text),
            params: Arc::from(self.params),
            channel_names: self.channel_names,
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
#[path = "../../tests/unit/synth/builder.rs"]
mod tests;
