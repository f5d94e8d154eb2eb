use std::collections::{HashMap, HashSet};

use crate::compile::error::CompileErrorKind;
use crate::program::ast::{BinaryOp, Expr, ExprKind, Lit, ProgramAst, Stmt, UnaryOp};
use crate::program::bytecode::{BuiltinId, Code, ConstIdx, ConstVal, Module, Op, Reserved};
use crate::program::error::ProgramError;
use crate::program::lexer::Span;
use crate::program::parser::parse_program;
use crate::synth::builder::Location;
use crate::synth::names;

/// Upper bound on fields plus locals of one program.
pub(crate) const MAX_SLOTS: usize = 4096;
pub(crate) const MAX_CHANNELS: usize = 1024;

/// A resolved, lowered program: everything except construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProgramTemplate {
    pub(crate) name: String,
    pub(crate) channels: usize,
    pub(crate) params: usize,
    pub(crate) progress_steps: usize,
    pub(crate) consts: Vec<ConstVal>,
    pub(crate) field_count: usize,
    pub(crate) local_count: usize,
    pub(crate) fields: Code,
    pub(crate) before_loop: Code,
    pub(crate) before_line: Code,
    /// `@before_pixel`, `@at_pixel` and `@after_pixel` back to back.
    pub(crate) pixel: Code,
    pub(crate) after_line: Code,
    pub(crate) after_loop: Code,
}

impl ProgramTemplate {
    pub(crate) fn compile(src: &str) -> Result<Self, ProgramError> {
        let ast = parse_program(src)?;
        resolve(&ast)
    }
}

/// Variable lifetime class of a section. Scopes see their own names and their ancestors'.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Fields,
    Loop,
    Line,
    Pixel,
    AfterLine,
    AfterLoop,
}

impl Scope {
    fn of(location: Location) -> Option<Scope> {
        Some(match location {
            Location::Imports => return None,
            Location::Fields => Scope::Fields,
            Location::BeforeLoop => Scope::Loop,
            Location::BeforeLine => Scope::Line,
            Location::BeforePixel | Location::AtPixel | Location::AfterPixel => Scope::Pixel,
            Location::AfterLine => Scope::AfterLine,
            Location::AfterLoop => Scope::AfterLoop,
        })
    }

    fn sees(self, other: Scope) -> bool {
        use Scope::*;
        match self {
            Fields => other == Fields,
            Loop => matches!(other, Fields | Loop),
            Line => matches!(other, Fields | Loop | Line),
            Pixel => matches!(other, Fields | Loop | Line | Pixel),
            AfterLine => matches!(other, Fields | Loop | Line | AfterLine),
            AfterLoop => matches!(other, Fields | Loop | AfterLoop),
        }
    }

    fn sees_reserved(self, r: Reserved) -> bool {
        match r {
            Reserved::WidthF | Reserved::HeightF | Reserved::SliceId => self != Scope::Fields,
            Reserved::Y | Reserved::YNorm => {
                matches!(self, Scope::Line | Scope::Pixel | Scope::AfterLine)
            }
            Reserved::X | Reserved::XNorm => self == Scope::Pixel,
        }
    }
}

fn reserved(name: &str) -> Option<Reserved> {
    Some(match name {
        names::X => Reserved::X,
        names::Y => Reserved::Y,
        names::X_NORM => Reserved::XNorm,
        names::Y_NORM => Reserved::YNorm,
        names::WIDTH_F => Reserved::WidthF,
        names::HEIGHT_F => Reserved::HeightF,
        names::SLICE_ID => Reserved::SliceId,
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy)]
struct Symbol {
    scope: Scope,
    slot: u32,
}

struct Resolver {
    modules: HashSet<Module>,
    params: usize,
    channels: usize,
    symbols: HashMap<String, Symbol>,
    consts: Vec<ConstVal>,
    field_count: usize,
    local_count: usize,
}

pub(crate) fn resolve(ast: &ProgramAst) -> Result<ProgramTemplate, ProgramError> {
    if ast.channels > MAX_CHANNELS {
        return Err(ProgramError::unlocated(
            CompileErrorKind::Resource,
            format!(
                "{} channels requested, at most {MAX_CHANNELS} are supported",
                ast.channels
            ),
        ));
    }
    if ast.params > MAX_SLOTS {
        return Err(ProgramError::unlocated(
            CompileErrorKind::Resource,
            format!(
                "{} parameters requested, at most {MAX_SLOTS} are supported",
                ast.params
            ),
        ));
    }

    let mut modules = HashSet::new();
    for (name, span) in &ast.uses {
        let m = Module::from_name(name).ok_or_else(|| {
            ProgramError::new(
                CompileErrorKind::MissingType,
                span.start,
                format!("unknown module `{name}`"),
            )
        })?;
        modules.insert(m);
    }

    let mut r = Resolver {
        modules,
        params: ast.params,
        channels: ast.channels,
        symbols: HashMap::new(),
        consts: Vec::new(),
        field_count: 0,
        local_count: 0,
    };

    let mut fields = Code::default();
    let mut before_loop = Code::default();
    let mut before_line = Code::default();
    let mut pixel = Code::default();
    let mut after_line = Code::default();
    let mut after_loop = Code::default();

    for section in &ast.sections {
        let Some(scope) = Scope::of(section.location) else {
            return Err(ProgramError::unlocated(
                CompileErrorKind::Syntax,
                "the header has no section marker",
            ));
        };
        let code = match scope {
            Scope::Fields => &mut fields,
            Scope::Loop => &mut before_loop,
            Scope::Line => &mut before_line,
            Scope::Pixel => &mut pixel,
            Scope::AfterLine => &mut after_line,
            Scope::AfterLoop => &mut after_loop,
        };
        for stmt in &section.body {
            r.lower_stmt(scope, stmt, code)?;
        }
    }

    Ok(ProgramTemplate {
        name: ast.name.clone(),
        channels: ast.channels,
        params: ast.params,
        progress_steps: ast.progress_steps,
        consts: r.consts,
        field_count: r.field_count,
        local_count: r.local_count,
        fields,
        before_loop,
        before_line,
        pixel,
        after_line,
        after_loop,
    })
}

fn access(span: Span, msg: impl Into<String>) -> ProgramError {
    ProgramError::new(CompileErrorKind::Access, span.start, msg)
}

impl Resolver {
    fn lower_stmt(
        &mut self,
        scope: Scope,
        stmt: &Stmt,
        code: &mut Code,
    ) -> Result<(), ProgramError> {
        match stmt {
            Stmt::Let { name, value, span } => {
                if reserved(name).is_some() || name == names::CHANNEL {
                    return Err(access(*span, format!("`{name}` is reserved")));
                }
                if self.symbols.contains_key(name) {
                    return Err(access(*span, format!("`{name}` is already declared")));
                }
                // The initializer cannot see the name it defines.
                self.lower_expr(scope, value, code)?;
                let slot = self.allocate(scope, *span)?;
                self.symbols.insert(name.clone(), Symbol { scope, slot });
                code.ops.push(Op::StoreLocal(slot));
            }
            Stmt::Assign { name, value, span } => {
                if reserved(name).is_some() {
                    return Err(access(*span, format!("cannot assign to `{name}`")));
                }
                let sym = self.lookup(scope, name, *span)?;
                if sym.scope == Scope::Fields && scope != Scope::Fields {
                    return Err(access(
                        *span,
                        format!("field `{name}` is read-only outside @fields"),
                    ));
                }
                self.lower_expr(scope, value, code)?;
                code.ops.push(Op::StoreLocal(sym.slot));
            }
            Stmt::Channel { index, value, span } => {
                if scope != Scope::Pixel {
                    return Err(access(*span, "channels can only be written per pixel"));
                }
                if *index >= self.channels {
                    return Err(ProgramError::new(
                        CompileErrorKind::Resource,
                        span.start,
                        format!(
                            "channel {index} written but the program declares {} channels",
                            self.channels
                        ),
                    ));
                }
                self.lower_expr(scope, value, code)?;
                code.ops.push(Op::WriteChannel(*index as u32));
            }
        }
        Ok(())
    }

    fn allocate(&mut self, scope: Scope, span: Span) -> Result<u32, ProgramError> {
        if self.field_count + self.local_count >= MAX_SLOTS {
            return Err(ProgramError::new(
                CompileErrorKind::Resource,
                span.start,
                format!("more than {MAX_SLOTS} variables"),
            ));
        }
        let counter = if scope == Scope::Fields {
            &mut self.field_count
        } else {
            &mut self.local_count
        };
        let slot = *counter as u32;
        *counter += 1;
        Ok(slot)
    }

    fn lookup(&self, scope: Scope, name: &str, span: Span) -> Result<Symbol, ProgramError> {
        let Some(sym) = self.symbols.get(name).copied() else {
            return Err(ProgramError::new(
                CompileErrorKind::MissingType,
                span.start,
                format!("unknown variable `{name}`"),
            ));
        };
        if !scope.sees(sym.scope) {
            return Err(access(
                span,
                format!("`{name}` is not visible in this section"),
            ));
        }
        Ok(sym)
    }

    fn push_const(&mut self, v: ConstVal, code: &mut Code) {
        let idx = match self.consts.iter().position(|c| same_const(c, &v)) {
            Some(i) => i,
            None => {
                self.consts.push(v);
                self.consts.len() - 1
            }
        };
        code.ops.push(Op::PushConst(ConstIdx(idx as u32)));
    }

    fn lower_expr(
        &mut self,
        scope: Scope,
        expr: &Expr,
        code: &mut Code,
    ) -> Result<(), ProgramError> {
        match &expr.kind {
            ExprKind::Lit(Lit::F64(v)) => self.push_const(ConstVal::F64(*v), code),
            ExprKind::Lit(Lit::Bool(b)) => self.push_const(ConstVal::Bool(*b), code),
            ExprKind::Ident(name) => {
                if let Some(r) = reserved(name) {
                    if !scope.sees_reserved(r) {
                        return Err(access(
                            expr.span,
                            format!("`{name}` is not available in this section"),
                        ));
                    }
                    code.ops.push(Op::LoadReserved(r));
                    return Ok(());
                }
                let sym = self.lookup(scope, name, expr.span)?;
                let op = if sym.scope == Scope::Fields && scope != Scope::Fields {
                    Op::LoadField(sym.slot)
                } else {
                    Op::LoadLocal(sym.slot)
                };
                code.ops.push(op);
            }
            ExprKind::Unary { op, expr: inner } => {
                self.lower_expr(scope, inner, code)?;
                code.ops.push(match op {
                    UnaryOp::Neg => Op::Neg,
                    UnaryOp::Not => Op::Not,
                });
            }
            ExprKind::Binary { op, left, right } => {
                self.lower_expr(scope, left, code)?;
                self.lower_expr(scope, right, code)?;
                code.ops.push(binary_op(*op));
            }
            ExprKind::Select {
                cond,
                then,
                otherwise,
            } => {
                self.lower_expr(scope, cond, code)?;
                self.lower_expr(scope, then, code)?;
                self.lower_expr(scope, otherwise, code)?;
                code.ops.push(Op::Select);
            }
            ExprKind::Call { func, args } if func == "param" => {
                self.lower_param(scope, args, expr.span, code)?;
            }
            ExprKind::Call { func, args } => {
                let id = BuiltinId::from_name(func).ok_or_else(|| {
                    ProgramError::new(
                        CompileErrorKind::MissingType,
                        expr.span.start,
                        format!("unknown function `{func}`"),
                    )
                })?;
                if !self.modules.contains(&id.module()) {
                    return Err(ProgramError::new(
                        CompileErrorKind::MissingType,
                        expr.span.start,
                        format!("`{func}` requires `use {};`", module_name(id.module())),
                    ));
                }
                if args.len() != usize::from(id.arity()) {
                    return Err(ProgramError::syntax(
                        expr.span.start,
                        format!(
                            "`{func}` takes {} arguments, {} given",
                            id.arity(),
                            args.len()
                        ),
                    ));
                }
                for a in args {
                    self.lower_expr(scope, a, code)?;
                }
                code.ops.push(Op::CallBuiltin {
                    id,
                    argc: id.arity(),
                });
            }
        }
        Ok(())
    }

    fn lower_param(
        &mut self,
        scope: Scope,
        args: &[Expr],
        span: Span,
        code: &mut Code,
    ) -> Result<(), ProgramError> {
        if scope != Scope::Fields {
            return Err(access(span, "`param` can only be read in @fields"));
        }
        let index = match args {
            [Expr {
                kind: ExprKind::Lit(Lit::F64(v)),
                ..
            }] if *v >= 0.0 && v.fract() == 0.0 => *v as usize,
            _ => {
                return Err(ProgramError::syntax(
                    span.start,
                    "`param` takes one integer literal",
                ));
            }
        };
        if index >= self.params {
            return Err(ProgramError::new(
                CompileErrorKind::Resource,
                span.start,
                format!(
                    "parameter {index} read but the program declares {}",
                    self.params
                ),
            ));
        }
        code.ops.push(Op::LoadParam(index as u32));
        Ok(())
    }
}

fn same_const(a: &ConstVal, b: &ConstVal) -> bool {
    match (a, b) {
        (ConstVal::F64(x), ConstVal::F64(y)) => x.to_bits() == y.to_bits(),
        (ConstVal::Bool(x), ConstVal::Bool(y)) => x == y,
        _ => false,
    }
}

fn module_name(m: Module) -> &'static str {
    match m {
        Module::Math => "math",
        Module::Noise => "noise",
        Module::Color => "color",
    }
}

fn binary_op(op: BinaryOp) -> Op {
    match op {
        BinaryOp::Add => Op::Add,
        BinaryOp::Sub => Op::Sub,
        BinaryOp::Mul => Op::Mul,
        BinaryOp::Div => Op::Div,
        BinaryOp::Mod => Op::Mod,
        BinaryOp::Eq => Op::Eq,
        BinaryOp::Ne => Op::Ne,
        BinaryOp::Lt => Op::Lt,
        BinaryOp::Le => Op::Le,
        BinaryOp::Gt => Op::Gt,
        BinaryOp::Ge => Op::Ge,
        BinaryOp::And => Op::And,
        BinaryOp::Or => Op::Or,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/program/resolve.rs"]
mod tests;
