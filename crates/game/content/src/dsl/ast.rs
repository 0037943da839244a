//! Syntax tree for role definitions and skill scripts.

use battle_core::{DamageKind, Direction, DistanceMetric, TargetingMode, Value};

use crate::dsl::error::Pos;

/// An AST node with the position where it started.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub pos: Pos,
}

impl<T> Spanned<T> {
    pub fn new(node: T, pos: Pos) -> Self {
        Self { node, pos }
    }
}

// === Role ===

#[derive(Clone, Debug, PartialEq)]
pub struct RoleAst {
    pub name: String,
    pub id: String,
    pub description: String,
    pub vars: Vec<(String, Value)>,
    pub tags: Vec<String>,
    pub skills: Vec<SkillAst>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkillAst {
    pub name: Spanned<String>,
    pub script: Script,
}

// === Script ===

/// A parsed skill body: top-level metadata plus statements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Script {
    pub meta: Vec<Spanned<Meta>>,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Meta {
    Range(i64),
    MinRange(i64),
    Cooldown(i64),
    Targeting(TargetingMode),
    Distance(DistanceMetric),
    SealedUntil(i64),
    EndsTurn,
}

/// A unit (or point) named in a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ref {
    /// `self` / `caster`
    Caster,
    Target,
    /// The current element of a `for each` loop.
    It,
    /// `unit "<id>"`
    Unit(String),
}

/// Owner of a variable or tag written by `set`/`add`/`remove`.
#[derive(Clone, Debug, PartialEq)]
pub enum Scope {
    Unit(Ref),
    Tile(Expr, Expr),
    TileAt(Ref),
    Global,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Destination {
    Coord(Expr, Expr),
    At(Ref),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Deal {
        kind: DamageKind,
        amount: Expr,
        target: Ref,
    },
    Heal {
        amount: Expr,
        target: Ref,
    },
    Move {
        unit: Ref,
        to: Destination,
    },
    Dash {
        target: Ref,
        steps: Expr,
    },
    Line {
        kind: DamageKind,
        amount: Expr,
        target: Ref,
        length: Expr,
        radius: Expr,
    },
    SetVar {
        scope: Scope,
        name: String,
        value: Expr,
    },
    AddVar {
        scope: Scope,
        name: String,
        delta: Expr,
    },
    RemoveVar {
        scope: Scope,
        name: String,
    },
    AddTag {
        scope: Scope,
        tag: String,
    },
    RemoveTag {
        scope: Scope,
        tag: String,
    },
    ConsumeMp(Expr),
    If {
        cond: Cond,
        then: Block,
        otherwise: Option<Block>,
    },
    Repeat {
        times: Expr,
        body: Block,
    },
    Parallel(Block),
    ForEach {
        selector: Spanned<Selector>,
        body: Block,
    },
    Chance {
        percent: Expr,
        then: Block,
        otherwise: Option<Block>,
    },
}

/// Statements under a control construct. `braced` is false for the
/// single-statement form (`then heal 1 to self`).
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
    pub braced: bool,
    pub pos: Pos,
}

// === Expressions ===

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Lit(Value),
    /// `<ref>.<Var>`
    UnitVar(Ref, String),
    /// `global.<Var>`
    GlobalVar(String),
    /// The current logical turn.
    Turn,
    Neg(Box<Expr>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// The literal value, if the expression is a constant.
    pub fn constant(&self) -> Option<Value> {
        match self {
            Expr::Lit(value) => Some(value.clone()),
            Expr::Neg(inner) => match inner.constant()? {
                Value::Int(n) => Some(Value::Int(n.saturating_neg())),
                Value::Float(f) => Some(Value::Float(-f)),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cond {
    Cmp(CmpOp, Expr, Expr),
    /// A bare expression read as a boolean.
    Truthy(Expr),
    HasTag(Ref, String),
    GlobalHasTag(String),
    Chance(Spanned<Expr>),
    Not(Box<Cond>),
    And(Box<Cond>, Box<Cond>),
    Or(Box<Cond>, Box<Cond>),
}

// === Selectors ===

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pool {
    Units,
    Enemies,
    Allies,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Nearest,
    Farthest,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeSpec {
    Line {
        length: Expr,
        dir: Option<Direction>,
        width: Option<Expr>,
    },
    Cone {
        radius: Expr,
        angle: Option<Expr>,
        dir: Option<Direction>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    pub pool: Pool,
    pub order: Option<Order>,
    pub limit: Option<Spanned<Expr>>,
    pub range: Option<Spanned<Expr>>,
    /// Anchor of `in range N of <ref>`; the caster when absent.
    pub anchor: Option<Ref>,
    pub with_tags: Vec<String>,
    pub shape: Option<Spanned<ShapeSpec>>,
}

impl Selector {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            order: None,
            limit: None,
            range: None,
            anchor: None,
            with_tags: Vec::new(),
            shape: None,
        }
    }
}
