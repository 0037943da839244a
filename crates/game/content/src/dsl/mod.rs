//! Role and skill-script compiler.
//!
//! Text flows `lexer -> parser -> ast`, then either through `analysis`
//! (warnings only) or `lower` (executable steps wrapped in a [`Skill`]).

pub mod analysis;
pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod lexer;
mod lower;
pub mod parser;
mod role;
mod skill;

pub use diagnostics::{Diagnostic, DiagnosticSeverity};
pub use error::{ParseError, ParseErrorKind, ParseResult, Pos};
pub use lower::MAX_REPEAT;
pub use role::RoleDefinition;
pub use skill::{CastTarget, Skill, SkillMeta};
