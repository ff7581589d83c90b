/*!

The data model shared by the inference kernel: [`Term`], [`Literal`], [`Substitution`],
[`Context`], and [`Rule`]. These types own no reference to the engine that drives saturation
(`crate::engine`); they are the vocabulary the engine is built out of.

*/

pub mod term;
pub mod literal;
pub mod substitution;
pub mod context;
pub mod rule;

pub use term::{Term, Variable, Constant};
pub use literal::{Literal, LiteralMark, LiteralMarks};
pub use substitution::Substitution;
pub use context::{Context, ContextLookup};
pub use rule::{Rule, RuleSignature};
