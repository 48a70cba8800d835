//! Statement compilation
//!
//! Turns a validated request descriptor into an ordered plan of
//! parameterized statements.

pub mod compiler;
pub mod plan;

pub use compiler::compile;
pub use plan::{CompiledStatement, QueryPlan};
