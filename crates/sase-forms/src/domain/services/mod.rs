//! Domain services module
//!
//! Stateless logic over the value objects: rule validation, formula
//! evaluation and schema dependency analysis.

pub mod clock;
pub mod dependency;
pub mod formula;
pub mod validator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use dependency::{DependencyGraph, SchemaIssue};
pub use formula::{parse_date, substitute, DerivationEvaluator, FormulaError};
pub use validator::Validator;
