//! OpenSASE Form Builder Platform
//!
//! Self-hosted form builder replacing Typeform, JotForm, Google Forms.
//! This crate holds the engine behind the builder: the form schema model,
//! field validation, derived (computed) fields and the reactive fill session.
//!
//! ## Architecture
//!
//! - **Domain Layer**: `FormSchema` aggregate, field/rule/value objects,
//!   validator, derivation evaluator and dependency analysis
//! - **Application Layer**: `FormSession` (value changes, recompute,
//!   revalidation, submit) and `FormService` (save/list/load/delete)
//! - **Ports Layer**: use case and repository interfaces
//! - **Infrastructure Layer**: in-memory and JSON file repositories
//!
//! ## Derived fields
//!
//! A derived field carries a formula such as `{price} * {quantity}` or
//! `age_from_date({dob})`. Formulas run through a small sandboxed
//! interpreter (numbers, quoted strings, `+ - * /`, parentheses); any failure
//! degrades to an empty value instead of an error.
//!
//! ```
//! use sase_forms::{DerivationEvaluator, FieldValue, ValueMap};
//!
//! let mut values = ValueMap::new();
//! values.insert("a".into(), FieldValue::from(3));
//! values.insert("b".into(), FieldValue::from(4));
//!
//! let evaluator = DerivationEvaluator::new();
//! assert_eq!(evaluator.evaluate("{a} + {b}", &values), FieldValue::from(7));
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use application::{
    ChangeReport, FormService, FormSession, FormSummary, SessionError, Submission,
    SubmissionRejected,
};
pub use config::{EngineConfig, RecomputeStrategy};
pub use domain::aggregates::{FormSchema, FormStats, MoveDirection, SchemaError};
pub use domain::events::{DomainEvent, FormEvent};
pub use domain::services::{
    parse_date, substitute, Clock, DependencyGraph, DerivationEvaluator, FixedClock,
    FormulaError, SchemaIssue, SystemClock, Validator,
};
pub use domain::value_objects::{
    DerivedLogic, ErrorMap, FieldDefinition, FieldId, FieldType, FieldValue, FormId, RuleKind,
    RuleParam, SelectOption, ValidationRule, ValueMap,
};
pub use error::{FormsError, Result};
pub use infrastructure::{
    InMemoryFormRepository, JsonFileFormRepository, LoggingEventPublisher, NoOpEventPublisher,
};
pub use ports::inbound::{FormUseCases, UseCaseError};
pub use ports::outbound::{EventPublisher, FormRepository, RepositoryError};
