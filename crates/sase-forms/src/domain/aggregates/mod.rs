//! Aggregates module

pub mod form;

pub use form::{FormSchema, FormStats, MoveDirection, SchemaError, UNTITLED_FORM_NAME};
