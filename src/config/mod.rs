//! VM definition model, loading and validation

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{load_definition, load_document};
pub use schema::Definition;
pub use validator::{validate, ValidationError, Violation, ViolationKind};
