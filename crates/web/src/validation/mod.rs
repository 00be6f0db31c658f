//! Declarative parameter validation.
//!
//! Handlers declare their inputs as [`Declarations`]; the [`ValidationEngine`] resolves each
//! declared name against the request into a [`Parameter`], looks its type name up in the
//! [`ValidatorCatalog`] and checks it.

mod catalog;
mod declaration;
mod engine;
mod parameter;
mod rule;

pub use catalog::{Lookup, ValidatorCatalog};
pub use declaration::{Declarations, ParamSpec};
pub use engine::{ValidateOptions, ValidationEngine};
pub use parameter::Parameter;
pub use rule::{Failures, NAME_PLACEHOLDER, Rule, render_value};
