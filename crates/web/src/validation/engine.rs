use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ErrorKind};
use crate::params::Params;
use crate::validation::{Declarations, Parameter, ValidatorCatalog};

/// Switches of one validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Fail when a param was sent that is not declared.
    pub reject_unknown: bool,
    /// Write the resolved value of every declared name back into the params.
    pub write_defaults: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self { reject_unknown: true, write_defaults: true }
    }
}

/// Checks request params against declarations.
///
/// A pass runs four stages and stops at the first failure:
/// 1. unknown params, when rejected
/// 2. resolving every declared value as `sent ?? default ?? null`
/// 3. required params without a value
/// 4. values against their rules
///
/// Only when all of them pass are the resolved values written back. Undeclared params
/// that were let through stay as they are.
#[derive(Debug, Clone, Copy)]
pub struct ValidationEngine<'a> {
    catalog: &'a ValidatorCatalog,
    error_kind: ErrorKind,
}

impl<'a> ValidationEngine<'a> {
    pub fn new(catalog: &'a ValidatorCatalog, error_kind: ErrorKind) -> Self {
        Self { catalog, error_kind }
    }

    pub fn validate(&self, params: &mut Params, declarations: &Declarations, options: ValidateOptions) -> Result<(), ApiError> {
        if options.reject_unknown {
            self.reject_unknown(params, declarations)?;
        }

        let parameters = self.resolve(params, declarations);

        if let Some(missing) = parameters.iter().find(|param| param.required_but_missing()) {
            return Err(self.error(format!("The `{}` parameter is required.", missing.name())));
        }

        for param in parameters.iter().filter(|param| param.has_value()) {
            if !param.validate() {
                let message = param.validation_error().unwrap_or_else(|| format!("Invalid parameter {}", param.name()));
                return Err(self.error(message));
            }
        }

        if options.write_defaults {
            let resolved = parameters
                .into_iter()
                .map(|param| {
                    let name = param.name().to_string();
                    (name, param.into_value().unwrap_or(Value::Null))
                })
                .collect::<Params>();
            params.merge(resolved);
        }

        debug!(declared = declarations.len(), "params validated");
        Ok(())
    }

    fn reject_unknown(&self, params: &Params, declarations: &Declarations) -> Result<(), ApiError> {
        match params.names().find(|name| !declarations.contains(name)) {
            Some(name) => Err(self.error(format!("The `{name}` parameter is not permitted."))),
            None => Ok(()),
        }
    }

    /// Builds a [`Parameter`] for every declared name, in declaration order.
    pub fn resolve(&self, params: &Params, declarations: &Declarations) -> Vec<Parameter> {
        declarations
            .iter()
            .map(|(name, spec)| {
                let value = params.get_present(name).cloned().or_else(|| spec.default.clone());
                let lookup = self.catalog.lookup(spec.type_name.as_deref());
                Parameter::new(name, value, spec.required, lookup.rule, lookup.custom_errors)
            })
            .collect()
    }

    fn error(&self, message: String) -> ApiError {
        ApiError::new(self.error_kind, message)
    }
}
