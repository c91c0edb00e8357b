use thiserror::Error;
use tracing::trace;

/// Maximum number of variables the store can hold.
pub const MAX_VARIABLES: usize = 5;
/// Maximum length of a variable name, in bytes.
pub const MAX_NAME_LEN: usize = 10;
/// Maximum length of a variable value, in bytes.
pub const MAX_VALUE_LEN: usize = 15;

/// Reasons a variable cannot be stored.
///
/// The `Display` text is the diagnostic body the `export` built-in prints after
/// its `lsh: export: ` prefix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("first letter of variable name must be a letter")]
    InvalidName,

    #[error("variable name exceeds a limit of {MAX_NAME_LEN} characters")]
    NameTooLong,

    #[error("variable value exceeds a limit of {MAX_VALUE_LEN} characters")]
    ValueTooLong,

    #[error("maximum number of variables reached")]
    CapacityExhausted,
}

/// A single `name = value` pair held by the [`VariableStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    value: String,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Bounded, insertion-ordered table of shell variables.
///
/// The store lives for the whole shell session and is never persisted or
/// passed to child processes. It upholds these invariants at all times:
/// - at most [`MAX_VARIABLES`] entries;
/// - every name is 1..=[`MAX_NAME_LEN`] bytes and starts with an ASCII letter;
/// - every value is at most [`MAX_VALUE_LEN`] bytes;
/// - names are unique.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    vars: Vec<Variable>,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            vars: Vec::with_capacity(MAX_VARIABLES),
        }
    }

    /// All variables in the order they were first set.
    pub fn list(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Set `name` to `value`.
    ///
    /// An existing entry is overwritten in place and keeps its position; a new
    /// one is appended unless the store is full. On error the store is left
    /// untouched.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        if value.len() > MAX_VALUE_LEN {
            return Err(StoreError::ValueTooLong);
        }

        if let Some(var) = self.vars.iter_mut().find(|var| var.name == name) {
            trace!(var = name, value, "variable updated");
            var.value = value.to_string();
            return Ok(());
        }

        if self.vars.len() == MAX_VARIABLES {
            return Err(StoreError::CapacityExhausted);
        }

        trace!(var = name, value, "variable added");
        self.vars.push(Variable {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    /// Get the value of the variable called exactly `name`.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }

    /// Get the value of the first variable, in insertion order, whose name
    /// starts with `request`.
    ///
    /// This is how `echo $NAME` resolves names: `$HO` finds `HOME`, and a bare
    /// `$` finds the first variable in the store.
    pub fn lookup_prefix(&self, request: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|var| var.name.as_bytes().starts_with(request.as_bytes()))
            .map(|var| var.value.as_str())
    }
}

/// Check the first-byte and length rules for a variable name.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    match name.as_bytes().first() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return Err(StoreError::InvalidName),
    }
    if name.len() > MAX_NAME_LEN {
        return Err(StoreError::NameTooLong);
    }
    Ok(())
}
