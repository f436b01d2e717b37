//! # Named variables
//!
//! Integer counters used by game scripts, for example to count the elements already collected.
//! The set of names is fixed when the store is built, asking for any other name is an error and
//! never creates an entry.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedVariable {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    vars: Vec<NamedVariable>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum VariableError {
    #[error("Variable \"{0}\" does not exist")]
    NotFound(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NamedVariable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: 0,
        }
    }

    pub fn increment(&mut self) {
        self.value += 1;
    }

    pub fn decrement(&mut self) {
        self.value -= 1;
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }

    pub fn set(&mut self, value: i64) {
        self.value = value;
    }
}

impl VariableStore {
    /// Build a store holding one zeroed counter per name. Duplicate names are merged.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let mut vars: Vec<NamedVariable> = Vec::with_capacity(names.len());

        for n in names {
            if !vars.iter().any(|v| v.name == n.as_ref()) {
                vars.push(NamedVariable::new(n.as_ref()));
            }
        }

        Self { vars }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<i64, VariableError> {
        self.vars
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value)
            .ok_or_else(|| VariableError::NotFound(name.to_string()))
    }

    pub fn increment(&mut self, name: &str) -> Result<i64, VariableError> {
        self.modify(name, NamedVariable::increment)
    }

    pub fn decrement(&mut self, name: &str) -> Result<i64, VariableError> {
        self.modify(name, NamedVariable::decrement)
    }

    pub fn reset(&mut self, name: &str) -> Result<i64, VariableError> {
        self.modify(name, NamedVariable::reset)
    }

    pub fn set(&mut self, name: &str, value: i64) -> Result<i64, VariableError> {
        self.modify(name, |v| v.set(value))
    }

    fn modify<F>(&mut self, name: &str, f: F) -> Result<i64, VariableError>
    where
        F: FnOnce(&mut NamedVariable),
    {
        let var = self
            .vars
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| VariableError::NotFound(name.to_string()))?;

        f(var);

        Ok(var.value)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
