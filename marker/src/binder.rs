//! # Variable Binder
//!
//! Resolves the values a student contributes to pattern construction. The scheme
//! declares which placeholders it uses; every one of them must resolve to a
//! non-empty value for the student, otherwise the student cannot be graded and a
//! [`MissingVariableError`] is returned.
//!
//! Resolution rules:
//! - `UID` → the student's UID
//! - `USERNAME` → the student's username
//! - any other `NAME` → the roster column `name` (case-insensitive)

use crate::error::MissingVariableError;
use crate::types::Student;
use std::collections::{BTreeMap, BTreeSet};

/// Mapping from placeholder name to the literal value for one student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableBinding(BTreeMap<String, String>);

impl VariableBinding {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Builds the binding for `student` covering every name in `placeholders`.
pub fn bind(
    student: &Student,
    placeholders: &BTreeSet<String>,
) -> Result<VariableBinding, MissingVariableError> {
    let mut binding = VariableBinding::default();
    let mut missing = Vec::new();

    for name in placeholders {
        match student.lookup(name).map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => binding.insert(name.clone(), value),
            None => missing.push(name.clone()),
        }
    }

    if missing.is_empty() {
        Ok(binding)
    } else {
        Err(MissingVariableError {
            username: student.username.clone(),
            variables: missing,
        })
    }
}
