use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::runtime::RuntimeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Str(String),
}

impl Value {
    pub fn bool(b: bool) -> Self {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    /// Numbers are true when non-zero; strings are false when empty or `"\0"`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !(s.is_empty() || s == "\0"),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: Value,
}

/// Script variables in order of first assignment. Variables are never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableStore {
    vars: Vec<Variable>,
    index: FxHashMap<String, usize>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&i| &self.vars[i].value)
    }

    pub fn lookup(&self, name: &str) -> Result<&Value, RuntimeError> {
        self.get(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }

    /// Overwrites `name` (its type may change) or appends it.
    pub fn assign(&mut self, name: &str, value: Value) {
        match self.index.get(name) {
            Some(&i) => self.vars[i].value = value,
            None => {
                self.index.insert(name.to_string(), self.vars.len());
                self.vars.push(Variable { name: name.to_string(), value });
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_keeps_first_position() {
        let mut vars = VariableStore::new();
        vars.assign("gold", Value::Number(1.0));
        vars.assign("name", Value::Str("Ann".into()));
        vars.assign("gold", Value::Str("lots".into()));

        let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["gold", "name"]);
        assert_eq!(vars.get("gold"), Some(&Value::Str("lots".into())));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn unknown_names_are_errors() {
        let vars = VariableStore::new();
        assert_eq!(vars.lookup("ghost"), Err(RuntimeError::UndefinedVariable("ghost".into())));
    }

    #[test]
    fn truthiness() {
        assert!(Value::Number(-2.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Str("0".into()).is_truthy());
        assert!(!Value::Str("\0".into()).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
    }
}
