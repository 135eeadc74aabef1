//! Declarative function signatures and argument binding

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::MemoError;

use super::args::{Arguments, CallArgs};

/// How a formal parameter accepts arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Filled by position or by name
    PositionalOrKeyword,
    /// Filled by name only
    KeywordOnly,
    /// Unbounded tail of positional arguments
    VarPositional,
    /// Catch-all for unmatched keyword arguments
    VarKeyword,
}

/// A formal parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Ordered formal parameter list of a memoized function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required positional-or-keyword parameter
    pub fn param(self, name: impl Into<String>) -> Self {
        self.with_param(Param::new(name, ParamKind::PositionalOrKeyword))
    }

    /// Adds a positional-or-keyword parameter with a default
    pub fn param_with_default(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.with_param(Param::new(name, ParamKind::PositionalOrKeyword).with_default(default))
    }

    /// Adds a keyword-only parameter, optionally defaulted
    pub fn keyword_only(self, name: impl Into<String>, default: Option<Value>) -> Self {
        let mut param = Param::new(name, ParamKind::KeywordOnly);
        param.default = default;
        self.with_param(param)
    }

    /// Adds a variadic positional parameter
    ///
    /// Such a signature can be declared but never bound.
    pub fn var_positional(self, name: impl Into<String>) -> Self {
        self.with_param(Param::new(name, ParamKind::VarPositional))
    }

    /// Adds a variadic keyword parameter whose entries are flattened
    pub fn var_keyword(self, name: impl Into<String>) -> Self {
        self.with_param(Param::new(name, ParamKind::VarKeyword))
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    fn var_positional_param(&self) -> Option<&Param> {
        self.params
            .iter()
            .find(|p| p.kind == ParamKind::VarPositional)
    }

    fn accepts_var_keyword(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::VarKeyword)
    }

    /// Binds a call onto this signature
    ///
    /// Positional arguments fill positional-or-keyword parameters in order,
    /// keyword arguments fill parameters by name, defaults fill the rest and
    /// unmatched keywords are flattened into the mapping when a variadic
    /// keyword parameter exists.
    pub fn bind(&self, call: &CallArgs) -> Result<Arguments, MemoError> {
        if let Some(param) = self.var_positional_param() {
            return Err(MemoError::contract_violation(format!(
                "Function declares variadic positional parameter '{}', which cannot be \
                 flattened into an argument mapping",
                param.name
            )));
        }

        let positional_params: Vec<&Param> = self
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::PositionalOrKeyword)
            .collect();

        if call.positional().len() > positional_params.len() {
            return Err(MemoError::binding(format!(
                "Takes {} positional arguments but {} were given",
                positional_params.len(),
                call.positional().len()
            )));
        }

        let mut bound: BTreeMap<String, Value> = BTreeMap::new();

        for (param, value) in positional_params.iter().zip(call.positional()) {
            bound.insert(param.name.clone(), value.clone());
        }

        let mut extra: BTreeMap<String, Value> = BTreeMap::new();

        for (name, value) in call.keyword() {
            let named = self.params.iter().find(|p| {
                &p.name == name
                    && matches!(
                        p.kind,
                        ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly
                    )
            });

            match named {
                Some(_) if bound.contains_key(name) => {
                    return Err(MemoError::binding(format!(
                        "Got multiple values for argument '{}'",
                        name
                    )));
                }
                Some(_) => {
                    bound.insert(name.clone(), value.clone());
                }
                None if self.accepts_var_keyword() => {
                    extra.insert(name.clone(), value.clone());
                }
                None => {
                    return Err(MemoError::binding(format!(
                        "Got an unexpected keyword argument '{}'",
                        name
                    )));
                }
            }
        }

        for param in &self.params {
            if !matches!(
                param.kind,
                ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly
            ) || bound.contains_key(&param.name)
            {
                continue;
            }

            match &param.default {
                Some(default) => {
                    bound.insert(param.name.clone(), default.clone());
                }
                None => {
                    return Err(MemoError::binding(format!(
                        "Missing required argument '{}'",
                        param.name
                    )));
                }
            }
        }

        bound.extend(extra);

        Ok(bound.into_iter().collect())
    }
}
