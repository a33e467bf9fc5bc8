/*
Copyright (c) 2021 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/


//! Actions: named callables with a fixed parameter list, registered once when the pipeline is
//! built and invoked through [`ActionRegistry::dispatch`].

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};

use thiserror::Error;

use crate::field::{FieldContext, FieldError};

/// Name of the action that does nothing.  Every registry has it.
pub const NO_ACTION: &str = "NoAction";

/// An action body.  `params` always has exactly as many values as the action declares.
pub type ActionFn = fn(ctx: &mut FieldContext, params: &[u128]) -> Result<(), FieldError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("action {0} registered twice")]
    DuplicateAction(String),

    #[error("action {action} declares parameter {param} twice")]
    DuplicateParam { action: String, param: String },

    #[error("no action named {0}")]
    UnknownAction(String),

    #[error("action {action} takes {expected} parameters but {actual} were supplied")]
    Arity {
        action: String,
        expected: usize,
        actual: usize,
    },

    #[error("action {action} failed: {source}")]
    Field {
        action: String,
        #[source]
        source: FieldError,
    },
}

/// Handle for a registered action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub(crate) usize);

impl Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ActionDef {
    name: String,
    params: Vec<String>,
    body: ActionFn,
}

fn no_action(_: &mut FieldContext, _: &[u128]) -> Result<(), FieldError> {
    Ok(())
}

pub struct ActionRegistry {
    actions: Vec<ActionDef>,
    by_name: HashMap<String, ActionId>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        let mut registry = ActionRegistry {
            actions: Vec::new(),
            by_name: HashMap::new(),
        };
        registry.push(NO_ACTION, Vec::new(), no_action);
        registry
    }

    fn push(&mut self, name: &str, params: Vec<String>, body: ActionFn) -> ActionId {
        let id = ActionId(self.actions.len());
        self.actions.push(ActionDef { name: name.into(), params, body });
        self.by_name.insert(name.into(), id);
        id
    }

    pub fn register(&mut self, name: &str, params: &[&str], body: ActionFn) -> Result<ActionId, ActionError> {
        if self.by_name.contains_key(name) {
            return Err(ActionError::DuplicateAction(name.into()));
        }
        let mut seen = HashSet::new();
        for p in params {
            if !seen.insert(*p) {
                return Err(ActionError::DuplicateParam {
                    action: name.into(),
                    param: (*p).into(),
                });
            }
        }
        Ok(self.push(name, params.iter().map(|p| (*p).into()).collect(), body))
    }

    pub fn resolve(&self, name: &str) -> Result<ActionId, ActionError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ActionError::UnknownAction(name.into()))
    }

    pub fn no_action(&self) -> ActionId {
        ActionId(0)
    }

    pub fn name(&self, id: ActionId) -> &str {
        &self.actions[id.0].name
    }

    pub fn params(&self, id: ActionId) -> &[String] {
        &self.actions[id.0].params
    }

    pub fn arity(&self, id: ActionId) -> usize {
        self.actions[id.0].params.len()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs action `id` on `ctx` with `params`, which must match the action's arity.
    pub fn dispatch(&self, id: ActionId, ctx: &mut FieldContext, params: &[u128]) -> Result<(), ActionError> {
        let action = &self.actions[id.0];
        if params.len() != action.params.len() {
            return Err(ActionError::Arity {
                action: action.name.clone(),
                expected: action.params.len(),
                actual: params.len(),
            });
        }
        (action.body)(ctx, params).map_err(|source| ActionError::Field {
            action: action.name.clone(),
            source,
        })
    }
}
