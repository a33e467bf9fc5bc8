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


use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use tracing::debug;

use crate::action::{ActionError, ActionFn, ActionId, ActionRegistry};
use crate::field::{FieldContext, FieldError};
use crate::table::{DefaultAction, Table, TableSchema};
use crate::value::MatchKind;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no table named {0}")]
    UnknownTable(String),

    #[error("table {0} defined twice")]
    DuplicateTable(String),

    #[error("table {table}: field {field} has width {width}, but widths must be between 1 and 128 bits")]
    BadKeyWidth { table: String, field: String, width: u32 },

    #[error("table {table}: {source}")]
    Action {
        table: String,
        #[source]
        source: ActionError,
    },

    #[error("table {table}: default action {action} takes {expected} parameters but {actual} were supplied")]
    DefaultParams {
        table: String,
        action: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Dispatch(#[from] ActionError),
}

/// Describes a table to be created by [`PipelineBuilder::table`].  Actions are named and resolved
/// when the pipeline is built.
#[derive(Clone, Debug, Default)]
pub struct TableDef {
    name: String,
    schema: TableSchema,
    actions: Vec<String>,
    default_action: Option<(String, Vec<u128>)>,
    const_default_action: Option<(String, Vec<u128>)>,
}

impl TableDef {
    pub fn new(name: &str) -> Self {
        TableDef { name: name.into(), ..Default::default() }
    }

    pub fn key(mut self, name: &str, kind: MatchKind, width: u32) -> Self {
        self.schema = self.schema.field(name, kind, width);
        self
    }

    /// Allows entries to use action `name`.
    pub fn action(mut self, name: &str) -> Self {
        self.actions.push(name.into());
        self
    }

    /// Runs action `name` with `params` on a miss.  Without one, the default is `NoAction`.
    pub fn default_action(mut self, name: &str, params: &[u128]) -> Self {
        self.default_action = Some((name.into(), params.to_vec()));
        self
    }

    pub fn const_default_action(mut self, name: &str, params: &[u128]) -> Self {
        self.const_default_action = Some((name.into(), params.to_vec()));
        self
    }
}

#[derive(Default)]
pub struct PipelineBuilder {
    actions: ActionRegistry,
    tables: Vec<TableDef>,
}

impl PipelineBuilder {
    /// Registers an action with the given parameter names.
    pub fn action(&mut self, name: &str, params: &[&str], body: ActionFn) -> Result<&mut Self, ActionError> {
        self.actions.register(name, params, body)?;
        Ok(self)
    }

    pub fn table(&mut self, def: TableDef) -> &mut Self {
        self.tables.push(def);
        self
    }

    fn resolve_default(
        &self,
        table: &str,
        default: &Option<(String, Vec<u128>)>,
    ) -> Result<Option<DefaultAction>, PipelineError> {
        let (name, params) = match default {
            Some(d) => d,
            None => return Ok(None),
        };
        let action = self.actions.resolve(name).map_err(|source| PipelineError::Action {
            table: table.into(),
            source,
        })?;
        let expected = self.actions.arity(action);
        if params.len() != expected {
            return Err(PipelineError::DefaultParams {
                table: table.into(),
                action: name.clone(),
                expected,
                actual: params.len(),
            });
        }
        Ok(Some(DefaultAction { action, params: params.clone() }))
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let mut tables = HashMap::new();
        for def in &self.tables {
            if tables.contains_key(&def.name) {
                return Err(PipelineError::DuplicateTable(def.name.clone()));
            }
            if let Some(f) = def.schema.fields.iter().find(|f| f.width == 0 || f.width > 128) {
                return Err(PipelineError::BadKeyWidth {
                    table: def.name.clone(),
                    field: f.name.clone(),
                    width: f.width,
                });
            }
            let actions = def
                .actions
                .iter()
                .map(|a| self.actions.resolve(a))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| PipelineError::Action {
                    table: def.name.clone(),
                    source,
                })?;
            let default_action = self
                .resolve_default(&def.name, &def.default_action)?
                .unwrap_or(DefaultAction { action: self.actions.no_action(), params: Vec::new() });
            let const_default_action = self.resolve_default(&def.name, &def.const_default_action)?;

            let table = Table::new(
                def.name.clone(),
                def.schema.clone(),
                actions,
                default_action,
                const_default_action,
            );
            tables.insert(def.name.clone(), Arc::new(table));
        }
        Ok(Pipeline { actions: self.actions, tables })
    }
}

/// What [`Pipeline::apply`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyResult {
    pub hit: bool,
    pub action: ActionId,
    pub action_name: String,
    pub params: Vec<u128>,
}

/// Tables and actions, built once at startup and then shared by the control plane and the packet
/// path.
pub struct Pipeline {
    actions: ActionRegistry,
    tables: HashMap<String, Arc<Table>>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn table(&self, name: &str) -> Result<&Arc<Table>, PipelineError> {
        self.tables
            .get(name)
            .ok_or_else(|| PipelineError::UnknownTable(name.into()))
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<Table>> {
        self.tables.values()
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Looks up `table` against `ctx` and runs exactly one action: the winning entry's on a hit,
    /// the table's miss action otherwise.
    pub fn apply(&self, table: &str, ctx: &mut FieldContext) -> Result<ApplyResult, PipelineError> {
        let table = self.table(table)?;
        let (hit, action, params) = match table.lookup(ctx)? {
            Some(entry) => (true, entry.action, entry.params),
            None => {
                let miss = table.miss_action();
                (false, miss.action, miss.params.clone())
            }
        };
        let action_name = self.actions.name(action).to_string();
        debug!(
            "{}: {} runs {}({:x?})",
            table.name(),
            if hit { "hit" } else { "miss" },
            action_name,
            params
        );
        self.actions.dispatch(action, ctx, &params)?;
        Ok(ApplyResult { hit, action, action_name, params })
    }
}
