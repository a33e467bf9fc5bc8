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


//! Tables: a key schema, the entries programmed into the table, and lookup.
//!
//! A lookup keeps the entries whose match values all accept the live values of their key fields,
//! and picks one winner with the table's [`TieBreak`] policy.  Fields are read only when some
//! entry has a value at their position, so trailing wildcard fields need not be declared.

use std::fmt::{self, Display};
use std::sync::Mutex;

use itertools::Itertools;

use thiserror::Error;

use tracing::debug;

use crate::action::ActionId;
use crate::field::{FieldContext, FieldError};
use crate::value::{MatchKind, MatchValue};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("table {table} already has an entry matching {values}")]
    DuplicateMatch { table: String, values: String },

    #[error("table {table} has no entry matching {values}")]
    NotFound { table: String, values: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyField {
    pub name: String,
    pub kind: MatchKind,
    pub width: u32,
}

impl Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: bit<{}> {}", self.name, self.width, self.kind)
    }
}

/// Ordered key fields of a table.  Position `i` of an entry's match values belongs to field `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub fields: Vec<KeyField>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, kind: MatchKind, width: u32) -> Self {
        self.fields.push(KeyField { name: name.into(), kind, width });
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&KeyField> {
        self.fields.get(index)
    }
}

/// How a table picks one entry when several match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreak {
    /// Largest prefix length at key position `field`, the first LPM field of the schema.
    LongestPrefix { field: usize },
    /// Numerically smallest priority.
    LowestPriority,
    /// First stored entry; used by keyless tables.
    FirstMatch,
}

impl TieBreak {
    pub fn for_schema(schema: &TableSchema) -> Self {
        if let Some(field) = schema.fields.iter().position(|f| f.kind == MatchKind::Lpm) {
            TieBreak::LongestPrefix { field }
        } else if schema.is_empty() {
            TieBreak::FirstMatch
        } else {
            TieBreak::LowestPriority
        }
    }

    /// True if `candidate` strictly beats `best`.  Ties keep `best`, so earlier entries win.
    fn prefers(&self, candidate: &Entry, best: &Entry) -> bool {
        match *self {
            TieBreak::LongestPrefix { field } => candidate.prefix_len(field) > best.prefix_len(field),
            TieBreak::LowestPriority => candidate.priority < best.priority,
            TieBreak::FirstMatch => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Match values in schema order.  Schema fields beyond the end are wildcards.
    pub values: Vec<MatchValue>,
    pub action: ActionId,
    pub params: Vec<u128>,
    pub priority: u32,
}

impl Entry {
    pub fn new(values: Vec<MatchValue>, action: ActionId, params: Vec<u128>) -> Self {
        Entry { values, action, params, priority: 0 }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    fn prefix_len(&self, field: usize) -> u32 {
        self.values.get(field).and_then(|v| v.prefix_len()).unwrap_or(0)
    }

    /// `live` caches the field values read so far, by key position.
    fn matches(
        &self,
        schema: &TableSchema,
        ctx: &FieldContext,
        live: &mut [Option<(u128, u32)>],
    ) -> Result<bool, FieldError> {
        for ((v, field), slot) in self.values.iter().zip(&schema.fields).zip(live.iter_mut()) {
            let (value, width) = match *slot {
                Some(read) => read,
                None => *slot.insert(ctx.read(&field.name)?),
            };
            if !v.matches(value, width) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] -> action {}({}) priority {}",
            self.values.iter().join(", "),
            self.action,
            self.params.iter().map(|p| format!("{:#x}", p)).join(", "),
            self.priority
        )
    }
}

/// An action reference together with the parameters it is run with on a miss.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultAction {
    pub action: ActionId,
    pub params: Vec<u128>,
}

pub struct Table {
    name: String,
    schema: TableSchema,
    tie_break: TieBreak,
    actions: Vec<ActionId>,
    default_action: DefaultAction,
    const_default_action: Option<DefaultAction>,
    entries: Mutex<Vec<Entry>>,
}

impl Table {
    /// Creates an empty table.  [`crate::PipelineBuilder`] validates the actions before calling
    /// this.
    pub(crate) fn new(
        name: String,
        schema: TableSchema,
        actions: Vec<ActionId>,
        default_action: DefaultAction,
        const_default_action: Option<DefaultAction>,
    ) -> Self {
        let tie_break = TieBreak::for_schema(&schema);
        Table {
            name,
            schema,
            tie_break,
            actions,
            default_action,
            const_default_action,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// True if `action` may be used by this table's entries.
    pub fn allows(&self, action: ActionId) -> bool {
        self.actions.contains(&action)
    }

    /// The action run on a miss.  A const default action takes precedence.
    pub fn miss_action(&self) -> &DefaultAction {
        self.const_default_action.as_ref().unwrap_or(&self.default_action)
    }

    fn describe(values: &[MatchValue]) -> String {
        format!("[{}]", values.iter().join(", "))
    }

    /// Adds `entry`.  Fails without changing the table if an entry with equal match values
    /// exists.
    pub fn insert(&self, entry: Entry) -> Result<(), TableError> {
        let mut entries = self.entries.lock().unwrap();
        if entries.iter().any(|e| e.values == entry.values) {
            return Err(TableError::DuplicateMatch {
                table: self.name.clone(),
                values: Self::describe(&entry.values),
            });
        }
        debug!("{}: insert {}", self.name, entry);
        entries.push(entry);
        Ok(())
    }

    /// Replaces the action, parameters and priority of the entry whose match values equal
    /// `entry`'s.  Returns false, leaving the table unchanged, if there is no such entry.
    pub fn modify(&self, entry: Entry) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|e| e.values == entry.values) {
            Some(e) => {
                debug!("{}: modify {}", self.name, entry);
                *e = entry;
                true
            }
            None => {
                debug!("{}: modify found no entry matching {}", self.name, Self::describe(&entry.values));
                false
            }
        }
    }

    /// Removes and returns the entry whose match values equal `values`.
    pub fn delete(&self, values: &[MatchValue]) -> Result<Entry, TableError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter().position(|e| e.values == values) {
            Some(index) => {
                let entry = entries.remove(index);
                debug!("{}: delete {}", self.name, entry);
                Ok(entry)
            }
            None => Err(TableError::NotFound {
                table: self.name.clone(),
                values: Self::describe(values),
            }),
        }
    }

    /// Finds the winning entry for the current field values in `ctx`.  Returns a copy, so the
    /// table is unlocked by the time the caller runs the entry's action.
    pub fn lookup(&self, ctx: &FieldContext) -> Result<Option<Entry>, FieldError> {
        let mut live = vec![None; self.schema.fields.len()];
        let entries = self.entries.lock().unwrap();
        let mut best: Option<&Entry> = None;
        for entry in entries.iter() {
            if !entry.matches(&self.schema, ctx, &mut live)? {
                continue;
            }
            best = match best {
                Some(b) if !self.tie_break.prefers(entry, b) => Some(b),
                _ => Some(entry),
            };
        }
        Ok(best.cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the entries in insertion order.
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {}:", self.name)?;
        for field in &self.schema.fields {
            write!(f, "\t{}", field)?;
        }
        write!(f, "\t{} entries", self.len())
    }
}
