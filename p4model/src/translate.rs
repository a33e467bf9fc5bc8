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


//! Conversion of P4Runtime table entries into match-action engine entries.
//!
//! Match fields are consumed in wire order: the `i`th `FieldMatch` supplies the value for the
//! table's `i`th key field.  A field whose payload can't be converted is skipped with a warning
//! and the rest of the entry is still translated.  Failing to resolve the table or the action
//! fails the whole entry.

use match_action::value::width_mask;
use match_action::{ActionId, Entry, KeyField, Lpm, MatchKind, MatchValue, Range, Ternary};

use p4ext::{decode_value, decode_value_or_zero, ValueError};

use proto::p4runtime::{FieldMatch, FieldMatch_oneof_field_match_type, TableEntry};

use thiserror::Error;

use tracing::{debug, warn};

use crate::directory::SymbolDirectory;

/// Fields whose `optional` payload becomes a ternary masked to the value's significant bytes.
const OPTIONAL_TERNARY_FIELDS: [&str; 3] = ["meta.dst_ip_addr", "meta.src_ip_addr", "meta.ip_protocol"];

/// Fields whose `optional` payload becomes a single-point range.
const OPTIONAL_RANGE_FIELDS: [&str; 2] = ["meta.src_l4_port", "meta.dst_l4_port"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("unknown table id {0:#x}")]
    UnknownTable(u32),

    #[error("unknown action id {0:#x}")]
    UnknownAction(u32),

    #[error("table {0} entry has no action")]
    MissingAction(String),

    #[error("action {action} is not allowed in table {table}")]
    ActionNotAllowed { table: String, action: String },

    #[error("action {action} may only be the default action of table {table}")]
    DefaultOnlyAction { table: String, action: String },

    #[error("table {0} is const")]
    ConstTable(String),

    #[error("action {action} has no parameter with id {param_id}")]
    UnknownParam { action: String, param_id: u32 },

    #[error("action {action} parameter {param_id}: {source}")]
    BadParam {
        action: String,
        param_id: u32,
        #[source]
        source: ValueError,
    },

    #[error("invalid priority {0}")]
    InvalidPriority(i32),
}

/// Why one match field was skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldMatchError {
    #[error("no {0} payload")]
    MissingPayload(MatchKind),

    #[error("empty {0}")]
    EmptyList(MatchKind),

    #[error("invalid prefix length {0}")]
    BadPrefixLen(i32),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// A translated table entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertRequest {
    pub table_id: u32,
    pub table: String,
    pub values: Vec<MatchValue>,
    pub action_id: u32,
    pub action: ActionId,
    pub params: Vec<u128>,
    pub priority: u32,
}

impl InsertRequest {
    pub fn entry(&self) -> Entry {
        Entry::new(self.values.clone(), self.action, self.params.clone()).with_priority(self.priority)
    }
}

/// Everything one wire `FieldMatch` can stand for.  Which member is used depends on the match kind
/// of the key field at the same position.
#[derive(Default)]
struct Staged {
    exact: Option<u128>,
    ternary: Option<Ternary>,
    lpm: Option<Lpm>,
    range: Option<Range>,
    ternary_list: Vec<Ternary>,
    range_list: Vec<Range>,
}

/// Mask covering the bytes needed to represent `value`.  Zero needs no bytes, so its mask is
/// zero too.
fn significant_bytes_mask(value: u128) -> u128 {
    let bits = 128 - value.leading_zeros();
    width_mask((bits + 7) / 8 * 8)
}

impl Staged {
    /// `name` is the key field that the match's field id names.  It selects how an `optional`
    /// payload is read.
    fn new(fm: &FieldMatch, name: Option<&str>) -> Result<Staged, FieldMatchError> {
        use FieldMatch_oneof_field_match_type::*;

        let mut staged = Staged::default();
        match &fm.field_match_type {
            Some(exact(e)) => staged.exact = Some(decode_value(e.get_value())?),
            Some(ternary(t)) => {
                let t = Ternary {
                    value: decode_value(t.get_value())?,
                    mask: decode_value(t.get_mask())?,
                };
                staged.ternary = Some(t);
                staged.ternary_list.push(t);
            }
            Some(optional(o)) => {
                let value = decode_value(o.get_value())?;
                match name {
                    Some(name) if OPTIONAL_TERNARY_FIELDS.contains(&name) => {
                        let t = Ternary { value, mask: significant_bytes_mask(value) };
                        staged.ternary = Some(t);
                        staged.ternary_list.push(t);
                    }
                    Some(name) if OPTIONAL_RANGE_FIELDS.contains(&name) => {
                        let r = Range::point(value);
                        staged.range = Some(r);
                        staged.range_list.push(r);
                    }
                    _ => debug!("ignoring optional match on field {:?}", name),
                }
            }
            Some(lpm(l)) => {
                let prefix_len = l.get_prefix_len();
                if prefix_len < 0 {
                    return Err(FieldMatchError::BadPrefixLen(prefix_len));
                }
                staged.lpm = Some(Lpm {
                    value: decode_value(l.get_value())?,
                    prefix_len: prefix_len as u32,
                });
            }
            Some(range(r)) => {
                let r = Range {
                    low: decode_value(r.get_low())?,
                    high: decode_value(r.get_high())?,
                };
                staged.range = Some(r);
                staged.range_list.push(r);
            }
            Some(other(_)) | None => (),
        }
        Ok(staged)
    }

    fn select(self, kind: MatchKind) -> Result<MatchValue, FieldMatchError> {
        let missing = || FieldMatchError::MissingPayload(kind);
        match kind {
            MatchKind::Exact => self.exact.map(MatchValue::Exact).ok_or_else(missing),
            MatchKind::Ternary => self.ternary.map(MatchValue::Ternary).ok_or_else(missing),
            MatchKind::Lpm => self.lpm.map(MatchValue::Lpm).ok_or_else(missing),
            MatchKind::Range => self.range.map(MatchValue::Range).ok_or_else(missing),
            MatchKind::TernaryList if self.ternary_list.is_empty() => Err(FieldMatchError::EmptyList(kind)),
            MatchKind::TernaryList => Ok(MatchValue::TernaryList(self.ternary_list)),
            MatchKind::RangeList if self.range_list.is_empty() => Err(FieldMatchError::EmptyList(kind)),
            MatchKind::RangeList => Ok(MatchValue::RangeList(self.range_list)),
        }
    }
}

fn translate_field(fm: &FieldMatch, key: &KeyField, named: Option<&KeyField>) -> Result<MatchValue, FieldMatchError> {
    Staged::new(fm, named.map(|k| k.name.as_str()))?.select(key.kind)
}

/// Translates the match fields of `entry`, which belongs to table `table`, skipping the ones that
/// don't convert.
fn translate_matches(entry: &TableEntry, table: &str, schema: &[KeyField]) -> Vec<MatchValue> {
    let mut values = Vec::with_capacity(schema.len());
    for (index, fm) in entry.get_field_match().iter().enumerate() {
        let key = match schema.get(index) {
            Some(key) => key,
            None => {
                warn!(
                    "{}: skipping match field {} (field id {}), the table has only {} key fields",
                    table,
                    index,
                    fm.field_id,
                    schema.len()
                );
                continue;
            }
        };
        let named = (fm.field_id as usize).checked_sub(1).and_then(|i| schema.get(i));
        match translate_field(fm, key, named) {
            Ok(value) => {
                debug!("{}: {}: {} {}", table, key.name, key.kind, value);
                values.push(value)
            }
            Err(e) => warn!(
                "{}: skipping match field {} (field id {}) for {}: {}",
                table, index, fm.field_id, key.name, e
            ),
        }
    }
    values
}

/// The table and match values of a wire entry, which is all that a delete needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryKey {
    pub table_id: u32,
    pub table: String,
    pub values: Vec<MatchValue>,
}

/// Translates the key of a wire entry that is about to be written.  Const tables can't be
/// written at all.
pub fn translate_key(entry: &TableEntry, directory: &SymbolDirectory) -> Result<EntryKey, TranslateError> {
    let table_id = entry.table_id;
    let table = directory
        .table(table_id)
        .ok_or(TranslateError::UnknownTable(table_id))?;
    if directory.rules(table_id).map_or(false, |r| r.is_const) {
        return Err(TranslateError::ConstTable(table.name().into()));
    }
    Ok(EntryKey {
        table_id,
        table: table.name().into(),
        values: translate_matches(entry, table.name(), &table.schema().fields),
    })
}

/// Translates a wire entry for insertion or modification.
pub fn translate(entry: &TableEntry, directory: &SymbolDirectory) -> Result<InsertRequest, TranslateError> {
    let EntryKey { table_id, table, values } = translate_key(entry, directory)?;

    if !entry.get_action().has_action() {
        return Err(TranslateError::MissingAction(table));
    }
    let wire_action = entry.get_action().get_action();
    let action_id = wire_action.action_id;
    let action = directory
        .action(action_id)
        .ok_or(TranslateError::UnknownAction(action_id))?;
    let actions = directory.pipeline().actions();
    let action_name = actions.name(action).to_string();
    let allowed = directory
        .table(table_id)
        .map_or(false, |t| t.allows(action));
    if !allowed {
        return Err(TranslateError::ActionNotAllowed { table, action: action_name });
    }
    if directory
        .rules(table_id)
        .map_or(false, |r| r.default_only.contains(&action_id))
    {
        return Err(TranslateError::DefaultOnlyAction { table, action: action_name });
    }

    // Parameter ids count from 1 in declaration order.  Missing parameters are zero.
    let mut params = vec![0u128; actions.arity(action)];
    for param in wire_action.get_params() {
        let slot = (param.param_id as usize)
            .checked_sub(1)
            .filter(|&i| i < params.len())
            .ok_or_else(|| TranslateError::UnknownParam {
                action: action_name.clone(),
                param_id: param.param_id,
            })?;
        params[slot] = decode_value_or_zero(param.get_value()).map_err(|source| TranslateError::BadParam {
            action: action_name.clone(),
            param_id: param.param_id,
            source,
        })?;
    }

    let priority = entry.priority;
    if priority < 0 {
        return Err(TranslateError::InvalidPriority(priority));
    }

    debug!("{}: action {}({:x?}) priority {}", table, action_name, params, priority);
    Ok(InsertRequest {
        table_id,
        table,
        values,
        action_id,
        action,
        params,
        priority: priority as u32,
    })
}
