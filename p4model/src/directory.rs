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


//! Id to name mapping for the symbols of the running pipeline.
//!
//! Controllers refer to tables and actions by the numeric ids in the P4Info they pushed.  The
//! directory turns those into the short names under which the [`Pipeline`] registered its tables
//! and actions.  It also keeps what the P4Info says about writing each table's entries.

use match_action::{ActionId, MatchKind, Pipeline, Table};

use p4ext::{MatchType, Switch};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

/// Write restrictions that the P4Info places on one table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableRules {
    /// Action ids that may only be the table's default action.
    pub default_only: HashSet<u32>,
    pub max_entries: Option<u64>,
    pub is_const: bool,
}

impl From<&p4ext::Table> for TableRules {
    fn from(t: &p4ext::Table) -> Self {
        TableRules {
            default_only: t
                .actions
                .iter()
                .filter(|a| !a.may_be_entry)
                .map(|a| a.action.preamble.id)
                .collect(),
            max_entries: t.max_entries,
            is_const: t.is_const_table,
        }
    }
}

/// Whether a P4Info match type describes a pipeline key of kind `kind`.  An `optional` match
/// is carried as a ternary or a range.
fn compatible(match_type: &MatchType, kind: MatchKind) -> bool {
    match (match_type, kind) {
        (MatchType::Exact, MatchKind::Exact)
        | (MatchType::Lpm, MatchKind::Lpm)
        | (MatchType::Ternary, MatchKind::Ternary)
        | (MatchType::Range, MatchKind::Range) => true,
        (MatchType::Optional, k) => k != MatchKind::Exact && k != MatchKind::Lpm,
        (MatchType::Other(other), k) => *other == k.to_string(),
        _ => false,
    }
}

pub struct SymbolDirectory {
    tables: HashMap<u32, String>,
    rules: HashMap<u32, TableRules>,
    actions: HashMap<u32, String>,
    counters: HashMap<u32, String>,
    direct_counters: HashMap<u32, String>,
    pipeline: Arc<Pipeline>,
}

impl SymbolDirectory {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        SymbolDirectory {
            tables: HashMap::new(),
            rules: HashMap::new(),
            actions: HashMap::new(),
            counters: HashMap::new(),
            direct_counters: HashMap::new(),
            pipeline,
        }
    }

    /// Adds the symbols of `switch`.  Ids seen in an earlier load keep their entries unless
    /// `switch` renames them; nothing is ever removed.
    pub fn load(&mut self, switch: &Switch) {
        let tables = switch.table_names();
        for (id, name) in &tables {
            if self.pipeline.table(name).is_err() {
                warn!("table {} ({:#x}) is not part of this device's pipeline", name, id);
            }
        }
        for t in &switch.tables {
            if let Some(table) = tables.get(&t.preamble.id).and_then(|name| self.pipeline.table(name).ok()) {
                self.check_match_fields(t, table);
            }
            self.rules.insert(t.preamble.id, t.into());
        }
        let actions = switch.action_names();
        for (id, name) in &actions {
            if self.pipeline.actions().resolve(name).is_err() {
                warn!("action {} ({:#x}) is not part of this device's pipeline", name, id);
            }
        }
        debug!(
            "loaded {} tables, {} actions, {} counters, {} direct counters",
            tables.len(),
            actions.len(),
            switch.counters.len(),
            switch.direct_counters.len()
        );
        self.tables.extend(tables);
        self.actions.extend(actions);
        self.counters.extend(switch.counter_names());
        self.direct_counters.extend(switch.direct_counter_names());
    }

    /// Warns about P4Info match fields that don't line up with the pipeline table's key.
    fn check_match_fields(&self, t: &p4ext::Table, table: &Table) {
        let keys = &table.schema().fields;
        for mf in &t.match_fields {
            match (mf.preamble.id as usize).checked_sub(1).and_then(|i| keys.get(i)) {
                Some(key) if compatible(&mf.match_type, key.kind) => (),
                Some(key) => warn!(
                    "{}: match field {} is {}-match but key field {} is {}",
                    table.name(),
                    mf.preamble.name,
                    mf.match_type,
                    key.name,
                    key.kind
                ),
                None => warn!(
                    "{}: match field {} (id {}) has no key field",
                    table.name(),
                    mf.preamble.name,
                    mf.preamble.id
                ),
            }
        }
    }

    /// What the last P4Info that named table id `id` says about writing it.
    pub fn rules(&self, id: u32) -> Option<&TableRules> {
        self.rules.get(&id)
    }

    pub fn table_name(&self, id: u32) -> Option<&str> {
        self.tables.get(&id).map(|s| s.as_str())
    }

    pub fn action_name(&self, id: u32) -> Option<&str> {
        self.actions.get(&id).map(|s| s.as_str())
    }

    pub fn counter_name(&self, id: u32) -> Option<&str> {
        self.counters.get(&id).map(|s| s.as_str())
    }

    pub fn direct_counter_name(&self, id: u32) -> Option<&str> {
        self.direct_counters.get(&id).map(|s| s.as_str())
    }

    /// The pipeline table that table id `id` names, if any.
    pub fn table(&self, id: u32) -> Option<&Arc<Table>> {
        self.table_name(id).and_then(|name| self.pipeline.table(name).ok())
    }

    /// The registered action that action id `id` names, if any.
    pub fn action(&self, id: u32) -> Option<ActionId> {
        self.action_name(id)
            .and_then(|name| self.pipeline.actions().resolve(name).ok())
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_action::{FieldContext, FieldError, MatchKind, TableDef};
    use proto::p4info::{self, P4Info};
    use tracing_test::traced_test;

    fn nop(_: &mut FieldContext, _: &[u128]) -> Result<(), FieldError> {
        Ok(())
    }

    fn pipeline() -> Arc<Pipeline> {
        let mut builder = Pipeline::builder();
        builder.action("outbound.acl.permit", &[], nop).unwrap();
        builder.table(
            TableDef::new("outbound.acl.stage1")
                .key("meta.stage1_dash_acl_group_id", MatchKind::Exact, 16)
                .action("outbound.acl.permit"),
        );
        Arc::new(builder.build().unwrap())
    }

    fn p4info(tables: &[(u32, &str)], actions: &[(u32, &str)]) -> P4Info {
        let mut p4i = P4Info::new();
        for (id, name) in tables {
            let mut t = p4info::Table::new();
            t.mut_preamble().set_id(*id);
            t.mut_preamble().set_name((*name).into());
            p4i.mut_tables().push(t);
        }
        for (id, name) in actions {
            let mut a = p4info::Action::new();
            a.mut_preamble().set_id(*id);
            a.mut_preamble().set_name((*name).into());
            p4i.mut_actions().push(a);
        }
        p4i
    }

    #[test]
    #[traced_test]
    fn load_is_additive() {
        let mut dir = SymbolDirectory::new(pipeline());
        let first = p4info(
            &[(1, "dash_ingress.outbound.acl.stage1")],
            &[(10, "dash_ingress.outbound.acl.permit")],
        );
        dir.load(&(&first).into());
        assert_eq!(dir.table_name(1), Some("outbound.acl.stage1"));
        assert!(dir.table(1).is_some());
        assert_eq!(dir.action(10), dir.pipeline().actions().resolve("outbound.acl.permit").ok());

        let second = p4info(&[(2, "dash_ingress.inbound.acl.stage1")], &[]);
        dir.load(&(&second).into());
        assert_eq!(dir.table_name(1), Some("outbound.acl.stage1"));
        assert_eq!(dir.table_name(2), Some("inbound.acl.stage1"));
        assert!(dir.table(2).is_none());
        assert!(logs_contain("inbound.acl.stage1 (0x2) is not part of this device's pipeline"));

        assert_eq!(dir.table_name(3), None);
        assert_eq!(dir.action(11), None);
    }

    #[test]
    #[traced_test]
    fn table_rules() {
        let mut dir = SymbolDirectory::new(pipeline());
        let mut p4i = p4info(
            &[(1, "dash_ingress.outbound.acl.stage1")],
            &[(10, "dash_ingress.outbound.acl.permit")],
        );
        let stage1 = &mut p4i.mut_tables()[0];
        let mut group = p4info::MatchField::new();
        group.set_id(1);
        group.set_name("meta.stage1_dash_acl_group_id".into());
        group.set_match_type(p4info::MatchField_MatchType::LPM);
        stage1.mut_match_fields().push(group);
        let mut permit = p4info::ActionRef::new();
        permit.set_id(10);
        permit.set_scope(p4info::ActionRef_Scope::DEFAULT_ONLY);
        stage1.mut_action_refs().push(permit);
        stage1.set_size(16);

        dir.load(&(&p4i).into());
        let rules = dir.rules(1).unwrap();
        assert!(rules.default_only.contains(&10));
        assert_eq!(rules.max_entries, Some(16));
        assert!(!rules.is_const);
        assert!(dir.rules(2).is_none());
        assert!(logs_contain(
            "match field meta.stage1_dash_acl_group_id is LPM-match but key field meta.stage1_dash_acl_group_id is exact"
        ));
    }

    #[test]
    fn optional_matches_ternary_and_range_keys() {
        assert!(compatible(&MatchType::Optional, MatchKind::TernaryList));
        assert!(compatible(&MatchType::Optional, MatchKind::Range));
        assert!(!compatible(&MatchType::Optional, MatchKind::Exact));
        assert!(compatible(&MatchType::Other("range_list".into()), MatchKind::RangeList));
        assert!(!compatible(&MatchType::Ternary, MatchKind::TernaryList));
    }
}
