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

//! Plain-Rust view of P4Info pipeline metadata, plus the codec for the
//! big-endian byte strings that P4Runtime uses for match and parameter values.
//!
//! [`Switch`] is built once from the `P4Info` inside a pushed
//! `ForwardingPipelineConfig` and answers the only questions the device model
//! asks of it: which numeric id carries which symbolic name.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use itertools::Itertools;

use proto::p4info;
use proto::p4runtime::{
    Entity, FieldMatch, FieldMatch_Exact, FieldMatch_LPM, FieldMatch_Optional, FieldMatch_Range,
    FieldMatch_Ternary, TableAction, TableEntry, Update, Update_Type,
};

use protobuf::RepeatedField;

use std::collections::HashMap;
use std::fmt::{self, Display};

use thiserror::Error;

/// Number of trailing dot-separated components kept by [`short_name`].
pub const NAME_COMPONENTS: usize = 3;

/// Shortens a fully qualified P4 name, such as `dash_ingress.outbound.acl.stage1`, to its last
/// [`NAME_COMPONENTS`] components (`outbound.acl.stage1`).  Names with fewer components are
/// returned unchanged.
pub fn short_name(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split('.').collect();
    if parts.len() >= NAME_COMPONENTS {
        parts[parts.len() - NAME_COMPONENTS..].join(".")
    } else {
        full_name.into()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preamble {
    pub id: u32,
    pub name: String,
    pub alias: String,
    pub annotations: Vec<String>,
}

impl From<&p4info::Preamble> for Preamble {
    fn from(p: &p4info::Preamble) -> Self {
        Preamble {
            id: p.id,
            name: p.name.clone(),
            alias: p.alias.clone(),
            annotations: p.get_annotations().to_vec(),
        }
    }
}

impl Display for Preamble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id {:#x})", self.name, self.id)?;
        // Sort annotations by name to ensure predictable output.
        for a in self.annotations.iter().sorted() {
            write!(f, " {}", a)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchType {
    Unspecified,
    Exact,
    Lpm,
    Ternary,
    Range,
    Optional,
    /// Architecture-specific match kinds, e.g. `list` and `range_list`.
    Other(String),
}

impl Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MatchType::*;
        let s = match self {
            Unspecified => "unspecified",
            Exact => "exact",
            Lpm => "LPM",
            Ternary => "ternary",
            Range => "range",
            Optional => "optional",
            Other(s) => s,
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug)]
pub struct MatchField {
    // The protobuf representation of MatchField doesn't include a
    // Preamble but it includes everything in the preamble except
    // 'alias'.  It seems more uniform to just use Preamble here.
    pub preamble: Preamble,
    pub bit_width: i32,
    pub match_type: MatchType,
}

impl From<&p4info::MatchField> for MatchField {
    fn from(mf: &p4info::MatchField) -> Self {
        use p4info::MatchField_MatchType::*;
        MatchField {
            preamble: Preamble {
                id: mf.id,
                name: mf.name.clone(),
                alias: mf.name.clone(),
                annotations: mf.get_annotations().to_vec(),
            },
            bit_width: mf.bitwidth,
            match_type: if mf.has_other_match_type() {
                MatchType::Other(mf.get_other_match_type().into())
            } else {
                match mf.get_match_type() {
                    EXACT => MatchType::Exact,
                    LPM => MatchType::Lpm,
                    TERNARY => MatchType::Ternary,
                    RANGE => MatchType::Range,
                    OPTIONAL => MatchType::Optional,
                    UNSPECIFIED => MatchType::Unspecified,
                }
            },
        }
    }
}

impl Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field {}: bit<{}> {}-match", self.preamble.name, self.bit_width, self.match_type)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Param {
    pub preamble: Preamble,
    pub bit_width: i32,
}

impl From<&p4info::Action_Param> for Param {
    fn from(ap: &p4info::Action_Param) -> Self {
        Param {
            preamble: Preamble {
                id: ap.id,
                name: ap.name.clone(),
                alias: ap.name.clone(),
                annotations: ap.get_annotations().to_vec(),
            },
            bit_width: ap.bitwidth,
        }
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: bit<{}>", self.preamble.name, self.bit_width)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Action {
    pub preamble: Preamble,
    pub params: Vec<Param>,
}

impl From<&p4info::Action> for Action {
    fn from(a: &p4info::Action) -> Self {
        Action {
            preamble: a.get_preamble().into(),
            params: a.get_params().iter().map(|x| x.into()).collect(),
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action {}(", self.preamble.name)?;
        for (p_index, p) in self.params.iter().enumerate() {
            if p_index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ")")
    }
}

#[derive(Clone, Debug, Default)]
pub struct ActionRef {
    pub action: Action,
    pub may_be_entry: bool, // False for DEFAULT_ONLY actions.
}

impl ActionRef {
    /// Resolves `ar` against the P4Info's actions.  Returns `None` for a reference to an action
    /// that the P4Info doesn't define.
    fn new_from_proto(ar: &p4info::ActionRef, actions: &HashMap<u32, Action>) -> Option<Self> {
        Some(ActionRef {
            action: actions.get(&ar.id)?.clone(),
            may_be_entry: ar.scope != p4info::ActionRef_Scope::DEFAULT_ONLY,
        })
    }
}

impl Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.may_be_entry {
            write!(f, "default-only ")?;
        }
        write!(f, "{}", self.action)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Table {
    pub preamble: Preamble,
    pub match_fields: Vec<MatchField>,
    pub actions: Vec<ActionRef>,
    pub max_entries: Option<u64>,
    pub is_const_table: bool,
}

impl Table {
    pub fn new_from_proto(t: &p4info::Table, actions: &HashMap<u32, Action>) -> Self {
        Table {
            preamble: t.get_preamble().into(),
            match_fields: t.get_match_fields().iter().map(|x| x.into()).collect(),
            actions: t
                .get_action_refs()
                .iter()
                .filter_map(|x| ActionRef::new_from_proto(x, actions))
                .collect(),
            max_entries: if t.size > 0 {
                Some(t.size as u64)
            } else {
                None
            },
            is_const_table: t.is_const_table,
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {}:", self.preamble.name)?;
        for mf in &self.match_fields {
            write!(f, "\t{}", mf)?;
        }
        for ar in &self.actions {
            write!(f, "\t{}", ar)?;
        }
        if let Some(max_entries) = self.max_entries {
            write!(f, "\tsize: {}", max_entries)?;
        }
        if self.is_const_table {
            write!(f, "\tconst table")?;
        }
        Ok(())
    }
}

/// A counter or direct counter.  Only the identity matters to the device model.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    pub preamble: Preamble,
}

/// Everything the device model learns from one P4Info.
#[derive(Clone, Debug, Default)]
pub struct Switch {
    pub tables: Vec<Table>,
    pub actions: Vec<Action>,
    pub counters: Vec<Counter>,
    pub direct_counters: Vec<Counter>,
}

impl From<&p4info::P4Info> for Switch {
    fn from(p4i: &p4info::P4Info) -> Self {
        let actions: HashMap<u32, Action> = p4i
            .get_actions()
            .iter()
            .map(|x| (x.get_preamble().id, x.into()))
            .collect();
        let tables: Vec<Table> = p4i
            .get_tables()
            .iter()
            .map(|x| Table::new_from_proto(x, &actions))
            .collect();
        let counters = p4i
            .get_counters()
            .iter()
            .map(|c| Counter { preamble: c.get_preamble().into() })
            .collect();
        let direct_counters = p4i
            .get_direct_counters()
            .iter()
            .map(|c| Counter { preamble: c.get_preamble().into() })
            .collect();
        Switch {
            tables,
            actions: actions.into_values().sorted_by_key(|a| a.preamble.id).collect(),
            counters,
            direct_counters,
        }
    }
}

fn short_names<'a, I>(preambles: I) -> HashMap<u32, String>
where
    I: IntoIterator<Item = &'a Preamble>,
{
    preambles
        .into_iter()
        .filter(|p| !p.name.is_empty())
        .map(|p| (p.id, short_name(&p.name)))
        .collect()
}

impl Switch {
    /// Maps table ids to short table names.
    pub fn table_names(&self) -> HashMap<u32, String> {
        short_names(self.tables.iter().map(|t| &t.preamble))
    }

    /// Maps action ids to short action names.
    pub fn action_names(&self) -> HashMap<u32, String> {
        short_names(self.actions.iter().map(|a| &a.preamble))
    }

    pub fn counter_names(&self) -> HashMap<u32, String> {
        short_names(self.counters.iter().map(|c| &c.preamble))
    }

    pub fn direct_counter_names(&self) -> HashMap<u32, String> {
        short_names(self.direct_counters.iter().map(|c| &c.preamble))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum P4Error {
    #[error("no table named {0}")]
    UnknownTable(String),

    #[error("table {table} has no action named {action}")]
    UnknownAction { table: String, action: String },

    #[error("table {table} has no match field named {field}")]
    UnknownField { table: String, field: String },

    #[error("action {action} has no parameter named {param}")]
    UnknownParam { action: String, param: String },
}

/// A match value for one key field, as a controller would supply it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Exact(u128),
    Ternary { value: u128, mask: u128 },
    Lpm { value: u128, prefix_len: i32 },
    Range { low: u128, high: u128 },
    Optional(u128),
}

fn names_match(full_name: &str, wanted: &str) -> bool {
    full_name == wanted || short_name(full_name) == wanted
}

impl MatchField {
    /// Builds the P4Runtime `FieldMatch` for `value`, encoded to this field's width.
    pub fn to_proto_runtime(&self, value: &FieldValue) -> FieldMatch {
        let width = self.bit_width.max(0) as u32;
        let mut fm = FieldMatch::new();
        fm.set_field_id(self.preamble.id);
        match *value {
            FieldValue::Exact(v) => {
                let mut exact = FieldMatch_Exact::new();
                exact.set_value(encode_value(v, width));
                fm.set_exact(exact);
            }
            FieldValue::Ternary { value, mask } => {
                let mut ternary = FieldMatch_Ternary::new();
                ternary.set_value(encode_value(value, width));
                ternary.set_mask(encode_value(mask, width));
                fm.set_ternary(ternary);
            }
            FieldValue::Lpm { value, prefix_len } => {
                let mut lpm = FieldMatch_LPM::new();
                lpm.set_value(encode_value(value, width));
                lpm.set_prefix_len(prefix_len);
                fm.set_lpm(lpm);
            }
            FieldValue::Range { low, high } => {
                let mut range = FieldMatch_Range::new();
                range.set_low(encode_value(low, width));
                range.set_high(encode_value(high, width));
                fm.set_range(range);
            }
            FieldValue::Optional(v) => {
                let mut optional = FieldMatch_Optional::new();
                optional.set_value(encode_value(v, width));
                fm.set_optional(optional);
            }
        }
        fm
    }
}

impl Action {
    /// Builds the P4Runtime `Action` with parameters taken by name from `params_values`.
    /// Parameters absent from `params_values` are left out, which the device reads as zero.
    pub fn to_proto_runtime(
        &self,
        params_values: &HashMap<String, u128>,
    ) -> Result<proto::p4runtime::Action, P4Error> {
        if let Some(unknown) = params_values
            .keys()
            .find(|name| !self.params.iter().any(|p| &p.preamble.name == *name))
        {
            return Err(P4Error::UnknownParam {
                action: self.preamble.name.clone(),
                param: unknown.clone(),
            });
        }

        let mut action = proto::p4runtime::Action::new();
        action.set_action_id(self.preamble.id);
        for p in &self.params {
            if let Some(v) = params_values.get(&p.preamble.name) {
                let mut param = proto::p4runtime::Action_Param::new();
                param.set_param_id(p.preamble.id);
                param.set_value(encode_value(*v, p.bit_width.max(0) as u32));
                action.mut_params().push(param);
            }
        }
        Ok(action)
    }
}

impl Switch {
    /// Finds a table by its full or short name.
    pub fn table(&self, name: &str) -> Result<&Table, P4Error> {
        self.tables
            .iter()
            .find(|t| names_match(&t.preamble.name, name))
            .ok_or_else(|| P4Error::UnknownTable(name.into()))
    }

    /// Builds a table entry for `table_name` that runs `action_name`.  Match fields and action
    /// parameters are given by name; match fields are emitted in the order given.
    pub fn build_table_entry(
        &self,
        table_name: &str,
        action_name: &str,
        params_values: &HashMap<String, u128>,
        match_fields: &[(&str, FieldValue)],
        priority: i32,
    ) -> Result<TableEntry, P4Error> {
        let table = self.table(table_name)?;
        let action = table
            .actions
            .iter()
            .map(|ar| &ar.action)
            .find(|a| names_match(&a.preamble.name, action_name))
            .ok_or_else(|| P4Error::UnknownAction {
                table: table.preamble.name.clone(),
                action: action_name.into(),
            })?;

        let mut field_matches = RepeatedField::<FieldMatch>::new();
        for (name, value) in match_fields {
            let field = table
                .match_fields
                .iter()
                .find(|mf| mf.preamble.name == *name)
                .ok_or_else(|| P4Error::UnknownField {
                    table: table.preamble.name.clone(),
                    field: (*name).into(),
                })?;
            field_matches.push(field.to_proto_runtime(value));
        }

        let mut table_action = TableAction::new();
        table_action.set_action(action.to_proto_runtime(params_values)?);

        let mut table_entry = TableEntry::new();
        table_entry.set_table_id(table.preamble.id);
        table_entry.set_field_match(field_matches);
        table_entry.set_action(table_action);
        table_entry.set_priority(priority);
        Ok(table_entry)
    }
}

/// Wraps `table_entry` in an update of the given type.
pub fn build_table_entry_update(update_type: Update_Type, table_entry: TableEntry) -> Update {
    let mut entity = Entity::new();
    entity.set_table_entry(table_entry);

    let mut update = Update::new();
    update.set_field_type(update_type);
    update.set_entity(entity);
    update
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("empty value")]
    Empty,

    #[error("value has {0} significant bytes but at most 16 are supported")]
    TooWide(usize),
}

/// Decodes a P4Runtime byte string, which is a big-endian unsigned integer.  Leading zero bytes
/// are not significant.
pub fn decode_value(bytes: &[u8]) -> Result<u128, ValueError> {
    if bytes.is_empty() {
        return Err(ValueError::Empty);
    }
    let significant = match bytes.iter().position(|&b| b != 0) {
        Some(start) => &bytes[start..],
        None => return Ok(0),
    };
    if significant.len() > 16 {
        return Err(ValueError::TooWide(significant.len()));
    }
    let mut buf = [0u8; 16];
    buf[16 - significant.len()..].copy_from_slice(significant);
    Ok(BigEndian::read_u128(&buf))
}

/// Like [`decode_value`], except that an empty byte string decodes as zero.  Action parameter
/// values use this.
pub fn decode_value_or_zero(bytes: &[u8]) -> Result<u128, ValueError> {
    if bytes.is_empty() {
        Ok(0)
    } else {
        decode_value(bytes)
    }
}

/// Encodes `value` as a P4Runtime byte string for a `bit_width`-bit field.
///
/// P4Runtime expects a byte-vector in big-endian order whose length is `(bit_width + 7) / 8`
/// bytes.  Bits of `value` beyond that length are dropped.
pub fn encode_value(value: u128, bit_width: u32) -> Vec<u8> {
    let mut enc_val: Vec<u8> = Vec::with_capacity(16);
    enc_val.write_u128::<BigEndian>(value).unwrap();

    let num_bytes = ((bit_width.min(128) + 7) / 8) as usize;
    enc_val[16 - num_bytes..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto::p4info::{Action_Param, MatchField_MatchType, P4Info};

    #[test]
    fn short_names_keep_three_components() {
        assert_eq!(short_name("dash_ingress.outbound.acl.stage1"), "outbound.acl.stage1");
        assert_eq!(short_name("outbound.acl.stage1"), "outbound.acl.stage1");
        assert_eq!(short_name("acl.permit"), "acl.permit");
        assert_eq!(short_name("NoAction"), "NoAction");
    }

    #[test]
    fn decode() {
        assert_eq!(decode_value(&[0xc0, 0xa8, 0x00, 0x01]), Ok(0xc0a8_0001));
        assert_eq!(decode_value(&[0, 0, 0x08, 0x00]), Ok(0x0800));
        assert_eq!(decode_value(&[0; 20]), Ok(0));
        assert_eq!(decode_value(&[]), Err(ValueError::Empty));
        assert_eq!(decode_value(&[1; 17]), Err(ValueError::TooWide(17)));
        assert_eq!(decode_value_or_zero(&[]), Ok(0));
    }

    #[test]
    fn encode() {
        assert_eq!(encode_value(0x0800, 16), vec![0x08, 0x00]);
        assert_eq!(encode_value(1, 1), vec![1]);
        assert_eq!(encode_value(0x0a01_0203, 32), vec![10, 1, 2, 3]);
        assert_eq!(encode_value(0x1ff, 9), vec![1, 0xff]);
        assert_eq!(decode_value(&encode_value(u128::MAX, 128)), Ok(u128::MAX));
    }

    fn preamble(id: u32, name: &str) -> p4info::Preamble {
        p4info::Preamble { id, name: name.into(), ..Default::default() }
    }

    #[test]
    fn switch_from_p4info() {
        let mut permit = p4info::Action::new();
        permit.set_preamble(preamble(0x0100_0001, "dash_ingress.outbound.acl.permit"));
        let mut set_port = p4info::Action::new();
        set_port.set_preamble(preamble(0x0100_0002, "set_port"));
        set_port.mut_params().push(Action_Param { id: 1, name: "port".into(), bitwidth: 9, ..Default::default() });

        let mut group = p4info::MatchField::new();
        group.set_id(1);
        group.set_name("meta.stage1_dash_acl_group_id".into());
        group.set_bitwidth(16);
        group.set_match_type(MatchField_MatchType::EXACT);
        let mut dip = p4info::MatchField::new();
        dip.set_id(2);
        dip.set_name("meta.dst_ip_addr".into());
        dip.set_bitwidth(128);
        dip.set_other_match_type("list".into());

        let mut table = p4info::Table::new();
        table.set_preamble(preamble(0x0200_0001, "dash_ingress.outbound.acl.stage1"));
        table.mut_match_fields().push(group);
        table.mut_match_fields().push(dip);
        let mut ar = p4info::ActionRef::new();
        ar.set_id(0x0100_0001);
        table.mut_action_refs().push(ar);
        let mut dangling = p4info::ActionRef::new();
        dangling.set_id(0x0100_00ff);
        table.mut_action_refs().push(dangling);

        let mut counter = p4info::DirectCounter::new();
        counter.set_preamble(preamble(0x1300_0001, "dash_ingress.outbound.acl.stage1_counter"));

        let mut p4i = P4Info::new();
        p4i.mut_actions().push(permit);
        p4i.mut_actions().push(set_port);
        p4i.mut_tables().push(table);
        p4i.mut_direct_counters().push(counter);

        let switch: Switch = (&p4i).into();
        assert_eq!(switch.tables.len(), 1);
        assert_eq!(switch.tables[0].actions.len(), 1);
        assert_eq!(switch.tables[0].match_fields[0].match_type, MatchType::Exact);
        assert_eq!(switch.tables[0].match_fields[1].match_type, MatchType::Other("list".into()));
        assert_eq!(switch.actions[1].params[0].bit_width, 9);

        assert_eq!(switch.table_names()[&0x0200_0001], "outbound.acl.stage1");
        assert_eq!(switch.action_names()[&0x0100_0001], "outbound.acl.permit");
        assert_eq!(switch.action_names()[&0x0100_0002], "set_port");
        assert_eq!(switch.direct_counter_names()[&0x1300_0001], "outbound.acl.stage1_counter");
        assert!(switch.counter_names().is_empty());

        assert_eq!(
            format!("{}", switch.tables[0]),
            "table dash_ingress.outbound.acl.stage1:\
             \tfield meta.stage1_dash_acl_group_id: bit<16> exact-match\
             \tfield meta.dst_ip_addr: bit<128> list-match\
             \taction dash_ingress.outbound.acl.permit()"
        );
    }

    #[test]
    fn table_restrictions() {
        let mut drop_action = p4info::Action::new();
        drop_action.set_preamble(preamble(0x0100_0022, "dash_ingress.outbound.outbound_routing_stage.drop"));
        let actions: HashMap<u32, Action> = std::iter::once((0x0100_0022, Action::from(&drop_action))).collect();

        let mut vni = p4info::MatchField::new();
        vni.set_id(1);
        vni.set_name("meta.vni".into());
        vni.set_bitwidth(24);
        vni.set_match_type(MatchField_MatchType::OPTIONAL);

        let mut t = p4info::Table::new();
        t.set_preamble(preamble(0x0200_0020, "dash_ingress.outbound.outbound_routing_stage.routing"));
        t.mut_match_fields().push(vni);
        let mut ar = p4info::ActionRef::new();
        ar.set_id(0x0100_0022);
        ar.set_scope(p4info::ActionRef_Scope::DEFAULT_ONLY);
        t.mut_action_refs().push(ar);
        t.set_size(8);
        t.set_is_const_table(true);

        let table = Table::new_from_proto(&t, &actions);
        assert!(!table.actions[0].may_be_entry);
        assert_eq!(table.match_fields[0].match_type, MatchType::Optional);
        assert_eq!(table.max_entries, Some(8));
        assert!(table.is_const_table);
        assert_eq!(
            format!("{}", table),
            "table dash_ingress.outbound.outbound_routing_stage.routing:\
             \tfield meta.vni: bit<24> optional-match\
             \tdefault-only action dash_ingress.outbound.outbound_routing_stage.drop()\
             \tsize: 8\
             \tconst table"
        );
    }
}
