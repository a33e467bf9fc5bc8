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


//! Example DASH pipeline: three ACL stages in each direction and outbound routing.

use anyhow::{Context, Result};

use match_action::{ApplyResult, FieldContext, FieldError, MatchKind, Pipeline, TableDef};

use proto::p4info::{self, MatchField_MatchType, P4Info};

use std::fmt::{self, Display};

use tracing::info;

pub const ROUTING_TABLE: &str = "outbound.outbound_routing_stage.routing";

/// Prefix that P4Info names carry in front of the pipeline's short names.
const CONTROL: &str = "dash_ingress";

const ACL_ACTIONS: [&str; 4] = ["permit", "permit_and_continue", "deny", "deny_and_continue"];

const ROUTING_ACTIONS: [(&str, &[&str]); 3] = [("route_vnet", &["dst_vnet_id"]), ("route_direct", &[]), ("drop", &[])];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "inbound"),
            Direction::Outbound => write!(f, "outbound"),
        }
    }
}

const DIRECTIONS: [Direction; 2] = [Direction::Inbound, Direction::Outbound];

pub fn acl_table(direction: Direction, stage: u32) -> String {
    format!("{}.acl.stage{}", direction, stage)
}

pub fn acl_action(direction: Direction, action: &str) -> String {
    format!("{}.acl.{}", direction, action)
}

pub fn routing_action(action: &str) -> String {
    format!("outbound.outbound_routing_stage.{}", action)
}

fn group_id_field(stage: u32) -> String {
    format!("meta.stage{}_dash_acl_group_id", stage)
}

/// Key fields of an ACL stage after the group id.
const ACL_KEYS: [(&str, MatchKind, u32); 5] = [
    ("meta.dst_ip_addr", MatchKind::TernaryList, 128),
    ("meta.src_ip_addr", MatchKind::TernaryList, 128),
    ("meta.ip_protocol", MatchKind::TernaryList, 8),
    ("meta.src_l4_port", MatchKind::RangeList, 16),
    ("meta.dst_l4_port", MatchKind::RangeList, 16),
];

const ROUTING_KEYS: [(&str, MatchKind, u32); 3] = [
    ("meta.eni_id", MatchKind::Exact, 16),
    ("meta.is_overlay_ip_v6", MatchKind::Exact, 1),
    ("meta.dst_ip_addr", MatchKind::Lpm, 128),
];

fn pass(_: &mut FieldContext, _: &[u128]) -> Result<(), FieldError> {
    Ok(())
}

fn drop_packet(ctx: &mut FieldContext, _: &[u128]) -> Result<(), FieldError> {
    ctx.set("meta.dropped", 1)
}

fn route_vnet(ctx: &mut FieldContext, params: &[u128]) -> Result<(), FieldError> {
    ctx.set("meta.dst_vnet_id", params[0])
}

fn acl_body(action: &str) -> match_action::ActionFn {
    if action.starts_with("deny") {
        drop_packet
    } else {
        pass
    }
}

fn routing_body(action: &str) -> match_action::ActionFn {
    match action {
        "route_vnet" => route_vnet,
        "drop" => drop_packet,
        _ => pass,
    }
}

/// Builds the pipeline's tables and actions.
pub fn pipeline() -> Result<Pipeline> {
    let mut builder = Pipeline::builder();
    for direction in DIRECTIONS {
        for action in ACL_ACTIONS {
            builder
                .action(&acl_action(direction, action), &[], acl_body(action))
                .with_context(|| format!("registering {} ACL actions", direction))?;
        }
        for stage in 1..=3 {
            let mut def = TableDef::new(&acl_table(direction, stage)).key(&group_id_field(stage), MatchKind::Exact, 16);
            for (name, kind, width) in ACL_KEYS {
                def = def.key(name, kind, width);
            }
            for action in ACL_ACTIONS {
                def = def.action(&acl_action(direction, action));
            }
            builder.table(def.default_action(&acl_action(direction, "deny"), &[]));
        }
    }

    for (action, params) in ROUTING_ACTIONS {
        builder
            .action(&routing_action(action), params, routing_body(action))
            .context("registering routing actions")?;
    }
    let mut routing = TableDef::new(ROUTING_TABLE);
    for (name, kind, width) in ROUTING_KEYS {
        routing = routing.key(name, kind, width);
    }
    for (action, _) in ROUTING_ACTIONS {
        routing = routing.action(&routing_action(action));
    }
    builder.table(routing.default_action(&routing_action("drop"), &[]));

    builder.build().context("building DASH pipeline")
}

/// Per-packet metadata with every field the pipeline reads or writes, all zero.
pub fn metadata() -> Result<FieldContext, FieldError> {
    let mut ctx = FieldContext::new();
    for stage in 1..=3 {
        ctx.declare(&group_id_field(stage), 16)?;
    }
    for (name, _, width) in ACL_KEYS {
        ctx.declare(name, width)?;
    }
    ctx.declare("meta.eni_id", 16)?;
    ctx.declare("meta.is_overlay_ip_v6", 1)?;
    ctx.declare("meta.dropped", 1)?;
    ctx.declare("meta.dst_vnet_id", 16)?;
    Ok(ctx)
}

/// Runs the ACL stages of `direction` in order.  Stages whose group id is 0 are skipped, and a
/// plain `permit` or `deny` ends the ACL.  Returns the result of every stage that ran.
pub fn acl_apply(pipeline: &Pipeline, direction: Direction, ctx: &mut FieldContext) -> Result<Vec<ApplyResult>> {
    let terminal = [acl_action(direction, "permit"), acl_action(direction, "deny")];
    let mut results = Vec::new();
    for stage in 1..=3 {
        if ctx.get(&group_id_field(stage))? == 0 {
            continue;
        }
        let table = acl_table(direction, stage);
        let result = pipeline.apply(&table, ctx)?;
        info!("{}: {}", table, result.action_name);
        let done = terminal.contains(&result.action_name);
        results.push(result);
        if done {
            break;
        }
    }
    Ok(results)
}

fn preamble(id: u32, name: &str) -> p4info::Preamble {
    let mut p = p4info::Preamble::new();
    p.set_id(id);
    p.set_name(format!("{}.{}", CONTROL, name));
    p
}

fn match_field(id: u32, name: &str, kind: MatchKind, width: u32) -> p4info::MatchField {
    let mut mf = p4info::MatchField::new();
    mf.set_id(id);
    mf.set_name(name.into());
    mf.set_bitwidth(width as i32);
    match kind {
        MatchKind::Exact => mf.set_match_type(MatchField_MatchType::EXACT),
        MatchKind::Ternary => mf.set_match_type(MatchField_MatchType::TERNARY),
        MatchKind::Lpm => mf.set_match_type(MatchField_MatchType::LPM),
        MatchKind::Range => mf.set_match_type(MatchField_MatchType::RANGE),
        MatchKind::TernaryList | MatchKind::RangeList => mf.set_other_match_type(kind.to_string()),
    }
    mf
}

fn action(id: u32, name: &str, params: &[&str], width: i32) -> p4info::Action {
    let mut a = p4info::Action::new();
    a.set_preamble(preamble(id, name));
    for (i, param) in params.iter().enumerate() {
        let mut p = p4info::Action_Param::new();
        p.set_id(i as u32 + 1);
        p.set_name((*param).into());
        p.set_bitwidth(width);
        a.mut_params().push(p);
    }
    a
}

fn table(id: u32, name: &str, keys: &[(String, MatchKind, u32)], actions: &[&p4info::Action]) -> p4info::Table {
    let mut t = p4info::Table::new();
    t.set_preamble(preamble(id, name));
    for (i, (key, kind, width)) in keys.iter().enumerate() {
        t.mut_match_fields().push(match_field(i as u32 + 1, key, *kind, *width));
    }
    for a in actions {
        let mut ar = p4info::ActionRef::new();
        ar.set_id(a.get_preamble().id);
        t.mut_action_refs().push(ar);
    }
    t.set_size(1024);
    t
}

/// P4Info that a controller pushes to program this pipeline.  Names carry the `dash_ingress.`
/// prefix, as a P4 compiler would emit them.
pub fn p4info() -> P4Info {
    let mut p4i = P4Info::new();
    p4i.mut_pkg_info().set_name("dash".into());
    p4i.mut_pkg_info().set_arch("v1model".into());

    for (d, direction) in DIRECTIONS.iter().enumerate() {
        let d = d as u32;
        let actions: Vec<p4info::Action> = ACL_ACTIONS
            .iter()
            .enumerate()
            .map(|(i, a)| action(0x0100_0000 | d << 4 | i as u32, &acl_action(*direction, a), &[], 0))
            .collect();
        for stage in 1..=3 {
            let keys: Vec<(String, MatchKind, u32)> = std::iter::once((group_id_field(stage), MatchKind::Exact, 16))
                .chain(ACL_KEYS.iter().map(|(n, k, w)| (n.to_string(), *k, *w)))
                .collect();
            let table_id = 0x0200_0000 | d << 4 | stage;
            p4i.mut_tables()
                .push(table(table_id, &acl_table(*direction, stage), &keys, &actions.iter().collect::<Vec<_>>()));

            let mut counter = p4info::DirectCounter::new();
            counter.set_preamble(preamble(
                0x1300_0000 | d << 4 | stage,
                &format!("{}_stage{}_counter", direction, stage),
            ));
            counter.set_direct_table_id(table_id);
            p4i.mut_direct_counters().push(counter);
        }
        for a in actions {
            p4i.mut_actions().push(a);
        }
    }

    let actions: Vec<p4info::Action> = ROUTING_ACTIONS
        .iter()
        .enumerate()
        .map(|(i, (a, params))| action(0x0100_0020 | i as u32, &routing_action(a), params, 16))
        .collect();
    let keys: Vec<(String, MatchKind, u32)> = ROUTING_KEYS.iter().map(|(n, k, w)| (n.to_string(), *k, *w)).collect();
    p4i.mut_tables()
        .push(table(0x0200_0020, ROUTING_TABLE, &keys, &actions.iter().collect::<Vec<_>>()));
    for a in actions {
        p4i.mut_actions().push(a);
    }
    p4i
}
