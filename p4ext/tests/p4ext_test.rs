extern crate p4ext;

use p4ext::{FieldValue, P4Error, Switch};
use proto::p4info::{self, MatchField_MatchType, P4Info};
use proto::p4runtime::Update_Type;
use std::collections::HashMap;

fn preamble(id: u32, name: &str) -> p4info::Preamble {
    let mut p = p4info::Preamble::new();
    p.set_id(id);
    p.set_name(name.into());
    p
}

fn match_field(id: u32, name: &str, bitwidth: i32, match_type: MatchField_MatchType) -> p4info::MatchField {
    let mut mf = p4info::MatchField::new();
    mf.set_id(id);
    mf.set_name(name.into());
    mf.set_bitwidth(bitwidth);
    mf.set_match_type(match_type);
    mf
}

/// A routing table keyed by VNI and destination prefix, with a `set_nhop(port)` action.
fn routing_p4info() -> P4Info {
    let mut set_nhop = p4info::Action::new();
    set_nhop.set_preamble(preamble(0x0100_0010, "ingress.routing.set_nhop"));
    let mut port = p4info::Action_Param::new();
    port.set_id(1);
    port.set_name("port".into());
    port.set_bitwidth(9);
    set_nhop.mut_params().push(port);

    let mut table = p4info::Table::new();
    table.set_preamble(preamble(0x0200_0010, "ingress.routing.lpm_table"));
    table.mut_match_fields().push(match_field(1, "meta.vni", 24, MatchField_MatchType::EXACT));
    table.mut_match_fields().push(match_field(2, "hdr.ipv4.dst", 32, MatchField_MatchType::LPM));
    let mut ar = p4info::ActionRef::new();
    ar.set_id(0x0100_0010);
    table.mut_action_refs().push(ar);

    let mut p4i = P4Info::new();
    p4i.mut_actions().push(set_nhop);
    p4i.mut_tables().push(table);
    p4i
}

#[test]
fn build_table_entry() {
    let switch: Switch = (&routing_p4info()).into();

    let mut params_values = HashMap::new();
    params_values.insert("port".to_string(), 7);
    let entry = switch
        .build_table_entry(
            "routing.lpm_table",
            "ingress.routing.set_nhop",
            &params_values,
            &[
                ("hdr.ipv4.dst", FieldValue::Lpm { value: 0x0a01_0000, prefix_len: 16 }),
                ("meta.vni", FieldValue::Exact(100)),
            ],
            3,
        )
        .unwrap();

    assert_eq!(entry.get_table_id(), 0x0200_0010);
    assert_eq!(entry.get_priority(), 3);
    let matches = entry.get_field_match();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].get_field_id(), 2);
    assert_eq!(matches[0].get_lpm().get_value(), &[10, 1, 0, 0]);
    assert_eq!(matches[0].get_lpm().get_prefix_len(), 16);
    assert_eq!(matches[1].get_exact().get_value(), &[0, 0, 100]);

    let action = entry.get_action().get_action();
    assert_eq!(action.get_action_id(), 0x0100_0010);
    assert_eq!(action.get_params()[0].get_param_id(), 1);
    assert_eq!(action.get_params()[0].get_value(), &[0, 7]);

    let update = p4ext::build_table_entry_update(Update_Type::DELETE, entry.clone());
    assert_eq!(update.get_field_type(), Update_Type::DELETE);
    assert_eq!(update.get_entity().get_table_entry(), &entry);
}

#[test]
fn build_table_entry_errors() {
    let switch: Switch = (&routing_p4info()).into();
    let none = HashMap::new();

    assert_eq!(
        switch.build_table_entry("routing.acl", "set_nhop", &none, &[], 0).unwrap_err(),
        P4Error::UnknownTable("routing.acl".into())
    );
    assert!(matches!(
        switch.build_table_entry("routing.lpm_table", "drop", &none, &[], 0),
        Err(P4Error::UnknownAction { .. })
    ));
    assert!(matches!(
        switch.build_table_entry(
            "routing.lpm_table",
            "routing.set_nhop",
            &none,
            &[("hdr.ipv6.dst", FieldValue::Exact(1))],
            0
        ),
        Err(P4Error::UnknownField { .. })
    ));

    let mut bogus = HashMap::new();
    bogus.insert("vlan".to_string(), 1);
    assert!(matches!(
        switch.build_table_entry("routing.lpm_table", "routing.set_nhop", &bogus, &[], 0),
        Err(P4Error::UnknownParam { .. })
    ));
}
