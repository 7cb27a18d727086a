//! Integration tests for inbound setting dispatch.
//!
//! These tests build a small instrument server's settings table through the
//! public API and drive it with tagged values the way a packet handler would.

use labrad_core::{
    Args, Extract, LabradError, Reply, SettingBuilder, SettingId, SettingsTable, TaggedValue,
    TypeSignature, Unpacker,
};
use std::sync::Mutex;

struct Dmm {
    range: Mutex<f64>,
    log: Mutex<Vec<String>>,
}

impl Dmm {
    fn new() -> Self {
        Self {
            range: Mutex::new(10.0),
            log: Mutex::new(Vec::new()),
        }
    }
}

const ADD: u32 = 1;
const RANGE: u32 = 2;
const RESET: u32 = 3;
const ECHO: u32 = 4;
const CHECK: u32 = 5;

fn int_pair() -> TypeSignature {
    TypeSignature::cluster([TypeSignature::Int, TypeSignature::Int])
}

fn value_pair() -> TypeSignature {
    TypeSignature::cluster([TypeSignature::Value, TypeSignature::Value])
}

fn dmm_table() -> SettingsTable<Dmm> {
    let mut table = SettingsTable::new();
    table
        .register(
            SettingBuilder::new(ADD, "add")
                .doc("Add two numbers.")
                .returns(TypeSignature::Int)
                .returns(TypeSignature::Value)
                .accepts(int_pair(), |_: &Dmm, args: Args| {
                    Ok(TaggedValue::Int(args.int(0)? + args.int(1)?).into())
                })
                .accepts(value_pair(), |_: &Dmm, args: Args| {
                    Ok(TaggedValue::Value(args.value(0)? + args.value(1)?).into())
                }),
        )
        .unwrap();
    table
        .register(
            SettingBuilder::new(RANGE, "range")
                .accepts(TypeSignature::Empty, |dmm: &Dmm, _| {
                    Ok(TaggedValue::Value(*dmm.range.lock().unwrap()).into())
                })
                .accepts(TypeSignature::Value, |dmm: &Dmm, args: Args| {
                    *dmm.range.lock().unwrap() = args.value(0)?;
                    Ok(Reply::Void)
                }),
        )
        .unwrap();
    table
        .register(
            SettingBuilder::new(RESET, "reset")
                .accepts(TypeSignature::Empty, |dmm: &Dmm, _| {
                    dmm.log.lock().unwrap().push("reset".to_string());
                    Ok(().into())
                })
                .accepts(TypeSignature::Str, |dmm: &Dmm, args: Args| {
                    dmm.log.lock().unwrap().push(args.str(0)?.to_string());
                    Ok(().into())
                }),
        )
        .unwrap();
    table
        .register(SettingBuilder::new(ECHO, "echo").overload(
            TypeSignature::Any,
            Unpacker::passthrough(),
            |_: &Dmm, args: Args| Ok(args.raw(0)?.clone().into()),
        ))
        .unwrap();
    table
        .register(
            SettingBuilder::new(CHECK, "check").overload(
                TypeSignature::list(TypeSignature::Int),
                Unpacker::Single(Extract::IntList),
                |_: &Dmm, args: Args| {
                    if args.int_list(0)?.iter().any(|v| *v < 0) {
                        return Err(LabradError::business_with_payload(
                            42,
                            "bad value",
                            TaggedValue::Str("negative".to_string()),
                        ));
                    }
                    Ok(Reply::Void)
                },
            ),
        )
        .unwrap();
    table
}

#[test]
fn test_overloads_route_by_shape() {
    let table = dmm_table();
    let dmm = Dmm::new();

    let ints = TaggedValue::cluster([TaggedValue::Int(2), TaggedValue::Int(3)]);
    let values = TaggedValue::cluster([TaggedValue::Value(0.5), TaggedValue::Value(0.25)]);

    assert_eq!(
        table.handle(&dmm, SettingId(ADD), &ints).unwrap(),
        TaggedValue::Int(5)
    );
    assert_eq!(
        table.handle(&dmm, SettingId(ADD), &values).unwrap(),
        TaggedValue::Value(0.75)
    );
}

#[test]
fn test_mixed_pair_has_no_overload() {
    let table = dmm_table();
    let mixed = TaggedValue::cluster([TaggedValue::Int(2), TaggedValue::Value(3.0)]);

    match table.handle(&Dmm::new(), SettingId(ADD), &mixed) {
        Err(LabradError::NoMatchingOverload { setting, type_tag }) => {
            assert_eq!(setting, "add");
            assert_eq!(type_tag, "(iv)");
        }
        other => panic!("Expected NoMatchingOverload, got: {:?}", other),
    }
}

#[test]
fn test_zero_argument_setting_takes_empty_value() {
    let table = dmm_table();
    let dmm = Dmm::new();
    assert_eq!(
        table
            .handle(&dmm, SettingId(RANGE), &TaggedValue::EMPTY)
            .unwrap(),
        TaggedValue::Value(10.0)
    );
}

#[test]
fn test_void_overloads_reply_with_empty_value() {
    let table = dmm_table();
    let dmm = Dmm::new();

    for value in [TaggedValue::EMPTY, TaggedValue::Str("soft".to_string())] {
        let reply = table.handle(&dmm, SettingId(RESET), &value).unwrap();
        assert!(reply.is_empty_value());
    }
    assert_eq!(*dmm.log.lock().unwrap(), vec!["reset", "soft"]);

    let reply = table
        .handle(&dmm, SettingId(RANGE), &TaggedValue::Value(2.5))
        .unwrap();
    assert_eq!(reply, TaggedValue::EMPTY);
    assert_eq!(*dmm.range.lock().unwrap(), 2.5);
}

#[test]
fn test_business_failure_passes_through() {
    let table = dmm_table();
    let value = TaggedValue::list([TaggedValue::Int(1), TaggedValue::Int(-1)]);

    let err = table
        .handle(&Dmm::new(), SettingId(CHECK), &value)
        .unwrap_err();
    assert_eq!(err.to_rpc_error_code(), 42);
    match err {
        LabradError::Business {
            code,
            message,
            payload,
        } => {
            assert_eq!(code, 42);
            assert_eq!(message, "bad value");
            assert_eq!(payload, Some(TaggedValue::Str("negative".to_string())));
        }
        other => panic!("Expected Business, got: {:?}", other),
    }
}

#[test]
fn test_passthrough_receives_value_unchanged() {
    let table = dmm_table();
    let value = TaggedValue::cluster([
        TaggedValue::Str("x".to_string()),
        TaggedValue::list([TaggedValue::Word(1)]),
    ]);
    assert_eq!(
        table.handle(&Dmm::new(), SettingId(ECHO), &value).unwrap(),
        value
    );
}

#[test]
fn test_matching_is_repeatable() {
    let value = TaggedValue::cluster([TaggedValue::Int(1), TaggedValue::Int(2)]);
    let sig = int_pair();
    let first = labrad_core::matches(&value, &sig);
    for _ in 0..10 {
        assert_eq!(labrad_core::matches(&value, &sig), first);
    }
    assert!(first);
}

#[test]
fn test_packet_stops_at_first_failure() {
    let table = dmm_table();
    let dmm = Dmm::new();
    let records = vec![
        (SettingId(RANGE), TaggedValue::Value(1.0)),
        (SettingId(99), TaggedValue::EMPTY),
        (SettingId(RESET), TaggedValue::EMPTY),
    ];

    let results = table.handle_records(&dmm, &records);
    assert_eq!(results.len(), 2);
    assert!(results[0].1.is_ok());
    assert!(matches!(results[1].1, Err(LabradError::UnknownSetting(99))));
    assert!(dmm.log.lock().unwrap().is_empty());
}

#[test]
fn test_descriptors_list_signatures_in_order() {
    let table = dmm_table();
    let descriptors = table.descriptors();

    assert_eq!(descriptors.len(), 5);
    let add = &descriptors[0];
    assert_eq!(add.name, "add");
    assert_eq!(add.accepts, vec!["(ii)", "(vv)"]);
    assert_eq!(add.returns, vec!["i", "v"]);
    assert_eq!(descriptors[2].accepts, vec!["_", "s"]);
}

#[test]
fn test_table_is_shareable_across_threads() {
    let table = std::sync::Arc::new(dmm_table());
    let dmm = std::sync::Arc::new(Dmm::new());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let table = table.clone();
            let dmm = dmm.clone();
            std::thread::spawn(move || {
                let value = TaggedValue::cluster([TaggedValue::Int(i), TaggedValue::Int(i)]);
                table.handle(&dmm, SettingId(ADD), &value).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), TaggedValue::Int(2 * i as i32));
    }
}
