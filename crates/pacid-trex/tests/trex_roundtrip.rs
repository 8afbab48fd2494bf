//! # T-REX Round Trip and Validation Tests
//!
//! Exercises the public API end to end: parse a blob, inspect its validity,
//! serialize it back.

use pacid_core::{UnitTable, Validated};
use pacid_trex::{ColumnHeader, TableSegment, Trex, TrexSegment, TrexType, TrexValue, ValueSegment};

fn parse(s: &str) -> Trex {
    Trex::parse(s, &UnitTable::builtin()).unwrap()
}

const SEGMENTS: &[&str] = &[
    "DATE$T.D:20250101",
    "BOOL$T.B:T",
    "ALPHANUM$T.A:ABC",
    "TXT$T.T:ABCD",
    "BIN$T.X:ABDF",
    "ERR$E:123",
    "DUR$HUR:10",
    "TAB$$C-0$T.A:C.1$T.B::TRUE:T::FALSE:F",
];

#[test]
fn parse_then_serialize_is_identity() {
    for s in SEGMENTS {
        let trex = parse(s);
        assert_eq!(trex.serialize(), *s);
        assert!(trex.is_valid(), "{s}: {:?}", trex.all_messages());
    }
    let joined = SEGMENTS.join("+");
    assert_eq!(parse(&joined).serialize(), joined);
}

#[test]
fn invalid_input_still_roundtrips() {
    for s in [
        "TIME$HUR:A",
        "TIME$HIP:A",
        "tImE$HUR:1",
        "TAB$$C0$T.A:C1$T.B::TRUE:TRUE::FALSE:T",
        "TAB$$C0$T.A:C1$T.B:C2$C63::TRUE:T::FALSE:T:1",
    ] {
        let trex = parse(s);
        assert!(!trex.is_valid(), "{s}");
        assert_eq!(trex.serialize(), s);
    }
}

#[test]
fn mixed_blob() {
    let trex = parse("WEIGHT$KGM:12.5+DONE$T.B:T+LOG$$T$T.D:V$CEL::T0800:21.5::T0900:22");
    assert!(trex.is_valid(), "{:?}", trex.all_messages());
    let log = trex.segment("LOG").and_then(TrexSegment::as_table).unwrap();
    assert_eq!(log.n_rows(), 2);
    assert_eq!(log.cell(1, "V"), Some(&TrexValue::Numeric("22".into())));
}

#[test]
fn build_programmatically() {
    let units = UnitTable::builtin();
    let table = TableSegment::new(
        "RUNS",
        vec![
            ColumnHeader::typed("ID", &TrexType::Alphanumeric, &units),
            ColumnHeader::typed("OK", &TrexType::Bool, &units),
        ],
        vec![
            vec![TrexValue::alphanumeric_or_text("R-1"), TrexValue::boolean(true)],
            vec![TrexValue::alphanumeric_or_text("R-2"), TrexValue::boolean(false)],
        ],
    );
    let trex = Trex::new(vec![
        TrexSegment::Value(ValueSegment::from_value("NOTE", TrexValue::text("ok!"), &units)),
        TrexSegment::Table(table),
    ]);
    assert!(trex.is_valid(), "{:?}", trex.all_messages());

    let reparsed = parse(&trex.serialize());
    assert_eq!(reparsed, trex);
}
