//! Invariants of `clean` over arbitrary small tables.

use std::collections::HashSet;

use proptest::prelude::*;
use rusty_clientes::data::columns::{CATEGORICAL_COLUMNS, DATE_COLUMNS, INCOME_COLUMN, SENTINEL};
use rusty_clientes::{clean, CellValue, Table};

const COLUMNS: [&str; 6] = [
    "Fecha de Nacimiento",
    INCOME_COLUMN,
    "Edad",
    "Barrio",
    "Correo",
    "Nombre",
];

fn cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        Just(CellValue::Null),
        (-3i64..50).prop_map(CellValue::Integer),
        (-10.0f64..10.0).prop_map(CellValue::Float),
        any::<bool>().prop_map(CellValue::Bool),
        prop::sample::select(vec![
            SENTINEL,
            "2020-01-31",
            "2020/02/03",
            "31/12/1999",
            "2021-06-07 08:09:10",
            "not-a-date",
            "3,5",
            "-4",
            "12",
            "Centro",
            "",
        ])
        .prop_map(CellValue::text),
    ]
}

fn table() -> impl Strategy<Value = Table> {
    prop::collection::vec(prop::collection::vec(cell(), COLUMNS.len()), 0..12).prop_map(|rows| {
        Table::new(COLUMNS.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    })
}

fn is_canonical_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

proptest! {
    #[test]
    fn clean_is_idempotent(t in table()) {
        let once = clean(&t).unwrap();
        prop_assert_eq!(clean(&once).unwrap(), once);
    }

    #[test]
    fn dates_are_canonical_or_sentinel(t in table()) {
        let out = clean(&t).unwrap();
        for col in DATE_COLUMNS.iter().filter(|c| out.column_index(c).is_some()) {
            for v in out.column_values(col).unwrap() {
                match v {
                    CellValue::String(s) => prop_assert!(s == SENTINEL || is_canonical_date(&s), "{}", s),
                    other => prop_assert!(false, "non-text date {:?}", other),
                }
            }
        }
    }

    #[test]
    fn output_has_no_duplicate_rows(t in table()) {
        let out = clean(&t).unwrap();
        let rows = out.rows();
        let distinct: HashSet<&Vec<CellValue>> = rows.iter().collect();
        prop_assert_eq!(distinct.len(), out.len());
    }

    #[test]
    fn income_is_numeric_and_non_negative(t in table()) {
        let out = clean(&t).unwrap();
        for v in out.column_values(INCOME_COLUMN).unwrap() {
            let n = v.as_f64();
            prop_assert!(n.is_some_and(|n| n >= 0.0), "{:?}", v);
        }
    }

    #[test]
    fn categorical_columns_have_no_missing_values(t in table()) {
        let out = clean(&t).unwrap();
        for col in CATEGORICAL_COLUMNS.iter().filter(|c| out.column_index(c).is_some()) {
            prop_assert!(out.column_values(col).unwrap().iter().all(|v| !v.is_null()));
        }
    }
}
