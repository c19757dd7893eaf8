//! Abbreviation extraction: the fixed-point loop, dedup, and the table
//! records it produces.

use rustc_hash::FxHashMap;

use crate::abbrev::{AbbrevTable, RecordWriter, extract_abbreviations};
use crate::canon::{BracketMode, SymbolSet, normalize};
use crate::core::expr::{Expr, ExprKind, substitute_symbols};
use crate::error::AbbrevError;

fn sym(name: &str) -> Expr {
    Expr::symbol(name)
}

/// No bracket head application of any kind remains in the tree.
fn fully_abbreviated(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::Bracket { .. } => false,
        ExprKind::Sum(children) | ExprKind::Product(children) => {
            children.iter().all(|c| fully_abbreviated(c))
        }
        ExprKind::Pow(base, exp) => fully_abbreviated(base) && fully_abbreviated(exp),
        ExprKind::Number(_) | ExprKind::Symbol(_) => true,
    }
}

/// Substitute every abbreviation back by its table pattern.
fn restore(e: &Expr, table: &AbbrevTable) -> Expr {
    let mut restored = e.clone();
    for entry in table.entries().iter().rev() {
        let mut map = FxHashMap::default();
        map.insert(entry.symbol.id(), entry.pattern.clone());
        restored = substitute_symbols(&restored, &map);
    }
    restored
}

#[test]
fn single_shared_subexpression_gets_one_entry() {
    // CC*X + R2*X with X = s12 + mT^2: exactly one table entry Z1 = X and
    // the abbreviated expression CC*Z1 + R2*Z1.
    let x = Expr::sum(vec![
        sym("ext_s12"),
        Expr::pow(sym("ext_mT"), Expr::integer(2)),
    ]);
    let e = Expr::sum(vec![
        Expr::product(vec![sym("ext_CC"), x.clone()]),
        Expr::product(vec![sym("ext_R2"), x.clone()]),
    ]);

    let set = SymbolSet::from_names(["ext_CC", "ext_R2"]);
    let mut table = AbbrevTable::new();
    let mut writer = RecordWriter::new(Vec::new());

    let abbreviated =
        extract_abbreviations(&e, &set, BracketMode::Bracket, "ext_Z", &mut table, &mut writer)
            .expect("extraction");

    assert_eq!(table.len(), 1);
    let entry = &table.entries()[0];
    assert_eq!(entry.seq, 1);
    assert_eq!(entry.name(), "ext_Z1");
    assert_eq!(entry.pattern, normalize(&x));

    let expected = normalize(&Expr::sum(vec![
        Expr::product(vec![sym("ext_CC"), sym("ext_Z1")]),
        Expr::product(vec![sym("ext_R2"), sym("ext_Z1")]),
    ]));
    assert_eq!(abbreviated, expected);

    let records = String::from_utf8(writer.into_inner().expect("flush")).expect("utf8");
    assert_eq!(records, "ext_Z1=ext_s12 + ext_mT^2;\n");
}

#[test]
fn identical_subexpressions_in_different_positions_share_one_number() {
    // The same compound content under two different external monomials: one
    // entry, two replaced occurrences.
    let content = Expr::product(vec![sym("ext2_a"), sym("ext2_b")]);
    let e = Expr::sum(vec![
        Expr::product(vec![sym("ext2_C1"), content.clone()]),
        Expr::product(vec![sym("ext2_C2"), content.clone()]),
    ]);

    let set = SymbolSet::from_names(["ext2_C1", "ext2_C2"]);
    let mut table = AbbrevTable::new();
    let mut writer = RecordWriter::new(Vec::new());

    let abbreviated =
        extract_abbreviations(&e, &set, BracketMode::Bracket, "ext2_Z", &mut table, &mut writer)
            .expect("extraction");

    assert_eq!(table.len(), 1);
    let expected = normalize(&Expr::sum(vec![
        Expr::product(vec![sym("ext2_C1"), sym("ext2_Z1")]),
        Expr::product(vec![sym("ext2_C2"), sym("ext2_Z1")]),
    ]));
    assert_eq!(abbreviated, expected);
}

#[test]
fn distinct_subexpressions_get_distinct_numbers() {
    let e = Expr::sum(vec![
        Expr::product(vec![sym("ext3_C"), sym("ext3_x")]),
        Expr::product(vec![
            sym("ext3_C"),
            sym("ext3_D"),
            Expr::sum(vec![sym("ext3_x"), sym("ext3_y")]),
        ]),
    ]);

    let set = SymbolSet::from_names(["ext3_C", "ext3_D"]);
    let mut table = AbbrevTable::new();
    let mut writer = RecordWriter::new(Vec::new());

    let abbreviated =
        extract_abbreviations(&e, &set, BracketMode::Bracket, "ext3_Z", &mut table, &mut writer)
            .expect("extraction");

    // Injectivity: both patterns distinct, both numbers distinct.
    assert_eq!(table.len(), 2);
    assert_ne!(table.entries()[0].pattern, table.entries()[1].pattern);
    assert_ne!(table.entries()[0].seq, table.entries()[1].seq);
    assert!(fully_abbreviated(&abbreviated));
}

#[test]
fn extraction_is_complete_and_round_trips() {
    let e = Expr::sum(vec![
        Expr::product(vec![
            Expr::integer(3),
            sym("ext4_C"),
            Expr::sum(vec![sym("ext4_x"), Expr::integer(1)]),
        ]),
        Expr::product(vec![
            sym("ext4_D"),
            Expr::pow(sym("ext4_y"), Expr::integer(2)),
        ]),
        Expr::product(vec![sym("ext4_C"), sym("ext4_D"), sym("ext4_x")]),
    ]);

    let set = SymbolSet::from_names(["ext4_C", "ext4_D"]);
    let mut table = AbbrevTable::new();
    let mut writer = RecordWriter::new(Vec::new());

    let abbreviated =
        extract_abbreviations(&e, &set, BracketMode::Bracket, "ext4_Z", &mut table, &mut writer)
            .expect("extraction");

    assert!(fully_abbreviated(&abbreviated));
    assert_eq!(normalize(&restore(&abbreviated, &table)), normalize(&e));
}

#[test]
fn rerunning_on_abbreviated_output_allocates_nothing() {
    let x = Expr::sum(vec![sym("ext5_x"), sym("ext5_y")]);
    let e = Expr::sum(vec![
        Expr::product(vec![sym("ext5_C"), x.clone()]),
        Expr::product(vec![sym("ext5_D"), x]),
    ]);

    let set = SymbolSet::from_names(["ext5_C", "ext5_D"]);
    let mut table = AbbrevTable::new();
    let mut writer = RecordWriter::new(Vec::new());

    let first =
        extract_abbreviations(&e, &set, BracketMode::Bracket, "ext5_Z", &mut table, &mut writer)
            .expect("first extraction");
    let entries_after_first = table.len();

    let second = extract_abbreviations(
        &first,
        &set,
        BracketMode::Bracket,
        "ext5_Z",
        &mut table,
        &mut writer,
    )
    .expect("second extraction");

    assert_eq!(table.len(), entries_after_first);
    assert_eq!(second, first);
}

#[test]
fn repeated_calls_within_a_run_reuse_stable_numbers() {
    // A second expression containing a pattern captured earlier resolves to
    // the same abbreviation symbol without a new record.
    let shared = Expr::sum(vec![sym("ext6_x"), sym("ext6_y")]);
    let set = SymbolSet::from_names(["ext6_C", "ext6_D"]);
    let mut table = AbbrevTable::new();
    let mut writer = RecordWriter::new(Vec::new());

    let e1 = Expr::product(vec![sym("ext6_C"), shared.clone()]);
    extract_abbreviations(&e1, &set, BracketMode::Bracket, "ext6_Z", &mut table, &mut writer)
        .expect("first call");
    assert_eq!(table.len(), 1);

    let e2 = Expr::product(vec![sym("ext6_D"), shared]);
    let abbreviated =
        extract_abbreviations(&e2, &set, BracketMode::Bracket, "ext6_Z", &mut table, &mut writer)
            .expect("second call");

    assert_eq!(table.len(), 1);
    let expected = normalize(&Expr::product(vec![sym("ext6_D"), sym("ext6_Z1")]));
    assert_eq!(abbreviated, expected);

    let records = String::from_utf8(writer.into_inner().expect("flush")).expect("utf8");
    assert_eq!(records.lines().count(), 1);
}

#[test]
fn bare_numbers_are_never_abbreviated() {
    // Purely numeric bracket content folds into the parent term and no
    // sequence number is consumed.
    let e = Expr::sum(vec![
        Expr::product(vec![Expr::integer(3), sym("ext7_C")]),
        Expr::product(vec![Expr::integer(5), sym("ext7_D")]),
    ]);

    let set = SymbolSet::from_names(["ext7_C", "ext7_D"]);
    let mut table = AbbrevTable::new();
    let mut writer = RecordWriter::new(Vec::new());

    let abbreviated =
        extract_abbreviations(&e, &set, BracketMode::Bracket, "ext7_Z", &mut table, &mut writer)
            .expect("extraction");

    assert!(table.is_empty());
    assert_eq!(abbreviated, normalize(&e));
}

#[test]
fn anti_bracket_captures_the_named_set() {
    // Named set {x}: anti-bracket keeps the complement (C, y) external and
    // captures x itself.
    let e = Expr::sum(vec![
        Expr::product(vec![sym("ext8_C"), sym("ext8_x")]),
        Expr::product(vec![sym("ext8_C"), sym("ext8_y")]),
    ]);

    let set = SymbolSet::from_names(["ext8_x"]);
    let mut table = AbbrevTable::new();
    let mut writer = RecordWriter::new(Vec::new());

    let abbreviated = extract_abbreviations(
        &e,
        &set,
        BracketMode::AntiBracket,
        "ext8_Z",
        &mut table,
        &mut writer,
    )
    .expect("extraction");

    assert_eq!(table.len(), 1);
    assert_eq!(table.entries()[0].pattern, sym("ext8_x"));
    let expected = normalize(&Expr::sum(vec![
        Expr::product(vec![sym("ext8_C"), sym("ext8_Z1")]),
        Expr::product(vec![sym("ext8_C"), sym("ext8_y")]),
    ]));
    assert_eq!(abbreviated, expected);
}

#[test]
fn empty_symbol_set_is_rejected_before_extraction() {
    let mut table = AbbrevTable::new();
    let mut writer = RecordWriter::new(Vec::new());
    let err = extract_abbreviations(
        &sym("ext9_x"),
        &SymbolSet::new(),
        BracketMode::Bracket,
        "ext9_Z",
        &mut table,
        &mut writer,
    )
    .expect_err("empty set must be rejected");
    assert!(matches!(err, AbbrevError::EmptySymbolSet));
    assert!(table.is_empty());
}

#[test]
fn records_appear_in_allocation_order() {
    let e = Expr::sum(vec![
        Expr::product(vec![sym("ext10_C"), sym("ext10_x")]),
        Expr::product(vec![sym("ext10_D"), sym("ext10_y")]),
        Expr::product(vec![
            sym("ext10_C"),
            sym("ext10_D"),
            sym("ext10_z"),
        ]),
    ]);

    let set = SymbolSet::from_names(["ext10_C", "ext10_D"]);
    let mut table = AbbrevTable::new();
    let mut writer = RecordWriter::new(Vec::new());

    extract_abbreviations(&e, &set, BracketMode::Bracket, "ext10_Z", &mut table, &mut writer)
        .expect("extraction");

    let records = String::from_utf8(writer.into_inner().expect("flush")).expect("utf8");
    let seqs: Vec<u32> = records
        .lines()
        .map(|line| {
            line.strip_prefix("ext10_Z")
                .and_then(|rest| rest.split('=').next())
                .and_then(|n| n.parse().ok())
                .expect("record format")
        })
        .collect();
    assert_eq!(seqs, (1..=seqs.len() as u32).collect::<Vec<_>>());
    assert_eq!(seqs.len(), table.len());
}
