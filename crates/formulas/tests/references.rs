use gridfill_formulas::{
    adjust_for_copy, parse_cell_reference, parse_range_reference, stringify_cell_reference,
    stringify_range_reference, transform_for_copy, AdjustOptions, CellReference, RangeReference,
};
use gridfill_primitives::{CellAddress, MAX_COLUMN_INDEX, MAX_ROW_INDEX};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SHEETS: &[&str] = &["Sheet1", "My Sheet", "O'Brien", "Q1.Data", "_x", "2024", "données"];

fn random_reference(rng: &mut StdRng) -> CellReference {
    let address = CellAddress::new(
        rng.gen_range(0..=MAX_ROW_INDEX),
        rng.gen_range(0..=MAX_COLUMN_INDEX),
    );
    let reference = CellReference::new(address).with_absolute(rng.gen(), rng.gen());
    if rng.gen_bool(0.3) {
        reference.with_sheet(SHEETS[rng.gen_range(0..SHEETS.len())])
    } else {
        reference
    }
}

#[test]
fn test_cell_reference_round_trip_random() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..2_000 {
        let reference = random_reference(&mut rng);
        let text = stringify_cell_reference(&reference);
        let parsed = parse_cell_reference(&text).expect("stringified reference parses");
        assert_eq!(parsed, reference, "{text}");
        assert_eq!(stringify_cell_reference(&parsed), text);
    }
}

#[test]
fn test_range_reference_round_trip_random() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..1_000 {
        let a = random_reference(&mut rng);
        let b = CellReference {
            sheet: a.sheet.clone(),
            ..random_reference(&mut rng)
        };
        let range = RangeReference::new(a, b);
        assert!(range.start.column <= range.end.column);
        assert!(range.start.row <= range.end.row);

        let text = stringify_range_reference(&range);
        let parsed = parse_range_reference(&text).expect("stringified range parses");
        assert_eq!(parsed, range, "{text}");
    }
}

#[test]
fn test_absolute_references_survive_any_copy() {
    let mut rng = StdRng::seed_from_u64(7);
    let options = AdjustOptions::default();
    for _ in 0..1_000 {
        let reference = random_reference(&mut rng).with_absolute(true, true);
        let source = random_reference(&mut rng).address();
        let target = random_reference(&mut rng).address();
        let out = adjust_for_copy(&reference, source, target, &options).expect("absolute adjust");
        assert!(!out.changed);
        assert_eq!(out.reference, reference);
    }
}

#[test]
fn test_copy_there_and_back_restores_formula() {
    let mut rng = StdRng::seed_from_u64(99);
    let options = AdjustOptions::default();
    for _ in 0..500 {
        let refs: Vec<String> = (0..3)
            .map(|_| {
                let address = CellAddress::new(rng.gen_range(100..200), rng.gen_range(100..200));
                let reference = CellReference::new(address).with_absolute(rng.gen(), rng.gen());
                stringify_cell_reference(&reference)
            })
            .collect();
        let formula = format!("=SUM({},{})*{}", refs[0], refs[1], refs[2]);

        let source = CellAddress::new(rng.gen_range(50..150), rng.gen_range(50..150));
        let target = CellAddress::new(rng.gen_range(50..150), rng.gen_range(50..150));
        let there = transform_for_copy(&formula, source, target, &options).expect("forward");
        let back = transform_for_copy(&there.formula, target, source, &options).expect("back");
        assert_eq!(back.formula, formula);
        assert_eq!(back.adjusted_count, there.adjusted_count);
    }
}
