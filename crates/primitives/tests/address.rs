use gridfill_primitives::{
    desanitize_sheet_name, sanitize_sheet_name, AddressError, CellAddress, CellRange,
    MAX_COLUMN_INDEX, MAX_ROW_INDEX,
};

#[test]
fn test_address_round_trip_through_a1() {
    for (row, col) in [(0, 0), (9, 26), (1_000, 702), (MAX_ROW_INDEX, MAX_COLUMN_INDEX)] {
        let addr = CellAddress::new(row, col);
        assert_eq!(CellAddress::from_a1(&addr.to_a1()), Ok(addr));
    }
}

#[test]
fn test_range_from_a1_normalizes_backwards_input() {
    let range = CellRange::from_a1("C5:A1").expect("range");
    assert_eq!(range.start, CellAddress::new(0, 0));
    assert_eq!(range.end, CellAddress::new(4, 2));
    assert_eq!(range.to_string(), "A1:C5");
}

#[test]
fn test_range_from_single_cell() {
    let range = CellRange::from_a1("B2").expect("range");
    assert_eq!(range.size(), 1);
    assert_eq!(range.iter().collect::<Vec<_>>(), vec![CellAddress::new(1, 1)]);
}

#[test]
fn test_range_from_a1_rejects_out_of_bounds() {
    assert!(matches!(
        CellRange::from_a1("A1:A1048577"),
        Err(AddressError::OutOfBounds(_))
    ));
}

#[test]
fn test_sheet_name_quoting_round_trip() {
    for name in ["Sheet1", "My Sheet", "Q1-2024", "O'Brien", "_x"] {
        assert_eq!(desanitize_sheet_name(&sanitize_sheet_name(name)), name);
    }
}
