//! Address helpers for spreadsheet-style A1 references.

use crate::AddressError;

pub const MAX_ROW_COUNT: u32 = 1_048_576;
pub const MAX_COLUMN_COUNT: u32 = 16_384;

/// Largest zero-based row index (row 1,048,576 in A1 text).
pub const MAX_ROW_INDEX: u32 = MAX_ROW_COUNT - 1;
/// Largest zero-based column index (column "XFD").
pub const MAX_COLUMN_INDEX: u32 = MAX_COLUMN_COUNT - 1;

/// Convert column index to letter (0 -> A, 1 -> B, 25 -> Z, 26 -> AA, etc.).
pub fn column_index_to_letter(index: u32) -> String {
    let mut n = index;
    let mut out = String::new();
    loop {
        let rem = (n % 26) as u8;
        out.push((b'A' + rem) as char);
        n /= 26;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    out.chars().rev().collect()
}

/// Convert column letters to a zero-based index (A -> 0, Z -> 25, AA -> 26).
/// Letters are case-insensitive; anything past "XFD" is out of bounds.
pub fn column_letter_to_index(letters: &str) -> Result<u32, AddressError> {
    if letters.is_empty() {
        return Err(AddressError::InvalidColumn(letters.to_string()));
    }
    let mut result: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(AddressError::InvalidColumn(letters.to_string()));
        }
        let value = u32::from(ch.to_ascii_uppercase() as u8 - b'A' + 1);
        result = result
            .checked_mul(26)
            .and_then(|v| v.checked_add(value))
            .filter(|v| *v <= MAX_COLUMN_COUNT)
            .ok_or_else(|| AddressError::OutOfBounds(letters.to_string()))?;
    }
    Ok(result - 1)
}

/// True when a sheet name must be quoted to appear in a formula.
///
/// Bare names follow `^[A-Za-z_][A-Za-z0-9_]*$`; everything else is quoted.
pub fn needs_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => true,
    }
}

/// Sanitize sheet names with special characters.
pub fn sanitize_sheet_name(name: &str) -> String {
    if needs_quoting(name) {
        let escaped = name.replace('\'', "''");
        return format!("'{}'", escaped);
    }
    name.to_string()
}

/// Remove single quotes from sheet name.
pub fn desanitize_sheet_name(name: &str) -> String {
    match name
        .strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
    {
        Some(inner) => inner.replace("''", "'"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_conversions() {
        assert_eq!(column_index_to_letter(0), "A");
        assert_eq!(column_index_to_letter(25), "Z");
        assert_eq!(column_index_to_letter(26), "AA");
        assert_eq!(column_index_to_letter(701), "ZZ");
        assert_eq!(column_index_to_letter(702), "AAA");
        assert_eq!(column_index_to_letter(MAX_COLUMN_INDEX), "XFD");

        assert_eq!(column_letter_to_index("A").unwrap(), 0);
        assert_eq!(column_letter_to_index("z").unwrap(), 25);
        assert_eq!(column_letter_to_index("AA").unwrap(), 26);
        assert_eq!(column_letter_to_index("XFD").unwrap(), MAX_COLUMN_INDEX);
    }

    #[test]
    fn test_column_letter_to_index_invalid() {
        assert!(matches!(
            column_letter_to_index("A!"),
            Err(AddressError::InvalidColumn(_))
        ));
        assert!(matches!(
            column_letter_to_index("XFE"),
            Err(AddressError::OutOfBounds(_))
        ));
        let long_col = "Z".repeat(20);
        assert!(matches!(
            column_letter_to_index(&long_col),
            Err(AddressError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Sheet1"), "Sheet1");
        assert_eq!(sanitize_sheet_name("_data"), "_data");
        assert_eq!(sanitize_sheet_name("Sheet 1"), "'Sheet 1'");
        assert_eq!(sanitize_sheet_name("2024"), "'2024'");
        assert_eq!(sanitize_sheet_name("Bob's"), "'Bob''s'");
    }

    #[test]
    fn test_desanitize_sheet_name() {
        assert_eq!(desanitize_sheet_name("'Sheet 1'"), "Sheet 1");
        assert_eq!(desanitize_sheet_name("'Bob''s'"), "Bob's");
        assert_eq!(desanitize_sheet_name("Plain"), "Plain");
    }
}
