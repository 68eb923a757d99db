//! Utilities for working with EIP-4844 field elements.

use crate::eip4844::{FIELD_ELEMENT_BYTES, USABLE_BYTES_PER_FIELD_ELEMENT};

/// Determine whether a slice of bytes can be contained in a field element.
pub const fn fits_in_fe(data: &[u8]) -> bool {
    const FULL_PLUS_ONE: usize = FIELD_ELEMENT_BYTES + 1;

    match data.len() {
        FULL_PLUS_ONE.. => false,
        FIELD_ELEMENT_BYTES => data[0] & 0b1100_0000 == 0, // first two bits must be zero
        _ => true,
    }
}

/// Calculate the number of field elements required to store the given
/// number of bytes.
pub const fn minimum_fe_for_bytes(bytes: usize) -> usize {
    bytes.div_ceil(USABLE_BYTES_PER_FIELD_ELEMENT)
}

/// Calculate the number of field elements required to store the given data.
pub const fn minimum_fe(data: &[u8]) -> usize {
    minimum_fe_for_bytes(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eip4844::{FIELD_ELEMENTS_PER_BLOB, USABLE_BYTES_PER_BLOB};

    #[test]
    fn calc_required_fe() {
        assert_eq!(minimum_fe(&[0u8; 31]), 1);
        assert_eq!(minimum_fe(&[0u8; 32]), 2);
        assert_eq!(minimum_fe(&[0u8; 62]), 2);
        assert_eq!(minimum_fe(&[0u8; 63]), 3);
        assert_eq!(minimum_fe_for_bytes(USABLE_BYTES_PER_BLOB), FIELD_ELEMENTS_PER_BLOB);
    }

    #[test]
    fn calc_is_valid_field_element() {
        assert!(fits_in_fe(&[0u8; 32]));
        assert!(!fits_in_fe(&[0u8; 33]));
        assert!(!fits_in_fe(&[0b1100_0000; 32]));
        assert!(fits_in_fe(&[0b0011_1111; 32]));
    }
}
