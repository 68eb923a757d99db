//! Utilities for interpreting node responses.

/// The 4-byte selector of the standard `Error(string)` revert.
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Decode a standard `Error(string)` revert payload into its message.
///
/// Returns `None` for payloads with a different selector, custom errors, or
/// malformed encodings.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    // selector || abi.encode(offset, length, bytes)
    let payload = data.strip_prefix(&ERROR_STRING_SELECTOR[..])?;
    if payload.len() < 64 {
        return None;
    }

    let offset = read_usize_word(&payload[..32])?;
    let length_word = payload.get(offset..offset + 32)?;
    let length = read_usize_word(length_word)?;
    let bytes = payload.get(offset + 32..offset + 32 + length)?;

    String::from_utf8(bytes.to_vec()).ok()
}

/// Read a 32-byte big-endian word as a usize, rejecting values that cannot
/// index a revert payload.
fn read_usize_word(word: &[u8]) -> Option<usize> {
    if word.len() != 32 || word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(buf)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn decodes_error_string() {
        let data = hex!(
            "08c379a0"
            "0000000000000000000000000000000000000000000000000000000000000020"
            "000000000000000000000000000000000000000000000000000000000000001a"
            "4e6f7420656e6f7567682045746865722070726f76696465642e000000000000"
        );
        assert_eq!(decode_revert_reason(&data).as_deref(), Some("Not enough Ether provided."));
    }

    #[test]
    fn rejects_custom_errors() {
        // A custom 4-byte selector with no string payload.
        let data = hex!("deadbeef00000000");
        assert!(decode_revert_reason(&data).is_none());
    }

    #[test]
    fn rejects_truncated_payloads() {
        let data = hex!("08c379a000000020");
        assert!(decode_revert_reason(&data).is_none());
    }
}
