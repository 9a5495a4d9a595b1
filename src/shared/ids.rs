use getrandom::getrandom;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Random 128-bit identifier rendered as 32 lowercase hex characters.
pub fn new_record_id() -> Result<String, String> {
    let mut bytes = [0u8; 16];
    getrandom(&mut bytes).map_err(|err| format!("failed to read random bytes: {err}"))?;
    Ok(to_hex(&bytes))
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_are_hex_and_distinct() {
        let first = new_record_id().expect("id");
        let second = new_record_id().expect("id");
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
