//! Canonical forms of the national person and organization identifiers

/// Digits of a canonical person key (individual taxpayer number)
pub const PERSON_KEY_DIGITS: usize = 11;
/// Digits of a canonical organization key (company registration number)
pub const ORG_KEY_DIGITS: usize = 14;

/// Strip every non-digit character. No length validation happens here.
pub fn canonicalize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// `11122233344` -> `111.222.333-44`; any other length is returned unchanged
pub fn format_person_key(key: &str) -> String {
    if key.len() != PERSON_KEY_DIGITS || !key.chars().all(|c| c.is_ascii_digit()) {
        return key.to_string();
    }
    format!("{}.{}.{}-{}", &key[0..3], &key[3..6], &key[6..9], &key[9..11])
}

/// `11111111000111` -> `11.111.111/0001-11`; any other length is returned unchanged
pub fn format_org_key(key: &str) -> String {
    if key.len() != ORG_KEY_DIGITS || !key.chars().all(|c| c.is_ascii_digit()) {
        return key.to_string();
    }
    format!(
        "{}.{}.{}/{}-{}",
        &key[0..2],
        &key[2..5],
        &key[5..8],
        &key[8..12],
        &key[12..14]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_strips_punctuation() {
        assert_eq!(canonicalize("111.222.333-44"), "11122233344");
        assert_eq!(canonicalize("AA.111.111/0001-11"), "111111000111");
        assert_eq!(canonicalize(" 12 345 "), "12345");
    }

    #[test]
    fn test_canonicalize_never_fails() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("n/a"), "");
        assert_eq!(canonicalize("١٢٣"), "", "only ASCII digits are kept");
    }

    #[test]
    fn test_format_keys() {
        assert_eq!(format_person_key("11122233344"), "111.222.333-44");
        assert_eq!(format_org_key("11111111000111"), "11.111.111/0001-11");
        assert_eq!(format_person_key("123"), "123");
        assert_eq!(format_org_key(""), "");
    }
}
