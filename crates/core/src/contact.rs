/// Normalize a raw phone value to the Kenyan dialing convention used by the
/// SMS gateway.
///
/// All non-digits are stripped (a leading `+` is remembered and restored).
/// A 10-digit number starting with `0` has the `0` replaced by `254`; a
/// 9-digit number starting with `7` gets `254` prepended. Anything with
/// fewer than 9 digits is rejected.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let has_plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

    if digits.len() < 9 {
        return None;
    }

    let msisdn = if digits.starts_with('0') && digits.len() == 10 {
        format!("254{}", &digits[1..])
    } else if digits.starts_with('7') && digits.len() == 9 {
        format!("254{digits}")
    } else {
        digits
    };

    Some(if has_plus { format!("+{msisdn}") } else { msisdn })
}

/// Shape-only email check (`local@domain`); delivery-level validation is
/// the relay's problem.
pub fn is_valid_email(raw: &str) -> bool {
    let value = raw.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
        && !domain.contains('@')
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, normalize_phone};

    #[test]
    fn kenyan_forms_converge_on_the_same_msisdn() {
        assert_eq!(normalize_phone("0712345678").as_deref(), Some("254712345678"));
        assert_eq!(normalize_phone("712345678").as_deref(), Some("254712345678"));
        assert_eq!(normalize_phone("254712345678").as_deref(), Some("254712345678"));
        assert_eq!(normalize_phone("+254712345678").as_deref(), Some("+254712345678"));
    }

    #[test]
    fn punctuation_is_stripped_before_the_heuristics() {
        assert_eq!(normalize_phone("0712-345 678").as_deref(), Some("254712345678"));
        assert_eq!(normalize_phone("(0712) 345678").as_deref(), Some("254712345678"));
    }

    #[test]
    fn short_numbers_are_rejected() {
        assert_eq!(normalize_phone("12345678"), None);
        assert_eq!(normalize_phone("0712"), None);
        assert_eq!(normalize_phone(""), None);
    }

    #[test]
    fn leading_plus_survives_normalization() {
        assert_eq!(normalize_phone("+0712345678").as_deref(), Some("+254712345678"));
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("jane@example.org"));
        assert!(is_valid_email("  jane.doe@mail.example.org "));
        assert!(!is_valid_email("jane"));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("@example.org"));
        assert!(!is_valid_email("jane@localhost"));
        assert!(!is_valid_email("jane doe@example.org"));
    }
}
