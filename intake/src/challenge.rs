//! Registration challenge delivered over SMS.

/// Literal text that precedes the two digit groups.
pub const VERIFICATION_PREFIX: &str = "Your TextSecure verification code: ";

/// Extract the code from a verification SMS.
///
/// The whole body must be `VERIFICATION_PREFIX` followed by two groups of 3–4
/// ASCII digits joined by a hyphen. The code is both groups concatenated.
/// Anything else yields `None`.
pub fn parse_verification_code(body: &str) -> Option<String> {
    let code = body.strip_prefix(VERIFICATION_PREFIX)?;
    let (first, second) = code.split_once('-')?;

    if is_digit_group(first) && is_digit_group(second) {
        Some(format!("{first}{second}"))
    } else {
        None
    }
}

fn is_digit_group(group: &str) -> bool {
    (3..=4).contains(&group.len()) && group.bytes().all(|b| b.is_ascii_digit())
}
