use rand::Rng;
use time::{Duration, OffsetDateTime};

pub const CODE_TTL_MINUTES: i64 = 15;

/// Issue a fresh verification code with its expiry instant.
///
/// The code is a uniform 7-digit number, never starting with zero, so it is
/// always exactly 7 characters. Collisions across users are fine: the code is
/// a short-lived shared secret, not an identifier.
pub fn issue_code() -> (String, OffsetDateTime) {
    let code: u32 = rand::thread_rng().gen_range(1_000_000..=9_999_999);
    let expires = OffsetDateTime::now_utc() + Duration::minutes(CODE_TTL_MINUTES);
    (code.to_string(), expires)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_seven_digits_without_leading_zero() {
        for _ in 0..200 {
            let (code, _) = issue_code();
            assert_eq!(code.len(), 7);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn code_is_in_range() {
        for _ in 0..200 {
            let (code, _) = issue_code();
            let n: u32 = code.parse().expect("numeric code");
            assert!((1_000_000..=9_999_999).contains(&n));
        }
    }

    #[test]
    fn expiry_is_fifteen_minutes_out() {
        let before = OffsetDateTime::now_utc();
        let (_, expires) = issue_code();
        let after = OffsetDateTime::now_utc();
        assert!(expires >= before + Duration::minutes(CODE_TTL_MINUTES));
        assert!(expires <= after + Duration::minutes(CODE_TTL_MINUTES));
    }
}
