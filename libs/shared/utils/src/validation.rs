use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9\s\-\.\(\)]{5,18}[0-9]$").expect("valid phone pattern")
});

pub const MAX_EMAIL_LEN: usize = 254;

pub fn validate_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

pub fn validate_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone.trim())
}
