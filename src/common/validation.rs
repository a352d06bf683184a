use std::sync::LazyLock;

use regex::Regex;

use crate::common::app_error::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("phone pattern compiles"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(&value.trim().to_lowercase())
}

/// An absent or empty phone number is valid.
pub fn is_valid_phone(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => true,
        Some(phone) => PHONE_RE.is_match(phone),
    }
}

/// Something that can be missing from a request body.
pub trait Present {
    fn is_present(&self) -> bool;
}

impl Present for Option<String> {
    fn is_present(&self) -> bool {
        self.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl<T> Present for Option<Vec<T>> {
    fn is_present(&self) -> bool {
        self.is_some()
    }
}

macro_rules! present_when_some {
    ($($ty:ty),*) => {
        $(impl Present for Option<$ty> {
            fn is_present(&self) -> bool {
                self.is_some()
            }
        })*
    };
}

present_when_some!(i32, bool, rust_decimal::Decimal);

/// Fails with `Missing required fields: a, b` when any named field is absent.
pub fn require_fields(fields: &[(&str, &dyn Present)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| !value.is_present())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}
