//! Stable machine-readable codes for the crate's error enums.
//!
//! Hosts surface `to_string()` to users and switch on `error_code()`.

pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}
