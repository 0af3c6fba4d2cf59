use std::sync::LazyLock;

use regex::Regex;

use super::slug::is_valid_slug;
use crate::error::{Error, Result};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s().-]{6,20}$").expect("valid phone regex"));

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));

/// 必填文本字段，去除首尾空白后不能为空
pub fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn slug(value: &str) -> Result<()> {
    if !is_valid_slug(value) {
        return Err(Error::validation(format!(
            "slug `{value}` may only contain lowercase letters, digits and single hyphens"
        )));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<()> {
    if !EMAIL_RE.is_match(value) {
        return Err(Error::validation(format!("`{value}` is not a valid email")));
    }
    Ok(())
}

pub fn phone(value: &str) -> Result<()> {
    if !PHONE_RE.is_match(value) {
        return Err(Error::validation(format!("`{value}` is not a valid phone number")));
    }
    Ok(())
}

pub fn url(value: &str) -> Result<()> {
    if !URL_RE.is_match(value) {
        return Err(Error::validation(format!("`{value}` is not a valid URL")));
    }
    Ok(())
}

/// 媒体引用：完整 URL 或以 `/` 开头的站内路径
pub fn media_ref(value: &str) -> Result<()> {
    if value.starts_with('/') && !value.contains(char::is_whitespace) {
        return Ok(());
    }
    url(value)
}

/// 对可选字段执行校验，`None` 直接通过
pub fn optional<T: AsRef<str>>(value: Option<T>, check: fn(&str) -> Result<()>) -> Result<()> {
    match value {
        Some(v) => check(v.as_ref()),
        None => Ok(()),
    }
}
