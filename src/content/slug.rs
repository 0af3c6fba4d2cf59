use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

/// 由显示名称生成 URL 安全的 slug
///
/// - 转为小写
/// - 丢弃 `[a-z0-9]`、空白和 `-` 以外的字符
/// - 连续的空白或 `-` 合并为一个 `-`，并去掉首尾的 `-`
///
/// 空名称得到空 slug，由调用方负责校验。不处理唯一性，参见
/// [`crate::storage::unique_slug`]。
///
/// ```ignore
/// assert_eq!(generate_slug("Beach Guides"), "beach-guides");
/// ```
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        }
    }

    slug
}

/// 是否为规范形式的 slug
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// 基于当前毫秒时间的 4 位后缀，用于 slug 冲突时追加
pub fn time_suffix() -> String {
    format!("{:04}", Utc::now().timestamp_millis().rem_euclid(10_000))
}

/// 拼接后缀
pub fn with_suffix(base: &str, suffix: &str) -> String {
    if base.is_empty() {
        suffix.to_string()
    } else {
        format!("{base}-{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug_basic() {
        assert_eq!(generate_slug("Beach Guides"), "beach-guides");
        assert_eq!(generate_slug("  Hidden   Gems of Bali "), "hidden-gems-of-bali");
        assert_eq!(generate_slug("Top 10 Dive Sites!"), "top-10-dive-sites");
    }

    #[test]
    fn test_generate_slug_hyphens_collapse() {
        assert_eq!(generate_slug("Reef - Snorkeling -- Tips"), "reef-snorkeling-tips");
        assert_eq!(generate_slug("-leading and trailing-"), "leading-and-trailing");
    }

    #[test]
    fn test_generate_slug_strips_non_ascii() {
        assert_eq!(generate_slug("Café Münch"), "caf-mnch");
        assert_eq!(generate_slug("海滩指南"), "");
        assert_eq!(generate_slug(""), "");
    }

    #[test]
    fn test_generate_slug_output_is_canonical() {
        let names = [
            "Beach Guides",
            "a  b\tc\nd",
            "--x--",
            "Kyoto: Temples & Tea",
            "100% Real",
            "UPPER lower 123",
        ];

        for name in names {
            let slug = generate_slug(name);
            assert!(is_valid_slug(&slug), "{name:?} -> {slug:?}");
            assert!(!slug.contains("--"));
        }
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("beach-guides"));
        assert!(is_valid_slug("a1"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-beach"));
        assert!(!is_valid_slug("beach--guides"));
        assert!(!is_valid_slug("Beach"));
    }

    #[test]
    fn test_time_suffix_four_digits() {
        let suffix = time_suffix();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(with_suffix("beach-guides", "0042"), "beach-guides-0042");
        assert_eq!(with_suffix("", "0042"), "0042");
    }
}
