use serde::{Deserialize, Deserializer};

/// 可空字段的局部更新
///
/// - 字段缺省：[`Patch::Keep`]，保持原值
/// - 显式 `null`：[`Patch::Clear`]，写入 `NULL`
/// - 其他值：[`Patch::Set`]
///
/// 字段上需要配合 `#[serde(default)]` 使用，缺省时才会得到 `Keep`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// 需要写入时返回 `Some(新值)`，保持原值时返回 `None`
    pub fn into_update(self) -> Option<Option<T>> {
        match self {
            Patch::Keep => None,
            Patch::Clear => Some(None),
            Patch::Set(v) => Some(Some(v)),
        }
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Keep => Patch::Keep,
            Patch::Clear => Patch::Clear,
            Patch::Set(v) => Patch::Set(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Keep => Patch::Keep,
            Patch::Clear => Patch::Clear,
            Patch::Set(v) => Patch::Set(f(v)),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Set(v),
            None => Patch::Clear,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default)]
        excerpt: Patch<String>,
        #[serde(default)]
        category_id: Patch<i64>,
        #[serde(default)]
        title: Option<String>,
    }

    #[test]
    fn test_omitted_null_and_value_are_distinct() {
        let payload: Payload =
            serde_json::from_str(r#"{"excerpt": null, "category_id": 7}"#).unwrap();

        assert_eq!(payload.excerpt, Patch::Clear);
        assert_eq!(payload.category_id, Patch::Set(7));
        assert_eq!(payload.title, None);

        let empty: Payload = serde_json::from_str("{}").unwrap();
        assert!(empty.excerpt.is_keep());
        assert!(empty.category_id.is_keep());
    }

    #[test]
    fn test_into_update() {
        assert_eq!(Patch::<i64>::Keep.into_update(), None);
        assert_eq!(Patch::<i64>::Clear.into_update(), Some(None));
        assert_eq!(Patch::Set(3).into_update(), Some(Some(3)));
        assert_eq!(Patch::Set(3).map(|v| v * 2), Patch::Set(6));
    }
}
