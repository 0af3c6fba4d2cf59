use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::Patch;
use crate::error::{Error, Result};

/// 数据库中读取到的结构化字段原始值
///
/// 列可能是 TEXT（尚未解码的 JSON 文本），也可能已经是 JSON 值
/// （例如迁移到 JSONB 之后），解码时两者都接受。
#[derive(Debug, Clone)]
pub enum RawField {
    Absent,
    Text(String),
    Json(Value),
}

impl From<Option<String>> for RawField {
    fn from(value: Option<String>) -> Self {
        value.map_or(RawField::Absent, RawField::Text)
    }
}

impl From<String> for RawField {
    fn from(value: String) -> Self {
        RawField::Text(value)
    }
}

impl From<&str> for RawField {
    fn from(value: &str) -> Self {
        RawField::Text(value.to_string())
    }
}

impl From<Value> for RawField {
    fn from(value: Value) -> Self {
        RawField::Json(value)
    }
}

/// 编码结构化字段，`None` 原样透传
pub fn encode<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value
        .map(|v| serde_json::to_string(v).map_err(Error::from))
        .transpose()
}

/// 编码局部更新中的结构化字段，`Keep` 与 `Clear` 原样保留
pub fn encode_patch<T: Serialize>(patch: Patch<T>) -> Result<Patch<String>> {
    Ok(match patch {
        Patch::Keep => Patch::Keep,
        Patch::Clear => Patch::Clear,
        Patch::Set(value) => Patch::Set(serde_json::to_string(&value)?),
    })
}

/// 解码结构化字段
///
/// - 文本按 JSON 解析
/// - 已解码的 JSON 值直接使用；若是 JSON 字符串则解析其内容
/// - 缺失、空文本或格式错误时记录日志并返回 `T::default()`
pub fn decode<T>(raw: impl Into<RawField>) -> T
where
    T: DeserializeOwned + Default,
{
    let parsed = match raw.into() {
        RawField::Absent => return T::default(),
        RawField::Text(text) if text.trim().is_empty() => return T::default(),
        RawField::Text(text) => serde_json::from_str(&text),
        RawField::Json(Value::Null) => return T::default(),
        RawField::Json(Value::String(text)) => serde_json::from_str(&text),
        RawField::Json(value) => serde_json::from_value(value),
    };

    parsed.unwrap_or_else(|e| {
        tracing::warn!(error = %e, field = std::any::type_name::<T>(), "malformed structured field");
        T::default()
    })
}

/// 星期
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// 单日营业时间，序列化为 `{"open": "09:00", "close": "17:00"}` 或 `"Closed"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DayHoursRepr", into = "DayHoursRepr")]
pub enum DayHours {
    Open { open: String, close: String },
    Closed,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DayHoursRepr {
    Span { open: String, close: String },
    Text(String),
}

impl TryFrom<DayHoursRepr> for DayHours {
    type Error = String;

    fn try_from(repr: DayHoursRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            DayHoursRepr::Span { open, close } => Ok(DayHours::Open { open, close }),
            DayHoursRepr::Text(text) if text.eq_ignore_ascii_case("closed") => Ok(DayHours::Closed),
            DayHoursRepr::Text(text) => Err(format!("unexpected hours value: {text}")),
        }
    }
}

impl From<DayHours> for DayHoursRepr {
    fn from(hours: DayHours) -> Self {
        match hours {
            DayHours::Open { open, close } => DayHoursRepr::Span { open, close },
            DayHours::Closed => DayHoursRepr::Text("Closed".to_string()),
        }
    }
}

/// 一周营业时间
pub type OpeningHours = BTreeMap<Weekday, DayHours>;

/// 商户图片，按展示顺序存放
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingImage {
    pub url: String,
    #[serde(default)]
    pub name: String,
}

/// 商户地理位置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub address: String,
}

impl LocationData {
    /// 规范化位置数据
    ///
    /// 经纬度需同时存在且在合法范围内，地址去除首尾空白。
    pub fn normalize(mut self) -> Result<Self> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(Error::validation("latitude must be between -90 and 90"));
                }
                if !(-180.0..=180.0).contains(&lng) {
                    return Err(Error::validation("longitude must be between -180 and 180"));
                }
            }
            (None, None) => {}
            _ => {
                return Err(Error::validation(
                    "latitude and longitude must be provided together",
                ));
            }
        }
        self.address = self.address.trim().to_string();
        Ok(self)
    }

    /// 冗余存储的 `"lat,lng"` 文本
    pub fn coordinates(&self) -> Option<String> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(format!("{lat},{lng}")),
            _ => None,
        }
    }
}
