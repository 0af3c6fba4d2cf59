use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 文章发布状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Scheduled,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "scheduled" => Ok(PostStatus::Scheduled),
            other => Err(format!("unknown post status: {other}")),
        }
    }
}

super::text_column!(PostStatus);

/// 请求中携带的发布意图
///
/// - `status`：目标状态
/// - `publish_date`：定时发布时间
/// - `published`：旧版调用方只传布尔值
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PublishIntent {
    pub status: Option<PostStatus>,
    pub publish_date: Option<DateTime<Utc>>,
    pub published: Option<bool>,
}

/// 需要写入数据库的发布相关字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Publication {
    pub status: PostStatus,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl Publication {
    pub fn draft() -> Self {
        Self {
            status: PostStatus::Draft,
            published: false,
            published_at: None,
        }
    }

    pub fn publish_now(now: DateTime<Utc>) -> Self {
        Self {
            status: PostStatus::Published,
            published: true,
            published_at: Some(now),
        }
    }

    pub fn scheduled_for(at: DateTime<Utc>) -> Self {
        Self {
            status: PostStatus::Scheduled,
            published: false,
            published_at: Some(at),
        }
    }
}

impl PublishIntent {
    /// 是否携带任何发布意图
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.published.is_none()
    }

    /// 计算状态转换结果
    ///
    /// 没有任何意图时返回 `None`，调用方不应修改发布字段。
    ///
    /// | 意图 | 结果 |
    /// |------|------|
    /// | `published` | 立即发布，`published_at = now` |
    /// | `scheduled` 且时间在未来 | 未发布，`published_at = publish_date` |
    /// | `scheduled` 且时间缺失或已过 | 立即发布 |
    /// | `draft` | 未发布，清空 `published_at` |
    /// | 仅 `published: true` | 同 `published` |
    /// | 仅 `published: false` | 同 `draft` |
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<Publication> {
        let status = match (self.status, self.published) {
            (Some(status), _) => status,
            (None, Some(true)) => PostStatus::Published,
            (None, Some(false)) => PostStatus::Draft,
            (None, None) => return None,
        };

        Some(match status {
            PostStatus::Draft => Publication::draft(),
            PostStatus::Published => Publication::publish_now(now),
            PostStatus::Scheduled => match self.publish_date {
                Some(at) if at > now => Publication::scheduled_for(at),
                _ => Publication::publish_now(now),
            },
        })
    }

    /// 新建文章时的发布字段，未携带意图时为草稿
    pub fn resolve_for_create(&self, now: DateTime<Utc>) -> Publication {
        self.resolve(now).unwrap_or_else(Publication::draft)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn intent(status: Option<PostStatus>, publish_date: Option<DateTime<Utc>>) -> PublishIntent {
        PublishIntent {
            status,
            publish_date,
            published: None,
        }
    }

    #[test]
    fn test_published_uses_now() {
        let now = Utc::now();
        let result = intent(Some(PostStatus::Published), None).resolve(now).unwrap();
        assert_eq!(result, Publication::publish_now(now));
    }

    #[test]
    fn test_scheduled_in_future() {
        let now = Utc::now();
        let at = now + Duration::hours(1);
        let result = intent(Some(PostStatus::Scheduled), Some(at)).resolve(now).unwrap();

        assert_eq!(result.status, PostStatus::Scheduled);
        assert!(!result.published);
        assert_eq!(result.published_at, Some(at));
    }

    #[test]
    fn test_scheduled_in_past_publishes_now() {
        let now = Utc::now();
        let at = now - Duration::hours(1);
        let result = intent(Some(PostStatus::Scheduled), Some(at)).resolve(now).unwrap();
        assert_eq!(result, Publication::publish_now(now));

        let missing = intent(Some(PostStatus::Scheduled), None).resolve(now).unwrap();
        assert_eq!(missing, Publication::publish_now(now));

        // 恰好等于当前时间也视为已过
        let exact = intent(Some(PostStatus::Scheduled), Some(now)).resolve(now).unwrap();
        assert!(exact.published);
    }

    #[test]
    fn test_draft_clears_published_at() {
        let now = Utc::now();
        let result = intent(Some(PostStatus::Draft), Some(now)).resolve(now).unwrap();
        assert_eq!(result, Publication::draft());
    }

    #[test]
    fn test_legacy_boolean_payload() {
        let now = Utc::now();
        let legacy = PublishIntent {
            published: Some(true),
            ..Default::default()
        };
        assert_eq!(legacy.resolve(now), Some(Publication::publish_now(now)));

        let unpublish = PublishIntent {
            published: Some(false),
            ..Default::default()
        };
        assert_eq!(unpublish.resolve(now), Some(Publication::draft()));

        // status 优先于旧版布尔值
        let both = PublishIntent {
            status: Some(PostStatus::Draft),
            published: Some(true),
            publish_date: None,
        };
        assert_eq!(both.resolve(now), Some(Publication::draft()));
    }

    #[test]
    fn test_no_intent_leaves_fields_untouched() {
        let now = Utc::now();
        let empty = PublishIntent::default();
        assert!(empty.is_empty());
        assert_eq!(empty.resolve(now), None);
        assert_eq!(empty.resolve_for_create(now), Publication::draft());

        // 只有 publish_date 没有 status 也不算意图
        let date_only = intent(None, Some(now + Duration::hours(2)));
        assert_eq!(date_only.resolve(now), None);
    }

    #[test]
    fn test_intent_deserialize() {
        let intent: PublishIntent = serde_json::from_str(
            r#"{"status": "scheduled", "publish_date": "2030-01-01T08:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(intent.status, Some(PostStatus::Scheduled));
        assert!(intent.publish_date.is_some());

        assert!(serde_json::from_str::<PublishIntent>(r#"{"status": "live"}"#).is_err());
    }
}
