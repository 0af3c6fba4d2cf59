use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Patch, PostStatus, PublishIntent, validate};
use crate::error::Result;

/// 文章标签的简要信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagRef {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// 文章详情
///
/// 包含分类名、作者名以及标签列表。
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub status: PostStatus,
    pub views_count: i64,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// 由二次查询填充
    #[sqlx(skip)]
    pub tags: Vec<TagRef>,
}

/// 新建文章
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    pub author_id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(flatten)]
    pub publish: PublishIntent,
}

impl NewPost {
    pub fn validate(&self) -> Result<()> {
        validate::required("title", &self.title)?;
        validate::optional(self.slug.as_deref(), validate::slug)?;
        validate::optional(self.featured_image.as_deref(), validate::media_ref)?;
        Ok(())
    }
}

/// 文章局部更新
///
/// 只有出现在请求中的字段才会写入。`expected_version` 用于乐观锁。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Patch<String>,
    #[serde(default)]
    pub featured_image: Patch<String>,
    #[serde(default)]
    pub category_id: Patch<i64>,
    #[serde(default)]
    pub meta_title: Patch<String>,
    #[serde(default)]
    pub meta_description: Patch<String>,
    /// `None` 表示不修改标签
    #[serde(default)]
    pub tag_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub expected_version: Option<i32>,
    #[serde(flatten)]
    pub publish: PublishIntent,
}

impl PostPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate::required("title", title)?;
        }
        validate::optional(self.slug.as_deref(), validate::slug)?;
        if let Patch::Set(image) = &self.featured_image {
            validate::media_ref(image)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_deserialize_with_intent() {
        let post: NewPost = serde_json::from_str(
            r#"{
                "title": "Reef Diving in Bali",
                "author_id": 1,
                "tag_ids": [1, 2],
                "status": "published"
            }"#,
        )
        .unwrap();

        assert_eq!(post.title, "Reef Diving in Bali");
        assert_eq!(post.tag_ids, vec![1, 2]);
        assert_eq!(post.publish.status, Some(PostStatus::Published));
        assert!(post.validate().is_ok());
    }

    #[test]
    fn test_new_post_validation() {
        let mut post: NewPost =
            serde_json::from_str(r#"{"title": " ", "author_id": 1}"#).unwrap();
        assert!(post.validate().is_err());

        post.title = "Ok".into();
        post.slug = Some("Not A Slug".into());
        assert!(post.validate().is_err());
    }

    #[test]
    fn test_post_patch_partial() {
        let patch: PostPatch = serde_json::from_str(
            r#"{"excerpt": null, "category_id": 4, "published": true, "expected_version": 2}"#,
        )
        .unwrap();

        assert_eq!(patch.title, None);
        assert_eq!(patch.excerpt, Patch::Clear);
        assert_eq!(patch.category_id, Patch::Set(4));
        assert!(patch.featured_image.is_keep());
        assert_eq!(patch.tag_ids, None);
        assert_eq!(patch.publish.published, Some(true));
        assert_eq!(patch.expected_version, Some(2));
    }
}
