use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Patch, validate};
use crate::error::Result;

/// 分类，博客分类与商户分类共用同一结构
///
/// `item_count` 为关联的文章或商户数量。
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
}

/// 新建分类或标签，标签忽略 `description`
#[derive(Debug, Clone, Deserialize)]
pub struct NewTerm {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewTerm {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
            description: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate::required("name", &self.name)?;
        validate::optional(self.slug.as_deref(), validate::slug)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Patch<String>,
}

impl TermPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate::required("name", name)?;
        }
        validate::optional(self.slug.as_deref(), validate::slug)
    }
}
