use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::validate;
use crate::error::{Error, Result};

/// 评分，取值 1 到 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(i16);

impl Rating {
    pub const MIN: i16 = 1;
    pub const MAX: i16 = 5;

    pub fn new(value: i64) -> Result<Self> {
        if !(Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            return Err(Error::validation(format!(
                "rating must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Rating(value as i16))
    }

    pub fn get(&self) -> i16 {
        self.0
    }
}

/// 提交评论
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    /// 先按原始整数接收，再由 [`Rating::new`] 校验
    pub rating: i64,
    pub content: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub user_name: String,
}

impl NewReview {
    pub fn validate(&self) -> Result<Rating> {
        let rating = Rating::new(self.rating)?;
        validate::required("content", &self.content)?;
        validate::required("user_name", &self.user_name)?;
        Ok(rating)
    }
}

/// 商家对评论的回复，每条评论最多一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewResponse {
    pub id: i64,
    pub review_id: i64,
    pub content: String,
    pub respondent_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewResponse {
    pub content: String,
    pub respondent_name: String,
}

impl NewResponse {
    pub fn validate(&self) -> Result<()> {
        validate::required("content", &self.content)?;
        validate::required("respondent_name", &self.respondent_name)
    }
}

/// 评论，附带可选的商家回复
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DirectoryReview {
    pub id: i64,
    pub listing_id: i64,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub rating: i16,
    pub content: String,
    pub helpful_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub response: Option<Json<ReviewResponse>>,
}

/// 举报评论
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
    #[serde(default)]
    pub user_id: Option<i64>,
    pub reason: String,
}

impl NewReport {
    pub fn validate(&self) -> Result<()> {
        validate::required("reason", &self.reason)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewReport {
    pub id: i64,
    pub review_id: i64,
    pub user_id: Option<i64>,
    pub reason: String,
    pub reported_at: DateTime<Utc>,
}

/// 商户评分汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct RatingSummary {
    pub review_count: i64,
    pub average_rating: Option<f64>,
}
