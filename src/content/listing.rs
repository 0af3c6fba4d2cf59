use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ListingImage, LocationData, OpeningHours, Patch, codec, validate};
use crate::error::Result;

/// 价格区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Upscale,
    #[serde(rename = "$$$$")]
    Luxury,
}

impl PriceRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::Budget => "$",
            PriceRange::Moderate => "$$",
            PriceRange::Upscale => "$$$",
            PriceRange::Luxury => "$$$$",
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "$" => Ok(PriceRange::Budget),
            "$$" => Ok(PriceRange::Moderate),
            "$$$" => Ok(PriceRange::Upscale),
            "$$$$" => Ok(PriceRange::Luxury),
            other => Err(format!("unknown price range: {other}")),
        }
    }
}

super::text_column!(PriceRange);

/// 数据库中的商户行，结构化字段尚未解码
#[derive(Debug, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub description: String,
    pub location: String,
    pub location_data: Option<String>,
    pub coordinates: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub price_range: Option<PriceRange>,
    pub hours: Option<String>,
    pub images: Option<String>,
    pub featured: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub review_count: i64,
    pub average_rating: Option<f64>,
}

/// 商户详情，结构化字段已解码
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListing {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub description: String,
    pub location: String,
    pub location_data: Option<LocationData>,
    pub coordinates: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub price_range: Option<PriceRange>,
    pub hours: OpeningHours,
    pub images: Vec<ListingImage>,
    pub featured: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub review_count: i64,
    pub average_rating: Option<f64>,
}

impl From<ListingRow> for DirectoryListing {
    fn from(row: ListingRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            category_id: row.category_id,
            category_name: row.category_name,
            description: row.description,
            location: row.location,
            location_data: row.location_data.map(codec::decode),
            coordinates: row.coordinates,
            website: row.website,
            phone: row.phone,
            email: row.email,
            price_range: row.price_range,
            hours: codec::decode(row.hours),
            images: codec::decode(row.images),
            featured: row.featured,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
            review_count: row.review_count,
            average_rating: row.average_rating,
        }
    }
}

/// 新建商户
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub category_id: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub location_data: Option<LocationData>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub hours: Option<OpeningHours>,
    #[serde(default)]
    pub images: Option<Vec<ListingImage>>,
    #[serde(default)]
    pub featured: bool,
}

impl NewListing {
    /// 校验并规范化位置数据
    ///
    /// 自由文本位置为空时使用结构化地址填充。
    pub fn normalize(mut self) -> Result<Self> {
        validate::required("name", &self.name)?;
        validate::optional(self.slug.as_deref(), validate::slug)?;
        validate_contacts(
            self.website.as_deref(),
            self.phone.as_deref(),
            self.email.as_deref(),
        )?;

        if let Some(data) = self.location_data.take() {
            let data = data.normalize()?;
            if self.location.trim().is_empty() && !data.address.is_empty() {
                self.location = data.address.clone();
            }
            self.location_data = Some(data);
        }
        self.location = self.location.trim().to_string();
        Ok(self)
    }

    pub fn coordinates(&self) -> Option<String> {
        self.location_data.as_ref().and_then(LocationData::coordinates)
    }
}

/// 商户局部更新
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub location_data: Patch<LocationData>,
    #[serde(default)]
    pub website: Patch<String>,
    #[serde(default)]
    pub phone: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub price_range: Patch<PriceRange>,
    #[serde(default)]
    pub hours: Patch<OpeningHours>,
    #[serde(default)]
    pub images: Patch<Vec<ListingImage>>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub expected_version: Option<i32>,
}

impl ListingPatch {
    pub fn normalize(mut self) -> Result<Self> {
        if let Some(name) = &self.name {
            validate::required("name", name)?;
        }
        validate::optional(self.slug.as_deref(), validate::slug)?;

        let set = |p: &Patch<String>| match p {
            Patch::Set(v) => Some(v.clone()),
            _ => None,
        };
        validate_contacts(
            set(&self.website).as_deref(),
            set(&self.phone).as_deref(),
            set(&self.email).as_deref(),
        )?;

        if let Patch::Set(data) = self.location_data {
            self.location_data = Patch::Set(data.normalize()?);
        }
        Ok(self)
    }
}

fn validate_contacts(website: Option<&str>, phone: Option<&str>, email: Option<&str>) -> Result<()> {
    validate::optional(website, validate::url)?;
    validate::optional(phone, validate::phone)?;
    validate::optional(email, validate::email)?;
    Ok(())
}
