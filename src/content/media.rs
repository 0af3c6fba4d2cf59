use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Patch, validate};
use crate::error::{Error, Result};

/// 媒体文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Video,
    Document,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Video => "video",
            FileType::Document => "document",
        }
    }

    /// 根据 MIME 类型推断，无法识别的归为文档
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next() {
            Some("image") => FileType::Image,
            Some("video") => FileType::Video,
            _ => FileType::Document,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "image" => Ok(FileType::Image),
            "video" => Ok(FileType::Video),
            "document" => Ok(FileType::Document),
            other => Err(format!("unknown file type: {other}")),
        }
    }
}

super::text_column!(FileType);

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MediaItem {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: FileType,
    pub mime_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 上传完成后登记的媒体元数据，文件写入由上传方负责
#[derive(Debug, Clone, Deserialize)]
pub struct NewMedia {
    pub filename: String,
    pub original_filename: String,
    /// 相对于媒体根目录的路径
    pub file_path: String,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub file_type: Option<FileType>,
    pub mime_type: String,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl NewMedia {
    pub fn validate(&self) -> Result<FileType> {
        validate::required("filename", &self.filename)?;
        validate::required("file_path", &self.file_path)?;
        validate::required("mime_type", &self.mime_type)?;
        if self.file_path.split(['/', '\\']).any(|part| part == "..") {
            return Err(Error::validation("file_path must stay inside the media root"));
        }
        if self.file_size < 0 {
            return Err(Error::validation("file_size must not be negative"));
        }
        Ok(self
            .file_type
            .unwrap_or_else(|| FileType::from_mime(&self.mime_type)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaPatch {
    #[serde(default)]
    pub alt_text: Patch<String>,
    #[serde(default)]
    pub caption: Patch<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_media(path: &str, mime: &str) -> NewMedia {
        NewMedia {
            filename: "beach.jpg".into(),
            original_filename: "IMG_0001.JPG".into(),
            file_path: path.into(),
            file_size: 1024,
            file_type: None,
            mime_type: mime.into(),
            width: None,
            height: None,
            alt_text: None,
            caption: None,
        }
    }

    #[test]
    fn test_file_type_from_mime() {
        assert_eq!(FileType::from_mime("image/png"), FileType::Image);
        assert_eq!(FileType::from_mime("video/mp4"), FileType::Video);
        assert_eq!(FileType::from_mime("application/pdf"), FileType::Document);
    }

    #[test]
    fn test_new_media_validate() {
        assert_eq!(
            new_media("2024/beach.jpg", "image/jpeg").validate().unwrap(),
            FileType::Image
        );
        assert!(new_media("../etc/passwd", "text/plain").validate().is_err());

        let mut explicit = new_media("guide.pdf", "application/octet-stream");
        explicit.file_type = Some(FileType::Document);
        assert_eq!(explicit.validate().unwrap(), FileType::Document);
    }
}
