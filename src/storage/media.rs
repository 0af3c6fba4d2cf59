use std::path::Path;

use sqlx::QueryBuilder;

use super::{
    DBPool,
    filter::{MediaFilter, Page},
    postgres::UpdateSet,
};
use crate::{
    content::{MediaItem, MediaPatch, NewMedia},
    error::{Error, Result},
};

const MEDIA_SELECT: &str = r#"
SELECT m.id, m.filename, m.original_filename, m.file_path, m.file_size, m.file_type,
       m.mime_type, m.width, m.height, m.alt_text, m.caption, m.created_at, m.updated_at
FROM media_items m
"#;

/// 媒体库存储
///
/// 只管理元数据，文件本身由上传方写入媒体根目录，删除时一并移除。
pub trait MediaStore: Send + Sync {
    fn list_media(
        &self,
        filter: &MediaFilter,
    ) -> impl std::future::Future<Output = Result<Page<MediaItem>>> + Send;

    fn media_by_id(&self, id: i64) -> impl std::future::Future<Output = Result<Option<MediaItem>>> + Send;

    fn create_media(&self, media: NewMedia) -> impl std::future::Future<Output = Result<MediaItem>> + Send;

    fn update_media(
        &self,
        id: i64,
        patch: MediaPatch,
    ) -> impl std::future::Future<Output = Result<Option<MediaItem>>> + Send;

    /// 删除记录并移除 `root` 下对应的文件
    ///
    /// 文件已不存在或删除失败只记录日志，不影响结果。
    fn delete_media(
        &self,
        id: i64,
        root: &Path,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl MediaStore for DBPool {
    async fn list_media(&self, filter: &MediaFilter) -> Result<Page<MediaItem>> {
        let pagination = filter.pagination();

        let mut query = QueryBuilder::new(MEDIA_SELECT);
        filter.push_predicate(&mut query);
        query.push(" ORDER BY m.created_at DESC, m.id DESC");
        pagination.push_to(&mut query);
        let items = query.build_query_as::<MediaItem>().fetch_all(self).await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM media_items m");
        filter.push_predicate(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(self).await?;

        Ok(Page::new(items, total, pagination))
    }

    async fn media_by_id(&self, id: i64) -> Result<Option<MediaItem>> {
        let sql = format!("{MEDIA_SELECT} WHERE m.id = $1");
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(self).await?)
    }

    async fn create_media(&self, media: NewMedia) -> Result<MediaItem> {
        let file_type = media.validate()?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO media_items (
                filename, original_filename, file_path, file_size, file_type,
                mime_type, width, height, alt_text, caption
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&media.filename)
        .bind(&media.original_filename)
        .bind(media.file_path.trim_start_matches('/'))
        .bind(media.file_size)
        .bind(file_type)
        .bind(&media.mime_type)
        .bind(media.width)
        .bind(media.height)
        .bind(&media.alt_text)
        .bind(&media.caption)
        .fetch_one(self)
        .await?;

        tracing::info!(id, path = %media.file_path, %file_type, "media registered");
        self.media_by_id(id).await?.ok_or(Error::NotFound)
    }

    async fn update_media(&self, id: i64, patch: MediaPatch) -> Result<Option<MediaItem>> {
        let mut update = UpdateSet::new("UPDATE media_items SET updated_at = now()");
        update
            .set_patch("alt_text", patch.alt_text)
            .set_patch("caption", patch.caption);
        if update.columns() == 0 {
            return self.media_by_id(id).await;
        }

        let result = update.where_id(id).build().execute(self).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.media_by_id(id).await
    }

    async fn delete_media(&self, id: i64, root: &Path) -> Result<bool> {
        let path: Option<String> =
            sqlx::query_scalar("DELETE FROM media_items WHERE id = $1 RETURNING file_path")
                .bind(id)
                .fetch_optional(self)
                .await?;

        let Some(path) = path else {
            return Ok(false);
        };

        let file = root.join(&path);
        if let Err(e) = tokio::fs::remove_file(&file).await {
            tracing::warn!(error = %e, file = %file.display(), "failed to remove media file");
        }
        Ok(true)
    }
}
