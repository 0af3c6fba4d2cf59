use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use axum_extra::extract::Query;

use crate::{
    content::{MediaItem, MediaPatch, NewMedia},
    error::{Error, Result},
    state::{AppState, MediaRoot},
    storage::{DBPool, MediaFilter, MediaStore, Page},
};

/// 媒体库管理接口。
///
/// - `GET|POST /media`：列表与登记
/// - `GET|PUT|DELETE /media/{id}`：详情、修改说明文字、删除记录与文件
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/media", get(list).post(create))
        .route("/media/{id}", get(get_one).put(update).delete(remove))
}

async fn list(Query(filter): Query<MediaFilter>, State(pool): State<DBPool>) -> Result<Json<Page<MediaItem>>> {
    pool.list_media(&filter).await.map(Json)
}

async fn get_one(Path(id): Path<i64>, State(pool): State<DBPool>) -> Result<Json<MediaItem>> {
    pool.media_by_id(id).await?.map(Json).ok_or(Error::NotFound)
}

async fn create(
    State(pool): State<DBPool>,
    Json(media): Json<NewMedia>,
) -> Result<(StatusCode, Json<MediaItem>)> {
    let media = pool.create_media(media).await?;
    Ok((StatusCode::CREATED, Json(media)))
}

async fn update(
    Path(id): Path<i64>,
    State(pool): State<DBPool>,
    Json(patch): Json<MediaPatch>,
) -> Result<Json<MediaItem>> {
    pool.update_media(id, patch)
        .await?
        .map(Json)
        .ok_or(Error::NotFound)
}

async fn remove(
    Path(id): Path<i64>,
    State(pool): State<DBPool>,
    State(root): State<MediaRoot>,
) -> Result<StatusCode> {
    match pool.delete_media(id, root.as_ref()).await? {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(Error::NotFound),
    }
}
