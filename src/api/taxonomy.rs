use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    content::{Category, NewTerm, Tag, TermPatch},
    error::{Error, Result},
    state::AppState,
    storage::{CategoryKind, DBPool, TaxonomyStore},
};

/// 公开的分类与标签列表。
///
/// - `GET /blog/categories`
/// - `GET /blog/tags`
/// - `GET /directory/categories`
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/blog/categories",
            get(|State(pool): State<DBPool>| list_categories(pool, CategoryKind::Blog)),
        )
        .route("/blog/tags", get(list_tags))
        .route(
            "/directory/categories",
            get(|State(pool): State<DBPool>| list_categories(pool, CategoryKind::Directory)),
        )
}

/// 分类与标签管理接口。
pub fn admin_routes() -> Router<AppState> {
    category_routes("/blog/categories", CategoryKind::Blog)
        .merge(category_routes("/directory/categories", CategoryKind::Directory))
        .route("/blog/tags", get(list_tags).post(create_tag))
        .route(
            "/blog/tags/{id}",
            get(get_tag).put(update_tag).delete(delete_tag),
        )
}

/// 两类分类共用同一组处理函数，由 `kind` 区分。
fn category_routes(prefix: &str, kind: CategoryKind) -> Router<AppState> {
    Router::new()
        .route(
            prefix,
            get(move |State(pool): State<DBPool>| list_categories(pool, kind)).post(
                move |State(pool): State<DBPool>, Json(term): Json<NewTerm>| {
                    create_category(pool, kind, term)
                },
            ),
        )
        .route(
            &format!("{prefix}/{{id}}"),
            get(move |Path(id): Path<i64>, State(pool): State<DBPool>| get_category(pool, kind, id))
                .put(
                    move |Path(id): Path<i64>, State(pool): State<DBPool>, Json(patch): Json<TermPatch>| {
                        update_category(pool, kind, id, patch)
                    },
                )
                .delete(move |Path(id): Path<i64>, State(pool): State<DBPool>| {
                    delete_category(pool, kind, id)
                }),
        )
}

async fn list_categories(pool: DBPool, kind: CategoryKind) -> Result<Json<Vec<Category>>> {
    pool.list_categories(kind).await.map(Json)
}

async fn get_category(pool: DBPool, kind: CategoryKind, id: i64) -> Result<Json<Category>> {
    pool.category_by_id(kind, id)
        .await?
        .map(Json)
        .ok_or(Error::NotFound)
}

async fn create_category(
    pool: DBPool,
    kind: CategoryKind,
    term: NewTerm,
) -> Result<(StatusCode, Json<Category>)> {
    let category = pool.create_category(kind, term).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    pool: DBPool,
    kind: CategoryKind,
    id: i64,
    patch: TermPatch,
) -> Result<Json<Category>> {
    pool.update_category(kind, id, patch)
        .await?
        .map(Json)
        .ok_or(Error::NotFound)
}

async fn delete_category(pool: DBPool, kind: CategoryKind, id: i64) -> Result<StatusCode> {
    match pool.delete_category(kind, id).await? {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(Error::NotFound),
    }
}

async fn list_tags(State(pool): State<DBPool>) -> Result<Json<Vec<Tag>>> {
    pool.list_tags().await.map(Json)
}

async fn get_tag(Path(id): Path<i64>, State(pool): State<DBPool>) -> Result<Json<Tag>> {
    pool.tag_by_id(id).await?.map(Json).ok_or(Error::NotFound)
}

async fn create_tag(
    State(pool): State<DBPool>,
    Json(term): Json<NewTerm>,
) -> Result<(StatusCode, Json<Tag>)> {
    let tag = pool.create_tag(term).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn update_tag(
    Path(id): Path<i64>,
    State(pool): State<DBPool>,
    Json(patch): Json<TermPatch>,
) -> Result<Json<Tag>> {
    pool.update_tag(id, patch)
        .await?
        .map(Json)
        .ok_or(Error::NotFound)
}

async fn delete_tag(Path(id): Path<i64>, State(pool): State<DBPool>) -> Result<StatusCode> {
    match pool.delete_tag(id).await? {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(Error::NotFound),
    }
}
