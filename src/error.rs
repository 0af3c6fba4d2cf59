use std::io;

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 请求数据不合法，消息直接展示给调用方
    #[error("{0}")]
    Validation(String),

    #[error("Not Found")]
    NotFound,

    /// 唯一约束、外键约束或版本号冲突
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),

    #[error(transparent)]
    Codec(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

/// 将数据库约束错误映射为 [`Error::Conflict`]，其余保持为 [`Error::Sqlx`]
///
/// - `23505` 唯一约束冲突
/// - `23503` 外键约束冲突（引用的记录不存在，或仍被引用）
impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            match db.code().as_deref() {
                Some("23505") => {
                    return Error::Conflict(format!("duplicate value violates {constraint}"));
                }
                Some("23503") => {
                    return Error::Conflict(format!("reference violates {constraint}"));
                }
                Some("23514") => {
                    return Error::Validation(format!("value violates {constraint}"));
                }
                _ => {}
            }
        }
        Error::Sqlx(e)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            Error::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Error::Sqlx(e) => {
                tracing::error!(%e, "sqlx error");
                internal()
            }
            Error::Codec(e) => {
                tracing::error!(%e, "json codec error");
                internal()
            }
            Error::Config(e) => {
                tracing::error!(%e, "config error");
                internal()
            }
            Error::Io(e) => {
                tracing::error!(%e, "file io error");
                internal()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (Error::validation("bad"), StatusCode::BAD_REQUEST),
            (Error::NotFound, StatusCode::NOT_FOUND),
            (Error::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                Error::Sqlx(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_row_not_found_stays_sqlx() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::Sqlx(_)));
    }
}
