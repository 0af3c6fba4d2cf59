use std::{path::Path, sync::Arc};

use axum::extract::FromRef;

use crate::storage::DBPool;

/// 媒体文件根目录
#[derive(Debug, Clone)]
pub struct MediaRoot(Arc<Path>);

impl MediaRoot {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(Arc::from(path.as_ref()))
    }
}

impl AsRef<Path> for MediaRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// 应用程序上下文
///
/// [`AppState`] 封装了数据库连接池和媒体根目录，处理函数通过 `State` 按需提取。
#[derive(Clone, FromRef)]
pub struct AppState {
    pool: DBPool,
    media_root: MediaRoot,
}

impl AppState {
    pub fn new(pool: DBPool, media_root: impl AsRef<Path>) -> Self {
        Self {
            pool,
            media_root: MediaRoot::new(media_root),
        }
    }

    /// 获取数据库连接池
    pub fn pool(&self) -> &DBPool {
        &self.pool
    }

    pub fn media_root(&self) -> &Path {
        self.media_root.as_ref()
    }
}
