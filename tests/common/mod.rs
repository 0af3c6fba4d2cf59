#![allow(dead_code)]

use chrono::Utc;
use tokio::sync::OnceCell;
use travelbook::{
    config::Config,
    content::{Category, NewTerm},
    storage::{CategoryKind, DBPool, TaxonomyStore, migrate, new_db_pool},
};

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// 连接 `DATABASE_URL` 指向的数据库，首次调用时执行建表脚本
pub async fn setup() -> DBPool {
    let config = Config::from_env().expect("DATABASE_URL 未设置");
    let pool = new_db_pool(&config).await.expect("连接数据库失败");

    MIGRATED
        .get_or_init(|| async {
            migrate(&pool, "sql/01-CREATE_TABLE.sql")
                .await
                .expect("初始化sql失败");
        })
        .await;
    pool
}

/// 每个测试使用独立的名称，避免多次运行之间互相干扰
pub fn nonce() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("t{nanos:x}")
}

pub async fn create_user(pool: &DBPool, tag: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id")
        .bind(format!("Author {tag}"))
        .bind(format!("{tag}@travelbook.test"))
        .fetch_one(pool)
        .await
        .expect("创建用户失败")
}

pub async fn create_category(pool: &DBPool, kind: CategoryKind, name: &str) -> Category {
    pool.create_category(kind, NewTerm::named(name))
        .await
        .expect("创建分类失败")
}
