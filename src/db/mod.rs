use std::str::FromStr;
use std::time::Duration;

use log::info;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod crud;
pub mod model;

pub use model::*;

pub type Database = PgPool;

/// 会话级参数，随每个连接下发
///
/// statement_timeout 以毫秒计，超时的查询由服务端取消并报错返回，
/// 不会无限等待。
fn session_options(statement_timeout: Duration) -> [(&'static str, String); 1] {
    [("statement_timeout", statement_timeout.as_millis().to_string())]
}

pub async fn init_db(uri: &str, statement_timeout: Duration) -> Result<Database, sqlx::Error> {
    info!("初始化数据库连接池");

    let options = PgConnectOptions::from_str(uri)?.options(session_options(statement_timeout));
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// 执行数据库迁移，建表和 vector 扩展都是幂等的
pub async fn run_migrations(db: &Database) -> Result<(), sqlx::migrate::MigrateError> {
    info!("检查数据库迁移");
    sqlx::migrate!().run(db).await
}
