use sqlx::{postgres::PgPoolOptions, PgPool, Result};

pub mod queries;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Pool that connects on first use. Router tests build one without a live database.
#[cfg(test)]
pub fn lazy_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new().max_connections(1).connect_lazy(database_url)
}
