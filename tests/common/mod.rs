use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use jobly_api::database::{PgStore, MIGRATOR};

/// A migrated, seeded Postgres schema private to one test
pub struct TestDb {
    pub store: PgStore,
    pub job_ids: Vec<i32>,
    admin: PgPool,
    schema: String,
}

/// Returns `None` (and the caller skips) when DATABASE_URL is not set
pub async fn setup() -> Result<Option<TestDb>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return Ok(None);
    };

    let schema = format!("test_{}", Uuid::new_v4().simple());
    let admin = PgPool::connect(&url).await.context("failed to connect to DATABASE_URL")?;
    sqlx::query(&format!("CREATE SCHEMA \"{}\"", schema))
        .execute(&admin)
        .await?;

    let search_path = schema.clone();
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .after_connect(move |conn, _meta| {
            let sql = format!("SET search_path TO \"{}\"", search_path);
            Box::pin(async move {
                sqlx::query(&sql).execute(conn).await?;
                Ok(())
            })
        })
        .connect(&url)
        .await?;
    MIGRATOR.run(&pool).await?;

    sqlx::query(
        "INSERT INTO companies (handle, name, num_employees, description, logo_url)
         VALUES ('c1', 'C1', 1, 'Desc1', 'http://c1.img'),
                ('c2', 'C2', 2, 'Desc2', 'http://c2.img'),
                ('c3', 'C3', 3, 'Desc3', 'http://c3.img')",
    )
    .execute(&pool)
    .await?;

    let ids: Vec<(i32,)> = sqlx::query_as(
        "INSERT INTO jobs (title, salary, equity, company_handle)
         VALUES ('j1', 10000, '0.1', 'c1'),
                ('j2', 20000, '0.2', 'c1'),
                ('j3', 30000, '0.3', 'c1'),
                ('j4', 40000, '0.4', 'c1')
         RETURNING id",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Some(TestDb {
        store: PgStore::new(pool),
        job_ids: ids.into_iter().map(|(id,)| id).collect(),
        admin,
        schema,
    }))
}

impl TestDb {
    pub async fn teardown(self) -> Result<()> {
        self.store.pool().close().await;
        sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", self.schema))
            .execute(&self.admin)
            .await?;
        self.admin.close().await;
        Ok(())
    }
}
