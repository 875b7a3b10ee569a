use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::job::JOB_UPDATE_COLUMNS;
use crate::database::models::{Company, CompanyDetail, Job, JobDetail, JobFilter, JobUpdate, JobValue, NewJob};
use crate::database::sql::sql_for_partial_update;

const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle";
const COMPANY_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

/// Data access for the `jobs` table
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a job and return it with its generated id
    async fn create(&self, data: NewJob) -> Result<Job, DatabaseError>;

    /// All jobs matching `filter`, ordered by title
    async fn find_all(&self, filter: &JobFilter) -> Result<Vec<Job>, DatabaseError>;

    /// One job with its company nested
    async fn get(&self, id: i32) -> Result<JobDetail, DatabaseError>;

    /// Apply a partial update to title, salary and equity
    async fn update(&self, id: i32, data: JobUpdate) -> Result<Job, DatabaseError>;

    async fn remove(&self, id: i32) -> Result<(), DatabaseError>;

    /// Connectivity probe for `/health`
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Read-only access to `companies`
#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn list_companies(&self) -> Result<Vec<Company>, DatabaseError>;

    async fn get_company(&self, handle: &str) -> Result<CompanyDetail, DatabaseError>;
}

pub(crate) fn job_not_found(id: i32) -> DatabaseError {
    DatabaseError::NotFound(format!("No job: {}", id))
}

pub(crate) fn company_not_found(handle: &str) -> DatabaseError {
    DatabaseError::NotFound(format!("No company: {}", handle))
}

/// Postgres-backed store sharing one connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_company(&self, handle: &str) -> Result<Option<Company>, DatabaseError> {
        let sql = format!("SELECT {} FROM companies WHERE handle = $1", COMPANY_COLUMNS);
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(handle)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn create(&self, data: NewJob) -> Result<Job, DatabaseError> {
        let sql = format!(
            "INSERT INTO jobs (company_handle, title, salary, equity) VALUES ($1, $2, $3, $4) RETURNING {}",
            JOB_COLUMNS
        );
        sqlx::query_as::<_, Job>(&sql)
            .bind(&data.company_handle)
            .bind(&data.title)
            .bind(data.salary)
            .bind(data.equity)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    DatabaseError::InvalidInput(format!("No company: {}", data.company_handle))
                }
                sqlx::Error::Database(db) if db.is_check_violation() => {
                    DatabaseError::InvalidInput(format!("Invalid job data: {}", db.message()))
                }
                other => other.into(),
            })
    }

    async fn find_all(&self, filter: &JobFilter) -> Result<Vec<Job>, DatabaseError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<JobValue> = Vec::new();

        if let Some(title) = &filter.title {
            params.push(JobValue::Text(format!("%{}%", title)));
            conditions.push(format!("title ILIKE ${}", params.len()));
        }
        if let Some(min_salary) = filter.min_salary {
            params.push(JobValue::Int(Some(min_salary)));
            conditions.push(format!("salary >= ${}", params.len()));
        }
        if filter.has_equity == Some(true) {
            params.push(JobValue::Decimal(Some(Decimal::ZERO)));
            conditions.push(format!("equity > ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("SELECT {} FROM jobs{} ORDER BY title", JOB_COLUMNS, where_clause);
        tracing::debug!("find_all jobs: {}", sql);

        let mut q = sqlx::query_as::<_, Job>(&sql);
        for p in params {
            q = bind_value(q, p);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: i32) -> Result<JobDetail, DatabaseError> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| job_not_found(id))?;

        let company = self
            .fetch_company(&job.company_handle)
            .await?
            .ok_or_else(|| company_not_found(&job.company_handle))?;

        Ok(JobDetail::new(job, company))
    }

    async fn update(&self, id: i32, data: JobUpdate) -> Result<Job, DatabaseError> {
        let update = sql_for_partial_update(data.into_fields(), JOB_UPDATE_COLUMNS)?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {}",
            update.set_cols,
            update.next_param(),
            JOB_COLUMNS
        );

        let mut q = sqlx::query_as::<_, Job>(&sql);
        for v in update.values {
            q = bind_value(q, v);
        }
        q.bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| job_not_found(id))
    }

    async fn remove(&self, id: i32) -> Result<(), DatabaseError> {
        let deleted: Option<(i32,)> = sqlx::query_as("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        deleted.map(|_| ()).ok_or_else(|| job_not_found(id))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

#[async_trait]
impl CompanyStore for PgStore {
    async fn list_companies(&self) -> Result<Vec<Company>, DatabaseError> {
        let sql = format!("SELECT {} FROM companies ORDER BY name", COMPANY_COLUMNS);
        Ok(sqlx::query_as::<_, Company>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_company(&self, handle: &str) -> Result<CompanyDetail, DatabaseError> {
        let company = self
            .fetch_company(handle)
            .await?
            .ok_or_else(|| company_not_found(handle))?;

        let sql = format!("SELECT {} FROM jobs WHERE company_handle = $1 ORDER BY id", JOB_COLUMNS);
        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(handle)
            .fetch_all(&self.pool)
            .await?;

        Ok(CompanyDetail { company, jobs })
    }
}

fn bind_value<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    v: JobValue,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        JobValue::Text(s) => q.bind(s),
        JobValue::Int(i) => q.bind(i),
        JobValue::Decimal(d) => q.bind(d),
    }
}
