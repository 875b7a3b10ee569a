//! In-process test harness: a memory-backed store behind the real router.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::RwLock;
use tower::ServiceExt;

use crate::api::{app, AppState};
use crate::auth::{Claims, JwtKeys};
use crate::database::models::job::JOB_UPDATE_COLUMNS;
use crate::database::models::{Company, CompanyDetail, Job, JobDetail, JobFilter, JobUpdate, JobValue, NewJob};
use crate::database::repository::{company_not_found, job_not_found};
use crate::database::sql::sql_for_partial_update;
use crate::database::{CompanyStore, DatabaseError, JobStore};

pub const ADMIN: &str = "admin";
pub const USER: &str = "u1";

const TEST_SECRET: &str = "test-secret";

#[derive(Default)]
struct MemoryData {
    companies: Vec<Company>,
    jobs: Vec<Job>,
    next_id: i32,
}

/// Store with the same observable semantics as `PgStore`
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub async fn add_company(&self, company: Company) {
        self.data.write().await.companies.push(company);
    }

    /// Make `ping` fail as an unreachable database would
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create(&self, data: NewJob) -> Result<Job, DatabaseError> {
        let mut store = self.data.write().await;
        if !store.companies.iter().any(|c| c.handle == data.company_handle) {
            return Err(DatabaseError::InvalidInput(format!("No company: {}", data.company_handle)));
        }

        store.next_id += 1;
        let job = Job {
            id: store.next_id,
            title: data.title,
            salary: data.salary,
            equity: data.equity,
            company_handle: data.company_handle,
        };
        store.jobs.push(job.clone());
        Ok(job)
    }

    async fn find_all(&self, filter: &JobFilter) -> Result<Vec<Job>, DatabaseError> {
        let store = self.data.read().await;
        let mut jobs: Vec<Job> = store.jobs.iter().filter(|j| filter.matches(j)).cloned().collect();
        jobs.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(jobs)
    }

    async fn get(&self, id: i32) -> Result<JobDetail, DatabaseError> {
        let store = self.data.read().await;
        let job = store.jobs.iter().find(|j| j.id == id).cloned().ok_or_else(|| job_not_found(id))?;
        let company = store
            .companies
            .iter()
            .find(|c| c.handle == job.company_handle)
            .cloned()
            .ok_or_else(|| company_not_found(&job.company_handle))?;
        Ok(JobDetail::new(job, company))
    }

    async fn update(&self, id: i32, data: JobUpdate) -> Result<Job, DatabaseError> {
        let fields = data.into_fields();
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let update = sql_for_partial_update(fields, JOB_UPDATE_COLUMNS)?;

        let mut store = self.data.write().await;
        let job = store.jobs.iter_mut().find(|j| j.id == id).ok_or_else(|| job_not_found(id))?;
        for (name, value) in names.into_iter().zip(update.values) {
            match (name, value) {
                ("title", JobValue::Text(title)) => job.title = title,
                ("salary", JobValue::Int(salary)) => job.salary = salary,
                ("equity", JobValue::Decimal(equity)) => job.equity = equity,
                (other, _) => return Err(DatabaseError::InvalidInput(format!("Unknown field: {}", other))),
            }
        }
        Ok(job.clone())
    }

    async fn remove(&self, id: i32) -> Result<(), DatabaseError> {
        let mut store = self.data.write().await;
        let before = store.jobs.len();
        store.jobs.retain(|j| j.id != id);
        if store.jobs.len() == before {
            return Err(job_not_found(id));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn list_companies(&self) -> Result<Vec<Company>, DatabaseError> {
        let mut companies = self.data.read().await.companies.clone();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    async fn get_company(&self, handle: &str) -> Result<CompanyDetail, DatabaseError> {
        let store = self.data.read().await;
        let company = store
            .companies
            .iter()
            .find(|c| c.handle == handle)
            .cloned()
            .ok_or_else(|| company_not_found(handle))?;
        let mut jobs: Vec<Job> = store.jobs.iter().filter(|j| j.company_handle == handle).cloned().collect();
        jobs.sort_by_key(|j| j.id);
        Ok(CompanyDetail { company, jobs })
    }
}

fn company(n: i32) -> Company {
    Company {
        handle: format!("c{}", n),
        name: format!("C{}", n),
        description: format!("Desc{}", n),
        num_employees: Some(n),
        logo_url: Some(format!("http://c{}.img", n)),
    }
}

/// Router wired to a seeded `MemoryStore`: companies c1..c3 and jobs j1..j4
/// (all at c1, salaries 10000..40000, equity 0.1..0.3 and 0 for j4)
pub struct TestApp {
    router: Router,
    state: AppState,
    store: Arc<MemoryStore>,
    keys: JwtKeys,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        for n in 1..=3 {
            store.add_company(company(n)).await;
        }
        for (title, salary, equity) in [("j1", 10000, "0.1"), ("j2", 20000, "0.2"), ("j3", 30000, "0.3"), ("j4", 40000, "0")] {
            let new_job = NewJob {
                title: title.to_string(),
                salary: Some(salary),
                equity: Some(Decimal::from_str(equity).unwrap()),
                company_handle: "c1".to_string(),
            };
            store.create(new_job).await.unwrap();
        }

        let keys = JwtKeys::new(TEST_SECRET, 1).unwrap();
        let state = AppState::new(store.clone(), store.clone(), keys.clone());
        Self {
            router: app(state.clone()),
            state,
            store,
            keys,
        }
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Token for `username`; `ADMIN` gets the admin flag
    pub fn token_for(&self, username: &str) -> String {
        self.keys.create_token(username, username == ADMIN).unwrap()
    }

    pub fn expired_token(&self, username: &str, is_admin: bool) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            username: username.to_string(),
            is_admin,
            iat: now - 7200,
            exp: now - 3600,
        };
        self.keys.sign(&claims).unwrap()
    }

    pub async fn job_id(&self, title: &str) -> i32 {
        self.state
            .jobs
            .find_all(&JobFilter::default())
            .await
            .unwrap()
            .into_iter()
            .find(|j| j.title == title)
            .map(|j| j.id)
            .unwrap()
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>, token: Option<String>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn token(&self, who: Option<&str>) -> Option<String> {
        who.map(|username| self.token_for(username))
    }

    pub async fn get(&self, uri: &str, who: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, self.token(who)).await
    }

    pub async fn post(&self, uri: &str, body: Value, who: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), self.token(who)).await
    }

    pub async fn patch(&self, uri: &str, body: Value, who: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body), self.token(who)).await
    }

    pub async fn delete(&self, uri: &str, who: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None, self.token(who)).await
    }

    pub async fn delete_with_token(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None, Some(token.to_string())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_update_applies_fields_in_order() {
        let app = TestApp::new().await;
        let id = app.job_id("j3").await;

        let update = JobUpdate {
            title: Some("New".to_string()),
            salary: Some(Some(500)),
            equity: Some(Some(Decimal::from_str("0.5").unwrap())),
        };
        let job = app.state().jobs.update(id, update).await.unwrap();
        assert_eq!(job.title, "New");
        assert_eq!(job.salary, Some(500));
        assert_eq!(job.equity.unwrap().to_string(), "0.5");
        assert_eq!(job.company_handle, "c1");
    }

    #[tokio::test]
    async fn memory_update_without_data_is_invalid_input() {
        let app = TestApp::new().await;
        let id = app.job_id("j1").await;

        let err = app.state().jobs.update(id, JobUpdate::default()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidInput(_)));
    }
}
