use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use super::company::Company;

/// Field-level validation failures keyed by JSON field name
pub type FieldErrors = HashMap<String, String>;

/// Fields a partial update may touch, with their column names
pub const JOB_UPDATE_COLUMNS: &[(&str, &str)] = &[
    ("title", "title"),
    ("salary", "salary"),
    ("equity", "equity"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// A job with its company expanded in place of `companyHandle`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetail {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company: Company,
}

impl JobDetail {
    pub fn new(job: Job, company: Company) -> Self {
        Self {
            id: job.id,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl NewJob {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_title(&self.title, &mut errors);
        check_salary(self.salary, &mut errors);
        check_equity(self.equity, &mut errors);
        if self.company_handle.trim().is_empty() {
            errors.insert("companyHandle".to_string(), "must not be empty".to_string());
        }
        finish(errors)
    }
}

/// Sparse update; `Some(None)` clears a nullable column
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    // `title` is NOT NULL, so an explicit null fails to deserialize
    #[serde(default, deserialize_with = "deserialize_some")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub equity: Option<Option<Decimal>>,
}

impl JobUpdate {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &self.title {
            check_title(title, &mut errors);
        }
        check_salary(self.salary.flatten(), &mut errors);
        check_equity(self.equity.flatten(), &mut errors);
        finish(errors)
    }

    /// Present fields in declaration order
    pub fn into_fields(self) -> Vec<(&'static str, JobValue)> {
        let mut fields = Vec::new();
        if let Some(title) = self.title {
            fields.push(("title", JobValue::Text(title)));
        }
        if let Some(salary) = self.salary {
            fields.push(("salary", JobValue::Int(salary)));
        }
        if let Some(equity) = self.equity {
            fields.push(("equity", JobValue::Decimal(equity)));
        }
        fields
    }
}

/// Listing filters; every supplied filter is ANDed
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    pub has_equity: Option<bool>,
}

impl JobFilter {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if matches!(self.min_salary, Some(s) if s < 0) {
            errors.insert("minSalary".to_string(), "must be at least 0".to_string());
        }
        finish(errors)
    }

    /// Whether `job` satisfies this filter, mirroring the SQL predicates
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(title) = &self.title {
            if !job.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if let Some(min) = self.min_salary {
            if !matches!(job.salary, Some(s) if s >= min) {
                return false;
            }
        }
        if self.has_equity == Some(true) && !matches!(job.equity, Some(e) if e > Decimal::ZERO) {
            return false;
        }
        true
    }
}

/// Typed value bound to a job column placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum JobValue {
    Text(String),
    Int(Option<i32>),
    Decimal(Option<Decimal>),
}

fn check_title(title: &str, errors: &mut FieldErrors) {
    if title.trim().is_empty() {
        errors.insert("title".to_string(), "must not be empty".to_string());
    }
}

fn check_salary(salary: Option<i32>, errors: &mut FieldErrors) {
    if matches!(salary, Some(s) if s < 0) {
        errors.insert("salary".to_string(), "must be at least 0".to_string());
    }
}

fn check_equity(equity: Option<Decimal>, errors: &mut FieldErrors) {
    if matches!(equity, Some(e) if e < Decimal::ZERO || e > Decimal::ONE) {
        errors.insert("equity".to_string(), "must be between 0 and 1".to_string());
    }
}

fn finish(errors: FieldErrors) -> Result<(), FieldErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// Distinguishes an explicit `null` from an absent key
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
