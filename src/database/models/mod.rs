pub mod company;
pub mod job;

pub use company::{Company, CompanyDetail};
pub use job::{FieldErrors, Job, JobDetail, JobFilter, JobUpdate, JobValue, NewJob};
