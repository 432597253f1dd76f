//! Data access for job postings. Same shape as the company model: statement
//! templates here, fragment assembly in [`crate::sql`].

use serde::{Deserialize, Serialize};
use sqlx::{Arguments, FromRow, PgPool};

use crate::errors::AppError;
use crate::sql::{self, partial_update, JobFilters, SqlValue};

const RENAMES: &[(&str, &str)] = &[("companyHandle", "company_handle")];

const SELECT_COLUMNS: &str = "id, title, salary, equity, company_handle";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

/// Sparse PATCH body. The posting's id is immutable and not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobPatch {
    pub title: Option<String>,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: Option<String>,
}

impl JobPatch {
    fn into_fields(self) -> Vec<(&'static str, SqlValue)> {
        let mut fields = Vec::new();
        if let Some(v) = self.title {
            fields.push(("title", SqlValue::from(v)));
        }
        if let Some(v) = self.salary {
            fields.push(("salary", SqlValue::from(v)));
        }
        if let Some(v) = self.equity {
            fields.push(("equity", SqlValue::from(v)));
        }
        if let Some(v) = self.company_handle {
            fields.push(("companyHandle", SqlValue::from(v)));
        }
        fields
    }
}

pub async fn create(pool: &PgPool, job: NewJob) -> Result<JobRow, AppError> {
    let duplicate: Option<(String,)> = sqlx::query_as(
        "SELECT title FROM jobs WHERE title = $1 AND company_handle = $2",
    )
    .bind(&job.title)
    .bind(&job.company_handle)
    .fetch_optional(pool)
    .await?;
    if duplicate.is_some() {
        return Err(AppError::Validation(format!("Duplicate job: {}", job.title)));
    }

    let row = sqlx::query_as::<_, JobRow>(
        "INSERT INTO jobs (title, salary, equity, company_handle) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, title, salary, equity, company_handle",
    )
    .bind(&job.title)
    .bind(job.salary)
    .bind(job.equity)
    .bind(&job.company_handle)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Lists jobs, narrowed by active filters, always ordered by title.
pub async fn find_all(pool: &PgPool, filters: &JobFilters) -> Result<Vec<JobRow>, AppError> {
    let fq = filters.build();

    let mut statement = format!("SELECT {SELECT_COLUMNS} FROM jobs");
    if !fq.where_clause.is_empty() {
        statement.push_str(" WHERE ");
        statement.push_str(&fq.where_clause);
    }
    statement.push_str(" ORDER BY ");
    statement.push_str(fq.order_by);

    let args = sql::arguments(&fq.values);
    Ok(sqlx::query_as_with::<_, JobRow, _>(&statement, args)
        .fetch_all(pool)
        .await?)
}

pub async fn get(pool: &PgPool, id: i32) -> Result<JobRow, AppError> {
    let row = sqlx::query_as::<_, JobRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM jobs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| AppError::NotFound(format!("No job with id of: {id}")))
}

pub async fn update(pool: &PgPool, id: i32, patch: JobPatch) -> Result<JobRow, AppError> {
    let update = partial_update(patch.into_fields(), RENAMES)?;

    let statement = format!(
        "UPDATE jobs SET {} WHERE id = ${} RETURNING {SELECT_COLUMNS}",
        update.set_clause,
        update.values.len() + 1,
    );

    let mut args = sql::arguments(&update.values);
    args.add(id);

    let row = sqlx::query_as_with::<_, JobRow, _>(&statement, args)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| AppError::NotFound(format!("No job with id of: {id}")))
}

pub async fn remove(pool: &PgPool, id: i32) -> Result<(), AppError> {
    let deleted: Option<(i32,)> = sqlx::query_as("DELETE FROM jobs WHERE id = $1 RETURNING id")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match deleted {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("No job with id of: {id}"))),
    }
}
