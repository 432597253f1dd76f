//! Data access for companies. List queries and partial updates are assembled
//! through the builders in [`crate::sql`]; this module owns the statement
//! templates and executes them.

use serde::{Deserialize, Serialize};
use sqlx::{Arguments, FromRow, PgPool};

use crate::errors::AppError;
use crate::sql::{self, partial_update, CompanyFilters, SqlValue};

/// camelCase logical names the API speaks, mapped to their storage columns.
const RENAMES: &[(&str, &str)] = &[("numEmployees", "num_employees"), ("logoUrl", "logo_url")];

const SELECT_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRow {
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Sparse PATCH body. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl CompanyPatch {
    /// Flattens the patch into the ordered field map fed to the SET-clause
    /// builder. Field order here fixes placeholder numbering.
    fn into_fields(self) -> Vec<(&'static str, SqlValue)> {
        let mut fields = Vec::new();
        if let Some(v) = self.name {
            fields.push(("name", SqlValue::from(v)));
        }
        if let Some(v) = self.description {
            fields.push(("description", SqlValue::from(v)));
        }
        if let Some(v) = self.num_employees {
            fields.push(("numEmployees", SqlValue::from(v)));
        }
        if let Some(v) = self.logo_url {
            fields.push(("logoUrl", SqlValue::from(v)));
        }
        fields
    }
}

pub async fn create(pool: &PgPool, company: NewCompany) -> Result<CompanyRow, AppError> {
    let duplicate: Option<(String,)> =
        sqlx::query_as("SELECT handle FROM companies WHERE handle = $1")
            .bind(&company.handle)
            .fetch_optional(pool)
            .await?;
    if duplicate.is_some() {
        return Err(AppError::Validation(format!(
            "Duplicate company: {}",
            company.handle
        )));
    }

    let row = sqlx::query_as::<_, CompanyRow>(
        "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING handle, name, description, num_employees, logo_url",
    )
    .bind(&company.handle)
    .bind(&company.name)
    .bind(&company.description)
    .bind(company.num_employees)
    .bind(&company.logo_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Lists companies, narrowed by whatever filters are active. With no active
/// filters the WHERE clause is omitted entirely and every company comes back,
/// always ordered by name.
pub async fn find_all(pool: &PgPool, filters: &CompanyFilters) -> Result<Vec<CompanyRow>, AppError> {
    let fq = filters.build();

    let mut statement = format!("SELECT {SELECT_COLUMNS} FROM companies");
    if !fq.where_clause.is_empty() {
        statement.push_str(" WHERE ");
        statement.push_str(&fq.where_clause);
    }
    statement.push_str(" ORDER BY ");
    statement.push_str(fq.order_by);

    let args = sql::arguments(&fq.values);
    Ok(sqlx::query_as_with::<_, CompanyRow, _>(&statement, args)
        .fetch_all(pool)
        .await?)
}

pub async fn get(pool: &PgPool, handle: &str) -> Result<CompanyRow, AppError> {
    let row = sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM companies WHERE handle = $1"
    ))
    .bind(handle)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| AppError::NotFound(format!("No company: {handle}")))
}

/// Partial update: only the fields present in `patch` change. The handle is
/// bound after the SET values, at placeholder `values.len() + 1`.
pub async fn update(
    pool: &PgPool,
    handle: &str,
    patch: CompanyPatch,
) -> Result<CompanyRow, AppError> {
    let update = partial_update(patch.into_fields(), RENAMES)?;

    let statement = format!(
        "UPDATE companies SET {} WHERE handle = ${} RETURNING {SELECT_COLUMNS}",
        update.set_clause,
        update.values.len() + 1,
    );

    let mut args = sql::arguments(&update.values);
    args.add(handle.to_string());

    let row = sqlx::query_as_with::<_, CompanyRow, _>(&statement, args)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| AppError::NotFound(format!("No company: {handle}")))
}

pub async fn remove(pool: &PgPool, handle: &str) -> Result<(), AppError> {
    let deleted: Option<(String,)> =
        sqlx::query_as("DELETE FROM companies WHERE handle = $1 RETURNING handle")
            .bind(handle)
            .fetch_optional(pool)
            .await?;

    match deleted {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("No company: {handle}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_field_order_is_declaration_order() {
        let patch = CompanyPatch {
            logo_url: Some("http://a.io/x.png".to_string()),
            name: Some("Acme".to_string()),
            ..Default::default()
        };
        let fields = patch.into_fields();
        assert_eq!(fields[0].0, "name");
        assert_eq!(fields[1].0, "logoUrl");
    }

    #[test]
    fn patch_renames_map_to_storage_columns() {
        let patch = CompanyPatch {
            num_employees: Some(25),
            logo_url: Some("http://a.io/x.png".to_string()),
            ..Default::default()
        };
        let update = partial_update(patch.into_fields(), RENAMES).unwrap();
        assert_eq!(update.set_clause, "\"num_employees\"=$1, \"logo_url\"=$2");
    }

    #[test]
    fn empty_patch_is_no_data() {
        let err = partial_update(CompanyPatch::default().into_fields(), RENAMES).unwrap_err();
        assert!(matches!(err, AppError::NoData));
    }
}
