//! Data access for user accounts. Passwords enter as plain text exactly once
//! per operation, are rule-checked, hashed with bcrypt, and only the hash is
//! ever stored or compared. No row type carries the hash back out.

use serde::{Deserialize, Serialize};
use sqlx::{Arguments, FromRow, PgPool};

use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::errors::AppError;
use crate::sql::{self, partial_update, SqlValue};

const RENAMES: &[(&str, &str)] = &[("firstName", "first_name"), ("lastName", "last_name")];

const SELECT_COLUMNS: &str = "username, first_name, last_name, email, is_admin";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// A user plus the ids of the jobs they have applied to, the shape the
/// single-user endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithJobs {
    #[serde(flatten)]
    pub user: UserRow,
    pub jobs: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Sparse PATCH body. A supplied password is re-validated and re-hashed
/// before it joins the field map. The admin flag is deliberately not
/// patchable: the route is reachable by the user themselves, and the role
/// is only ever granted by an admin through account creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    fn into_fields(self) -> Result<Vec<(&'static str, SqlValue)>, AppError> {
        let mut fields = Vec::new();
        if let Some(plain) = self.password {
            validate_password(&plain)?;
            fields.push(("password", SqlValue::from(hash_password(&plain)?)));
        }
        if let Some(v) = self.first_name {
            fields.push(("firstName", SqlValue::from(v)));
        }
        if let Some(v) = self.last_name {
            fields.push(("lastName", SqlValue::from(v)));
        }
        if let Some(v) = self.email {
            fields.push(("email", SqlValue::from(v)));
        }
        Ok(fields)
    }
}

/// Creates an account. Admin-created users may themselves be admins;
/// self-registration passes `is_admin: false`.
pub async fn create(pool: &PgPool, user: NewUser) -> Result<UserRow, AppError> {
    validate_password(&user.password)?;

    let duplicate: Option<(String,)> =
        sqlx::query_as("SELECT username FROM users WHERE username = $1")
            .bind(&user.username)
            .fetch_optional(pool)
            .await?;
    if duplicate.is_some() {
        return Err(AppError::Validation(format!(
            "Duplicate username: {}",
            user.username
        )));
    }

    let hashed = hash_password(&user.password)?;

    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username, password, first_name, last_name, email, is_admin) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING username, first_name, last_name, email, is_admin",
    )
    .bind(&user.username)
    .bind(&hashed)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(user.is_admin)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Checks credentials and returns the account on success. Unknown usernames
/// and bad passwords are indistinguishable to the caller.
pub async fn authenticate(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<UserRow, AppError> {
    let found: Option<(String,)> = sqlx::query_as("SELECT password FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    let (hashed,) = found.ok_or(AppError::Unauthorized)?;
    if !verify_password(password, &hashed)? {
        return Err(AppError::Unauthorized);
    }

    get(pool, username).await
}

pub async fn find_all(pool: &PgPool) -> Result<Vec<UserRow>, AppError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM users ORDER BY username"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, username: &str) -> Result<UserRow, AppError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| AppError::NotFound(format!("No user: {username}")))
}

/// Fetches a user together with their job applications.
pub async fn get_with_jobs(pool: &PgPool, username: &str) -> Result<UserWithJobs, AppError> {
    let user = get(pool, username).await?;

    let applied: Vec<(i32,)> =
        sqlx::query_as("SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id")
            .bind(username)
            .fetch_all(pool)
            .await?;

    Ok(UserWithJobs {
        user,
        jobs: applied.into_iter().map(|(id,)| id).collect(),
    })
}

/// Records `username`'s application to job `job_id` and returns the job id.
/// Both the user and the job must exist.
pub async fn apply_to_job(pool: &PgPool, username: &str, job_id: i32) -> Result<i32, AppError> {
    get(pool, username).await?;
    crate::models::job::get(pool, job_id).await?;

    sqlx::query("INSERT INTO applications (username, job_id) VALUES ($1, $2)")
        .bind(username)
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(job_id)
}

/// Replaces a user's password after rule-checking and hashing the new one.
pub async fn update_password(pool: &PgPool, username: &str, plain: &str) -> Result<(), AppError> {
    validate_password(plain)?;
    let hashed = hash_password(plain)?;

    let updated: Option<(String,)> =
        sqlx::query_as("UPDATE users SET password = $1 WHERE username = $2 RETURNING username")
            .bind(&hashed)
            .bind(username)
            .fetch_optional(pool)
            .await?;

    match updated {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("No user: {username}"))),
    }
}

pub async fn update(pool: &PgPool, username: &str, patch: UserPatch) -> Result<UserRow, AppError> {
    let update = partial_update(patch.into_fields()?, RENAMES)?;

    let statement = format!(
        "UPDATE users SET {} WHERE username = ${} RETURNING {SELECT_COLUMNS}",
        update.set_clause,
        update.values.len() + 1,
    );

    let mut args = sql::arguments(&update.values);
    args.add(username.to_string());

    let row = sqlx::query_as_with::<_, UserRow, _>(&statement, args)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| AppError::NotFound(format!("No user: {username}")))
}

pub async fn remove(pool: &PgPool, username: &str) -> Result<(), AppError> {
    let deleted: Option<(String,)> =
        sqlx::query_as("DELETE FROM users WHERE username = $1 RETURNING username")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    match deleted {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("No user: {username}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_translates_camel_case_names() {
        let patch = UserPatch {
            first_name: Some("Aliya".to_string()),
            last_name: Some("Jones".to_string()),
            ..Default::default()
        };
        let update = partial_update(patch.into_fields().unwrap(), RENAMES).unwrap();
        assert_eq!(update.set_clause, "\"first_name\"=$1, \"last_name\"=$2");
    }

    #[test]
    fn patch_body_cannot_carry_admin_flag() {
        // The role is granted only through admin account creation; a PATCH
        // body naming isAdmin must die at deserialization, long before it
        // could reach an UPDATE statement.
        let parsed: Result<UserPatch, _> = serde_json::from_str(r#"{"isAdmin": true}"#);
        assert!(parsed.is_err());

        let parsed: Result<UserPatch, _> =
            serde_json::from_str(r#"{"firstName": "New", "isAdmin": true}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn patch_never_emits_an_admin_assignment() {
        let patch = UserPatch {
            password: Some("Str0ngPass".to_string()),
            first_name: Some("New".to_string()),
            last_name: Some("L".to_string()),
            email: Some("new@email.com".to_string()),
        };
        let update = partial_update(patch.into_fields().unwrap(), RENAMES).unwrap();
        assert!(!update.set_clause.contains("is_admin"));
    }

    #[test]
    fn patch_password_is_hashed_not_passed_through() {
        let patch = UserPatch {
            password: Some("Str0ngPass".to_string()),
            ..Default::default()
        };
        let fields = patch.into_fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "password");
        match &fields[0].1 {
            SqlValue::Text(Some(stored)) => assert_ne!(stored, "Str0ngPass"),
            other => panic!("expected hashed text value, got {other:?}"),
        }
    }

    #[test]
    fn patch_rejects_weak_password() {
        let patch = UserPatch {
            password: Some("weak".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            patch.into_fields().unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
