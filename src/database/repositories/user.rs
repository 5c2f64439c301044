use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{Company, User, UserSummary};

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_company(&self, name: &str) -> Result<Company> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO
                companies (id, name, created_at)
            VALUES
                (?, ?, ?)
            RETURNING
                id,
                name,
                created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn create_user(&self, user: &User) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO
                users (
                    id,
                    company_id,
                    login_id,
                    email,
                    name,
                    password_hash,
                    role,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                company_id,
                login_id,
                email,
                name,
                password_hash,
                role,
                created_at,
                updated_at
            "#,
        )
        .bind(user.id)
        .bind(user.company_id)
        .bind(&user.login_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT
                id,
                company_id,
                login_id,
                email,
                name,
                password_hash,
                role,
                created_at,
                updated_at
            FROM
                users
            WHERE
                id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT
                id,
                company_id,
                login_id,
                email,
                name,
                password_hash,
                role,
                created_at,
                updated_at
            FROM
                users
            WHERE
                email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// EMPLOYEE users of one company, name ascending.
    pub async fn company_employees(&self, company_id: Uuid) -> Result<Vec<UserSummary>> {
        let employees = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT
                id,
                name,
                email,
                login_id
            FROM
                users
            WHERE
                company_id = ?
                AND role = 'EMPLOYEE'
            ORDER BY
                name ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    /// How many of the given ids are EMPLOYEE users of the given company.
    /// Used to validate allocation targets against the caller's tenant.
    pub async fn count_company_employees(&self, company_id: Uuid, ids: &[Uuid]) -> Result<i64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!(
            "SELECT COUNT(*) FROM users WHERE company_id = ? AND role = 'EMPLOYEE' AND id IN ({})",
            placeholders
        );

        let mut prepared = sqlx::query_scalar::<_, i64>(&query).bind(company_id);
        for id in ids {
            prepared = prepared.bind(id);
        }

        let count = prepared.fetch_one(&self.pool).await?;

        Ok(count)
    }
}
