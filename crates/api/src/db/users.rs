//! User and access token store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres};

use dscommerce_core::{Email, Role, RoleSet, UserId};

use super::{RepositoryError, UserStore};
use crate::models::{NewAccessToken, NewUser, User, UserCredentials};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    birth_date: Option<NaiveDate>,
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    birth_date: Option<NaiveDate>,
    password_hash: String,
}

fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

/// `PostgreSQL` implementation of [`UserStore`].
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn roles_of(&self, user_id: i64) -> Result<RoleSet, RepositoryError> {
        let authorities: Vec<String> =
            sqlx::query_scalar("SELECT authority FROM shop.user_role WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        authorities
            .iter()
            .map(|a| {
                a.parse::<Role>().map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
                })
            })
            .collect()
    }

    async fn hydrate(&self, row: UserRow) -> Result<User, RepositoryError> {
        let roles = self.roles_of(row.id).await?;
        Ok(User {
            id: UserId::new(row.id),
            name: row.name,
            email: parse_email(&row.email)?,
            phone: row.phone,
            birth_date: row.birth_date,
            roles,
        })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<Postgres, UserRow>(
            r"
            SELECT id, name, email, phone, birth_date
            FROM shop.user
            WHERE id = $1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let row = sqlx::query_as::<Postgres, CredentialsRow>(
            r"
            SELECT id, name, email, phone, birth_date, password_hash
            FROM shop.user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let password_hash = row.password_hash;
        let user = self
            .hydrate(UserRow {
                id: row.id,
                name: row.name,
                email: row.email,
                phone: row.phone,
                birth_date: row.birth_date,
            })
            .await?;

        Ok(Some(UserCredentials {
            user,
            password_hash,
        }))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<Postgres, UserRow>(
            r"
            INSERT INTO shop.user (name, email, phone, birth_date, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, phone, birth_date
            ",
        )
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.phone.as_deref())
        .bind(user.birth_date)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "email already exists"))?;

        for role in user.roles.iter() {
            sqlx::query("INSERT INTO shop.user_role (user_id, authority) VALUES ($1, $2)")
                .bind(row.id)
                .bind(role.authority())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(User {
            id: UserId::new(row.id),
            name: row.name,
            email: parse_email(&row.email)?,
            phone: row.phone,
            birth_date: row.birth_date,
            roles: user.roles.clone(),
        })
    }

    async fn save_access_token(&self, token: &NewAccessToken) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let purged = sqlx::query("DELETE FROM shop.access_token WHERE expires_at <= NOW()")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(
            r"
            INSERT INTO shop.access_token (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(&token.token_hash)
        .bind(token.user_id.as_i64())
        .bind(token.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "token already issued"))?;

        tx.commit().await?;

        if purged > 0 {
            tracing::debug!(purged, "expired access tokens removed");
        }

        Ok(())
    }

    async fn find_user_by_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<Postgres, UserRow>(
            r"
            SELECT u.id, u.name, u.email, u.phone, u.birth_date
            FROM shop.access_token t
            JOIN shop.user u ON u.id = t.user_id
            WHERE t.token_hash = $1 AND t.expires_at > $2
            ",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }
}
