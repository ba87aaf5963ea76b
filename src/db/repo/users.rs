//! User, role and permission operations for the repository.

use crate::domain::{NewUser, Permission, Role, User, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{time_column, Repository};

fn map_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        user_name: row.try_get("user_name")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        created_at: time_column(row, "created_at")?,
        modified_at: time_column(row, "modified_at")?,
    })
}

impl Repository {
    /// Insert a user. `created_at`/`modified_at` come from column defaults.
    ///
    /// # Errors
    /// Fails with a unique violation if the user name is taken.
    pub async fn insert_user(&self, user: &NewUser) -> Result<User, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, user_name, email, full_name)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_name, email, full_name, created_at, modified_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.user_name)
        .bind(user.email.as_deref())
        .bind(user.full_name.as_deref())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        map_user(&row)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, user_name, email, full_name, created_at, modified_at FROM users WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user).transpose()
    }

    /// Change a user's email. Returns false if the user does not exist.
    pub async fn update_user_email(
        &self,
        id: &UserId,
        email: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET email = ? WHERE id = ?")
            .bind(email)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a user.
    ///
    /// # Errors
    /// Fails with a foreign key violation while a member still links to the
    /// user. Adjustments made by the user lose their `user_id` instead.
    pub async fn delete_user(&self, id: &UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_role(&self, role: &Role) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO roles (id, name) VALUES (?, ?)")
            .bind(&role.id)
            .bind(&role.name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, sqlx::Error> {
        let rows = sqlx::query("SELECT id, name FROM roles ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Role {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    pub async fn insert_permission(
        &self,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<Permission, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO permissions (claim_type, claim_value)
            VALUES (?, ?)
            RETURNING id, claim_type, claim_value
            "#,
        )
        .bind(claim_type)
        .bind(claim_value)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Permission {
            id: row.try_get("id")?,
            claim_type: row.try_get("claim_type")?,
            claim_value: row.try_get("claim_value")?,
        })
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, sqlx::Error> {
        let rows = sqlx::query("SELECT id, claim_type, claim_value FROM permissions ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Permission {
                    id: row.try_get("id")?,
                    claim_type: row.try_get("claim_type")?,
                    claim_value: row.try_get("claim_value")?,
                })
            })
            .collect()
    }
}
