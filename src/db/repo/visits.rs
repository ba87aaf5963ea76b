//! Visit log operations for the repository.

use crate::domain::{LibraryLog, LibraryLogItem, NewLibraryLog, TimeMs, VisitStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

use super::{optional_time_column, time_column, Repository};

const LOG_COLUMNS: &str = "log_id, visitor_name, phone, status, visit_date, approved_at, returned_at";

fn map_log(row: &SqliteRow) -> Result<LibraryLog, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = VisitStatus::from_str(&status).map_err(|e| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: Box::new(e),
    })?;

    Ok(LibraryLog {
        log_id: row.try_get("log_id")?,
        visitor_name: row.try_get("visitor_name")?,
        phone: row.try_get("phone")?,
        status,
        visit_date: time_column(row, "visit_date")?,
        approved_at: optional_time_column(row, "approved_at")?,
        returned_at: optional_time_column(row, "returned_at")?,
    })
}

fn map_log_item(row: &SqliteRow) -> Result<LibraryLogItem, sqlx::Error> {
    Ok(LibraryLogItem {
        item_id: row.try_get("item_id")?,
        log_id: row.try_get("log_id")?,
        book_id: row.try_get("book_id")?,
        returned_at: optional_time_column(row, "returned_at")?,
    })
}

impl Repository {
    /// Open a visit log. Status starts as the column default (`Pending`).
    pub async fn insert_log(&self, log: &NewLibraryLog) -> Result<LibraryLog, sqlx::Error> {
        let sql = format!(
            "INSERT INTO library_logs (visitor_name, phone) VALUES (?, ?) RETURNING {}",
            LOG_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&sql)
            .bind(&log.visitor_name)
            .bind(log.phone.as_deref())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        map_log(&row)
    }

    pub async fn get_log(&self, log_id: i64) -> Result<Option<LibraryLog>, sqlx::Error> {
        let sql = format!("SELECT {} FROM library_logs WHERE log_id = ?", LOG_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(log_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_log).transpose()
    }

    /// Mark a log approved at `at`.
    pub async fn approve_log(&self, log_id: i64, at: TimeMs) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE library_logs SET status = ?, approved_at = ? WHERE log_id = ?")
                .bind(VisitStatus::Approved.as_str())
                .bind(at.as_i64())
                .bind(log_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a log returned at `at`.
    pub async fn mark_log_returned(&self, log_id: i64, at: TimeMs) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE library_logs SET status = ?, returned_at = ? WHERE log_id = ?")
                .bind(VisitStatus::Returned.as_str())
                .bind(at.as_i64())
                .bind(log_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a log and its items.
    pub async fn delete_log(&self, log_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM library_logs WHERE log_id = ?")
            .bind(log_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Hand a book out under a log.
    ///
    /// # Errors
    /// Fails with a unique violation if the book is already on this log.
    pub async fn insert_log_item(
        &self,
        log_id: i64,
        book_id: i64,
    ) -> Result<LibraryLogItem, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO library_log_items (log_id, book_id)
            VALUES (?, ?)
            RETURNING item_id, log_id, book_id, returned_at
            "#,
        )
        .bind(log_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        map_log_item(&row)
    }

    pub async fn mark_log_item_returned(
        &self,
        item_id: i64,
        at: TimeMs,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE library_log_items SET returned_at = ? WHERE item_id = ?")
            .bind(at.as_i64())
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_log_items(&self, log_id: i64) -> Result<Vec<LibraryLogItem>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, log_id, book_id, returned_at
            FROM library_log_items
            WHERE log_id = ?
            ORDER BY item_id ASC
            "#,
        )
        .bind(log_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_log_item).collect()
    }
}
