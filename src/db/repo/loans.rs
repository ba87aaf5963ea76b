//! Loan operations for the repository: borrows, borrowed books, returns and
//! reminders.

use crate::domain::{
    BookBorrow, BookBorrowDetail, BookReturn, Decimal, LoanReminder, NewBookBorrow, NewBookReturn,
};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{QueryBuilder, Row};

use super::{decimal_column, optional_time_column, time_column, Repository};

const BORROW_COLUMNS: &str =
    "borrow_id, member_id, loan_date, due_date, is_returned, created_at, modified_at";

fn map_borrow(row: &SqliteRow) -> Result<BookBorrow, sqlx::Error> {
    Ok(BookBorrow {
        borrow_id: row.try_get("borrow_id")?,
        member_id: row.try_get("member_id")?,
        loan_date: time_column(row, "loan_date")?,
        due_date: optional_time_column(row, "due_date")?,
        is_returned: row.try_get("is_returned")?,
        created_at: time_column(row, "created_at")?,
        modified_at: time_column(row, "modified_at")?,
    })
}

fn map_borrow_detail(row: &SqliteRow) -> Result<BookBorrowDetail, sqlx::Error> {
    Ok(BookBorrowDetail {
        detail_id: row.try_get("detail_id")?,
        borrow_id: row.try_get("borrow_id")?,
        book_id: row.try_get("book_id")?,
        fine_amount: decimal_column(row, "fine_amount")?,
        created_at: time_column(row, "created_at")?,
        modified_at: time_column(row, "modified_at")?,
    })
}

fn map_return(row: &SqliteRow) -> Result<BookReturn, sqlx::Error> {
    Ok(BookReturn {
        return_id: row.try_get("return_id")?,
        borrow_id: row.try_get("borrow_id")?,
        return_date: time_column(row, "return_date")?,
        fine_amount: decimal_column(row, "fine_amount")?,
        paid_amount: decimal_column(row, "paid_amount")?,
        refund_amount: decimal_column(row, "refund_amount")?,
    })
}

fn map_reminder(row: &SqliteRow) -> Result<LoanReminder, sqlx::Error> {
    Ok(LoanReminder {
        reminder_id: row.try_get("reminder_id")?,
        borrow_id: row.try_get("borrow_id")?,
        sent_date: time_column(row, "sent_date")?,
        message: row.try_get("message")?,
    })
}

impl Repository {
    // =========================================================================
    // Borrow operations
    // =========================================================================

    /// Open a loan. `loan_date` defaults to now and `is_returned` to false.
    ///
    /// # Errors
    /// Fails with a foreign key violation if the member does not exist.
    pub async fn insert_borrow(&self, borrow: &NewBookBorrow) -> Result<BookBorrow, sqlx::Error> {
        let sql = format!(
            "INSERT INTO book_borrows (member_id, due_date) VALUES (?, ?) RETURNING {}",
            BORROW_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&sql)
            .bind(borrow.member_id)
            .bind(borrow.due_date.map(|t| t.as_i64()))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        map_borrow(&row)
    }

    pub async fn get_borrow(&self, borrow_id: i64) -> Result<Option<BookBorrow>, sqlx::Error> {
        let sql = format!("SELECT {} FROM book_borrows WHERE borrow_id = ?", BORROW_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(borrow_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_borrow).transpose()
    }

    pub async fn list_borrows_for_member(
        &self,
        member_id: i64,
    ) -> Result<Vec<BookBorrow>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM book_borrows WHERE member_id = ? ORDER BY loan_date ASC, borrow_id ASC",
            BORROW_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(member_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_borrow).collect()
    }

    pub async fn set_borrow_returned(
        &self,
        borrow_id: i64,
        is_returned: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE book_borrows SET is_returned = ? WHERE borrow_id = ?")
            .bind(is_returned)
            .bind(borrow_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a loan. Its details, returns and reminders are deleted with it.
    pub async fn delete_borrow(&self, borrow_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM book_borrows WHERE borrow_id = ?")
            .bind(borrow_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Borrow detail operations
    // =========================================================================

    /// Attach a book to a loan. A `None` fine takes the column default.
    pub async fn insert_borrow_detail(
        &self,
        borrow_id: i64,
        book_id: i64,
        fine_amount: Option<Decimal>,
    ) -> Result<BookBorrowDetail, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO book_borrow_details (borrow_id, book_id");
        if fine_amount.is_some() {
            builder.push(", fine_amount");
        }
        builder.push(") VALUES (");
        let mut values = builder.separated(", ");
        values.push_bind(borrow_id);
        values.push_bind(book_id);
        if let Some(fine) = fine_amount {
            values.push_bind(fine.to_canonical_string());
        }
        builder.push(
            ") RETURNING detail_id, borrow_id, book_id, fine_amount, created_at, modified_at",
        );

        let mut tx = self.pool.begin().await?;
        let row = builder.build().fetch_one(&mut *tx).await?;
        tx.commit().await?;
        map_borrow_detail(&row)
    }

    pub async fn set_borrow_detail_fine(
        &self,
        detail_id: i64,
        fine_amount: Decimal,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE book_borrow_details SET fine_amount = ? WHERE detail_id = ?")
                .bind(fine_amount.to_canonical_string())
                .bind(detail_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_borrow_details(
        &self,
        borrow_id: i64,
    ) -> Result<Vec<BookBorrowDetail>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT detail_id, borrow_id, book_id, fine_amount, created_at, modified_at
            FROM book_borrow_details
            WHERE borrow_id = ?
            ORDER BY detail_id ASC
            "#,
        )
        .bind(borrow_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_borrow_detail).collect()
    }

    // =========================================================================
    // Return operations
    // =========================================================================

    /// Record a return. Amounts left as `None` take the column default.
    pub async fn insert_return(&self, book_return: &NewBookReturn) -> Result<BookReturn, sqlx::Error> {
        let amounts = [
            ("fine_amount", book_return.fine_amount),
            ("paid_amount", book_return.paid_amount),
            ("refund_amount", book_return.refund_amount),
        ];

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO book_returns (borrow_id");
        for (column, amount) in &amounts {
            if amount.is_some() {
                builder.push(", ");
                builder.push(*column);
            }
        }
        builder.push(") VALUES (");
        let mut values = builder.separated(", ");
        values.push_bind(book_return.borrow_id);
        for amount in amounts.iter().filter_map(|(_, amount)| *amount) {
            values.push_bind(amount.to_canonical_string());
        }
        builder.push(
            ") RETURNING return_id, borrow_id, return_date, fine_amount, paid_amount, refund_amount",
        );

        let mut tx = self.pool.begin().await?;
        let row = builder.build().fetch_one(&mut *tx).await?;
        tx.commit().await?;
        map_return(&row)
    }

    pub async fn list_returns(&self, borrow_id: i64) -> Result<Vec<BookReturn>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT return_id, borrow_id, return_date, fine_amount, paid_amount, refund_amount
            FROM book_returns
            WHERE borrow_id = ?
            ORDER BY return_id ASC
            "#,
        )
        .bind(borrow_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_return).collect()
    }

    // =========================================================================
    // Reminder operations
    // =========================================================================

    pub async fn insert_reminder(
        &self,
        borrow_id: i64,
        message: Option<&str>,
    ) -> Result<LoanReminder, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO loan_reminders (borrow_id, message)
            VALUES (?, ?)
            RETURNING reminder_id, borrow_id, sent_date, message
            "#,
        )
        .bind(borrow_id)
        .bind(message)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        map_reminder(&row)
    }

    pub async fn list_reminders(&self, borrow_id: i64) -> Result<Vec<LoanReminder>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT reminder_id, borrow_id, sent_date, message
            FROM loan_reminders
            WHERE borrow_id = ?
            ORDER BY sent_date ASC, reminder_id ASC
            "#,
        )
        .bind(borrow_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_reminder).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::db::repo::test_support::{setup_test_db, violation_kind};
    use crate::db::repo::Repository;
    use crate::domain::{Decimal, NewBookBorrow, NewBookReturn, NewCatalog, NewMember, TimeMs};
    use sqlx::error::ErrorKind;
    use std::str::FromStr;

    async fn member_and_book(repo: &Repository) -> (i64, i64) {
        let member = repo.insert_member(&NewMember::new("Jo")).await.unwrap();
        let catalog = repo
            .insert_catalog(&NewCatalog::new("Bleak House").with_copies(1, 1))
            .await
            .unwrap();
        let book = repo.insert_book(catalog.catalog_id, "BC-1000").await.unwrap();
        (member.member_id, book.book_id)
    }

    #[tokio::test]
    async fn test_borrow_defaults() {
        let (repo, _temp) = setup_test_db().await;
        let (member_id, _) = member_and_book(&repo).await;

        let borrow = repo
            .insert_borrow(&NewBookBorrow {
                member_id,
                due_date: Some(TimeMs::new(1_900_000_000_000)),
            })
            .await
            .unwrap();

        assert!(!borrow.is_returned);
        assert!(borrow.loan_date.as_i64() > 0);
        assert_eq!(borrow.due_date, Some(TimeMs::new(1_900_000_000_000)));

        assert!(repo.set_borrow_returned(borrow.borrow_id, true).await.unwrap());
        let stored = repo.get_borrow(borrow.borrow_id).await.unwrap().unwrap();
        assert!(stored.is_returned);
        assert_eq!(repo.list_borrows_for_member(member_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_borrow_requires_member() {
        let (repo, _temp) = setup_test_db().await;
        let err = repo
            .insert_borrow(&NewBookBorrow {
                member_id: 404,
                due_date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(violation_kind(&err), ErrorKind::ForeignKeyViolation));
    }

    #[tokio::test]
    async fn test_amount_defaults_and_values() {
        let (repo, _temp) = setup_test_db().await;
        let (member_id, book_id) = member_and_book(&repo).await;
        let borrow = repo
            .insert_borrow(&NewBookBorrow {
                member_id,
                due_date: None,
            })
            .await
            .unwrap();

        let detail = repo
            .insert_borrow_detail(borrow.borrow_id, book_id, None)
            .await
            .unwrap();
        assert!(detail.fine_amount.is_zero());

        assert!(repo
            .set_borrow_detail_fine(detail.detail_id, Decimal::from_str("1.50").unwrap())
            .await
            .unwrap());
        let details = repo.list_borrow_details(borrow.borrow_id).await.unwrap();
        assert_eq!(details[0].fine_amount.to_canonical_string(), "1.5");

        let book_return = repo
            .insert_return(&NewBookReturn {
                borrow_id: borrow.borrow_id,
                fine_amount: Some(Decimal::from_str("1.5").unwrap()),
                paid_amount: Some(Decimal::from_str("2").unwrap()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(book_return.paid_amount.to_string(), "2");
        assert!(book_return.refund_amount.is_zero());
    }

    #[tokio::test]
    async fn test_deleting_loan_cascades_to_children() {
        let (repo, _temp) = setup_test_db().await;
        let (member_id, book_id) = member_and_book(&repo).await;
        let borrow = repo
            .insert_borrow(&NewBookBorrow {
                member_id,
                due_date: None,
            })
            .await
            .unwrap();

        repo.insert_borrow_detail(borrow.borrow_id, book_id, None)
            .await
            .unwrap();
        repo.insert_return(&NewBookReturn {
            borrow_id: borrow.borrow_id,
            ..Default::default()
        })
        .await
        .unwrap();
        repo.insert_reminder(borrow.borrow_id, Some("Due tomorrow"))
            .await
            .unwrap();

        assert!(repo.delete_borrow(borrow.borrow_id).await.unwrap());

        assert!(repo.get_borrow(borrow.borrow_id).await.unwrap().is_none());
        assert!(repo
            .list_borrow_details(borrow.borrow_id)
            .await
            .unwrap()
            .is_empty());
        assert!(repo.list_returns(borrow.borrow_id).await.unwrap().is_empty());
        assert!(repo.list_reminders(borrow.borrow_id).await.unwrap().is_empty());

        // The borrowed book itself is untouched.
        assert!(repo.get_book(book_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_borrowed_book_cannot_be_deleted() {
        let (repo, _temp) = setup_test_db().await;
        let (member_id, book_id) = member_and_book(&repo).await;
        let borrow = repo
            .insert_borrow(&NewBookBorrow {
                member_id,
                due_date: None,
            })
            .await
            .unwrap();
        repo.insert_borrow_detail(borrow.borrow_id, book_id, None)
            .await
            .unwrap();

        let err = repo.delete_book(book_id).await.unwrap_err();
        assert!(matches!(violation_kind(&err), ErrorKind::ForeignKeyViolation));
    }
}
