//! Catalog, book and stock adjustment operations for the repository.

use crate::domain::{Adjustment, AdjustmentDetail, Book, Catalog, NewAdjustment, NewCatalog};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{QueryBuilder, Row};

use super::{optional_user_column, time_column, Repository};

const CATALOG_COLUMNS: &str =
    "catalog_id, title, author, isbn, total_copies, available_copies, created_at, modified_at";

fn map_catalog(row: &SqliteRow) -> Result<Catalog, sqlx::Error> {
    Ok(Catalog {
        catalog_id: row.try_get("catalog_id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        isbn: row.try_get("isbn")?,
        total_copies: row.try_get("total_copies")?,
        available_copies: row.try_get("available_copies")?,
        created_at: time_column(row, "created_at")?,
        modified_at: time_column(row, "modified_at")?,
    })
}

fn map_book(row: &SqliteRow) -> Result<Book, sqlx::Error> {
    Ok(Book {
        book_id: row.try_get("book_id")?,
        catalog_id: row.try_get("catalog_id")?,
        barcode: row.try_get("barcode")?,
        created_at: time_column(row, "created_at")?,
    })
}

fn map_adjustment(row: &SqliteRow) -> Result<Adjustment, sqlx::Error> {
    Ok(Adjustment {
        adjustment_id: row.try_get("adjustment_id")?,
        catalog_id: row.try_get("catalog_id")?,
        user_id: optional_user_column(row, "user_id")?,
        adjustment_date: time_column(row, "adjustment_date")?,
        reason: row.try_get("reason")?,
    })
}

fn map_adjustment_detail(row: &SqliteRow) -> Result<AdjustmentDetail, sqlx::Error> {
    Ok(AdjustmentDetail {
        detail_id: row.try_get("detail_id")?,
        adjustment_id: row.try_get("adjustment_id")?,
        catalog_id: row.try_get("catalog_id")?,
        quantity_changed: row.try_get("quantity_changed")?,
    })
}

impl Repository {
    // =========================================================================
    // Catalog operations
    // =========================================================================

    /// Insert a catalog title. Copy counters left as `None` take the column
    /// default.
    ///
    /// # Errors
    /// Fails with a check violation if a counter is negative or
    /// `available_copies > total_copies`.
    pub async fn insert_catalog(&self, catalog: &NewCatalog) -> Result<Catalog, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO catalogs (title, author, isbn");
        if catalog.total_copies.is_some() {
            builder.push(", total_copies");
        }
        if catalog.available_copies.is_some() {
            builder.push(", available_copies");
        }

        builder.push(") VALUES (");
        let mut values = builder.separated(", ");
        values.push_bind(catalog.title.clone());
        values.push_bind(catalog.author.clone());
        values.push_bind(catalog.isbn.clone());
        if let Some(total) = catalog.total_copies {
            values.push_bind(total);
        }
        if let Some(available) = catalog.available_copies {
            values.push_bind(available);
        }
        builder.push(") RETURNING ");
        builder.push(CATALOG_COLUMNS);

        let mut tx = self.pool.begin().await?;
        let row = builder.build().fetch_one(&mut *tx).await?;
        tx.commit().await?;
        map_catalog(&row)
    }

    pub async fn get_catalog(&self, catalog_id: i64) -> Result<Option<Catalog>, sqlx::Error> {
        let sql = format!("SELECT {} FROM catalogs WHERE catalog_id = ?", CATALOG_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(catalog_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_catalog).transpose()
    }

    /// Overwrite both copy counters.
    ///
    /// # Errors
    /// Fails with a check violation if the new counters break the copy
    /// invariants; the stored row is left unchanged.
    pub async fn set_catalog_copies(
        &self,
        catalog_id: i64,
        total_copies: i64,
        available_copies: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE catalogs SET total_copies = ?, available_copies = ? WHERE catalog_id = ?",
        )
        .bind(total_copies)
        .bind(available_copies)
        .bind(catalog_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a catalog title. Wishlist entries go with it.
    ///
    /// # Errors
    /// Fails with a foreign key violation while books or adjustments refer to it.
    pub async fn delete_catalog(&self, catalog_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM catalogs WHERE catalog_id = ?")
            .bind(catalog_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Book operations
    // =========================================================================

    /// Register a physical copy.
    ///
    /// # Errors
    /// Fails with a unique violation if the barcode is already used.
    pub async fn insert_book(&self, catalog_id: i64, barcode: &str) -> Result<Book, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO books (catalog_id, barcode)
            VALUES (?, ?)
            RETURNING book_id, catalog_id, barcode, created_at
            "#,
        )
        .bind(catalog_id)
        .bind(barcode)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        map_book(&row)
    }

    pub async fn get_book(&self, book_id: i64) -> Result<Option<Book>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT book_id, catalog_id, barcode, created_at FROM books WHERE book_id = ?",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_book).transpose()
    }

    pub async fn find_book_by_barcode(&self, barcode: &str) -> Result<Option<Book>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT book_id, catalog_id, barcode, created_at FROM books WHERE barcode = ?",
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_book).transpose()
    }

    pub async fn list_books(&self, catalog_id: i64) -> Result<Vec<Book>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT book_id, catalog_id, barcode, created_at
            FROM books
            WHERE catalog_id = ?
            ORDER BY book_id ASC
            "#,
        )
        .bind(catalog_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_book).collect()
    }

    /// Delete a book.
    ///
    /// # Errors
    /// Fails with a foreign key violation while any loan detail, purchase,
    /// purchase detail or visit log item refers to it.
    pub async fn delete_book(&self, book_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE book_id = ?")
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Adjustment operations
    // =========================================================================

    pub async fn insert_adjustment(
        &self,
        adjustment: &NewAdjustment,
    ) -> Result<Adjustment, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO adjustments (catalog_id, user_id, reason)
            VALUES (?, ?, ?)
            RETURNING adjustment_id, catalog_id, user_id, adjustment_date, reason
            "#,
        )
        .bind(adjustment.catalog_id)
        .bind(adjustment.user_id.as_ref().map(|id| id.as_str()))
        .bind(adjustment.reason.as_deref())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        map_adjustment(&row)
    }

    pub async fn get_adjustment(
        &self,
        adjustment_id: i64,
    ) -> Result<Option<Adjustment>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT adjustment_id, catalog_id, user_id, adjustment_date, reason
            FROM adjustments
            WHERE adjustment_id = ?
            "#,
        )
        .bind(adjustment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_adjustment).transpose()
    }

    /// Delete an adjustment and its details.
    pub async fn delete_adjustment(&self, adjustment_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM adjustments WHERE adjustment_id = ?")
            .bind(adjustment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_adjustment_detail(
        &self,
        adjustment_id: i64,
        catalog_id: i64,
        quantity_changed: i64,
    ) -> Result<AdjustmentDetail, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO adjustment_details (adjustment_id, catalog_id, quantity_changed)
            VALUES (?, ?, ?)
            RETURNING detail_id, adjustment_id, catalog_id, quantity_changed
            "#,
        )
        .bind(adjustment_id)
        .bind(catalog_id)
        .bind(quantity_changed)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        map_adjustment_detail(&row)
    }

    pub async fn list_adjustment_details(
        &self,
        adjustment_id: i64,
    ) -> Result<Vec<AdjustmentDetail>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT detail_id, adjustment_id, catalog_id, quantity_changed
            FROM adjustment_details
            WHERE adjustment_id = ?
            ORDER BY detail_id ASC
            "#,
        )
        .bind(adjustment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_adjustment_detail).collect()
    }
}
