//! Purchase and purchase line item operations for the repository.

use crate::domain::{NewPurchase, NewPurchaseDetail, Purchase, PurchaseDetail};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{QueryBuilder, Row};

use super::{decimal_column, time_column, Repository};

fn map_purchase(row: &SqliteRow) -> Result<Purchase, sqlx::Error> {
    Ok(Purchase {
        purchase_id: row.try_get("purchase_id")?,
        book_id: row.try_get("book_id")?,
        purchase_date: time_column(row, "purchase_date")?,
        cost: decimal_column(row, "cost")?,
        supplier: row.try_get("supplier")?,
    })
}

fn map_purchase_detail(row: &SqliteRow) -> Result<PurchaseDetail, sqlx::Error> {
    Ok(PurchaseDetail {
        detail_id: row.try_get("detail_id")?,
        purchase_id: row.try_get("purchase_id")?,
        book_id: row.try_get("book_id")?,
        quantity: row.try_get("quantity")?,
        unit_price: decimal_column(row, "unit_price")?,
        line_total: decimal_column(row, "line_total")?,
    })
}

impl Repository {
    /// Record a purchase. `purchase_date` defaults to now and an unset cost
    /// to zero.
    pub async fn insert_purchase(&self, purchase: &NewPurchase) -> Result<Purchase, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO purchases (book_id, supplier");
        if purchase.cost.is_some() {
            builder.push(", cost");
        }

        builder.push(") VALUES (");
        let mut values = builder.separated(", ");
        values.push_bind(purchase.book_id);
        values.push_bind(purchase.supplier.clone());
        if let Some(cost) = purchase.cost {
            values.push_bind(cost.to_canonical_string());
        }
        builder.push(") RETURNING purchase_id, book_id, purchase_date, cost, supplier");

        let mut tx = self.pool.begin().await?;
        let row = builder.build().fetch_one(&mut *tx).await?;
        tx.commit().await?;
        map_purchase(&row)
    }

    pub async fn get_purchase(&self, purchase_id: i64) -> Result<Option<Purchase>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT purchase_id, book_id, purchase_date, cost, supplier
            FROM purchases
            WHERE purchase_id = ?
            "#,
        )
        .bind(purchase_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_purchase).transpose()
    }

    /// Delete a purchase and its line items.
    pub async fn delete_purchase(&self, purchase_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM purchases WHERE purchase_id = ?")
            .bind(purchase_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add a line item to a purchase. Unset fields take the column defaults.
    ///
    /// # Errors
    /// Fails with a check violation if `quantity` is not positive.
    pub async fn insert_purchase_detail(
        &self,
        detail: &NewPurchaseDetail,
    ) -> Result<PurchaseDetail, sqlx::Error> {
        let amounts = [
            ("unit_price", detail.unit_price),
            ("line_total", detail.line_total),
        ];

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO purchase_details (purchase_id, book_id");
        if detail.quantity.is_some() {
            builder.push(", quantity");
        }
        for (column, amount) in &amounts {
            if amount.is_some() {
                builder.push(", ");
                builder.push(*column);
            }
        }

        builder.push(") VALUES (");
        let mut values = builder.separated(", ");
        values.push_bind(detail.purchase_id);
        values.push_bind(detail.book_id);
        if let Some(quantity) = detail.quantity {
            values.push_bind(quantity);
        }
        for amount in amounts.iter().filter_map(|(_, amount)| *amount) {
            values.push_bind(amount.to_canonical_string());
        }
        builder.push(
            ") RETURNING detail_id, purchase_id, book_id, quantity, unit_price, line_total",
        );

        let mut tx = self.pool.begin().await?;
        let row = builder.build().fetch_one(&mut *tx).await?;
        tx.commit().await?;
        map_purchase_detail(&row)
    }

    pub async fn list_purchase_details(
        &self,
        purchase_id: i64,
    ) -> Result<Vec<PurchaseDetail>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT detail_id, purchase_id, book_id, quantity, unit_price, line_total
            FROM purchase_details
            WHERE purchase_id = ?
            ORDER BY detail_id ASC
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_purchase_detail).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::db::repo::test_support::{setup_test_db, violation_kind};
    use crate::domain::{Decimal, NewCatalog, NewPurchase, NewPurchaseDetail};
    use sqlx::error::ErrorKind;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_purchase_round_trip_keeps_precision() {
        let (repo, _temp) = setup_test_db().await;
        let catalog = repo.insert_catalog(&NewCatalog::new("Rebecca")).await.unwrap();
        let book = repo.insert_book(catalog.catalog_id, "BC-2000").await.unwrap();

        let purchase = repo
            .insert_purchase(
                &NewPurchase::new(book.book_id)
                    .with_cost(Decimal::from_str("0.1").unwrap() + Decimal::from_str("0.2").unwrap())
                    .with_supplier("Harbor Books"),
            )
            .await
            .unwrap();
        assert_eq!(purchase.cost.to_canonical_string(), "0.3");
        assert_eq!(
            repo.get_purchase(purchase.purchase_id).await.unwrap(),
            Some(purchase)
        );
    }

    #[tokio::test]
    async fn test_unset_purchase_fields_take_column_defaults() {
        let (repo, _temp) = setup_test_db().await;
        let catalog = repo.insert_catalog(&NewCatalog::new("Evelina")).await.unwrap();
        let book = repo.insert_book(catalog.catalog_id, "BC-2004").await.unwrap();

        let purchase = repo.insert_purchase(&NewPurchase::new(book.book_id)).await.unwrap();
        assert!(purchase.cost.is_zero());
        assert_eq!(purchase.supplier, None);

        let detail = repo
            .insert_purchase_detail(&NewPurchaseDetail::new(purchase.purchase_id, book.book_id))
            .await
            .unwrap();
        assert_eq!(detail.quantity, 1);
        assert!(detail.unit_price.is_zero());
        assert!(detail.line_total.is_zero());
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let (repo, _temp) = setup_test_db().await;
        let catalog = repo.insert_catalog(&NewCatalog::new("Oroonoko")).await.unwrap();
        let book = repo.insert_book(catalog.catalog_id, "BC-2001").await.unwrap();
        let purchase = repo
            .insert_purchase(&NewPurchase::new(book.book_id).with_cost(Decimal::zero()))
            .await
            .unwrap();

        let err = repo
            .insert_purchase_detail(
                &NewPurchaseDetail::priced(
                    purchase.purchase_id,
                    book.book_id,
                    0,
                    Decimal::from_str("5").unwrap(),
                )
                .unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(violation_kind(&err), ErrorKind::CheckViolation));
    }

    #[tokio::test]
    async fn test_book_on_purchase_detail_cannot_be_deleted() {
        let (repo, _temp) = setup_test_db().await;
        let catalog = repo.insert_catalog(&NewCatalog::new("Clarissa")).await.unwrap();
        let purchased = repo.insert_book(catalog.catalog_id, "BC-2002").await.unwrap();
        let listed = repo.insert_book(catalog.catalog_id, "BC-2003").await.unwrap();

        let purchase = repo
            .insert_purchase(&NewPurchase::new(purchased.book_id).with_cost(Decimal::from_str("30").unwrap()))
            .await
            .unwrap();
        let detail = repo
            .insert_purchase_detail(
                &NewPurchaseDetail::priced(
                    purchase.purchase_id,
                    listed.book_id,
                    2,
                    Decimal::from_str("15").unwrap(),
                )
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(detail.line_total.to_canonical_string(), "30");

        let err = repo.delete_book(listed.book_id).await.unwrap_err();
        assert!(matches!(violation_kind(&err), ErrorKind::ForeignKeyViolation));
        assert!(repo.get_book(listed.book_id).await.unwrap().is_some());

        // Deleting the purchase removes its line items and frees the book.
        assert!(repo.delete_purchase(purchase.purchase_id).await.unwrap());
        assert!(repo
            .list_purchase_details(purchase.purchase_id)
            .await
            .unwrap()
            .is_empty());
        assert!(repo.delete_book(listed.book_id).await.unwrap());
    }
}
