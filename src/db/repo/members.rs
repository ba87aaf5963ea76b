//! Member and wishlist operations for the repository.

use crate::domain::{Member, MemberWishlist, NewMember};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{optional_user_column, time_column, Repository};

fn map_member(row: &SqliteRow) -> Result<Member, sqlx::Error> {
    Ok(Member {
        member_id: row.try_get("member_id")?,
        user_id: optional_user_column(row, "user_id")?,
        full_name: row.try_get("full_name")?,
        phone: row.try_get("phone")?,
        join_date: time_column(row, "join_date")?,
        created_at: time_column(row, "created_at")?,
        modified_at: time_column(row, "modified_at")?,
    })
}

fn map_wishlist(row: &SqliteRow) -> Result<MemberWishlist, sqlx::Error> {
    Ok(MemberWishlist {
        wishlist_id: row.try_get("wishlist_id")?,
        member_id: row.try_get("member_id")?,
        catalog_id: row.try_get("catalog_id")?,
        created_at: time_column(row, "created_at")?,
    })
}

impl Repository {
    /// Insert a member. `join_date` defaults to the insert time.
    ///
    /// # Errors
    /// Fails with a foreign key violation if `user_id` names no user.
    pub async fn insert_member(&self, member: &NewMember) -> Result<Member, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO members (user_id, full_name, phone)
            VALUES (?, ?, ?)
            RETURNING member_id, user_id, full_name, phone, join_date, created_at, modified_at
            "#,
        )
        .bind(member.user_id.as_ref().map(|id| id.as_str()))
        .bind(&member.full_name)
        .bind(member.phone.as_deref())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        map_member(&row)
    }

    pub async fn get_member(&self, member_id: i64) -> Result<Option<Member>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT member_id, user_id, full_name, phone, join_date, created_at, modified_at
            FROM members
            WHERE member_id = ?
            "#,
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_member).transpose()
    }

    pub async fn update_member_phone(
        &self,
        member_id: i64,
        phone: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE members SET phone = ? WHERE member_id = ?")
            .bind(phone)
            .bind(member_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a member together with their wishlist.
    ///
    /// # Errors
    /// Fails with a foreign key violation while the member has loans.
    pub async fn delete_member(&self, member_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM members WHERE member_id = ?")
            .bind(member_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add a catalog title to a member's wishlist.
    ///
    /// # Errors
    /// Fails with a unique violation if the title is already on the list.
    pub async fn add_to_wishlist(
        &self,
        member_id: i64,
        catalog_id: i64,
    ) -> Result<MemberWishlist, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO member_wishlists (member_id, catalog_id)
            VALUES (?, ?)
            RETURNING wishlist_id, member_id, catalog_id, created_at
            "#,
        )
        .bind(member_id)
        .bind(catalog_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        map_wishlist(&row)
    }

    pub async fn list_wishlist(&self, member_id: i64) -> Result<Vec<MemberWishlist>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT wishlist_id, member_id, catalog_id, created_at
            FROM member_wishlists
            WHERE member_id = ?
            ORDER BY wishlist_id ASC
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_wishlist).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::db::repo::test_support::{setup_test_db, violation_kind};
    use crate::domain::{NewBookBorrow, NewCatalog, NewMember, NewUser, UserId};
    use sqlx::error::ErrorKind;

    #[tokio::test]
    async fn test_member_defaults() {
        let (repo, _temp) = setup_test_db().await;
        let member = repo.insert_member(&NewMember::new("Dana")).await.unwrap();

        assert_eq!(member.user_id, None);
        assert!(member.join_date.as_i64() > 0);
        assert_eq!(repo.get_member(member.member_id).await.unwrap(), Some(member));
    }

    #[tokio::test]
    async fn test_member_requires_existing_user() {
        let (repo, _temp) = setup_test_db().await;
        let err = repo
            .insert_member(&NewMember::new("Eve").with_user(UserId::generate()))
            .await
            .unwrap_err();
        assert!(matches!(violation_kind(&err), ErrorKind::ForeignKeyViolation));
    }

    #[tokio::test]
    async fn test_linked_user_cannot_be_deleted() {
        let (repo, _temp) = setup_test_db().await;
        let user = repo.insert_user(&NewUser::new("frank")).await.unwrap();
        let member = repo
            .insert_member(&NewMember::new("Frank").with_user(user.id.clone()))
            .await
            .unwrap();

        let err = repo.delete_user(&user.id).await.unwrap_err();
        assert!(matches!(violation_kind(&err), ErrorKind::ForeignKeyViolation));

        assert!(repo.delete_member(member.member_id).await.unwrap());
        assert!(repo.delete_user(&user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_member_with_loans_cannot_be_deleted() {
        let (repo, _temp) = setup_test_db().await;
        let member = repo.insert_member(&NewMember::new("Gina")).await.unwrap();
        repo.insert_borrow(&NewBookBorrow {
            member_id: member.member_id,
            due_date: None,
        })
        .await
        .unwrap();

        let err = repo.delete_member(member.member_id).await.unwrap_err();
        assert!(matches!(violation_kind(&err), ErrorKind::ForeignKeyViolation));
    }

    #[tokio::test]
    async fn test_duplicate_wishlist_entry_rejected() {
        let (repo, _temp) = setup_test_db().await;
        let member = repo.insert_member(&NewMember::new("Hal")).await.unwrap();
        let catalog = repo.insert_catalog(&NewCatalog::new("Dune")).await.unwrap();

        repo.add_to_wishlist(member.member_id, catalog.catalog_id)
            .await
            .unwrap();
        let err = repo
            .add_to_wishlist(member.member_id, catalog.catalog_id)
            .await
            .unwrap_err();
        assert!(matches!(violation_kind(&err), ErrorKind::UniqueViolation));
    }

    #[tokio::test]
    async fn test_wishlist_follows_member_and_catalog() {
        let (repo, _temp) = setup_test_db().await;
        let member = repo.insert_member(&NewMember::new("Ivy")).await.unwrap();
        let kept = repo.insert_catalog(&NewCatalog::new("Emma")).await.unwrap();
        let dropped = repo.insert_catalog(&NewCatalog::new("Ulysses")).await.unwrap();

        repo.add_to_wishlist(member.member_id, kept.catalog_id)
            .await
            .unwrap();
        repo.add_to_wishlist(member.member_id, dropped.catalog_id)
            .await
            .unwrap();

        assert!(repo.delete_catalog(dropped.catalog_id).await.unwrap());
        let remaining = repo.list_wishlist(member.member_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].catalog_id, kept.catalog_id);

        assert!(repo.delete_member(member.member_id).await.unwrap());
        assert!(repo.list_wishlist(member.member_id).await.unwrap().is_empty());
    }
}
