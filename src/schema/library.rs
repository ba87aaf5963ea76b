//! The library model: every mapped entity with its defaults, keys and rules.

use super::{ColumnDef, DeleteRule, Schema, TableDef};

/// Build the full library schema.
///
/// Parents are declared before children so the declaration order is also a
/// valid creation order.
pub fn library_schema() -> Schema {
    Schema::new()
        .table(users())
        .table(roles())
        .table(permissions())
        .table(members())
        .table(catalogs())
        .table(books())
        .table(book_borrows())
        .table(book_borrow_details())
        .table(book_returns())
        .table(loan_reminders())
        .table(purchases())
        .table(purchase_details())
        .table(adjustments())
        .table(adjustment_details())
        .table(library_logs())
        .table(library_log_items())
        .table(member_wishlists())
}

fn users() -> TableDef {
    TableDef::new("users")
        .column(ColumnDef::text("id").primary_key())
        .column(ColumnDef::text("user_name"))
        .column(ColumnDef::text("email").nullable())
        .column(ColumnDef::text("full_name").nullable())
        .column(ColumnDef::timestamp("created_at").default_now())
        .column(ColumnDef::timestamp("modified_at").default_now())
        .unique("ux_users_user_name", &["user_name"])
        .touch_on_update("modified_at")
}

// Roles and permissions keep the default mapping.
fn roles() -> TableDef {
    TableDef::new("roles")
        .column(ColumnDef::text("id").primary_key())
        .column(ColumnDef::text("name"))
        .unique("ux_roles_name", &["name"])
}

fn permissions() -> TableDef {
    TableDef::new("permissions")
        .column(ColumnDef::id("id"))
        .column(ColumnDef::text("claim_type"))
        .column(ColumnDef::text("claim_value"))
}

fn members() -> TableDef {
    TableDef::new("members")
        .column(ColumnDef::id("member_id"))
        .column(ColumnDef::text("user_id").nullable())
        .column(ColumnDef::text("full_name"))
        .column(ColumnDef::text("phone").nullable())
        .column(ColumnDef::timestamp("join_date").default_now())
        .column(ColumnDef::timestamp("created_at").default_now())
        .column(ColumnDef::timestamp("modified_at").default_now())
        .references("user_id", "users", "id", DeleteRule::Restrict)
        .touch_on_update("modified_at")
}

fn catalogs() -> TableDef {
    TableDef::new("catalogs")
        .column(ColumnDef::id("catalog_id"))
        .column(ColumnDef::text("title"))
        .column(ColumnDef::text("author").nullable())
        .column(ColumnDef::text("isbn").nullable())
        .column(ColumnDef::integer("total_copies").default_int(0))
        .column(ColumnDef::integer("available_copies").default_int(0))
        .column(ColumnDef::timestamp("created_at").default_now())
        .column(ColumnDef::timestamp("modified_at").default_now())
        .check("ck_catalogs_total_copies", "total_copies >= 0")
        .check("ck_catalogs_available_copies", "available_copies >= 0")
        .check(
            "ck_catalogs_available_within_total",
            "available_copies <= total_copies",
        )
        .touch_on_update("modified_at")
}

fn books() -> TableDef {
    TableDef::new("books")
        .column(ColumnDef::id("book_id"))
        .column(ColumnDef::integer("catalog_id"))
        .column(ColumnDef::text("barcode"))
        .column(ColumnDef::timestamp("created_at").default_now())
        .references("catalog_id", "catalogs", "catalog_id", DeleteRule::Restrict)
        .unique("ux_books_barcode", &["barcode"])
}

fn book_borrows() -> TableDef {
    TableDef::new("book_borrows")
        .column(ColumnDef::id("borrow_id"))
        .column(ColumnDef::integer("member_id"))
        .column(ColumnDef::timestamp("loan_date").default_now())
        .column(ColumnDef::timestamp("due_date").nullable())
        .column(ColumnDef::boolean("is_returned").default_int(0))
        .column(ColumnDef::timestamp("created_at").default_now())
        .column(ColumnDef::timestamp("modified_at").default_now())
        .references("member_id", "members", "member_id", DeleteRule::Restrict)
        .touch_on_update("modified_at")
}

fn book_borrow_details() -> TableDef {
    TableDef::new("book_borrow_details")
        .column(ColumnDef::id("detail_id"))
        .column(ColumnDef::integer("borrow_id"))
        .column(ColumnDef::integer("book_id"))
        .column(ColumnDef::decimal("fine_amount").default_text("0"))
        .column(ColumnDef::timestamp("created_at").default_now())
        .column(ColumnDef::timestamp("modified_at").default_now())
        .references("borrow_id", "book_borrows", "borrow_id", DeleteRule::Cascade)
        .references("book_id", "books", "book_id", DeleteRule::Restrict)
        .touch_on_update("modified_at")
}

fn book_returns() -> TableDef {
    TableDef::new("book_returns")
        .column(ColumnDef::id("return_id"))
        .column(ColumnDef::integer("borrow_id"))
        .column(ColumnDef::timestamp("return_date").default_now())
        .column(ColumnDef::decimal("fine_amount").default_text("0"))
        .column(ColumnDef::decimal("paid_amount").default_text("0"))
        .column(ColumnDef::decimal("refund_amount").default_text("0"))
        .references("borrow_id", "book_borrows", "borrow_id", DeleteRule::Cascade)
}

fn loan_reminders() -> TableDef {
    TableDef::new("loan_reminders")
        .column(ColumnDef::id("reminder_id"))
        .column(ColumnDef::integer("borrow_id"))
        .column(ColumnDef::timestamp("sent_date").default_now())
        .column(ColumnDef::text("message").nullable())
        .references("borrow_id", "book_borrows", "borrow_id", DeleteRule::Cascade)
}

fn purchases() -> TableDef {
    TableDef::new("purchases")
        .column(ColumnDef::id("purchase_id"))
        .column(ColumnDef::integer("book_id"))
        .column(ColumnDef::timestamp("purchase_date").default_now())
        .column(ColumnDef::decimal("cost").default_text("0"))
        .column(ColumnDef::text("supplier").nullable())
        .references("book_id", "books", "book_id", DeleteRule::Restrict)
}

fn purchase_details() -> TableDef {
    TableDef::new("purchase_details")
        .column(ColumnDef::id("detail_id"))
        .column(ColumnDef::integer("purchase_id"))
        .column(ColumnDef::integer("book_id"))
        .column(ColumnDef::integer("quantity").default_int(1))
        .column(ColumnDef::decimal("unit_price").default_text("0"))
        .column(ColumnDef::decimal("line_total").default_text("0"))
        .references("purchase_id", "purchases", "purchase_id", DeleteRule::Cascade)
        .references("book_id", "books", "book_id", DeleteRule::Restrict)
        .check("ck_purchase_details_quantity", "quantity > 0")
}

fn adjustments() -> TableDef {
    TableDef::new("adjustments")
        .column(ColumnDef::id("adjustment_id"))
        .column(ColumnDef::integer("catalog_id"))
        .column(ColumnDef::text("user_id").nullable())
        .column(ColumnDef::timestamp("adjustment_date").default_now())
        .column(ColumnDef::text("reason").nullable())
        .references("catalog_id", "catalogs", "catalog_id", DeleteRule::Restrict)
        .references("user_id", "users", "id", DeleteRule::SetNull)
}

fn adjustment_details() -> TableDef {
    TableDef::new("adjustment_details")
        .column(ColumnDef::id("detail_id"))
        .column(ColumnDef::integer("adjustment_id"))
        .column(ColumnDef::integer("catalog_id"))
        .column(ColumnDef::integer("quantity_changed"))
        .references(
            "adjustment_id",
            "adjustments",
            "adjustment_id",
            DeleteRule::Cascade,
        )
        .references("catalog_id", "catalogs", "catalog_id", DeleteRule::Restrict)
}

fn library_logs() -> TableDef {
    TableDef::new("library_logs")
        .column(ColumnDef::id("log_id"))
        .column(ColumnDef::text("visitor_name"))
        .column(ColumnDef::text("phone").nullable())
        .column(ColumnDef::text("status").default_text("Pending"))
        .column(ColumnDef::timestamp("visit_date").default_now())
        .column(ColumnDef::timestamp("approved_at").nullable())
        .column(ColumnDef::timestamp("returned_at").nullable())
}

fn library_log_items() -> TableDef {
    TableDef::new("library_log_items")
        .column(ColumnDef::id("item_id"))
        .column(ColumnDef::integer("log_id"))
        .column(ColumnDef::integer("book_id"))
        .column(ColumnDef::timestamp("returned_at").nullable())
        .references("log_id", "library_logs", "log_id", DeleteRule::Cascade)
        .references("book_id", "books", "book_id", DeleteRule::Restrict)
        .unique("ux_library_log_items_log_book", &["log_id", "book_id"])
}

fn member_wishlists() -> TableDef {
    TableDef::new("member_wishlists")
        .column(ColumnDef::id("wishlist_id"))
        .column(ColumnDef::integer("member_id"))
        .column(ColumnDef::integer("catalog_id"))
        .column(ColumnDef::timestamp("created_at").default_now())
        .references("member_id", "members", "member_id", DeleteRule::Cascade)
        .references("catalog_id", "catalogs", "catalog_id", DeleteRule::Cascade)
        .unique(
            "ux_member_wishlists_member_catalog",
            &["member_id", "catalog_id"],
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDefault;

    fn rule(schema: &Schema, table: &str, column: &str) -> DeleteRule {
        schema
            .get_table(table)
            .and_then(|t| t.foreign_keys.iter().find(|fk| fk.column == column))
            .map(|fk| fk.on_delete)
            .unwrap_or_else(|| panic!("no foreign key on {}.{}", table, column))
    }

    #[test]
    fn test_library_schema_is_valid() {
        assert_eq!(library_schema().validate(), Ok(()));
    }

    #[test]
    fn test_library_schema_declares_every_entity() {
        let schema = library_schema();
        let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), 17);
        for name in [
            "users",
            "roles",
            "permissions",
            "members",
            "catalogs",
            "books",
            "book_borrows",
            "book_borrow_details",
            "book_returns",
            "loan_reminders",
            "purchases",
            "purchase_details",
            "adjustments",
            "adjustment_details",
            "library_logs",
            "library_log_items",
            "member_wishlists",
        ] {
            assert!(names.contains(&name), "missing table {}", name);
        }
    }

    #[test]
    fn test_loan_children_cascade() {
        let schema = library_schema();
        let mut cascading: Vec<&str> = schema
            .dependents("book_borrows")
            .filter(|(_, fk)| fk.on_delete == DeleteRule::Cascade)
            .map(|(t, _)| t.name.as_str())
            .collect();
        cascading.sort();
        assert_eq!(
            cascading,
            vec!["book_borrow_details", "book_returns", "loan_reminders"]
        );
    }

    #[test]
    fn test_delete_rules() {
        let schema = library_schema();
        assert_eq!(rule(&schema, "members", "user_id"), DeleteRule::Restrict);
        assert_eq!(rule(&schema, "adjustments", "user_id"), DeleteRule::SetNull);
        assert_eq!(rule(&schema, "adjustments", "catalog_id"), DeleteRule::Restrict);
        assert_eq!(
            rule(&schema, "adjustment_details", "adjustment_id"),
            DeleteRule::Cascade
        );
        assert_eq!(rule(&schema, "books", "catalog_id"), DeleteRule::Restrict);
        assert_eq!(rule(&schema, "purchases", "book_id"), DeleteRule::Restrict);
        assert_eq!(
            rule(&schema, "purchase_details", "purchase_id"),
            DeleteRule::Cascade
        );
        assert_eq!(rule(&schema, "purchase_details", "book_id"), DeleteRule::Restrict);
        assert_eq!(rule(&schema, "library_log_items", "log_id"), DeleteRule::Cascade);
        assert_eq!(rule(&schema, "library_log_items", "book_id"), DeleteRule::Restrict);
        assert_eq!(rule(&schema, "member_wishlists", "member_id"), DeleteRule::Cascade);
        assert_eq!(rule(&schema, "member_wishlists", "catalog_id"), DeleteRule::Cascade);
    }

    #[test]
    fn test_visit_status_defaults_to_pending() {
        let schema = library_schema();
        let status = schema
            .get_table("library_logs")
            .and_then(|t| t.get_column("status"))
            .expect("status column");
        assert_eq!(
            status.default,
            Some(ColumnDefault::Text("Pending".to_string()))
        );
    }

    #[test]
    fn test_rendered_sql_contains_catalog_checks() {
        let sql = library_schema().to_sql();
        let catalogs = sql
            .iter()
            .find(|s| s.starts_with("CREATE TABLE IF NOT EXISTS catalogs"))
            .expect("catalogs table");
        assert!(catalogs.contains("CHECK (available_copies <= total_copies)"));
        assert!(catalogs.contains("CHECK (total_copies >= 0)"));
        assert!(catalogs.contains("CHECK (available_copies >= 0)"));
    }
}
