//! Post-run summary queries

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Table};
use postgres::Client;

use crate::error::{BootstrapError, BootstrapResult};
use crate::schema::TableSchema;

/// Row count of one table after the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub table: &'static str,
    pub rows: i64,
}

/// One user with the number of products across their carts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub first_name: String,
    pub last_name: String,
    pub products_in_cart: i64,
}

const CART_SUMMARY_SQL: &str = "\
    SELECT u.first_name, u.last_name, COUNT(cp.products_product_id) AS products_in_cart \
    FROM users u \
    LEFT JOIN carts c ON c.users_user_id = u.user_id \
    LEFT JOIN cart_product cp ON cp.carts_cart_id = c.cart_id \
    GROUP BY u.user_id, u.first_name, u.last_name \
    ORDER BY u.user_id \
    LIMIT $1";

pub fn table_counts(
    client: &mut Client,
    tables: &[&'static TableSchema],
) -> BootstrapResult<Vec<TableCount>> {
    tables
        .iter()
        .map(|schema| {
            let row = client
                .query_one(format!("SELECT COUNT(*) FROM {}", schema.name).as_str(), &[])
                .map_err(|e| BootstrapError::database(format!("counting {}", schema.name), e))?;
            Ok(TableCount {
                table: schema.name,
                rows: row.get(0),
            })
        })
        .collect()
}

/// First `limit` users by id with their cart product counts
pub fn cart_summary(client: &mut Client, limit: i64) -> BootstrapResult<Vec<CartSummary>> {
    let rows = client
        .query(CART_SUMMARY_SQL, &[&limit])
        .map_err(|e| BootstrapError::database("building the cart summary", e))?;

    Ok(rows
        .iter()
        .map(|row| CartSummary {
            first_name: row.get(0),
            last_name: row.get(1),
            products_in_cart: row.get(2),
        })
        .collect())
}

pub fn render_table_counts(counts: &[TableCount]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec!["Table", "Rows"]);
    for count in counts {
        table.add_row(vec![
            Cell::new(count.table),
            Cell::new(count.rows).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

pub fn render_cart_summary(rows: &[CartSummary]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
        "First name",
        "Last name",
        "Number of products in the cart",
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.first_name),
            Cell::new(&row.last_name),
            Cell::new(row.products_in_cart).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_counts_lists_every_table() {
        let out = render_table_counts(&[
            TableCount {
                table: "users",
                rows: 5,
            },
            TableCount {
                table: "cart_product",
                rows: 12,
            },
        ]);
        let users = out.lines().find(|l| l.contains("users")).unwrap();
        let junction = out.lines().find(|l| l.contains("cart_product")).unwrap();
        assert!(users.contains('5'));
        assert!(junction.contains("12"));
        // Every row of the grid has the same width
        assert_eq!(users.chars().count(), junction.chars().count());
    }

    #[test]
    fn test_render_cart_summary() {
        let out = render_cart_summary(&[CartSummary {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            products_in_cart: 3,
        }]);
        assert!(out.contains("First name"));
        assert!(out.contains("Number of products in the cart"));
        let row = out.lines().find(|l| l.contains("Ann")).unwrap();
        assert!(row.contains("Lee"));
        assert!(row.contains('3'));
    }

    #[test]
    fn test_render_empty_cart_summary_has_header_only() {
        let out = render_cart_summary(&[]);
        assert!(out.contains("First name"));
        assert!(!out.lines().any(|l| l.contains("Ann")));
    }
}
