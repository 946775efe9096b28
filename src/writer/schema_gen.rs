use crate::schema::TableSchema;

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        let identity = if col.identity {
            " GENERATED ALWAYS AS IDENTITY"
        } else {
            ""
        };
        let pk = if schema.primary_key == Some(col.name) {
            " PRIMARY KEY"
        } else {
            ""
        };

        columns.push(format!(
            "    {} {}{}{}{}",
            col.name, col.col_type, null_constraint, identity, pk
        ));
    }

    // Add foreign key constraints
    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {} ({})",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// COPY statement streaming every column of the table in declared order
pub fn generate_copy_statement(schema: &TableSchema) -> String {
    format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT text, DELIMITER ',')",
        schema.name,
        schema.column_names().join(", ")
    )
}

/// Move the identity sequence past the highest seeded key.
/// COPY writes identity values directly, so the sequence is left behind.
pub fn generate_identity_resync(schema: &TableSchema) -> Option<String> {
    schema.identity_column().map(|col| {
        format!(
            "SELECT setval(pg_get_serial_sequence('{table}', '{col}'), \
             COALESCE(MAX({col}), 0) + 1, false) FROM {table}",
            table = schema.name,
            col = col.name
        )
    })
}

/// Quote an identifier for statements that cannot take parameters
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{CART_PRODUCT, ORDERS, PRODUCTS, USERS};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&PRODUCTS);
        assert!(sql.starts_with("CREATE TABLE products ("));
        assert!(sql.contains("product_id INTEGER NOT NULL GENERATED ALWAYS AS IDENTITY PRIMARY KEY"));
        assert!(sql.contains("slug VARCHAR(45) NOT NULL"));
        assert!(sql.contains("product_description TEXT,"));
        assert!(sql.contains("price REAL NOT NULL"));
        assert!(sql.contains("FOREIGN KEY (category_category_id) REFERENCES categories (category_id)"));
        assert!(sql.contains("FOREIGN KEY (orders_order_id) REFERENCES orders (order_id)"));
        assert!(!sql.contains("IF NOT EXISTS"));
    }

    #[test]
    fn test_plain_primary_key_and_timestamps() {
        let sql = generate_create_table(&ORDERS);
        assert!(sql.contains("order_id INTEGER NOT NULL PRIMARY KEY"));
        assert!(!sql.contains("IDENTITY"));
        assert!(sql.contains("created_at TIMESTAMP WITHOUT TIME ZONE NOT NULL"));
    }

    #[test]
    fn test_junction_table_has_no_primary_key() {
        let sql = generate_create_table(&CART_PRODUCT);
        assert!(!sql.contains("PRIMARY KEY"));
        assert_eq!(sql.matches("FOREIGN KEY").count(), 2);
    }

    #[test]
    fn test_generate_copy_statement() {
        assert_eq!(
            generate_copy_statement(&CART_PRODUCT),
            "COPY cart_product (carts_cart_id, products_product_id) FROM STDIN WITH (FORMAT text, DELIMITER ',')"
        );
    }

    #[test]
    fn test_identity_resync() {
        let sql = generate_identity_resync(&USERS).unwrap();
        assert!(sql.contains("pg_get_serial_sequence('users', 'user_id')"));
        assert!(sql.contains("MAX(user_id)"));
        assert!(generate_identity_resync(&ORDERS).is_none());
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("shop"), "\"shop\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
