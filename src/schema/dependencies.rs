use super::tables::ALL_TABLES;
use super::types::TableSchema;
use std::collections::{HashMap, HashSet};

/// Orders tables so that every foreign key points at a table created earlier
pub struct DependencyResolver {
    /// Tables in declaration order
    tables: Vec<&'static TableSchema>,
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::for_tables(ALL_TABLES)
    }

    pub fn for_tables(tables: &[&'static TableSchema]) -> Self {
        let deps = tables
            .iter()
            .map(|table| (table.name, table.dependencies()))
            .collect();

        Self {
            tables: tables.to_vec(),
            deps,
        }
    }

    fn get(&self, name: &str) -> Option<&'static TableSchema> {
        self.tables.iter().find(|t| t.name == name).copied()
    }

    /// Check that every foreign key names a known table and an existing column
    /// on both sides, and that the referenced column is the parent's primary key
    pub fn validate_references(&self) -> Result<(), String> {
        for table in &self.tables {
            for fk in table.foreign_keys {
                if table.column(fk.column).is_none() {
                    return Err(format!(
                        "{}: foreign key column {} is not defined",
                        table.name, fk.column
                    ));
                }

                let parent = self.get(fk.references_table).ok_or_else(|| {
                    format!(
                        "{}.{} references unknown table {}",
                        table.name, fk.column, fk.references_table
                    )
                })?;

                if parent.primary_key != Some(fk.references_column) {
                    return Err(format!(
                        "{}.{} references {}.{}, which is not its primary key",
                        table.name, fk.column, parent.name, fk.references_column
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check the declared order has no forward references
    pub fn verify_declared_order(&self) -> Result<(), String> {
        let mut created: HashSet<&str> = HashSet::new();

        for table in &self.tables {
            for dep in &self.deps[table.name] {
                if *dep != table.name && !created.contains(dep) {
                    return Err(format!(
                        "{} references {} before it is created",
                        table.name, dep
                    ));
                }
            }
            created.insert(table.name);
        }

        Ok(())
    }

    /// Return all tables in creation order (parents before children).
    /// Ties keep declaration order.
    pub fn creation_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        for table in &self.tables {
            self.visit(table.name, &mut visited, &mut temp_visited, &mut result)?;
        }

        Ok(result)
    }

    fn visit<'a>(
        &self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        temp_visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<(), String> {
        if temp_visited.contains(name) {
            return Err(format!("Circular dependency detected at: {}", name));
        }
        if visited.contains(name) {
            return Ok(());
        }

        let table = self
            .get(name)
            .ok_or_else(|| format!("Unknown table: {}", name))?;

        temp_visited.insert(name);

        // Declaration order keeps the result deterministic
        let mut parents: Vec<&'static str> = self.deps[table.name].iter().copied().collect();
        parents.sort_by_key(|p| self.tables.iter().position(|t| t.name == *p));

        for dep in parents {
            if dep != name {
                self.visit(dep, visited, temp_visited, result)?;
            }
        }

        temp_visited.remove(name);
        visited.insert(name);
        result.push(table);

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{CARTS, CART_PRODUCT, CATEGORIES, ORDERS, PRODUCTS, USERS};
    use crate::schema::types::{Column, ColumnType, ForeignKey};

    fn position(names: &[&str], name: &str) -> usize {
        names.iter().position(|&n| n == name).unwrap()
    }

    #[test]
    fn test_builtin_schema_is_consistent() {
        let resolver = DependencyResolver::new();
        resolver.validate_references().unwrap();
        resolver.verify_declared_order().unwrap();
    }

    #[test]
    fn test_creation_order_puts_parents_first() {
        let resolver = DependencyResolver::new();
        let tables = resolver.creation_order().unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name).collect();

        assert_eq!(names.len(), ALL_TABLES.len());
        for table in &tables {
            for fk in table.foreign_keys {
                assert!(
                    position(&names, fk.references_table) < position(&names, table.name),
                    "{} must come after {}",
                    table.name,
                    fk.references_table
                );
            }
        }
    }

    #[test]
    fn test_creation_order_matches_declared_order() {
        let resolver = DependencyResolver::new();
        let names: Vec<_> = resolver
            .creation_order()
            .unwrap()
            .iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(
            names,
            ["users", "categories", "carts", "orders", "products", "cart_product"]
        );
    }

    #[test]
    fn test_reordered_declaration_is_sorted() {
        let resolver = DependencyResolver::for_tables(&[
            &CART_PRODUCT,
            &PRODUCTS,
            &ORDERS,
            &CARTS,
            &USERS,
            &CATEGORIES,
        ]);
        assert!(resolver.verify_declared_order().is_err());

        let names: Vec<_> = resolver
            .creation_order()
            .unwrap()
            .iter()
            .map(|t| t.name)
            .collect();
        assert!(position(&names, "users") < position(&names, "carts"));
        assert!(position(&names, "carts") < position(&names, "orders"));
        assert!(position(&names, "orders") < position(&names, "products"));
        assert!(position(&names, "products") < position(&names, "cart_product"));
    }

    #[test]
    fn test_missing_parent_is_rejected() {
        let resolver = DependencyResolver::for_tables(&[&CARTS]);
        assert!(resolver.validate_references().is_err());
        assert!(resolver.creation_order().is_err());
    }

    static LEFT: TableSchema = TableSchema {
        name: "left",
        seed_file: "left.csv",
        columns: &[
            Column::identity("id"),
            Column::required("right_id", ColumnType::Integer),
        ],
        primary_key: Some("id"),
        foreign_keys: &[ForeignKey::new("right_id", "right", "id")],
    };

    static RIGHT: TableSchema = TableSchema {
        name: "right",
        seed_file: "right.csv",
        columns: &[
            Column::identity("id"),
            Column::required("left_id", ColumnType::Integer),
        ],
        primary_key: Some("id"),
        foreign_keys: &[ForeignKey::new("left_id", "left", "id")],
    };

    static BAD_TARGET: TableSchema = TableSchema {
        name: "bad_target",
        seed_file: "bad_target.csv",
        columns: &[Column::required("user_email", ColumnType::Integer)],
        primary_key: None,
        foreign_keys: &[ForeignKey::new("user_email", "users", "email")],
    };

    #[test]
    fn test_cycle_is_rejected() {
        let resolver = DependencyResolver::for_tables(&[&LEFT, &RIGHT]);
        let err = resolver.creation_order().unwrap_err();
        assert!(err.contains("Circular dependency"));
    }

    #[test]
    fn test_reference_to_non_key_column_is_rejected() {
        let resolver = DependencyResolver::for_tables(&[&USERS, &BAD_TARGET]);
        let err = resolver.validate_references().unwrap_err();
        assert!(err.contains("not its primary key"));
    }
}
