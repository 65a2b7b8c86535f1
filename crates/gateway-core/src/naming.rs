use uuid::Uuid;

/// Builds the physical table name for a reference table from its owning
/// webhook's id and the operator-chosen logical name:
/// `ref_<webhook_uuid>_<logical_name>`, with dashes in the uuid replaced
/// by underscores so the result is a bare SQL identifier. Keying on the
/// webhook id (not the reference table's own id) is what keeps two
/// different webhooks' tables of the same logical name from colliding.
pub fn reference_table_name(webhook_id: Uuid, logical_name: &str) -> String {
    format!("ref_{}_{}", underscored_uuid(webhook_id), logical_name)
}

/// Builds the physical scalar function name for a UDF from its owning
/// webhook's id and logical name: `udf_<webhook_uuid>_<logical_name>`.
pub fn udf_function_name(webhook_id: Uuid, logical_name: &str) -> String {
    format!("udf_{}_{}", underscored_uuid(webhook_id), logical_name)
}

/// The hyphenated UUID string with every `-` replaced by `_`. Operators
/// writing transform SQL apply this same rewrite by hand to address a
/// webhook's physical tables and functions, so it must stay deterministic
/// and match theirs exactly.
fn underscored_uuid(id: Uuid) -> String {
    id.to_string().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_bare_identifiers() {
        let id = Uuid::nil();
        let name = reference_table_name(id, "customers");
        assert!(!name.contains('-'));
        assert!(name.starts_with("ref_"));
        assert!(name.ends_with("customers"));
    }

    #[test]
    fn dashes_are_replaced_by_underscores_not_stripped() {
        let id = Uuid::parse_str("12345678-1234-5678-1234-567812345678").unwrap();
        let name = reference_table_name(id, "customers");
        assert_eq!(name, "ref_12345678_1234_5678_1234_567812345678_customers");
    }

    #[test]
    fn udf_names_use_the_same_rewrite() {
        let id = Uuid::parse_str("12345678-1234-5678-1234-567812345678").unwrap();
        let name = udf_function_name(id, "normalize");
        assert_eq!(name, "udf_12345678_1234_5678_1234_567812345678_normalize");
    }
}
