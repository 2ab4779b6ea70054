use crate::error::LoadError;

/// A parameterized INSERT derived from a header row: the SQL text plus the
/// field count every bound row must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    pub sql: String,
    pub width: usize,
}

/// Build `INSERT INTO <table> (..) VALUES (..)` with one placeholder per
/// header column, columns in header order. Pure function of the header.
pub fn build_insert(table: &str, header: &[String]) -> Result<InsertStatement, LoadError> {
    if header.is_empty() {
        return Err(LoadError::EmptyHeader);
    }
    let placeholders = (1..=header.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(InsertStatement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            header.join(", "),
            placeholders
        ),
        width: header.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_placeholder_per_column_in_header_order() {
        let header = vec!["policyID".to_string(), "statecode".to_string()];
        let stmt = build_insert("fl_insurance", &header).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO fl_insurance (policyID, statecode) VALUES (?1, ?2)"
        );
        assert_eq!(stmt.width, 2);
    }

    #[test]
    fn empty_header_is_rejected() {
        let err = build_insert("fl_insurance", &[]).unwrap_err();
        assert!(matches!(err, LoadError::EmptyHeader));
    }
}
