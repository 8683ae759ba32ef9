use crate::models::{NormalizedRow, NormalizedTable, ParsedTable};

/// Relabel a parsed table to the fixed schema. Fields are assigned positionally;
/// empty strings become missing values.
pub fn normalize(table: ParsedTable) -> NormalizedTable {
    let rows = table
        .rows
        .into_iter()
        .map(|fields| NormalizedRow::new(fields.map(|f| if f.is_empty() { None } else { Some(f) })))
        .collect();

    NormalizedTable {
        source: table.source,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::COLUMNS;

    #[test]
    fn test_header_text_is_irrelevant() {
        let table = ParsedTable {
            source: "x.txt".to_string(),
            rows: vec![[
                "u1", "c1", "cn1", "2023-01-01", "", "", "Complete", "Yes", "p1",
            ]
            .map(String::from)],
        };

        let normalized = normalize(table);
        assert_eq!(normalized.columns(), &COLUMNS);
        assert_eq!(normalized.rows.len(), 1);

        let row = &normalized.rows[0];
        assert_eq!(row.get("Username*"), Some("u1"));
        assert_eq!(row.get("Task Code/Course ID*"), Some("c1"));
        assert_eq!(row.get("Date Taken*"), Some("2023-01-01"));
        assert_eq!(row.get("Date Qualified"), None);
        assert_eq!(row.get("Is Qualified*"), Some("Yes"));
        assert_eq!(row.get("Proctor"), Some("p1"));
    }
}
