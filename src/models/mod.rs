use bytes::Bytes;

/// Number of columns every record must carry.
pub const COLUMN_COUNT: usize = 9;

/// Output schema, in order. Source headers are discarded and replaced by these.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "Username*",
    "Task Code/Course ID*",
    "Task/Course Name",
    "Date Taken*",
    "Date Qualified",
    "Date Expired",
    "Status*",
    "Is Qualified*",
    "Proctor",
];

/// Columns holding calendar dates, used when date cells are enabled.
pub const DATE_COLUMNS: [usize; 3] = [3, 4, 5];

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One multipart file part, held in memory for the lifetime of the request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Positional output of the delimited parser. Every row has exactly nine fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    pub source: String,
    pub rows: Vec<[String; COLUMN_COUNT]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedRow {
    values: [Option<String>; COLUMN_COUNT],
}

impl NormalizedRow {
    pub fn new(values: [Option<String>; COLUMN_COUNT]) -> Self {
        Self { values }
    }

    /// Look up a value by its fixed column name. Missing values and unknown columns yield `None`.
    pub fn get(&self, column: &str) -> Option<&str> {
        COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|idx| self.values[idx].as_deref())
    }

    pub fn values(&self) -> &[Option<String>; COLUMN_COUNT] {
        &self.values
    }

    /// Pairs of (column name, value) in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> + '_ {
        COLUMNS
            .iter()
            .copied()
            .zip(self.values.iter().map(|v| v.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTable {
    pub source: String,
    pub rows: Vec<NormalizedRow>,
}

impl NormalizedTable {
    pub fn columns(&self) -> &'static [&'static str; COLUMN_COUNT] {
        &COLUMNS
    }
}

/// Row count contributed by one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub filename: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregatedTable {
    pub rows: Vec<NormalizedRow>,
    pub sources: Vec<SourceSummary>,
}

impl AggregatedTable {
    pub fn columns(&self) -> &'static [&'static str; COLUMN_COUNT] {
        &COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Serialized workbook ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportedWorkbook {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_by_column_name() {
        let mut values: [Option<String>; COLUMN_COUNT] = Default::default();
        values[0] = Some("u1".to_string());
        values[6] = Some("Complete".to_string());
        let row = NormalizedRow::new(values);

        assert_eq!(row.get("Username*"), Some("u1"));
        assert_eq!(row.get("Status*"), Some("Complete"));
        assert_eq!(row.get("Proctor"), None);
        assert_eq!(row.get("Not A Column"), None);

        let names: Vec<&str> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(names, COLUMNS.to_vec());
    }
}
