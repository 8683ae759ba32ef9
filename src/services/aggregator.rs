use crate::models::{AggregatedTable, NormalizedTable, SourceSummary};
use crate::services::error::ConvertError;

/// Concatenate tables in the order given, keeping row order within each table.
///
/// Fails with [`ConvertError::NoData`] when there are no tables or none of them has rows.
pub fn aggregate(tables: Vec<NormalizedTable>) -> Result<AggregatedTable, ConvertError> {
    let total: usize = tables.iter().map(|t| t.rows.len()).sum();
    if total == 0 {
        return Err(ConvertError::NoData);
    }

    let mut aggregated = AggregatedTable {
        rows: Vec::with_capacity(total),
        sources: Vec::with_capacity(tables.len()),
    };

    for table in tables {
        aggregated.sources.push(SourceSummary {
            filename: table.source,
            rows: table.rows.len(),
        });
        aggregated.rows.extend(table.rows);
    }

    Ok(aggregated)
}
