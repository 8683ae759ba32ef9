//! Pipe-delimited parsing. Field counts are strict: any record (header included)
//! without exactly nine fields fails the whole file. Lines holding nothing but
//! whitespace are skipped like empty lines.

use crate::models::{COLUMN_COUNT, ParsedTable, UploadedFile};
use crate::services::encoding::decode;
use crate::services::error::ConvertError;
use csv::StringRecord;
use encoding_rs::Encoding;

pub const DELIMITER: u8 = b'|';

/// Decode `file` with `encoding` and split it into a header plus nine-field rows.
pub fn parse_delimited(
    file: &UploadedFile,
    encoding: &'static Encoding,
) -> Result<ParsedTable, ConvertError> {
    let text = decode(&file.data, encoding).map_err(|reason| ConvertError::Decode {
        file: file.filename.clone(),
        reason,
    })?;

    parse_text(&file.filename, &text)
}

pub fn parse_text(filename: &str, text: &str) -> Result<ParsedTable, ConvertError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        // The header is validated like any other record and then discarded.
        .has_headers(false)
        // Lengths are checked below so the error can name the observed count.
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader
        .records()
        .filter(|r| !r.as_ref().is_ok_and(is_blank_line));

    let header = match records.next() {
        Some(record) => record.map_err(|e| map_csv_error(filename, e))?,
        None => {
            return Err(ConvertError::Parse {
                file: filename.to_string(),
                line: 1,
                reason: "file has no header line".to_string(),
            });
        }
    };
    let header = to_fields(filename, &header)?;
    tracing::debug!(file = %filename, header = ?header, "discarding source header");

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|e| map_csv_error(filename, e))?;
        rows.push(to_fields(filename, &record)?);
    }

    tracing::debug!(file = %filename, rows = rows.len(), "parsed delimited file");

    Ok(ParsedTable {
        source: filename.to_string(),
        rows,
    })
}

/// A whitespace-only line has no delimiter, so it reads as one blank field.
fn is_blank_line(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).is_some_and(|f| f.trim().is_empty())
}

fn to_fields(filename: &str, record: &StringRecord) -> Result<[String; COLUMN_COUNT], ConvertError> {
    if record.len() != COLUMN_COUNT {
        return Err(ConvertError::Parse {
            file: filename.to_string(),
            line: line_of(record),
            reason: format!(
                "expected {} fields, found {}",
                COLUMN_COUNT,
                record.len()
            ),
        });
    }

    Ok(std::array::from_fn(|i| {
        record.get(i).unwrap_or_default().to_string()
    }))
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn map_csv_error(filename: &str, e: csv::Error) -> ConvertError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    ConvertError::Parse {
        file: filename.to_string(),
        line,
        reason: e.to_string(),
    }
}
