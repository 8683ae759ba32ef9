use crate::config::ConverterConfig;
use crate::models::{ExportedWorkbook, NormalizedTable, UploadedFile};
use crate::services::aggregator::aggregate;
use crate::services::encoding;
use crate::services::error::ConvertError;
use crate::services::exporter::{ExportOptions, export_workbook};
use crate::services::normalizer::normalize;
use crate::services::parser::parse_delimited;
use crate::services::scratch::ScratchArena;
use chrono::{Local, NaiveDate};
use futures::future::join_all;
use tracing::{debug, info, warn};

/// Runs the full batch: ingest every file, concatenate, export.
pub struct ConverterService {
    config: ConverterConfig,
}

/// Detect, parse and normalize a single upload.
pub fn ingest(file: &UploadedFile) -> Result<NormalizedTable, ConvertError> {
    let detection = encoding::detect(&file.data).ok_or_else(|| ConvertError::Decode {
        file: file.filename.clone(),
        reason: "character encoding could not be detected".to_string(),
    })?;

    debug!(
        file = %file.filename,
        encoding = detection.label(),
        confidence = detection.confidence,
        "encoding detected"
    );

    let parsed = parse_delimited(file, detection.encoding)?;
    Ok(normalize(parsed))
}

impl ConverterService {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Convert `files` into a workbook stamped with today's local date.
    pub async fn convert(
        &self,
        request_id: &str,
        files: Vec<UploadedFile>,
    ) -> Result<ExportedWorkbook, ConvertError> {
        self.convert_on(request_id, files, Local::now().date_naive())
            .await
    }

    pub async fn convert_on(
        &self,
        request_id: &str,
        files: Vec<UploadedFile>,
        date: NaiveDate,
    ) -> Result<ExportedWorkbook, ConvertError> {
        if files.is_empty() {
            return Err(ConvertError::no_selected_file());
        }

        // Lives until the end of the request; dropping it removes the scratch copies.
        let arena = if self.config.persist_uploads {
            Some(ScratchArena::create(&self.config.scratch_dir, request_id)?)
        } else {
            None
        };

        let files = match &arena {
            Some(arena) => {
                let mut persisted = Vec::with_capacity(files.len());
                for (index, file) in files.into_iter().enumerate() {
                    persisted.push(arena.persist(index, file).await?);
                }
                persisted
            }
            None => files,
        };

        let tables = if self.config.parallel_parsing {
            ingest_parallel(files).await?
        } else {
            files.iter().map(ingest).collect::<Result<Vec<_>, _>>()?
        };

        let aggregated = aggregate(tables)?;
        for source in &aggregated.sources {
            info!(file = %source.filename, rows = source.rows, "file normalized");
        }

        let options = ExportOptions {
            sheet_name: self.config.sheet_name.clone(),
            date_cells: self.config.date_cells,
        };

        let workbook =
            tokio::task::spawn_blocking(move || export_workbook(&aggregated, &options, date))
                .await
                .map_err(|e| ConvertError::Task(e.to_string()))??;

        info!(
            filename = %workbook.filename,
            rows = workbook.rows,
            bytes = workbook.bytes.len(),
            "workbook exported"
        );
        Ok(workbook)
    }
}

/// Ingest every file on the blocking pool. Results are collected in upload order,
/// and the first failure in that order is reported.
async fn ingest_parallel(files: Vec<UploadedFile>) -> Result<Vec<NormalizedTable>, ConvertError> {
    let handles = files.into_iter().map(|file| {
        let filename = file.filename.clone();
        let handle = tokio::task::spawn_blocking(move || ingest(&file));
        async move {
            handle.await.unwrap_or_else(|e| {
                warn!(file = %filename, "ingestion task failed: {}", e);
                Err(ConvertError::Task(format!("'{}': {}", filename, e)))
            })
        }
    });

    join_all(handles).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "h1|h2|h3|h4|h5|h6|h7|h8|h9";

    fn file(name: &str, rows: &[&str]) -> UploadedFile {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        UploadedFile::new(name, text.into_bytes())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    #[test]
    fn test_ingest_undetectable_encoding_is_decode_error() {
        let err = ingest(&UploadedFile::new("empty.txt", Vec::new())).unwrap_err();
        assert!(matches!(err, ConvertError::Decode { ref file, .. } if file == "empty.txt"));
    }

    #[tokio::test]
    async fn test_parallel_keeps_upload_order() {
        let service = ConverterService::new(ConverterConfig::default());
        let files: Vec<UploadedFile> = (0..8)
            .map(|i| {
                let row = format!("u{i}|c|n|d|||s|q|p");
                file(&format!("f{i}.txt"), &[row.as_str()])
            })
            .collect();

        let workbook = service.convert_on("req", files, date()).await.unwrap();
        assert_eq!(workbook.rows, 8);
        assert_eq!(workbook.filename, "atmos_converted_2024-05-06.xlsx");
    }

    #[tokio::test]
    async fn test_one_bad_file_fails_batch() {
        let service = ConverterService::new(ConverterConfig::development());
        let files = vec![
            file("good.txt", &["u1|c|n|d|||s|q|p"]),
            file("bad.txt", &["u2|c|n|d||s|q|p"]),
        ];

        let err = service.convert_on("req", files, date()).await.unwrap_err();
        match err {
            ConvertError::Parse { file, .. } => assert_eq!(file, "bad.txt"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_failure_in_upload_order_is_reported() {
        let service = ConverterService::new(ConverterConfig::default());
        let files = vec![
            file("ok.txt", &["u1|c|n|d|||s|q|p"]),
            file("first-bad.txt", &["x"]),
            file("second-bad.txt", &["y"]),
        ];

        let err = service.convert_on("req", files, date()).await.unwrap_err();
        assert!(err.to_string().contains("first-bad.txt"), "{err}");
    }

    #[tokio::test]
    async fn test_persisted_uploads_are_cleaned_up() {
        let scratch = tempfile::tempdir().unwrap();
        let config = ConverterConfig {
            persist_uploads: true,
            scratch_dir: scratch.path().to_path_buf(),
            ..ConverterConfig::default()
        };
        let service = ConverterService::new(config);
        let files = vec![
            file("same.txt", &["u1|c|n|d|||s|q|p"]),
            file("same.txt", &["u2|c|n|d|||s|q|p"]),
        ];

        let workbook = service.convert_on("req-42", files, date()).await.unwrap();
        assert_eq!(workbook.rows, 2);
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_is_missing_input() {
        let service = ConverterService::new(ConverterConfig::default());
        let err = service.convert_on("req", Vec::new(), date()).await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "No selected file");
    }
}
