use std::env;
use std::path::PathBuf;

/// Runtime configuration for the conversion service
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Maximum request body size in bytes (default: 64 MB)
    pub max_upload_size: usize,

    /// Multipart field carrying the uploaded files (default: "file")
    pub upload_field: String,

    /// Persist each upload to a request-scoped scratch directory before parsing (default: false)
    pub persist_uploads: bool,

    /// Base directory for scratch directories (default: OS temp dir)
    pub scratch_dir: PathBuf,

    /// Ingest the files of one request concurrently (default: true)
    pub parallel_parsing: bool,

    /// Write YYYY-MM-DD values in date columns as date cells (default: false)
    pub date_cells: bool,

    /// Name of the single worksheet (default: "Sheet1")
    pub sheet_name: String,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 64 * 1024 * 1024, // 64 MB
            upload_field: "file".to_string(),
            persist_uploads: false,
            scratch_dir: env::temp_dir(),
            parallel_parsing: true,
            date_cells: false,
            sheet_name: "Sheet1".to_string(),
            allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:5000".to_string(),
            ],
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| {
            let v = v.trim().to_lowercase();
            v == "true" || v == "1" || v == "yes"
        })
        .unwrap_or(default)
}

impl ConverterConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            upload_field: env::var("UPLOAD_FIELD")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default.upload_field),

            persist_uploads: env_flag("PERSIST_UPLOADS", default.persist_uploads),

            scratch_dir: env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.scratch_dir),

            parallel_parsing: env_flag("PARALLEL_PARSING", default.parallel_parsing),

            date_cells: env_flag("DATE_CELLS", default.date_cells),

            sheet_name: env::var("SHEET_NAME")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default.sheet_name),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development (any origin, sequential parsing for readable logs)
    pub fn development() -> Self {
        Self {
            parallel_parsing: false,
            allowed_origins: vec!["*".to_string()],
            ..Self::default()
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}
