//! Persisting frames as Parquet or CSV.

use crate::error::{ExportError, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// On-disk table format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Apache Parquet
    Parquet,
    /// Comma-separated values with a header row
    Csv,
}

impl TableFormat {
    /// Format implied by the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("parquet" | "pq") => Ok(Self::Parquet),
            Some("csv") => Ok(Self::Csv),
            _ => Err(ExportError::InvalidFormat(format!(
                "cannot infer a table format from {}",
                path.display()
            ))),
        }
    }

    /// File extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Parquet => "parquet",
            Self::Csv => "csv",
        }
    }
}

/// Write `df` to `path`, creating missing parent directories.
pub fn write_frame(df: &mut DataFrame, path: &Path, format: TableFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    match format {
        TableFormat::Parquet => {
            ParquetWriter::new(file).finish(df)?;
        }
        TableFormat::Csv => {
            CsvWriter::new(file).include_header(true).finish(df)?;
        }
    }
    info!(path = %path.display(), rows = df.height(), columns = df.width(), "wrote table");
    Ok(())
}

/// Path next to `path` named `<stem>_<suffix>.<extension>`.
pub fn sibling_path(path: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_{suffix}.{extension}"))
}
