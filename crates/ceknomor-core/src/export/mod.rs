//! Report rendering: CSV, pipe-delimited text and Excel.
//!
//! Rendering is pure. Staging on disk is a separate step so the file can be
//! handed to a transport that wants a path, and is removed when the
//! [`StagedArtifact`] goes out of scope.

pub mod schema;

pub use schema::Cell;

use crate::error::ExportError;
use crate::model::ResultSet;
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::TempDir;
use tracing::debug;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const TEXT_SEPARATOR: &str = " | ";
const SHEET_NAME: &str = "Results";

/// Output format picked by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// Plain text, cells joined by ` | `
    Txt,
    /// Excel workbook
    Excel,
}

impl ExportFormat {
    /// All formats, in the order they are offered.
    pub const ALL: [Self; 3] = [Self::Csv, Self::Txt, Self::Excel];

    /// Token used in button payloads.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Excel => "excel",
        }
    }

    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Txt => "TXT",
            Self::Excel => "Excel",
        }
    }

    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Excel => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown export format: {s}"))
    }
}

/// A rendered report held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// File name, `<prefix>_<timestamp>.<ext>`
    pub file_name: String,
    /// Format the content is encoded in
    pub format: ExportFormat,
    /// Number of body rows (header excluded)
    pub row_count: usize,
    /// Encoded bytes
    pub content: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the directory or file cannot be created.
    pub fn stage(&self) -> Result<StagedArtifact, ExportError> {
        let dir = tempfile::Builder::new().prefix("ceknomor-").tempdir()?;
        let path = dir.path().join(&self.file_name);
        std::fs::write(&path, &self.content)?;
        debug!(path = %path.display(), bytes = self.content.len(), "Artifact staged");
        Ok(StagedArtifact {
            file_name: self.file_name.clone(),
            path,
            _dir: dir,
        })
    }
}

/// An artifact written to disk. The directory is deleted on drop.
#[derive(Debug)]
pub struct StagedArtifact {
    file_name: String,
    path: PathBuf,
    _dir: TempDir,
}

impl StagedArtifact {
    /// Location of the staged file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the file should be delivered under.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Read the staged file back.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be read.
    pub async fn read(&self) -> Result<Vec<u8>, ExportError> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// Serializes result sets into report files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultExporter;

impl ResultExporter {
    /// Render `set` as `format`, stamping the file name with `now`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] if the underlying writer fails.
    pub fn export(
        set: &ResultSet,
        format: ExportFormat,
        now: NaiveDateTime,
    ) -> Result<ExportArtifact, ExportError> {
        let header = schema::columns(set.kind());
        let rows = schema::rows(set);

        let content = match format {
            ExportFormat::Csv => render_csv(header, &rows)?,
            ExportFormat::Txt => render_text(header, &rows),
            ExportFormat::Excel => render_xlsx(header, &rows)?,
        };

        Ok(ExportArtifact {
            file_name: file_name(set, format, now),
            format,
            row_count: rows.len(),
            content,
        })
    }
}

/// `<prefix>_<YYYY-MM-DD_HH-MM-SS>.<ext>`
#[must_use]
pub fn file_name(set: &ResultSet, format: ExportFormat, now: NaiveDateTime) -> String {
    format!(
        "{}_{}.{}",
        set.kind().file_prefix(),
        now.format(TIMESTAMP_FORMAT),
        format.extension()
    )
}

fn render_csv(header: &[&str], rows: &[Vec<Cell>]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

fn render_text(header: &[&str], rows: &[Vec<Cell>]) -> Vec<u8> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header.join(TEXT_SEPARATOR));
    for row in rows {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        lines.push(cells.join(TEXT_SEPARATOR));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text.into_bytes()
}

fn render_xlsx(header: &[&str], rows: &[Vec<Cell>]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in (0u16..).zip(header) {
        sheet.write_string_with_format(0, col, *title, &bold)?;
    }
    for (row, cells) in (1u32..).zip(rows) {
        for (col, cell) in (0u16..).zip(cells) {
            match cell {
                Cell::Text(text) => sheet.write_string(row, col, text)?,
                Cell::Count(n) => sheet.write_number(row, col, f64::from(*n))?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}
