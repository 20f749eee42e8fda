//! Export requests.

use std::collections::HashSet;

use crate::column::{ColumnSpec, Row};
use crate::error::{ExportError, ExportResult};

/// Filename stem of a CSV export when none is given.
pub const DEFAULT_CSV_STEM: &str = "dados";

/// Filename stem of a printable document when none is given.
pub const DEFAULT_DOCUMENT_STEM: &str = "relatorio";

/// Document title when none is given.
pub const DEFAULT_TITLE: &str = "Relatório";

/// Everything one export needs: the dataset, its columns and naming.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub filename_stem: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Row>,
}

impl ExportRequest {
    pub fn new(columns: Vec<ColumnSpec>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            ..Default::default()
        }
    }

    pub fn with_filename_stem(mut self, stem: impl Into<String>) -> Self {
        self.filename_stem = Some(stem.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn csv_stem(&self) -> &str {
        self.stem_or(DEFAULT_CSV_STEM)
    }

    pub fn document_stem(&self) -> &str {
        self.stem_or(DEFAULT_DOCUMENT_STEM)
    }

    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
    }

    fn stem_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.filename_stem
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
    }

    /// Reject requests that cannot produce an artifact.
    pub fn validate(&self) -> ExportResult<()> {
        if self.rows.is_empty() {
            return Err(ExportError::EmptyDataset);
        }
        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if !seen.insert(column.key.as_str()) {
                return Err(ExportError::DuplicateColumn(column.key.clone()));
            }
        }
        if let Some(stem) = &self.filename_stem
            && stem.contains(['/', '\\', '\0'])
        {
            return Err(ExportError::InvalidFilename(stem.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let request = ExportRequest::new(vec![], vec![]);
        assert_eq!(request.csv_stem(), "dados");
        assert_eq!(request.document_stem(), "relatorio");
        assert_eq!(request.title(), "Relatório");

        let request = request.with_filename_stem("lotes").with_title("Lotes de abate");
        assert_eq!(request.csv_stem(), "lotes");
        assert_eq!(request.document_stem(), "lotes");
        assert_eq!(request.title(), "Lotes de abate");
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let request = ExportRequest::new(vec![ColumnSpec::new("nome", "Nome")], vec![]);
        assert!(matches!(request.validate(), Err(ExportError::EmptyDataset)));
    }

    #[test]
    fn test_stem_with_path_separator_rejected() {
        for stem in ["../fora", "sub/lotes", "..\\fora"] {
            let request = ExportRequest::new(
                vec![ColumnSpec::new("nome", "Nome")],
                rows(json!([{"nome": "Frango"}])),
            )
            .with_filename_stem(stem);
            assert!(
                matches!(request.validate(), Err(ExportError::InvalidFilename(ref s)) if s == stem),
                "{stem} accepted"
            );
        }
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let request = ExportRequest::new(
            vec![ColumnSpec::new("nome", "Nome"), ColumnSpec::new("nome", "Outro")],
            rows(json!([{"nome": "Frango"}])),
        );
        match request.validate() {
            Err(ExportError::DuplicateColumn(key)) => assert_eq!(key, "nome"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
