//! Output formatting for CLI

use reelcast_core::{ContentRef, SessionSnapshot};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// One catalog entry
#[derive(Debug, Serialize, Tabled)]
pub struct CatalogRow {
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Name")]
    pub name: String,
}

impl CatalogRow {
    pub fn new(content: &ContentRef) -> Self {
        Self {
            kind: content.kind().to_string(),
            name: content.identifier().to_string(),
        }
    }
}

/// Format output based on selected format
pub fn format_output<T: Serialize>(data: &T, format: &str) -> String {
    match OutputFormat::from(format) {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table | OutputFormat::Text => {
            serde_json::to_value(data).unwrap_or_default().to_string()
        }
    }
}

/// Render catalog rows as a table or JSON
pub fn format_catalog(rows: &[CatalogRow], format: &str) -> String {
    match OutputFormat::from(format) {
        OutputFormat::Table => Table::new(rows).to_string(),
        _ => format_output(&rows, format),
    }
}

/// One JSON line per snapshot, suitable for piping
pub fn format_snapshot(snapshot: &SessionSnapshot) -> String {
    serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string())
}
