//! Output formatting utilities

use erm_core::{BatchItemError, Edge, Entity, Properties};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Rows that can be shown as a table
pub trait Tabular {
    fn headers() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

impl Tabular for Entity {
    fn headers() -> &'static [&'static str] {
        &["ID", "TYPE", "PROPERTIES", "CREATED"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.entity_type.clone(),
            compact(&self.properties),
            self.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]
    }
}

impl Tabular for Edge {
    fn headers() -> &'static [&'static str] {
        &["ID", "TYPE", "SOURCE", "TARGET", "PROPERTIES"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.edge_type.clone(),
            self.source_id.to_string(),
            self.target_id.to_string(),
            compact(&self.properties),
        ]
    }
}

impl Tabular for BatchItemError {
    fn headers() -> &'static [&'static str] {
        &["INDEX", "FIELD", "REASON"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.index.to_string(),
            self.field.clone().unwrap_or_default(),
            serde_json::to_string(&self.reason).unwrap_or_default(),
        ]
    }
}

fn compact(properties: &Properties) -> String {
    let mut keys: Vec<&String> = properties.keys().collect();
    keys.sort();
    keys.iter()
        .map(|k| format!("{}={}", k, properties[k.as_str()]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render rows with space-padded columns
pub fn render_table<T: Tabular>(rows: &[T]) -> String {
    let headers = T::headers();
    let cells: Vec<Vec<String>> = rows.iter().map(Tabular::row).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |values: Vec<String>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.iter().map(|h| h.to_string()).collect())];
    out.extend(cells.into_iter().map(line));
    out.join("\n")
}

/// Format any serializable value as JSON
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Print a list in the requested format
pub fn print_list<T: Tabular + Serialize>(rows: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", format_json(&rows)),
        OutputFormat::Table if rows.is_empty() => println!("(none)"),
        OutputFormat::Table => println!("{}", render_table(rows)),
    }
}

/// Print a single record in the requested format
pub fn print_one<T: Tabular + Serialize>(row: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", format_json(row)),
        OutputFormat::Table => print_list(std::slice::from_ref(row), format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erm_core::WorkspaceId;
    use serde_json::json;

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("yaml"), OutputFormat::Table);
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let ws = WorkspaceId::new();
        let props: Properties = serde_json::from_value(json!({"name": "Ada", "age": 36})).unwrap();
        let entity = Entity::new(ws, "Person", props);

        let table = render_table(&[entity.clone()]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with(&entity.id.to_string()));
        assert!(lines[1].contains("age=36 name=\"Ada\""));
    }
}
