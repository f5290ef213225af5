//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Tabled)]
struct KeyValue {
    key: String,
    value: String,
}

impl OutputFormat {
    /// Print a single record. Tables show one row per top-level key.
    pub fn print<T: Serialize>(&self, data: &T) {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(data).unwrap_or_default());
            }
            OutputFormat::Table => match serde_json::to_value(data) {
                Ok(serde_json::Value::Object(map)) => {
                    let rows: Vec<KeyValue> = map
                        .into_iter()
                        .map(|(key, value)| KeyValue {
                            key,
                            value: cell(&value),
                        })
                        .collect();
                    println!("{}", Table::new(rows).with(Style::rounded()));
                }
                Ok(other) => println!("{}", cell(&other)),
                Err(_) => {}
            },
        }
    }

    /// Print a list of records.
    pub fn print_rows<T: Serialize + Tabled>(&self, rows: &[T]) {
        match self {
            OutputFormat::Table => {
                if rows.is_empty() {
                    println!("(none)");
                } else {
                    println!("{}", Table::new(rows).with(Style::rounded()));
                }
            }
            _ => self.print(&rows),
        }
    }
}

/// Compact single-line rendering of a JSON value for a table cell.
pub fn cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell(&json!(null)), "");
        assert_eq!(cell(&json!("text")), "text");
        assert_eq!(cell(&json!(3)), "3");
        assert_eq!(cell(&json!(["a", "b"])), r#"["a","b"]"#);
    }

    #[test]
    fn test_format_names() {
        assert!(matches!(OutputFormat::from_str("YAML", true), Ok(OutputFormat::Yaml)));
        assert!(OutputFormat::from_str("xml", true).is_err());
    }
}
