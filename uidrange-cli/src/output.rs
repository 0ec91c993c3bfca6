///! Output formatting for CLI
///!
///! Every command renders through here so table, JSON and YAML output stay
///! consistent.

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};
use uidrange_common::RangeStatus;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Table,
        }
    }
}

/// Print rows as a table, or the raw data as JSON/YAML
pub fn print_output<T: Tabled, S: Serialize>(rows: Vec<T>, data: &S, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(rows),
        OutputFormat::Json => print_json(data)?,
        OutputFormat::Yaml => print_yaml(data)?,
    }
    Ok(())
}

pub fn print_table<T: Tabled>(data: Vec<T>) {
    if data.is_empty() {
        println!("{}", "No results found".yellow());
        return;
    }

    let table = Table::new(data);
    println!("{}", table);
}

pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}

pub fn print_yaml<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    println!("{}", yaml);
    Ok(())
}

/// Colored status label for tables
pub fn format_status(status: RangeStatus) -> String {
    let label = status.to_string();
    match status {
        RangeStatus::Ok => label.green().to_string(),
        RangeStatus::Unset => label.dimmed().to_string(),
        RangeStatus::Mismatch | RangeStatus::Malformed => label.red().bold().to_string(),
    }
}

/// Print a success message with green check
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message with red X
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("YML"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::parse("wide"), OutputFormat::Table);
    }

    #[test]
    fn test_format_status_keeps_label() {
        colored::control::set_override(false);
        assert_eq!(format_status(RangeStatus::Mismatch), "mismatch");
        assert_eq!(format_status(RangeStatus::Ok), "ok");
    }
}
