use crate::api::ApiClient;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use tabled::Tabled;
use uidrange_common::{AllocatorStatus, RangeRecord};

#[derive(Tabled)]
struct RangeRow {
    #[tabled(rename = "NAMESPACE")]
    namespace: String,
    #[tabled(rename = "UID RANGE")]
    uid_range: String,
    #[tabled(rename = "GROUP RANGE")]
    group_range: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

impl From<&RangeRecord> for RangeRow {
    fn from(record: &RangeRecord) -> Self {
        let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

        Self {
            namespace: record.namespace.clone(),
            uid_range: or_dash(&record.uid_range),
            group_range: or_dash(&record.group_range),
            status: output::format_status(record.status),
        }
    }
}

pub async fn handle_ranges_command(
    namespace: Option<String>,
    api: &ApiClient,
    output_format: OutputFormat,
) -> Result<()> {
    let records: Vec<RangeRecord> = match namespace {
        Some(namespace) => vec![api.get(&format!("/api/v1/ranges/{}", namespace)).await?],
        None => api.get("/api/v1/ranges").await?,
    };

    let rows: Vec<RangeRow> = records.iter().map(RangeRow::from).collect();
    output::print_output(rows, &records, output_format)?;

    if output_format == OutputFormat::Table {
        for record in records.iter().filter(|r| r.message.is_some()) {
            output::print_error(&format!(
                "{}: {}",
                record.namespace,
                record.message.as_deref().unwrap_or_default()
            ));
        }
    }

    Ok(())
}

pub async fn handle_allocator_command(api: &ApiClient, output_format: OutputFormat) -> Result<()> {
    let status: AllocatorStatus = api.get("/api/v1/allocator").await?;

    match output_format {
        OutputFormat::Json => output::print_json(&status)?,
        OutputFormat::Yaml => output::print_yaml(&status)?,
        OutputFormat::Table => {
            println!("Allocator:");
            println!("  Initialized:   {}", status.initialized);
            match status.next_start {
                Some(start) => println!("  Next block:    {}/{}", start, status.block_size),
                None => println!("  Next block:    -"),
            }
            println!("  Block size:    {}", status.block_size);
            println!("  Default start: {}", status.default_start);
        }
    }

    Ok(())
}
