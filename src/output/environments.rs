//! Environment list output formatter

use comfy_table::{presets::NOTHING, Table};
use serde::Serialize;

use super::common::{print_json, print_yaml};
use crate::cli::OutputFormat;
use crate::session::Environment;

#[derive(Serialize, Debug)]
struct SerializableEnvironment<'a> {
    name: &'a str,
    endpoint: &'a str,
    authority: &'a str,
    current: bool,
}

/// Output environments, marking the one the session points at
pub fn output_environments<'a, I>(environments: I, current: Option<&str>, format: OutputFormat)
where
    I: IntoIterator<Item = &'a Environment>,
{
    let rows: Vec<SerializableEnvironment> = environments
        .into_iter()
        .map(|env| SerializableEnvironment {
            name: env.name(),
            endpoint: env.endpoint(),
            authority: env.authority(),
            current: current == Some(env.name()),
        })
        .collect();

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(NOTHING);
            table.set_header(vec!["CURRENT", "NAME", "ENDPOINT", "AUTHORITY"]);
            for row in &rows {
                table.add_row(vec![
                    if row.current { "*" } else { "" },
                    row.name,
                    row.endpoint,
                    row.authority,
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Yaml => print_yaml(&rows),
    }
}
