use crate::error::Result;
use crate::instance::{InstanceItem, default_instance, group_instances};
use crate::telemetry::load_batch;
use comfy_table::{ContentArrangement, Table, presets};
use serde_json::json;
use std::path::Path;

pub fn run(file: &Path, json: bool) -> Result<()> {
    let items: Vec<InstanceItem> = load_batch(file)?;
    let groups = group_instances(items);
    let default = default_instance(None, &groups);

    if json {
        let output: Vec<_> = groups
            .iter()
            .map(|group| {
                json!({
                    "name": group.name,
                    "instances": &group.instances,
                })
            })
            .collect();
        let output = json!({
            "groups": output,
            "default": default,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Failed to serialize instance groups: {e}"),
        }
        return Ok(());
    }

    if groups.is_empty() {
        println!("No instances in this window.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["TYPE", "INSTANCE"]);
    for group in &groups {
        for item in &group.instances {
            table.add_row([group.name.as_str(), item.instance.as_str()]);
        }
    }
    println!("{table}");

    if let Some(item) = default {
        println!("Default: {item}");
    }

    Ok(())
}
