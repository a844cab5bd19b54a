use anyhow::Context;
use casewise_schema::SchemaRegistry;

use crate::cli::SchemaArgs;

/// Handle `casewise schema [name]`.
pub fn handle(args: &SchemaArgs) -> anyhow::Result<()> {
    let registry = SchemaRegistry::new();
    let output = render(&registry, args.name.as_deref())?;
    println!("{output}");
    Ok(())
}

fn render(registry: &SchemaRegistry, name: Option<&str>) -> anyhow::Result<String> {
    match name {
        None => Ok(registry.list().join("\n")),
        Some(name) => {
            let schema = registry.get(name).with_context(|| {
                format!("unknown schema '{name}'; run `casewise schema` to list names")
            })?;
            serde_json::to_string_pretty(schema).context("failed to render schema")
        }
    }
}
