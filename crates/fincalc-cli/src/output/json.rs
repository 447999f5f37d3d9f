use serde_json::Value;

/// Write the full computation envelope (result, methodology, warnings,
/// metadata) to stdout as pretty-printed JSON. This is the default output
/// mode and the one meant for piping into `jq` or other tools.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => eprintln!("Failed to serialize output as JSON: {}", e),
    }
}
