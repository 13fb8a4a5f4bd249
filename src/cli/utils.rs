use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::path::Path;

use crate::assessment::Score;
use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print `data` as JSON, or hand it to `text` for the human-readable form
pub fn output_data<T: Serialize>(output_format: &OutputFormat, data: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => text(data),
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: [] }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Load a YAML or JSON document, chosen by file extension
pub fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
    parse_document(path, &raw)
}

fn parse_document<T: DeserializeOwned>(path: &Path, raw: &str) -> anyhow::Result<T> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(raw).with_context(|| format!("invalid YAML in {}", path.display()))
        }
        _ => serde_json::from_str(raw).with_context(|| format!("invalid JSON in {}", path.display())),
    }
}

/// `D 3  I 1  S 0  C 0`
pub fn format_score(score: &Score) -> String {
    crate::assessment::Axis::ALL
        .iter()
        .map(|axis| format!("{} {}", axis, score.get(*axis)))
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn documents_parse_by_extension() {
        let yaml: HashMap<String, String> = parse_document(Path::new("a.yaml"), "\"1\": D\n\"2\": I\n").unwrap();
        assert_eq!(yaml.get("2").map(String::as_str), Some("I"));

        let json: HashMap<String, String> = parse_document(Path::new("a.json"), r#"{"1":"C"}"#).unwrap();
        assert_eq!(json.get("1").map(String::as_str), Some("C"));

        assert!(parse_document::<HashMap<String, String>>(Path::new("a.json"), "1: D").is_err());
    }

    #[test]
    fn score_is_printed_in_axis_order() {
        let score = Score { d: 3, i: 1, s: 0, c: 0 };
        assert_eq!(format_score(&score), "D 3  I 1  S 0  C 0");
    }
}
