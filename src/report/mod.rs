//! Parsing of knip's `--reporter json` output into a [`ParsedReport`].

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::{Category, CategoryShape, FileMap, Item, ParsedReport};

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    files: Vec<Value>,
    #[serde(default)]
    issues: Vec<Map<String, Value>>,
}

/// knip can evaluate config files that print to stdout, so the report is the
/// last line that looks like a JSON object. Output that parses as a single
/// (possibly pretty-printed) JSON document is taken whole.
pub fn extract_json_payload(output: &str) -> Result<&str> {
    let trimmed = output.trim();
    if trimmed.starts_with('{') && serde_json::from_str::<Value>(trimmed).is_ok() {
        return Ok(trimmed);
    }
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with('{') && line.ends_with('}'))
        .ok_or_else(|| anyhow!("Unable to find JSON blob"))
}

pub fn parse(raw: &str) -> Result<ParsedReport> {
    let raw: RawReport = serde_json::from_str(raw).context("Failed to parse knip JSON report")?;

    let mut out = ParsedReport {
        files: raw
            .files
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        ..ParsedReport::default()
    };

    for (idx, entry) in raw.issues.into_iter().enumerate() {
        let file = match entry.get("file").and_then(Value::as_str) {
            Some(file) if !file.trim().is_empty() => file.to_string(),
            _ => bail!("knip issue entry #{idx} has no `file` path"),
        };

        for (key, value) in entry {
            if key == "file" || value.is_null() {
                continue;
            }
            let category = match key.parse::<Category>() {
                Ok(category) => category,
                Err(_) => {
                    tracing::debug!(file = %file, key = %key, "skipping non-finding key");
                    continue;
                }
            };
            insert_result(&mut out, category, &file, value)
                .with_context(|| format!("Invalid `{category}` result for {file}"))?;
        }
    }

    Ok(out)
}

fn insert_result(out: &mut ParsedReport, category: Category, file: &str, value: Value) -> Result<()> {
    match category.shape() {
        CategoryShape::Plain | CategoryShape::Positioned => {
            let items: Vec<Item> = serde_json::from_value(value)?;
            if items.is_empty() {
                return Ok(());
            }
            if let Some(bucket) = out.items_mut(category) {
                append(bucket, file, items);
            }
        }
        CategoryShape::Grouped => {
            let groups: Vec<Vec<Item>> = serde_json::from_value(value)?;
            let groups: Vec<Vec<Item>> = groups.into_iter().filter(|g| !g.is_empty()).collect();
            if !groups.is_empty() {
                append(&mut out.duplicates, file, groups);
            }
        }
        CategoryShape::Members => {
            let containers: BTreeMap<String, Vec<Item>> = serde_json::from_value(value)?;
            let containers: BTreeMap<String, Vec<Item>> = containers
                .into_iter()
                .filter(|(_, members)| !members.is_empty())
                .collect();
            if containers.is_empty() {
                return Ok(());
            }
            let Some(bucket) = out.members_mut(category) else {
                return Ok(());
            };
            let existing = bucket.entry(file.to_string()).or_default();
            for (container, members) in containers {
                existing.entry(container).or_default().extend(members);
            }
        }
    }
    Ok(())
}

fn append<T>(bucket: &mut FileMap<Vec<T>>, file: &str, values: Vec<T>) {
    bucket.entry(file.to_string()).or_default().extend(values);
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
        "files": ["src/Unused.ts", "", null],
        "issues": [
            {
                "file": "package.json",
                "owners": [],
                "dependencies": [{"name": "react"}, {"name": "react-dom"}],
                "devDependencies": [{"name": "dotenv"}],
                "unlisted": [],
                "exports": [],
                "enumMembers": {},
                "classMembers": null
            },
            {
                "file": "src/Weapons.ts",
                "exports": [{"name": "sheepinator", "line": 83, "col": 14, "pos": 3858}],
                "types": [{"name": "Cowinator", "line": 75, "col": 13, "pos": 3686}],
                "duplicates": [[{"name": "Ratchet"}, {"name": "default"}], []],
                "enumMembers": {"Homeworld": [{"name": "Magmos", "line": 37, "col": 5, "pos": 1273}], "Empty": []},
                "nsExports": []
            }
        ]
    }"#;

    #[test]
    fn parses_every_bucket_shape() {
        let report = parse(REPORT).expect("parse");

        assert_eq!(report.files, vec!["src/Unused.ts".to_string()]);
        assert_eq!(
            report.dependencies["package.json"],
            vec![Item::named("react"), Item::named("react-dom")]
        );
        assert_eq!(report.dev_dependencies["package.json"].len(), 1);
        assert_eq!(
            report.exports["src/Weapons.ts"],
            vec![Item::at("sheepinator", 83, 14, 3858)]
        );
        assert_eq!(report.types["src/Weapons.ts"][0].name, "Cowinator");
        assert_eq!(report.duplicates["src/Weapons.ts"].len(), 1);
        assert_eq!(report.enum_members["src/Weapons.ts"].len(), 1);
        assert_eq!(
            report.enum_members["src/Weapons.ts"]["Homeworld"][0].name,
            "Magmos"
        );
    }

    #[test]
    fn empty_and_null_results_are_omitted() {
        let report = parse(REPORT).expect("parse");

        assert!(report.unlisted.is_empty());
        assert!(!report.exports.contains_key("package.json"));
        assert!(!report.enum_members.contains_key("package.json"));
        assert!(report.class_members.is_empty());
        assert!(report.binaries.is_empty());
    }

    #[test]
    fn item_order_within_a_file_is_preserved() {
        let raw = r#"{"files": [], "issues": [{"file": "a.ts", "exports": [
            {"name": "z"}, {"name": "a"}, {"name": "m"}
        ]}]}"#;
        let report = parse(raw).expect("parse");
        let names: Vec<&str> = report.exports["a.ts"]
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, ["z", "a", "m"]);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse("{\"files\": [").is_err());
        assert!(parse("[{\"file\": \"a.ts\"}]").is_err());
    }

    #[test]
    fn issue_without_file_is_rejected() {
        let err = parse(r#"{"issues": [{"exports": [{"name": "x"}]}]}"#).unwrap_err();
        assert!(err.to_string().contains("no `file` path"), "{err}");
    }

    #[test]
    fn extracts_last_json_object_from_noisy_output() {
        let output = r#"

> knip-reporter@0.0.0 knip /Users/x/dev/p/knip-reporter
> knip "--reporter" "json"

{"files":["foo.ts"],"issues":[{"foo":"bar"}]}

{"files":["bar.ts"],"issues":[]}
 ELIFECYCLE  Command failed with exit code 3.

"#;
        let json = extract_json_payload(output).expect("json line");
        assert_eq!(json, r#"{"files":["bar.ts"],"issues":[]}"#);
        assert!(serde_json::from_str::<Value>(json).is_ok());
    }

    #[test]
    fn pretty_printed_output_is_taken_whole() {
        let json = extract_json_payload(REPORT).expect("json");
        assert!(parse(json).is_ok());
    }

    #[test]
    fn json_printed_by_a_config_file_is_skipped() {
        let output = "{\"configLoaded\": true}\n{\"files\":[\"a.ts\"],\"issues\":[]}";
        let json = extract_json_payload(output).expect("json line");
        assert_eq!(json, "{\"files\":[\"a.ts\"],\"issues\":[]}");
        assert_eq!(parse(json).expect("parse").files, vec!["a.ts".to_string()]);
    }

    #[test]
    fn missing_json_blob_is_an_error() {
        let output = "\n> knip\n\nUnused files (2)\nsrc/x.ts\n ELIFECYCLE  Command failed.\n";
        let err = extract_json_payload(output).unwrap_err();
        assert_eq!(err.to_string(), "Unable to find JSON blob");
    }
}
