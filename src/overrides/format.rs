//! Rendering override documents

use crate::error::{RelocatorError, Result};
use crate::tree::{Node, Path, Segment};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    /// One `path=value` line per scalar leaf, for `--set` style flags
    HelmSet,
}

impl FromStr for OutputFormat {
    type Err = RelocatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            "helm-set" | "set" => Ok(OutputFormat::HelmSet),
            other => Err(RelocatorError::Config(format!(
                "unknown output format '{}' (expected yaml, json or helm-set)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::HelmSet => "helm-set",
        })
    }
}

pub fn render(values: &Node, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => values.to_yaml_string(),
        OutputFormat::Json => values.to_json_string_pretty().map(|mut text| {
            text.push('\n');
            text
        }),
        OutputFormat::HelmSet => {
            let mut lines = helm_set_lines(values);
            lines.iter_mut().for_each(|line| line.push('\n'));
            Ok(lines.concat())
        }
    }
}

/// Flatten a tree into `path=value` assignments in document order.
///
/// Dots inside field names are escaped as `\.` and commas in values as `\,`.
/// Empty records and lists produce nothing.
pub fn helm_set_lines(values: &Node) -> Vec<String> {
    let mut lines = Vec::new();
    let mut path = Path::root();
    flatten(values, &mut path, &mut lines);
    lines
}

fn flatten(node: &Node, path: &mut Path, lines: &mut Vec<String>) {
    match node {
        Node::Record(record) => {
            for (key, value) in record {
                path.push(Segment::Field(key.clone()));
                flatten(value, path, lines);
                path.pop();
            }
        }
        Node::List(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(Segment::Index(index));
                flatten(item, path, lines);
                path.pop();
            }
        }
        scalar if !path.is_empty() => {
            let value = match scalar {
                Node::Str(text) => text.replace(',', "\\,"),
                Node::Empty => "null".to_string(),
                other => other.to_compact_string(),
            };
            lines.push(format!("{}={}", helm_path(path), value));
        }
        _ => {}
    }
}

/// Helm only understands `\.` escapes in keys.
fn helm_path(path: &Path) -> String {
    let mut out = String::new();
    for (i, segment) in path.segments().iter().enumerate() {
        match segment {
            Segment::Field(name) => {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(&name.replace('.', "\\."));
            }
            Segment::Index(index) => out.push_str(&format!("[{}]", index)),
        }
    }
    out
}
