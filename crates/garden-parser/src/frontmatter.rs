//! Frontmatter splitting
//!
//! A document may open with a YAML block between `---` fences or a TOML block
//! between `+++` fences. An opening fence without a matching closing fence is
//! not frontmatter; the whole document is body.

use garden_core::parser::{Frontmatter, FrontmatterFormat, Metadata, ParserError, ParserResult};
use serde_json::Value;

/// A document split into frontmatter and markdown body
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDocument<'a> {
    /// Parsed frontmatter (empty when absent)
    pub frontmatter: Frontmatter,
    /// Markdown after the closing fence
    pub body: &'a str,
}

/// Split and parse the frontmatter block of `source`
pub fn split_frontmatter(source: &str) -> ParserResult<SplitDocument<'_>> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let Some((format, raw, body)) = find_block(source) else {
        return Ok(SplitDocument {
            frontmatter: Frontmatter::default(),
            body: source,
        });
    };

    let properties = match format {
        FrontmatterFormat::Yaml => parse_yaml(raw)?,
        FrontmatterFormat::Toml => parse_toml(raw)?,
        FrontmatterFormat::None => Metadata::new(),
    };

    Ok(SplitDocument {
        frontmatter: Frontmatter::new(format, properties),
        body,
    })
}

/// Locate the fenced block: (format, raw block text, remaining body)
fn find_block(source: &str) -> Option<(FrontmatterFormat, &str, &str)> {
    let mut lines = source.split_inclusive('\n');
    let opening = lines.next()?;
    let (format, fence) = match opening.trim_end() {
        "---" => (FrontmatterFormat::Yaml, "---"),
        "+++" => (FrontmatterFormat::Toml, "+++"),
        _ => return None,
    };

    let raw_start = opening.len();
    let mut offset = raw_start;
    for line in lines {
        let trimmed = line.trim_end();
        let closes = trimmed == fence || (format == FrontmatterFormat::Yaml && trimmed == "...");
        if closes {
            let raw = &source[raw_start..offset];
            let body = &source[offset + line.len()..];
            return Some((format, raw, body));
        }
        offset += line.len();
    }
    None
}

fn parse_yaml(raw: &str) -> ParserResult<Metadata> {
    if raw.trim().is_empty() {
        return Ok(Metadata::new());
    }

    let value: serde_yaml::Value =
        serde_yaml::from_str(raw).map_err(|e| ParserError::frontmatter(e.to_string()))?;
    match value {
        serde_yaml::Value::Null => Ok(Metadata::new()),
        serde_yaml::Value::Mapping(_) => match serde_json::to_value(&value) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ParserError::frontmatter("frontmatter must be a mapping")),
            Err(e) => Err(ParserError::frontmatter(e.to_string())),
        },
        _ => Err(ParserError::frontmatter("frontmatter must be a mapping")),
    }
}

fn parse_toml(raw: &str) -> ParserResult<Metadata> {
    let table: toml::Table =
        toml::from_str(raw).map_err(|e| ParserError::frontmatter(e.to_string()))?;
    Ok(table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect())
}

/// Convert TOML values, rendering datetimes as their RFC 3339 text
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}
