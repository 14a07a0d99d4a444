use std::collections::BTreeMap;

use crate::error::Result;

/// Scalar front matter fields, stringified.
///
/// Posts may open with either a `---` fenced YAML block or a `+++` fenced
/// TOML block. Only scalar values are kept; nested tables and lists are
/// ignored since nothing downstream consumes them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    fields: BTreeMap<String, String>,
}

impl FrontMatter {
    /// Splits `input` into its front matter and the remaining body. Input
    /// without a complete leading block has empty front matter and is all
    /// body.
    pub fn split(input: &str) -> Result<(FrontMatter, &str)> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        if let Some((block, body)) = fenced(input, Yaml::FENCE) {
            return Ok((Yaml::parse(block)?, body));
        }

        if let Some((block, body)) = fenced(input, Toml::FENCE) {
            return Ok((Toml::parse(block)?, body));
        }

        Ok((FrontMatter::default(), input))
    }

    /// The value of `key`, or `""` when it is absent.
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map_or("", |v| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Returns the text between an opening `fence` line at the very start of
/// `input` and the next line consisting solely of `fence`, and the text after
/// that closing line.
fn fenced<'a>(input: &'a str, fence: &str) -> Option<(&'a str, &'a str)> {
    let rest = input.strip_prefix(fence)?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == fence {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }

        offset += line.len();
    }

    None
}

trait Format {
    const FENCE: &'static str;

    fn fields(block: &str) -> Result<BTreeMap<String, String>>;

    fn parse(block: &str) -> Result<FrontMatter> {
        if block.trim().is_empty() {
            return Ok(FrontMatter::default());
        }

        Self::fields(block).map(|fields| FrontMatter { fields })
    }
}

struct Yaml;

struct Toml;

impl Format for Yaml {
    const FENCE: &'static str = "---";

    fn fields(block: &str) -> Result<BTreeMap<String, String>> {
        use serde_yaml::Value;

        let mapping: serde_yaml::Mapping = serde_yaml::from_str(block)?;
        let fields = mapping.into_iter()
            .filter_map(|(key, value)| {
                let key = match key {
                    Value::String(key) => key,
                    _ => return None,
                };

                let value = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };

                Some((key, value))
            })
            .collect();

        Ok(fields)
    }
}

impl Format for Toml {
    const FENCE: &'static str = "+++";

    fn fields(block: &str) -> Result<BTreeMap<String, String>> {
        use toml::Value;

        let table: toml::Table = toml::from_str(block)?;
        let fields = table.into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    Value::Integer(i) => i.to_string(),
                    Value::Float(f) => f.to_string(),
                    Value::Boolean(b) => b.to_string(),
                    Value::Datetime(d) => d.to_string(),
                    Value::Array(_) | Value::Table(_) => return None,
                };

                Some((key, value))
            })
            .collect();

        Ok(fields)
    }
}
