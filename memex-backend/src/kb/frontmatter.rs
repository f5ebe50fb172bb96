//! Parse entry documents: YAML frontmatter header + markdown body.
//!
//! Hand-rolled YAML subset, no serde_yaml. Scalars, inline string lists,
//! block string lists, and block lists of maps (edges/sources) are
//! supported; anything else in the header is a parse error.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::entry::{slug_for_path, Edge, Entry, EntryType, ParseError, Source};

/// Parse one raw document into a validated Entry.
/// Any malformed edge or source item fails the whole document; the batch
/// loader skips it and reports the error per document.
pub fn parse_entry(path: &str, content: &str) -> Result<Entry, ParseError> {
    let (header, body) = split_frontmatter(content)?;
    let raw = parse_header(&header)?;

    let title = raw
        .scalars
        .get("title")
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingField("title"))?;

    let entry_type: EntryType = raw
        .scalars
        .get("type")
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingField("type"))?
        .parse()
        .map_err(|_| {
            ParseError::invalid("type", format!("unrecognized value '{}'", raw.scalars["type"]))
        })?;

    let summary = raw
        .scalars
        .get("summary")
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingField("summary"))?;

    let created = parse_date(
        raw.scalars
            .get("created")
            .filter(|s| !s.is_empty())
            .ok_or(ParseError::MissingField("created"))?,
        "created",
    )?;

    let updated = match raw.scalars.get("updated").filter(|s| !s.is_empty()) {
        Some(v) => Some(parse_date(v, "updated")?),
        None => None,
    };

    let mut edges = Vec::new();
    for item in &raw.edges {
        edges.push(Edge {
            label: required_item_field(item, "label", "edges")?,
            path: required_item_field(item, "path", "edges")?,
            description: item.get("description").cloned().filter(|s| !s.is_empty()),
        });
    }

    let mut sources = Vec::new();
    for item in &raw.sources {
        sources.push(Source {
            url: required_item_field(item, "url", "sources")?,
            title: item.get("title").cloned().filter(|s| !s.is_empty()),
        });
    }

    Ok(Entry {
        path: path.to_string(),
        slug: slug_for_path(path),
        title,
        entry_type,
        summary,
        tags: raw.tags,
        created,
        updated,
        edges,
        sources,
        body,
    })
}

fn parse_date(value: &str, field: &'static str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ParseError::invalid(field, format!("expected YYYY-MM-DD, got '{}'", value)))
}

fn required_item_field(
    item: &HashMap<String, String>,
    key: &str,
    field: &'static str,
) -> Result<String, ParseError> {
    item.get(key)
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ParseError::invalid(field, format!("list item missing '{}'", key)))
}

/// Split content into (header_yaml, body). A document without an opening and
/// closing `---` fence has no decodable header and is rejected.
fn split_frontmatter(content: &str) -> Result<(String, String), ParseError> {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return Err(ParseError::MissingFrontmatter);
    }

    let after_open = &trimmed[3..];
    let close_idx = after_open
        .find("\n---")
        .ok_or(ParseError::MissingFrontmatter)?;

    let yaml = after_open[..close_idx].trim().to_string();
    let body_start = close_idx + 4; // skip \n---
    let body = if body_start < after_open.len() {
        after_open[body_start..]
            .trim_start_matches('\n')
            .to_string()
    } else {
        String::new()
    };
    Ok((yaml, body))
}

/// Which block-list section an indented line belongs to
#[derive(PartialEq)]
enum Section {
    None,
    Tags,
    Edges,
    Sources,
}

/// Header fields before validation
#[derive(Default)]
struct RawHeader {
    scalars: HashMap<String, String>,
    tags: Vec<String>,
    edges: Vec<HashMap<String, String>>,
    sources: Vec<HashMap<String, String>>,
}

/// Indent-tracked parse of the header block. Top-level lines are
/// `key: value` pairs; indented lines belong to the current list section.
fn parse_header(yaml: &str) -> Result<RawHeader, ParseError> {
    let mut raw = RawHeader::default();
    let mut section = Section::None;
    let mut current_item: Option<HashMap<String, String>> = None;

    for line in yaml.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let indent = line.len() - line.trim_start().len();

        if indent == 0 {
            flush_item(&mut raw, &section, &mut current_item);

            let (key, value) = trimmed
                .split_once(':')
                .ok_or_else(|| ParseError::invalid("frontmatter", format!("bad line '{}'", trimmed)))?;
            let key = key.trim();
            let value = value.trim();

            section = Section::None;
            match key {
                "tags" => {
                    if value.is_empty() {
                        section = Section::Tags;
                    } else if value.starts_with('[') {
                        raw.tags = parse_inline_list(value);
                    } else {
                        return Err(ParseError::invalid("tags", "expected a list"));
                    }
                }
                "edges" => section = begin_object_list(value, "edges")?,
                "sources" => section = begin_object_list(value, "sources")?,
                _ => {
                    raw.scalars.insert(key.to_string(), unquote(value));
                }
            }
        } else {
            match section {
                Section::Tags => {
                    let item = trimmed
                        .strip_prefix('-')
                        .ok_or_else(|| ParseError::invalid("tags", format!("bad item '{}'", trimmed)))?;
                    let tag = unquote(item.trim());
                    if !tag.is_empty() {
                        raw.tags.push(tag);
                    }
                }
                Section::Edges | Section::Sources => {
                    let field = if section == Section::Edges { "edges" } else { "sources" };
                    if let Some(rest) = trimmed.strip_prefix('-') {
                        flush_item(&mut raw, &section, &mut current_item);
                        let mut item = HashMap::new();
                        let rest = rest.trim();
                        if !rest.is_empty() {
                            let (k, v) = rest.split_once(':').ok_or_else(|| {
                                ParseError::invalid(field, format!("bad item '{}'", trimmed))
                            })?;
                            item.insert(k.trim().to_string(), unquote(v.trim()));
                        }
                        current_item = Some(item);
                    } else {
                        let (k, v) = trimmed.split_once(':').ok_or_else(|| {
                            ParseError::invalid(field, format!("bad item '{}'", trimmed))
                        })?;
                        let item = current_item.as_mut().ok_or_else(|| {
                            ParseError::invalid(field, format!("dangling key '{}'", trimmed))
                        })?;
                        item.insert(k.trim().to_string(), unquote(v.trim()));
                    }
                }
                Section::None => {
                    return Err(ParseError::invalid(
                        "frontmatter",
                        format!("unexpected indented line '{}'", trimmed),
                    ));
                }
            }
        }
    }

    flush_item(&mut raw, &section, &mut current_item);
    Ok(raw)
}

/// `edges:` / `sources:` open a block list; only an empty value or `[]` is
/// accepted on the key line itself.
fn begin_object_list(value: &str, field: &'static str) -> Result<Section, ParseError> {
    if value.is_empty() {
        Ok(match field {
            "edges" => Section::Edges,
            _ => Section::Sources,
        })
    } else if value == "[]" {
        Ok(Section::None)
    } else {
        Err(ParseError::invalid(field, "expected a block list"))
    }
}

fn flush_item(
    raw: &mut RawHeader,
    section: &Section,
    current_item: &mut Option<HashMap<String, String>>,
) {
    if let Some(item) = current_item.take() {
        match section {
            Section::Edges => raw.edges.push(item),
            Section::Sources => raw.sources.push(item),
            _ => {}
        }
    }
}

/// Remove surrounding quotes from a string
fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Parse an inline YAML list like [foo, bar, "baz qux"]
fn parse_inline_list(s: &str) -> Vec<String> {
    let s = s.trim();
    let inner = if s.starts_with('[') && s.ends_with(']') {
        &s[1..s.len() - 1]
    } else {
        s
    };

    inner
        .split(',')
        .map(|item| unquote(item.trim()))
        .filter(|item| !item.is_empty())
        .collect()
}
