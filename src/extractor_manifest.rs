//! Language build-manifest extractor (rank 3).
//!
//! One extractor handles all recognized manifests, branching on the exact
//! filename: `Cargo.toml`, `pyproject.toml`, and `package.json`. Each yields
//! the descriptive subset codemeta cares about: name, description, version,
//! license, people, repository and homepage URLs, and the implementation
//! language.

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::extract::Extractor;
use crate::models::{ProjectContext, SourceKind};

pub struct ManifestExtractor;

impl Extractor for ManifestExtractor {
    fn kind(&self) -> SourceKind {
        SourceKind::LanguageManifest
    }

    fn extract(&self, source: &Path, ctx: &ProjectContext) -> Result<String> {
        let content = std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;

        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let record = match filename.as_str() {
            "Cargo.toml" => from_cargo(&content)?,
            "pyproject.toml" => from_pyproject(&content)?,
            "package.json" => from_package_json(&content)?,
            other => bail!("unrecognized manifest filename: {other}"),
        };

        // A release checkout trusts the manifest's version; on a moving
        // branch the manifest version describes unreleased work.
        let mut record = record;
        if !ctx.is_release {
            record.remove("version");
        }

        Ok(serde_json::to_string(&Value::Object(record))?)
    }
}

fn from_cargo(content: &str) -> Result<Map<String, Value>> {
    let manifest: toml::Value = toml::from_str(content).context("Failed to parse Cargo.toml")?;
    let package = manifest
        .get("package")
        .and_then(|p| p.as_table())
        .context("Cargo.toml has no [package] table")?;

    let mut record = Map::new();
    record.insert("programmingLanguage".into(), json!("Rust"));

    for (toml_key, codemeta_key) in [
        ("name", "name"),
        ("description", "description"),
        ("version", "version"),
        ("repository", "codeRepository"),
        ("homepage", "url"),
    ] {
        if let Some(value) = package.get(toml_key).and_then(|v| v.as_str()) {
            record.insert(codemeta_key.into(), json!(value));
        }
    }
    if let Some(license) = package.get("license").and_then(|v| v.as_str()) {
        record.insert("license".into(), json!(spdx_uri(license)));
    }
    if let Some(authors) = package.get("authors").and_then(|v| v.as_array()) {
        let people: Vec<Value> = authors
            .iter()
            .filter_map(|a| a.as_str())
            .map(parse_person)
            .collect();
        if !people.is_empty() {
            record.insert("author".into(), Value::Array(people));
        }
    }
    Ok(record)
}

fn from_pyproject(content: &str) -> Result<Map<String, Value>> {
    let manifest: toml::Value =
        toml::from_str(content).context("Failed to parse pyproject.toml")?;
    let project = manifest
        .get("project")
        .and_then(|p| p.as_table())
        .context("pyproject.toml has no [project] table")?;

    let mut record = Map::new();
    record.insert("programmingLanguage".into(), json!("Python"));

    for (toml_key, codemeta_key) in [
        ("name", "name"),
        ("description", "description"),
        ("version", "version"),
    ] {
        if let Some(value) = project.get(toml_key).and_then(|v| v.as_str()) {
            record.insert(codemeta_key.into(), json!(value));
        }
    }

    // `license` may be an SPDX string or a `{ text = ... }` table.
    match project.get("license") {
        Some(toml::Value::String(s)) => {
            record.insert("license".into(), json!(spdx_uri(s)));
        }
        Some(toml::Value::Table(t)) => {
            if let Some(text) = t.get("text").and_then(|v| v.as_str()) {
                record.insert("license".into(), json!(spdx_uri(text)));
            }
        }
        _ => {}
    }

    if let Some(authors) = project.get("authors").and_then(|v| v.as_array()) {
        let people: Vec<Value> = authors
            .iter()
            .filter_map(|a| a.as_table())
            .filter_map(|t| {
                let name = t.get("name").and_then(|v| v.as_str())?;
                let mut person = name_to_person(name);
                if let (Value::Object(map), Some(email)) =
                    (&mut person, t.get("email").and_then(|v| v.as_str()))
                {
                    map.insert("email".into(), json!(email));
                }
                Some(person)
            })
            .collect();
        if !people.is_empty() {
            record.insert("author".into(), Value::Array(people));
        }
    }

    if let Some(urls) = project.get("urls").and_then(|v| v.as_table()) {
        for (key, codemeta_key) in [
            ("Repository", "codeRepository"),
            ("repository", "codeRepository"),
            ("Homepage", "url"),
            ("homepage", "url"),
        ] {
            if let Some(url) = urls.get(key).and_then(|v| v.as_str()) {
                record.entry(codemeta_key.to_string()).or_insert(json!(url));
            }
        }
    }
    Ok(record)
}

fn from_package_json(content: &str) -> Result<Map<String, Value>> {
    let manifest: Value =
        serde_json::from_str(content).context("Failed to parse package.json")?;
    let obj = manifest
        .as_object()
        .context("package.json is not a JSON object")?;

    let mut record = Map::new();
    record.insert("programmingLanguage".into(), json!("JavaScript"));

    for (json_key, codemeta_key) in [
        ("name", "name"),
        ("description", "description"),
        ("version", "version"),
        ("homepage", "url"),
    ] {
        if let Some(value) = obj.get(json_key).and_then(|v| v.as_str()) {
            record.insert(codemeta_key.into(), json!(value));
        }
    }
    if let Some(license) = obj.get("license").and_then(|v| v.as_str()) {
        record.insert("license".into(), json!(spdx_uri(license)));
    }

    // `repository` may be a string or `{ "url": ... }`.
    match obj.get("repository") {
        Some(Value::String(s)) => {
            record.insert("codeRepository".into(), json!(s));
        }
        Some(Value::Object(r)) => {
            if let Some(url) = r.get("url").and_then(|v| v.as_str()) {
                record.insert("codeRepository".into(), json!(url));
            }
        }
        _ => {}
    }

    // `author` may be a string or `{ "name": ..., "email": ... }`.
    match obj.get("author") {
        Some(Value::String(s)) => {
            record.insert("author".into(), Value::Array(vec![parse_person(s)]));
        }
        Some(Value::Object(a)) => {
            if let Some(name) = a.get("name").and_then(|v| v.as_str()) {
                let mut person = name_to_person(name);
                if let (Value::Object(map), Some(email)) =
                    (&mut person, a.get("email").and_then(|v| v.as_str()))
                {
                    map.insert("email".into(), json!(email));
                }
                record.insert("author".into(), Value::Array(vec![person]));
            }
        }
        _ => {}
    }
    Ok(record)
}

/// Parse a `Name <email>` contributor string into a codemeta Person.
pub fn parse_person(entry: &str) -> Value {
    let entry = entry.trim();
    if let (Some(open), Some(close)) = (entry.find('<'), entry.rfind('>')) {
        if open < close {
            let name = entry[..open].trim();
            let email = entry[open + 1..close].trim();
            let mut person = name_to_person(name);
            if let (Value::Object(map), false) = (&mut person, email.is_empty()) {
                map.insert("email".into(), json!(email));
            }
            return person;
        }
    }
    name_to_person(entry)
}

fn name_to_person(name: &str) -> Value {
    let mut person = Map::new();
    person.insert("@type".into(), json!("Person"));
    match name.rsplit_once(' ') {
        Some((given, family)) => {
            person.insert("givenName".into(), json!(given));
            person.insert("familyName".into(), json!(family));
        }
        None => {
            person.insert("givenName".into(), json!(name));
        }
    }
    Value::Object(person)
}

fn spdx_uri(license: &str) -> String {
    if license.starts_with("http://") || license.starts_with("https://") {
        license.to_string()
    } else {
        format!("https://spdx.org/licenses/{license}")
    }
}
