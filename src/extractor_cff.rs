//! Citation-file extractor (`CITATION.cff`, rank 2).
//!
//! Maps the citation-file-format YAML fields onto their codemeta
//! counterparts. Only well-known fields are carried over; anything the
//! citation format expresses that codemeta does not is dropped.

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::extract::Extractor;
use crate::models::{ProjectContext, SourceKind};

pub struct CitationExtractor;

impl Extractor for CitationExtractor {
    fn kind(&self) -> SourceKind {
        SourceKind::CitationFile
    }

    fn extract(&self, source: &Path, _ctx: &ProjectContext) -> Result<String> {
        let content = std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;
        let cff: serde_yaml::Value = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", source.display()))?;
        if !cff.is_mapping() {
            bail!("{} is not a YAML mapping", source.display());
        }

        let mut record = Map::new();

        if let Some(title) = str_field(&cff, "title") {
            record.insert("name".into(), json!(title));
        }
        if let Some(version) = str_field(&cff, "version") {
            record.insert("version".into(), json!(version));
        }
        if let Some(license) = str_field(&cff, "license") {
            record.insert("license".into(), json!(spdx_uri(&license)));
        }
        if let Some(repo) = str_field(&cff, "repository-code") {
            record.insert("codeRepository".into(), json!(repo));
        }
        if let Some(url) = str_field(&cff, "url") {
            record.insert("url".into(), json!(url));
        }
        if let Some(desc) = str_field(&cff, "abstract") {
            record.insert("description".into(), json!(desc));
        }
        if let Some(date) = str_field(&cff, "date-released") {
            record.insert("datePublished".into(), json!(date));
        }
        if let Some(doi) = str_field(&cff, "doi") {
            record.insert("identifier".into(), json!(format!("https://doi.org/{doi}")));
        }
        if let Some(keywords) = cff.get("keywords").and_then(|v| v.as_sequence()) {
            let words: Vec<Value> = keywords
                .iter()
                .filter_map(|k| k.as_str())
                .map(|k| json!(k))
                .collect();
            if !words.is_empty() {
                record.insert("keywords".into(), Value::Array(words));
            }
        }
        if let Some(authors) = cff.get("authors").and_then(|v| v.as_sequence()) {
            let people: Vec<Value> = authors.iter().filter_map(cff_author_to_person).collect();
            if !people.is_empty() {
                record.insert("author".into(), Value::Array(people));
            }
        }

        Ok(serde_json::to_string(&Value::Object(record))?)
    }
}

fn str_field(cff: &serde_yaml::Value, key: &str) -> Option<String> {
    cff.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn cff_author_to_person(author: &serde_yaml::Value) -> Option<Value> {
    let given = author.get("given-names").and_then(|v| v.as_str());
    let family = author.get("family-names").and_then(|v| v.as_str());
    if given.is_none() && family.is_none() {
        // An entity (organization) entry uses `name` instead.
        let name = author.get("name").and_then(|v| v.as_str())?;
        return Some(json!({ "@type": "Organization", "name": name }));
    }

    let mut person = Map::new();
    person.insert("@type".into(), json!("Person"));
    if let Some(given) = given {
        person.insert("givenName".into(), json!(given));
    }
    if let Some(family) = family {
        person.insert("familyName".into(), json!(family));
    }
    if let Some(email) = author.get("email").and_then(|v| v.as_str()) {
        person.insert("email".into(), json!(email));
    }
    if let Some(orcid) = author.get("orcid").and_then(|v| v.as_str()) {
        person.insert("@id".into(), json!(orcid));
    }
    Some(Value::Object(person))
}

/// Expand a bare SPDX identifier into its canonical URI; full URIs pass
/// through unchanged.
fn spdx_uri(license: &str) -> String {
    if license.starts_with("http://") || license.starts_with("https://") {
        license.to_string()
    } else {
        format!("https://spdx.org/licenses/{license}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(dir: &Path) -> ProjectContext {
        ProjectContext {
            identifier: "p".into(),
            checkout_root: dir.to_path_buf(),
            work_dir: dir.to_path_buf(),
            source_url: None,
            ref_name: "v1.0.0".into(),
            is_release: true,
        }
    }

    #[test]
    fn maps_citation_fields_to_codemeta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CITATION.cff");
        std::fs::write(
            &path,
            "cff-version: 1.2.0\n\
             title: WidgetLib\n\
             version: 1.4.2\n\
             license: GPL-3.0-or-later\n\
             doi: 10.5281/zenodo.1234\n\
             repository-code: https://github.com/example/widgetlib\n\
             date-released: 2024-06-01\n\
             keywords:\n  - widgets\n  - metadata\n\
             authors:\n\
             \x20 - given-names: Ada\n\
             \x20   family-names: Lovelace\n\
             \x20   orcid: https://orcid.org/0000-0001-2345-6789\n\
             \x20 - name: Example Org\n",
        )
        .unwrap();

        let payload = CitationExtractor.extract(&path, &ctx(dir.path())).unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(value["name"], "WidgetLib");
        assert_eq!(value["version"], "1.4.2");
        assert_eq!(value["license"], "https://spdx.org/licenses/GPL-3.0-or-later");
        assert_eq!(value["identifier"], "https://doi.org/10.5281/zenodo.1234");
        assert_eq!(value["datePublished"], "2024-06-01");
        assert_eq!(value["author"][0]["familyName"], "Lovelace");
        assert_eq!(value["author"][0]["@id"], "https://orcid.org/0000-0001-2345-6789");
        assert_eq!(value["author"][1]["@type"], "Organization");
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CITATION.cff");
        std::fs::write(&path, "title: [unclosed\n").unwrap();
        assert!(CitationExtractor.extract(&path, &ctx(dir.path())).is_err());
    }
}
