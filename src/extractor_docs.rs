//! Documentation-scrape extractors (README rank 6, install instructions
//! rank 7).
//!
//! The README is converted to a plain-text artifact inside the run's scratch
//! directory solely so link detection sees bare URLs instead of markup; the
//! artifact is removed again once the links are collected. Badge and image
//! URLs are filtered out, documentation-looking URLs become `softwareHelp`
//! entries, and the files themselves are linked via web URLs when the
//! hosting service is recognizable.

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::OnceLock;

use crate::extract::Extractor;
use crate::models::{ProjectContext, SourceKind};

pub struct ReadmeExtractor;

impl Extractor for ReadmeExtractor {
    fn kind(&self) -> SourceKind {
        SourceKind::Readme
    }

    fn extract(&self, source: &Path, ctx: &ProjectContext) -> Result<String> {
        let content = std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;

        // Conversion artifact exists only for the duration of link detection.
        let plain = markdown_to_plain(&content);
        let artifact = ctx.work_dir.join(".readme-converted.txt");
        std::fs::write(&artifact, &plain)
            .with_context(|| format!("Failed to write {}", artifact.display()))?;
        let detected = std::fs::read_to_string(&artifact)
            .map(|text| documentation_links(&text))
            .unwrap_or_default();
        let _ = std::fs::remove_file(&artifact);

        let mut record = Map::new();
        // Last-resort name candidate; any ranked source above wins.
        if let Some(title) = first_heading(&content) {
            record.insert("name".into(), json!(title));
        }
        if !detected.is_empty() {
            record.insert(
                "softwareHelp".into(),
                Value::Array(detected.into_iter().map(|u| json!(u)).collect()),
            );
        }
        if let Some(url) = repo_file_url(ctx, source) {
            record.insert("readme".into(), json!(url));
        }

        Ok(serde_json::to_string(&Value::Object(record))?)
    }
}

pub struct InstallExtractor;

impl Extractor for InstallExtractor {
    fn kind(&self) -> SourceKind {
        SourceKind::InstallInstructions
    }

    fn extract(&self, source: &Path, ctx: &ProjectContext) -> Result<String> {
        let mut record = Map::new();
        if let Some(url) = repo_file_url(ctx, source) {
            record.insert("buildInstructions".into(), json!(url));
        }
        Ok(serde_json::to_string(&Value::Object(record))?)
    }
}

/// The first markdown heading, if any.
fn first_heading(markdown: &str) -> Option<String> {
    markdown.lines().find_map(|line| {
        let title = line.trim().strip_prefix('#')?.trim_start_matches('#').trim();
        (!title.is_empty()).then(|| title.to_string())
    })
}

/// Reduce markdown to plain text with bare URLs: `[text](url)` becomes
/// `text url`, images and emphasis markers are dropped.
fn markdown_to_plain(markdown: &str) -> String {
    static LINK: OnceLock<Regex> = OnceLock::new();
    static IMAGE: OnceLock<Regex> = OnceLock::new();
    let image = IMAGE.get_or_init(|| Regex::new(r"!\[[^\]]*\]\(([^)]+)\)").unwrap());
    let link = LINK.get_or_init(|| Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").unwrap());

    let text = image.replace_all(markdown, "$1");
    let text = link.replace_all(&text, "$1 $2");
    text.replace(['#', '*', '`'], " ")
}

/// URLs in `text` that look like documentation rather than badges or CI.
fn documentation_links(text: &str) -> Vec<String> {
    static URL: OnceLock<Regex> = OnceLock::new();
    let url_re = URL.get_or_init(|| Regex::new(r#"https?://[^\s<>"')\]]+"#).unwrap());

    let mut links = Vec::new();
    for m in url_re.find_iter(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';']);
        if is_badge_url(url) || !is_documentation_url(url) {
            continue;
        }
        if !links.iter().any(|l| l == url) {
            links.push(url.to_string());
        }
    }
    links
}

fn is_badge_url(url: &str) -> bool {
    const BADGE_HOSTS: &[&str] = &[
        "shields.io",
        "badge",
        "travis-ci",
        "appveyor.com",
        "codecov.io",
        "coveralls.io",
        "/actions/workflows/",
    ];
    BADGE_HOSTS.iter().any(|frag| url.contains(frag))
}

fn is_documentation_url(url: &str) -> bool {
    const DOC_MARKERS: &[&str] = &[
        "docs.rs",
        "readthedocs",
        "github.io",
        "/docs/",
        "/doc/",
        "/wiki",
        "/manual",
        "/documentation",
    ];
    DOC_MARKERS.iter().any(|frag| url.contains(frag))
}

/// Web URL for a file in the checkout, when the source repository is hosted
/// on a recognizable service.
fn repo_file_url(ctx: &ProjectContext, file: &Path) -> Option<String> {
    let source_url = ctx.source_url.as_deref()?;
    let relative = file
        .strip_prefix(&ctx.checkout_root)
        .ok()?
        .to_string_lossy();

    if let Some(rest) = source_url.strip_prefix("git@github.com:") {
        let repo = rest.trim_end_matches(".git");
        return Some(format!(
            "https://github.com/{}/blob/{}/{}",
            repo, ctx.ref_name, relative
        ));
    }
    if source_url.contains("github.com") {
        let base = source_url.trim_end_matches(".git");
        return Some(format!("{}/blob/{}/{}", base, ctx.ref_name, relative));
    }
    if let Some(rest) = source_url.strip_prefix("git@gitlab.com:") {
        let repo = rest.trim_end_matches(".git");
        return Some(format!(
            "https://gitlab.com/{}/-/blob/{}/{}",
            repo, ctx.ref_name, relative
        ));
    }
    if source_url.contains("gitlab.com") {
        let base = source_url.trim_end_matches(".git");
        return Some(format!("{}/-/blob/{}/{}", base, ctx.ref_name, relative));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(dir: &Path) -> ProjectContext {
        ProjectContext {
            identifier: "p".into(),
            checkout_root: dir.to_path_buf(),
            work_dir: dir.to_path_buf(),
            source_url: Some("https://github.com/example/widgetlib.git".into()),
            ref_name: "v1.0.0".into(),
            is_release: true,
        }
    }

    #[test]
    fn collects_documentation_links_and_filters_badges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(
            &path,
            "# WidgetLib\n\n\
             ![build](https://img.shields.io/badge/build-passing)\n\
             Read the [manual](https://widgetlib.readthedocs.io/en/latest/).\n\
             API docs at https://docs.rs/widgetlib.\n\
             See https://example.org/blog for news.\n",
        )
        .unwrap();

        let payload = ReadmeExtractor.extract(&path, &ctx(dir.path())).unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();
        let help = value["softwareHelp"].as_array().unwrap();
        let urls: Vec<_> = help.iter().map(|u| u.as_str().unwrap()).collect();
        assert!(urls.contains(&"https://widgetlib.readthedocs.io/en/latest/"));
        assert!(urls.contains(&"https://docs.rs/widgetlib"));
        assert!(!urls.iter().any(|u| u.contains("shields.io")));
        assert!(!urls.iter().any(|u| u.contains("example.org/blog")));
    }

    #[test]
    fn first_heading_becomes_a_name_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(&path, "badge line\n\n## The Widget Library\n\ntext\n").unwrap();

        let payload = ReadmeExtractor.extract(&path, &ctx(dir.path())).unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["name"], "The Widget Library");

        assert_eq!(first_heading("no headings here"), None);
    }

    #[test]
    fn conversion_artifact_is_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(&path, "# WidgetLib\n").unwrap();

        ReadmeExtractor.extract(&path, &ctx(dir.path())).unwrap();
        assert!(!dir.path().join(".readme-converted.txt").exists());
    }

    #[test]
    fn readme_and_install_get_web_urls() {
        let dir = tempfile::tempdir().unwrap();
        let readme = dir.path().join("README.md");
        let install = dir.path().join("INSTALL.md");
        std::fs::write(&readme, "# x\n").unwrap();
        std::fs::write(&install, "build with make\n").unwrap();

        let ctx = ctx(dir.path());
        let value: Value =
            serde_json::from_str(&ReadmeExtractor.extract(&readme, &ctx).unwrap()).unwrap();
        assert_eq!(
            value["readme"],
            "https://github.com/example/widgetlib/blob/v1.0.0/README.md"
        );

        let value: Value =
            serde_json::from_str(&InstallExtractor.extract(&install, &ctx).unwrap()).unwrap();
        assert_eq!(
            value["buildInstructions"],
            "https://github.com/example/widgetlib/blob/v1.0.0/INSTALL.md"
        );
    }

    #[test]
    fn unknown_hosting_yields_no_file_links() {
        let dir = tempfile::tempdir().unwrap();
        let readme = dir.path().join("README.md");
        std::fs::write(&readme, "plain\n").unwrap();

        let mut ctx = ctx(dir.path());
        ctx.source_url = Some("https://git.example.org/widgetlib.git".into());
        let value: Value =
            serde_json::from_str(&ReadmeExtractor.extract(&readme, &ctx).unwrap()).unwrap();
        assert!(value.get("readme").is_none());
    }
}
