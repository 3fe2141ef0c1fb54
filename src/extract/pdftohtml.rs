use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::debug;

use crate::model::{
    DocumentMetadata, RawBlock, RawDocument, RawLine, RawPage, RawSpan, TEXT_BLOCK_TYPE,
};
use crate::outline::{SPAN_FLAG_BOLD, SPAN_FLAG_ITALIC};

pub(super) fn extract_with_pdftohtml(
    pdf_path: &Path,
    max_pages: Option<usize>,
) -> Result<RawDocument> {
    let mut command = Command::new("pdftohtml");
    command
        .arg("-xml")
        .arg("-i")
        .arg("-q")
        .arg("-zoom")
        .arg("1")
        .arg("-stdout")
        .arg("-f")
        .arg("1");
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path);

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftohtml for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftohtml returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let xml = String::from_utf8_lossy(&output.stdout);
    let pages = PdftohtmlXmlParser::new()?
        .parse(&xml)
        .with_context(|| format!("failed to parse pdftohtml output for {}", pdf_path.display()))?;

    Ok(RawDocument {
        metadata: DocumentMetadata {
            title: read_metadata_title(pdf_path),
        },
        pages,
    })
}

pub(super) fn read_metadata_title(pdf_path: &Path) -> Option<String> {
    let output = match Command::new("pdfinfo")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .output()
    {
        Ok(output) => output,
        Err(error) => {
            debug!(path = %pdf_path.display(), error = %error, "pdfinfo unavailable");
            return None;
        }
    };

    if !output.status.success() {
        debug!(path = %pdf_path.display(), "pdfinfo returned non-zero exit status");
        return None;
    }

    parse_pdfinfo_title(&String::from_utf8_lossy(&output.stdout))
}

pub(super) fn parse_pdfinfo_title(info: &str) -> Option<String> {
    info.lines()
        .find_map(|line| line.strip_prefix("Title:"))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(ToOwned::to_owned)
}

#[derive(Debug, Clone)]
struct FontSpec {
    size: f64,
    family: String,
}

#[derive(Debug, Clone)]
struct TextElement {
    top: f64,
    left: f64,
    width: f64,
    height: f64,
    span: RawSpan,
}

#[derive(Debug)]
struct PageDraft {
    width: f64,
    height: f64,
    elements: Vec<TextElement>,
}

#[derive(Debug)]
struct LineDraft {
    top: f64,
    bottom: f64,
    left: f64,
    right: f64,
    size: f64,
    spans: Vec<RawSpan>,
}

impl LineDraft {
    fn start(element: TextElement) -> Self {
        Self {
            top: element.top,
            bottom: element.top + element.height,
            left: element.left,
            right: element.left + element.width,
            size: element.span.size,
            spans: vec![element.span],
        }
    }

    fn shares_baseline(&self, element: &TextElement) -> bool {
        let tolerance = 0.5 * element.height.min(self.bottom - self.top);
        (element.top - self.top).abs() <= tolerance && element.left >= self.right - 1.0
    }

    fn extend(&mut self, element: TextElement) {
        self.top = self.top.min(element.top);
        self.bottom = self.bottom.max(element.top + element.height);
        self.right = self.right.max(element.left + element.width);
        self.spans.push(element.span);
    }

    fn continues_block(&self, next: &LineDraft) -> bool {
        let height = next.bottom - next.top;
        let gap = next.top - self.bottom;
        let overlaps = next.left < self.right && next.right > self.left;

        gap > -height && gap < 0.6 * height && overlaps && (next.size - self.size).abs() < 1.0
    }
}

#[derive(Debug)]
pub(super) struct PdftohtmlXmlParser {
    page_tag: Regex,
    fontspec_tag: Regex,
    text_tag: Regex,
    attribute: Regex,
    markup: Regex,
    numeric_entity: Regex,
}

impl PdftohtmlXmlParser {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            page_tag: Regex::new(r"<page\s([^>]*)>").context("failed to compile page tag regex")?,
            fontspec_tag: Regex::new(r"<fontspec\s([^>]*?)/?>")
                .context("failed to compile fontspec tag regex")?,
            text_tag: Regex::new(r"<text\s([^>]*)>(.*?)</text>")
                .context("failed to compile text tag regex")?,
            attribute: Regex::new(r#"([A-Za-z_]+)="([^"]*)""#)
                .context("failed to compile attribute regex")?,
            markup: Regex::new(r"<[^>]+>").context("failed to compile markup regex")?,
            numeric_entity: Regex::new(r"&#(\d+);").context("failed to compile entity regex")?,
        })
    }

    pub(super) fn parse(&self, xml: &str) -> Result<Vec<RawPage>> {
        let mut fonts = HashMap::<String, FontSpec>::new();
        let mut drafts = Vec::<PageDraft>::new();

        for line in xml.lines() {
            if let Some(captures) = self.page_tag.captures(line) {
                let attributes = self.attributes(captures.get(1).map_or("", |m| m.as_str()));
                drafts.push(PageDraft {
                    width: numeric_attribute(&attributes, "width")?,
                    height: numeric_attribute(&attributes, "height")?,
                    elements: Vec::new(),
                });
                continue;
            }

            if let Some(captures) = self.fontspec_tag.captures(line) {
                let attributes = self.attributes(captures.get(1).map_or("", |m| m.as_str()));
                let id = attributes
                    .get("id")
                    .map(|value| value.to_string())
                    .context("fontspec without id")?;
                fonts.insert(
                    id,
                    FontSpec {
                        size: numeric_attribute(&attributes, "size")?,
                        family: attributes
                            .get("family")
                            .map(|value| value.to_string())
                            .unwrap_or_default(),
                    },
                );
                continue;
            }

            let Some(captures) = self.text_tag.captures(line) else {
                continue;
            };
            let Some(page) = drafts.last_mut() else {
                bail!("text element outside of a page");
            };

            let attributes = self.attributes(captures.get(1).map_or("", |m| m.as_str()));
            let inner = captures.get(2).map_or("", |m| m.as_str());
            let Some(font) = attributes.get("font").and_then(|id| fonts.get(*id)) else {
                continue;
            };

            let text = self.plain_text(inner);
            if text.trim().is_empty() {
                continue;
            }

            let mut flags = 0;
            if inner.contains("<b>") {
                flags |= SPAN_FLAG_BOLD;
            }
            if inner.contains("<i>") {
                flags |= SPAN_FLAG_ITALIC;
            }

            let top = numeric_attribute(&attributes, "top")?;
            let left = numeric_attribute(&attributes, "left")?;
            let width = numeric_attribute(&attributes, "width")?;
            let height = numeric_attribute(&attributes, "height")?;

            page.elements.push(TextElement {
                top,
                left,
                width,
                height,
                span: RawSpan {
                    text,
                    font: font.family.clone(),
                    size: font.size,
                    flags,
                    bbox: [left, top, left + width, top + height],
                },
            });
        }

        Ok(drafts.into_iter().map(assemble_page).collect())
    }

    fn attributes<'a>(&self, raw: &'a str) -> HashMap<&'a str, &'a str> {
        self.attribute
            .captures_iter(raw)
            .filter_map(|captures| Some((captures.get(1)?.as_str(), captures.get(2)?.as_str())))
            .collect()
    }

    fn plain_text(&self, inner: &str) -> String {
        let stripped = self.markup.replace_all(inner, "");
        let decoded = self.numeric_entity.replace_all(&stripped, |captures: &regex::Captures| {
            captures
                .get(1)
                .and_then(|value| value.as_str().parse::<u32>().ok())
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        });

        decoded
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }
}

fn numeric_attribute(attributes: &HashMap<&str, &str>, name: &str) -> Result<f64> {
    let raw = attributes
        .get(name)
        .with_context(|| format!("missing attribute {name}"))?;
    raw.parse::<f64>()
        .with_context(|| format!("invalid numeric attribute {name}={raw}"))
}

fn assemble_page(draft: PageDraft) -> RawPage {
    let mut lines = Vec::<LineDraft>::new();
    for element in draft.elements {
        match lines.last_mut() {
            Some(current) if current.shares_baseline(&element) => current.extend(element),
            _ => lines.push(LineDraft::start(element)),
        }
    }

    let mut blocks = Vec::<Vec<LineDraft>>::new();
    for line in lines {
        let joins = blocks
            .last()
            .and_then(|block| block.last())
            .is_some_and(|previous| previous.continues_block(&line));
        if joins {
            if let Some(block) = blocks.last_mut() {
                block.push(line);
            }
        } else {
            blocks.push(vec![line]);
        }
    }

    RawPage {
        width: draft.width,
        height: draft.height,
        blocks: blocks
            .into_iter()
            .map(|lines| RawBlock {
                kind: TEXT_BLOCK_TYPE,
                lines: lines
                    .into_iter()
                    .map(|line| RawLine { spans: line.spans })
                    .collect(),
            })
            .collect(),
    }
}
