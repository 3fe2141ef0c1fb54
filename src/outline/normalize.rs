use anyhow::{Context, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::config::NormalizerConfig;
use super::types::{BBox, FontSpan, Line, alnum_count, char_count};
use crate::model::{RawPage, RawSpan};

#[derive(Debug)]
pub struct LineNormalizer {
    separator: Regex,
    config: NormalizerConfig,
}

impl LineNormalizer {
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        Ok(Self {
            separator: Regex::new(r"^[-=~|*#+]{2,}$")
                .context("failed to compile separator span regex")?,
            config,
        })
    }

    pub fn normalize_pages(&self, pages: &[RawPage]) -> Vec<Line> {
        pages
            .iter()
            .enumerate()
            .flat_map(|(index, page)| self.normalize_page(page, index + 1))
            .collect()
    }

    pub fn normalize_page(&self, page: &RawPage, page_number: usize) -> Vec<Line> {
        if page.width <= 0.0 || page.height <= 0.0 {
            return Vec::new();
        }

        let header_limit = self.config.edge_band_ratio * page.height;
        let footer_limit = (1.0 - self.config.edge_band_ratio) * page.height;

        let mut lines = Vec::new();
        let mut previous_bottom: Option<f64> = None;

        for block in page.blocks.iter().filter(|block| block.is_text()) {
            let block_density = block.lines.len();

            for raw_line in &block.lines {
                let spans = raw_line
                    .spans
                    .iter()
                    .filter_map(|span| self.normalize_span(span))
                    .collect::<Vec<FontSpan>>();
                let Some(bbox) = union_bbox(&spans) else {
                    continue;
                };

                let text = spans
                    .iter()
                    .map(|span| span.text.as_str())
                    .collect::<Vec<&str>>()
                    .join(" ")
                    .trim()
                    .to_string();
                if !self.keeps_line_text(&text) {
                    continue;
                }

                if bbox.y0 < header_limit || bbox.y1 > footer_limit {
                    continue;
                }

                let spacing_above = previous_bottom.map_or(0.0, |bottom| bbox.y0 - bottom);
                previous_bottom = Some(bbox.y1);

                let is_centered = ((bbox.x0 + bbox.x1 - page.width).abs() / page.width)
                    < self.config.centered_tolerance;

                lines.push(Line {
                    text,
                    page: page_number,
                    bbox,
                    spans,
                    is_centered,
                    spacing_above,
                    block_density,
                });
            }
        }

        lines
    }

    fn normalize_span(&self, raw: &RawSpan) -> Option<FontSpan> {
        let trimmed = raw.text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let text = trimmed.nfkc().collect::<String>();
        if self.separator.is_match(&text) || char_count(&text) < self.config.min_span_chars {
            return None;
        }

        Some(FontSpan {
            text,
            font: raw.font.clone(),
            size: round_to(raw.size, 2),
            flags: raw.flags,
            bbox: BBox::from_array(raw.bbox),
        })
    }

    fn keeps_line_text(&self, text: &str) -> bool {
        !text.is_empty()
            && char_count(text) >= self.config.min_line_chars
            && alnum_count(text) >= self.config.min_line_alnum
    }
}

fn union_bbox(spans: &[FontSpan]) -> Option<BBox> {
    let (first, rest) = spans.split_first()?;
    Some(rest.iter().fold(first.bbox, |acc, span| acc.union(span.bbox)))
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
