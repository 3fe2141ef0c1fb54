use std::collections::{HashMap, HashSet};

use anyhow::Result;
use tracing::debug;

use super::config::{AssemblyConfig, ClassifierConfig, DEFAULT_TITLE};
use super::normalize::LineNormalizer;
use super::profile::TypographyProfile;
use super::scoring::HeadingScorer;
use super::title::TitleDetector;
use super::types::{Line, alnum_count, char_count};
use crate::model::{DocumentOutline, HeadingEntry, HeadingLevel, RawDocument};

#[derive(Debug)]
pub struct OutlineClassifier {
    config: ClassifierConfig,
    normalizer: LineNormalizer,
    scorer: HeadingScorer,
    titles: TitleDetector,
}

#[derive(Debug)]
struct PlacedHeading {
    entry: HeadingEntry,
    top: f64,
}

impl OutlineClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        Ok(Self {
            normalizer: LineNormalizer::new(config.normalizer.clone())?,
            scorer: HeadingScorer::new(config.scoring.clone())?,
            titles: TitleDetector::new(config.title.clone(), config.scoring.bold_flag_mask),
            config,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn normalize(&self, document: &RawDocument) -> Vec<Line> {
        self.normalizer.normalize_pages(&document.pages)
    }

    pub fn classify(&self, document: &RawDocument) -> Option<DocumentOutline> {
        let lines = self.normalize(document);
        if lines.is_empty() {
            return None;
        }

        let first_page_height = document.pages.first().map(|page| page.height);
        Some(self.outline_from_lines(
            &lines,
            document.metadata.title.as_deref(),
            first_page_height,
        ))
    }

    pub fn outline_from_lines(
        &self,
        lines: &[Line],
        metadata_title: Option<&str>,
        first_page_height: Option<f64>,
    ) -> DocumentOutline {
        if lines.is_empty() {
            return DocumentOutline {
                title: DEFAULT_TITLE.to_string(),
                outline: Vec::new(),
            };
        }

        let mut title = self
            .titles
            .metadata_title(metadata_title)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let Some(profile) = TypographyProfile::from_lines(lines, &self.config.profile) else {
            debug!("no font sizes above the noise floor");
            return DocumentOutline {
                title,
                outline: Vec::new(),
            };
        };
        debug!(
            body_size = profile.body_size,
            h1 = ?profile.h1,
            h2 = ?profile.h2,
            h3 = ?profile.h3,
            h4 = ?profile.h4,
            "typography profile"
        );

        if let Some(visual) =
            self.titles
                .visual_title(lines, profile.body_size, first_page_height)
        {
            title = visual;
        }

        let outline = self.collect_headings(lines, &profile, &title);
        promote_first_h1(title, outline)
    }

    fn collect_headings(
        &self,
        lines: &[Line],
        profile: &TypographyProfile,
        title: &str,
    ) -> Vec<HeadingEntry> {
        let AssemblyConfig {
            max_headings_per_page,
            max_block_density,
        } = self.config.assembly;

        let normalizer = &self.config.normalizer;
        let mut placed = Vec::<PlacedHeading>::new();
        let mut per_page = HashMap::<usize, usize>::new();
        let mut seen = HashSet::<(String, usize, HeadingLevel)>::new();

        for line in lines {
            if alnum_count(&line.text) < normalizer.min_line_alnum
                || char_count(&line.text) < normalizer.min_line_chars
            {
                continue;
            }
            if per_page.get(&line.page).copied().unwrap_or(0) >= max_headings_per_page {
                continue;
            }
            if line.block_density > max_block_density {
                continue;
            }

            let score = self.scorer.score(line, profile);
            let Some(level) = self.scorer.assign_level(line, score, profile) else {
                continue;
            };
            if line.text == title {
                continue;
            }

            let key = (line.text.trim().to_lowercase(), line.page, level);
            if !seen.insert(key) {
                continue;
            }

            placed.push(PlacedHeading {
                entry: HeadingEntry {
                    level,
                    text: line.text.clone(),
                    page: line.page,
                },
                top: line.top(),
            });
            *per_page.entry(line.page).or_insert(0) += 1;
        }

        placed.sort_by(|a, b| {
            a.entry
                .page
                .cmp(&b.entry.page)
                .then(a.top.total_cmp(&b.top))
        });
        placed.into_iter().map(|heading| heading.entry).collect()
    }
}

fn promote_first_h1(title: String, outline: Vec<HeadingEntry>) -> DocumentOutline {
    if title != DEFAULT_TITLE {
        return DocumentOutline { title, outline };
    }

    let Some(first_h1) = outline
        .iter()
        .find(|entry| entry.level == HeadingLevel::H1)
        .cloned()
    else {
        return DocumentOutline { title, outline };
    };

    let outline = outline
        .into_iter()
        .filter(|entry| !(entry.text == first_h1.text && entry.page == first_h1.page))
        .collect();

    DocumentOutline {
        title: first_h1.text,
        outline,
    }
}
