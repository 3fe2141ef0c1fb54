use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use super::config::TitleConfig;
use super::types::{Line, alnum_count, char_count};

#[derive(Debug, Clone)]
pub struct TitleCandidate<'a> {
    pub lines: Vec<&'a Line>,
}

impl TitleCandidate<'_> {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<&str>>()
            .join(" ")
    }

    pub fn avg_size(&self) -> f64 {
        if self.lines.is_empty() {
            return 0.0;
        }
        self.lines.iter().map(|line| line.avg_size()).sum::<f64>() / self.lines.len() as f64
    }
}

#[derive(Debug)]
pub struct TitleDetector {
    config: TitleConfig,
    bold_flag_mask: u32,
}

impl TitleDetector {
    pub fn new(config: TitleConfig, bold_flag_mask: u32) -> Self {
        Self {
            config,
            bold_flag_mask,
        }
    }

    pub fn metadata_title(&self, raw: Option<&str>) -> Option<String> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() || alnum_count(trimmed) < self.config.min_metadata_alnum {
            return None;
        }
        Some(trimmed.nfkc().collect())
    }

    pub fn cluster_first_page<'a>(&self, lines: &'a [Line]) -> Vec<TitleCandidate<'a>> {
        let mut first_page = lines.iter().filter(|line| line.page == 1).collect::<Vec<&Line>>();
        first_page.sort_by(|a, b| a.top().total_cmp(&b.top()));

        let mut candidates = Vec::new();
        let mut current: Vec<&Line> = Vec::new();

        for line in first_page {
            let avg_size = line.avg_size();
            let continues = match current.last() {
                None => true,
                Some(previous) => {
                    line.top() - previous.bbox.y1 < avg_size * self.config.cluster_gap_ratio
                        && (avg_size - previous.avg_size()).abs() < self.config.cluster_size_delta
                }
            };

            if !continues {
                candidates.push(TitleCandidate {
                    lines: std::mem::take(&mut current),
                });
            }
            current.push(line);
        }

        if !current.is_empty() {
            candidates.push(TitleCandidate { lines: current });
        }

        candidates
    }

    pub fn score_candidate(
        &self,
        candidate: &TitleCandidate<'_>,
        body_size: f64,
        first_page_height: Option<f64>,
    ) -> Option<u32> {
        let config = &self.config;
        let text = candidate.text();
        if alnum_count(&text) < config.min_candidate_alnum
            || char_count(&text) < config.min_candidate_chars
        {
            return None;
        }

        let mut score = 0;
        if candidate.avg_size() > body_size * config.large_size_ratio {
            score += config.large_points;
        }
        if candidate.lines.iter().any(|line| line.is_centered) {
            score += config.centered_points;
        }
        if candidate
            .lines
            .iter()
            .any(|line| line.has_flag(self.bold_flag_mask))
        {
            score += config.bold_points;
        }
        let near_top = match (candidate.lines.first(), first_page_height) {
            (Some(first), Some(height)) => first.top() < height * config.top_band_ratio,
            _ => false,
        };
        if near_top {
            score += config.top_points;
        }
        if candidate.lines.len() == 1
            || candidate
                .lines
                .iter()
                .all(|line| line.block_density <= config.sparse_block_max)
        {
            score += config.compact_points;
        }

        Some(score)
    }

    pub fn visual_title(
        &self,
        lines: &[Line],
        body_size: f64,
        first_page_height: Option<f64>,
    ) -> Option<String> {
        let mut best: Option<(u32, String)> = None;

        for candidate in self.cluster_first_page(lines) {
            let Some(score) = self.score_candidate(&candidate, body_size, first_page_height) else {
                continue;
            };
            if score < self.config.min_score {
                continue;
            }
            if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
                best = Some((score, candidate.text()));
            }
        }

        if let Some((score, text)) = &best {
            debug!(score = *score, title = %text, "visual title selected");
        }

        best.map(|(_, text)| text)
    }
}
