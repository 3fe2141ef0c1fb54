use anyhow::{Context, Result};
use regex::Regex;

use super::config::ScoringConfig;
use super::profile::TypographyProfile;
use super::types::{Line, char_count};
use crate::model::HeadingLevel;

#[derive(Debug)]
pub struct HeadingScorer {
    numbered: Regex,
    config: ScoringConfig,
}

impl HeadingScorer {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        Ok(Self {
            numbered: Regex::new(r"^\d+(\.\d+)*(\.\s|\.$|\s|$)")
                .context("failed to compile numbered heading regex")?,
            config,
        })
    }

    pub fn is_numbered(&self, text: &str) -> bool {
        self.numbered.is_match(text)
    }

    pub fn score(&self, line: &Line, profile: &TypographyProfile) -> u32 {
        let config = &self.config;
        let avg_size = line.avg_size();
        let mut score = 0;

        if avg_size > profile.body_size * config.oversized_ratio {
            score += config.oversized_points;
        }
        if line.has_flag(config.bold_flag_mask) {
            score += config.emphasis_points;
        }
        if self.is_numbered(&line.text) {
            score += config.numbered_points;
        }
        if char_count(&line.text) < config.short_text_max_chars {
            score += config.short_points;
        }
        if line.is_centered {
            score += config.centered_points;
        }
        if line.spacing_above.max(0.0) > avg_size * config.isolation_ratio {
            score += config.isolated_points;
        }
        if line.block_density <= config.sparse_block_max {
            score += config.sparse_points;
        }

        score + self.tier_bonus(avg_size, profile)
    }

    fn tier_bonus(&self, avg_size: f64, profile: &TypographyProfile) -> u32 {
        let config = &self.config;
        let reaches = |tier: Option<f64>| {
            tier.is_some_and(|size| avg_size >= size * config.tier_match_ratio)
        };

        if reaches(profile.h1) {
            config.h1_tier_points
        } else if reaches(profile.h2) {
            config.h2_tier_points
        } else if reaches(profile.h3) {
            config.h3_tier_points
        } else {
            0
        }
    }

    pub fn assign_level(
        &self,
        line: &Line,
        score: u32,
        profile: &TypographyProfile,
    ) -> Option<HeadingLevel> {
        let config = &self.config;
        if score < config.heading_min_score {
            return None;
        }

        let avg_size = line.avg_size();
        let floor = |tier: f64| tier * config.tier_match_ratio;
        let ceiling = |tier: Option<f64>| tier.map_or(f64::INFINITY, floor);

        if let Some(h1) = profile.h1 {
            if avg_size >= floor(h1) && score >= config.h1_min_score {
                return Some(HeadingLevel::H1);
            }
        }

        if let Some(h2) = profile.h2 {
            if avg_size >= floor(h2)
                && avg_size < ceiling(profile.h1)
                && score >= config.h2_min_score
            {
                return Some(HeadingLevel::H2);
            }
        }

        if let Some(h3) = profile.h3 {
            if avg_size >= floor(h3)
                && avg_size < ceiling(profile.h2)
                && score >= config.h3_min_score
            {
                return Some(HeadingLevel::H3);
            }
        }

        None
    }
}
