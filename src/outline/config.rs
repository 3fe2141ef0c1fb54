use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::types::SPAN_FLAG_BOLD;

pub const DEFAULT_TITLE: &str = "No Title Found";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub normalizer: NormalizerConfig,
    pub profile: ProfileConfig,
    pub scoring: ScoringConfig,
    pub title: TitleConfig,
    pub assembly: AssemblyConfig,
}

impl ClassifierConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read classifier config {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse classifier config {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub min_span_chars: usize,
    pub min_line_chars: usize,
    pub min_line_alnum: usize,
    pub edge_band_ratio: f64,
    pub centered_tolerance: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_span_chars: 2,
            min_line_chars: 3,
            min_line_alnum: 2,
            edge_band_ratio: 0.1,
            centered_tolerance: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub noise_floor_size: f64,
    pub heading_size_ratio: f64,
    pub distinct_tier_ratio: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            noise_floor_size: 6.0,
            heading_size_ratio: 1.2,
            distinct_tier_ratio: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub bold_flag_mask: u32,
    pub oversized_ratio: f64,
    pub oversized_points: u32,
    pub emphasis_points: u32,
    pub numbered_points: u32,
    pub short_text_max_chars: usize,
    pub short_points: u32,
    pub centered_points: u32,
    pub isolation_ratio: f64,
    pub isolated_points: u32,
    pub sparse_block_max: usize,
    pub sparse_points: u32,
    pub tier_match_ratio: f64,
    pub h1_tier_points: u32,
    pub h2_tier_points: u32,
    pub h3_tier_points: u32,
    pub heading_min_score: u32,
    pub h1_min_score: u32,
    pub h2_min_score: u32,
    pub h3_min_score: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            bold_flag_mask: SPAN_FLAG_BOLD,
            oversized_ratio: 1.2,
            oversized_points: 40,
            emphasis_points: 25,
            numbered_points: 25,
            short_text_max_chars: 80,
            short_points: 20,
            centered_points: 15,
            isolation_ratio: 2.0,
            isolated_points: 20,
            sparse_block_max: 3,
            sparse_points: 15,
            tier_match_ratio: 0.95,
            h1_tier_points: 25,
            h2_tier_points: 20,
            h3_tier_points: 15,
            heading_min_score: 80,
            h1_min_score: 100,
            h2_min_score: 90,
            h3_min_score: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    pub min_metadata_alnum: usize,
    pub cluster_gap_ratio: f64,
    pub cluster_size_delta: f64,
    pub min_candidate_alnum: usize,
    pub min_candidate_chars: usize,
    pub large_size_ratio: f64,
    pub large_points: u32,
    pub centered_points: u32,
    pub bold_points: u32,
    pub top_band_ratio: f64,
    pub top_points: u32,
    pub sparse_block_max: usize,
    pub compact_points: u32,
    pub min_score: u32,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            min_metadata_alnum: 3,
            cluster_gap_ratio: 1.5,
            cluster_size_delta: 1.0,
            min_candidate_alnum: 3,
            min_candidate_chars: 5,
            large_size_ratio: 1.3,
            large_points: 40,
            centered_points: 25,
            bold_points: 25,
            top_band_ratio: 0.25,
            top_points: 30,
            sparse_block_max: 3,
            compact_points: 20,
            min_score: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub max_headings_per_page: usize,
    pub max_block_density: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_headings_per_page: 9,
            max_block_density: 5,
        }
    }
}
