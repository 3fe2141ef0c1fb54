use std::collections::HashMap;

use super::config::ProfileConfig;
use super::normalize::round_to;
use super::types::Line;

#[derive(Debug, Clone, PartialEq)]
pub struct TypographyProfile {
    pub body_size: f64,
    pub h1: Option<f64>,
    pub h2: Option<f64>,
    pub h3: Option<f64>,
    pub h4: Option<f64>,
}

impl TypographyProfile {
    pub fn from_lines(lines: &[Line], config: &ProfileConfig) -> Option<Self> {
        let sizes = lines
            .iter()
            .flat_map(|line| line.spans.iter().map(|span| span.size))
            .filter(|size| *size > config.noise_floor_size)
            .collect::<Vec<f64>>();
        if sizes.is_empty() {
            return None;
        }

        let mut body_size = median(&sizes);
        if let Some(mode) = modal_size(&sizes) {
            body_size = body_size.max(mode);
        }

        let threshold = body_size * config.heading_size_ratio;
        let mut candidates = sizes
            .iter()
            .copied()
            .filter(|size| *size > threshold)
            .collect::<Vec<f64>>();
        candidates.sort_by(|a, b| b.total_cmp(a));
        candidates.dedup();

        let h1 = candidates.first().copied();
        let distinct_tier = |index: usize| {
            let size = candidates.get(index).copied()?;
            let largest = h1?;
            (size < largest * config.distinct_tier_ratio).then_some(size)
        };

        Some(Self {
            body_size,
            h1,
            h2: distinct_tier(1),
            h3: distinct_tier(2),
            h4: distinct_tier(3),
        })
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

fn modal_size(sizes: &[f64]) -> Option<f64> {
    let mut counts = HashMap::<i64, (usize, usize)>::new();
    for (position, size) in sizes.iter().enumerate() {
        let key = (size * 10.0).round() as i64;
        let entry = counts.entry(key).or_insert((0, position));
        entry.0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(key, _)| round_to(key as f64 / 10.0, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_averages_the_two_middle_values() {
        assert_eq!(median(&[10.0, 12.0, 14.0, 20.0]), 13.0);
        assert_eq!(median(&[9.0, 12.0, 30.0]), 12.0);
    }

    #[test]
    fn modal_size_prefers_first_seen_on_ties() {
        assert_eq!(modal_size(&[11.04, 14.0, 11.0, 14.02]), Some(11.0));
        assert_eq!(modal_size(&[9.0, 12.0, 12.0]), Some(12.0));
    }
}
