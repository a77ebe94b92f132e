use crate::summary::DimensionSummary;
use serde::Serialize;
use std::cmp::Ordering;

/// Visual tier of a ranked row on the top performers table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankTier {
    Gold,
    Silver,
    Bronze,
    Standard,
}

impl RankTier {
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            1 => RankTier::Gold,
            2 => RankTier::Silver,
            3 => RankTier::Bronze,
            _ => RankTier::Standard,
        }
    }

    pub fn fill_color(self) -> u32 {
        match self {
            RankTier::Gold => 0xFFD700,
            RankTier::Silver => 0xC0C0C0,
            RankTier::Bronze => 0xCD7F32,
            RankTier::Standard => 0xFFFFFF,
        }
    }

    pub fn font_color(self) -> u32 {
        match self {
            RankTier::Gold | RankTier::Silver => 0x000000,
            RankTier::Bronze => 0xFFFFFF,
            RankTier::Standard => 0x666666,
        }
    }

    pub fn is_podium(self) -> bool {
        self != RankTier::Standard
    }
}

/// A division summary with its position in the savings ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDivision {
    pub rank: usize,
    pub tier: RankTier,
    pub summary: DimensionSummary,
}

/// Rank divisions by total savings, highest first
///
/// The sort is stable: divisions with equal totals keep the order in which
/// they first appeared in the input. Ranks run from 1 by position.
///
/// # Examples
/// ```
/// use solution_dashboard::ranking::rank_divisions;
/// use solution_dashboard::summary::DimensionSummary;
///
/// let mut a = DimensionSummary::new("A");
/// a.smv_unlock = 100.0;
/// let mut b = DimensionSummary::new("B");
/// b.smv_unlock = 300.0;
///
/// let ranked = rank_divisions(&[a, b]);
/// assert_eq!(ranked[0].summary.category, "B");
/// assert_eq!(ranked[0].rank, 1);
/// ```
pub fn rank_divisions(divisions: &[DimensionSummary]) -> Vec<RankedDivision> {
    let mut sorted: Vec<&DimensionSummary> = divisions.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_savings()
            .partial_cmp(&a.total_savings())
            .unwrap_or(Ordering::Equal)
    });

    sorted
        .into_iter()
        .enumerate()
        .map(|(position, summary)| RankedDivision {
            rank: position + 1,
            tier: RankTier::for_rank(position + 1),
            summary: summary.clone(),
        })
        .collect()
}

/// Rank of each division in input order, as the summary sheet's helper column holds it
pub fn ranks_in_input_order(divisions: &[DimensionSummary]) -> Vec<usize> {
    let ranked = rank_divisions(divisions);
    divisions
        .iter()
        .map(|division| {
            ranked
                .iter()
                .find(|r| r.summary.category == division.category)
                .map_or(0, |r| r.rank)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn division(name: &str, total: f64) -> DimensionSummary {
        let mut summary = DimensionSummary::new(name);
        summary.oh_reduction = total;
        summary
    }

    #[test]
    fn ranks_by_total_descending() {
        let ranked = rank_divisions(&[
            division("A", 100.0),
            division("B", 300.0),
            division("C", 200.0),
        ]);
        let order: Vec<&str> = ranked.iter().map(|r| r.summary.category.as_str()).collect();
        let ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(order, vec!["B", "C", "A"]);
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let ranked = rank_divisions(&[
            division("First", 50.0),
            division("Big", 80.0),
            division("Second", 50.0),
        ]);
        let order: Vec<&str> = ranked.iter().map(|r| r.summary.category.as_str()).collect();
        assert_eq!(order, vec!["Big", "First", "Second"]);
    }

    #[test]
    fn podium_tiers() {
        let divisions: Vec<DimensionSummary> = (0..5)
            .map(|i| division(&format!("D{}", i), (10 - i) as f64))
            .collect();
        let tiers: Vec<RankTier> = rank_divisions(&divisions).iter().map(|r| r.tier).collect();
        assert_eq!(
            tiers,
            vec![
                RankTier::Gold,
                RankTier::Silver,
                RankTier::Bronze,
                RankTier::Standard,
                RankTier::Standard
            ]
        );
        assert!(!RankTier::Standard.is_podium());
    }

    #[test]
    fn helper_ranks_follow_input_order() {
        let divisions = [
            division("A", 100.0),
            division("B", 300.0),
            division("C", 200.0),
        ];
        assert_eq!(ranks_in_input_order(&divisions), vec![3, 1, 2]);
    }
}
