//! Poll result aggregation for display.

use serde::Serialize;

use crate::poll::{AlternativeId, Poll};

/// Display row for one alternative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeResult {
    pub id: AlternativeId,
    pub text: String,
    pub votes: u64,
    /// `votes / total * 100`, or 0 when nobody voted.
    pub percentage: f64,
    /// Holds the maximum count; never set while the poll has no votes.
    pub leading: bool,
}

/// Results for a whole poll, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollResults {
    pub total_votes: u64,
    pub alternatives: Vec<AlternativeResult>,
}

impl PollResults {
    pub fn leaders(&self) -> impl Iterator<Item = &AlternativeResult> {
        self.alternatives.iter().filter(|a| a.leading)
    }
}

/// Derive percentages and leaders from the poll's current tallies.
#[allow(clippy::cast_precision_loss)]
pub fn compute_results(poll: &Poll) -> PollResults {
    let total = poll.counted_votes();
    let max = poll
        .alternatives
        .iter()
        .map(|a| a.vote_count)
        .max()
        .unwrap_or(0);

    let alternatives = poll
        .alternatives
        .iter()
        .map(|a| AlternativeResult {
            id: a.id,
            text: a.text.clone(),
            votes: a.vote_count,
            percentage: if total == 0 {
                0.0
            } else {
                a.vote_count as f64 / total as f64 * 100.0
            },
            leading: total > 0 && a.vote_count == max,
        })
        .collect();

    PollResults {
        total_votes: total,
        alternatives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::{Alternative, PollStatus};

    fn poll_with(counts: &[u64]) -> Poll {
        let alternatives: Vec<Alternative> = counts
            .iter()
            .zip(1u64..)
            .map(|(&vote_count, id)| Alternative {
                id,
                text: format!("Option {id}"),
                vote_count,
            })
            .collect();
        Poll {
            id: 1,
            title: "Poll".into(),
            description: None,
            closing_time: time::macros::datetime!(2030-01-01 00:00 UTC),
            status: PollStatus::Active,
            attachment_url: None,
            total_votes: counts.iter().fold(0, |acc: u64, c| acc.saturating_add(*c)),
            alternatives,
            created_at: None,
            updated_at: None,
        }
    }

    fn percentages(results: &PollResults) -> Vec<f64> {
        results.alternatives.iter().map(|a| a.percentage).collect()
    }

    #[test]
    fn percentages_and_single_leader() {
        let results = compute_results(&poll_with(&[3, 1, 0]));
        assert_eq!(results.total_votes, 4);
        assert_eq!(percentages(&results), vec![75.0, 25.0, 0.0]);
        let leaders: Vec<_> = results.leaders().map(|a| a.id).collect();
        assert_eq!(leaders, vec![1]);
    }

    #[test]
    fn no_votes_means_zero_and_no_leader() {
        let results = compute_results(&poll_with(&[0, 0, 0]));
        assert_eq!(results.total_votes, 0);
        assert_eq!(percentages(&results), vec![0.0, 0.0, 0.0]);
        assert_eq!(results.leaders().count(), 0);
    }

    #[test]
    fn ties_share_the_lead() {
        let results = compute_results(&poll_with(&[2, 2, 1]));
        let leaders: Vec<_> = results.leaders().map(|a| a.id).collect();
        assert_eq!(leaders, vec![1, 2]);
        assert!((results.alternatives[2].percentage - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_poll_has_no_rows() {
        let results = compute_results(&poll_with(&[]));
        assert!(results.alternatives.is_empty());
        assert_eq!(results.total_votes, 0);
    }

    #[test]
    fn huge_backend_counts_saturate() {
        let results = compute_results(&poll_with(&[u64::MAX, 1]));
        assert_eq!(results.total_votes, u64::MAX);
        assert!(results.alternatives[0].leading);
        assert!(results.alternatives[0].percentage <= 100.0);
    }

    #[test]
    fn display_order_is_preserved() {
        let results = compute_results(&poll_with(&[0, 5, 1]));
        let ids: Vec<_> = results.alternatives.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(results.alternatives[1].leading);
    }
}
