//! Proposal and evaluation records
//!
//! A researcher authors a [`Proposal`]; the evaluator never mutates it and
//! instead publishes a separate [`ProposalEvaluation`] naming the winner.
//!
//! Scoring is cost-efficiency per researcher per month per asset:
//!
//! ```text
//! score = (grant_requested / num_researchers) / research_length_months / assets_generated
//! ```
//!
//! Lower score wins. Among equal lowest scores the candidate listed first
//! wins.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while scoring proposals
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProposalError {
    #[error("Malformed proposal: {field} must be positive, got {value}")]
    Malformed { field: &'static str, value: i64 },

    #[error("No proposals to evaluate")]
    NoCandidates,
}

/// Fixed proposal parameters a researcher re-submits each round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalTemplate {
    pub grant_requested: i64,
    pub assets_generated: u32,
    pub num_researchers: u32,
    pub research_length_months: u32,
}

/// A funding request owned by the researcher that authored it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Requested grant (unit B minor units)
    pub grant_requested: i64,
    pub assets_generated: u32,
    pub num_researchers: u32,
    pub research_length_months: u32,
    /// Carried forward from the researcher across proposals
    pub knowledge_access: f64,
    /// Tick at which the researcher authored this proposal
    pub authored_tick: usize,
}

impl Proposal {
    pub fn from_template(template: &ProposalTemplate, knowledge_access: f64, tick: usize) -> Self {
        Self {
            grant_requested: template.grant_requested,
            assets_generated: template.assets_generated,
            num_researchers: template.num_researchers,
            research_length_months: template.research_length_months,
            knowledge_access,
            authored_tick: tick,
        }
    }

    /// Cost-efficiency score (lower is better)
    ///
    /// # Example
    /// ```
    /// use funding_simulator_core_rs::models::proposal::{Proposal, ProposalTemplate};
    ///
    /// let template = ProposalTemplate {
    ///     grant_requested: 10_000,
    ///     assets_generated: 2,
    ///     num_researchers: 5,
    ///     research_length_months: 10,
    /// };
    /// let proposal = Proposal::from_template(&template, 1.0, 0);
    /// assert_eq!(proposal.score().unwrap(), 100.0);
    /// ```
    pub fn score(&self) -> Result<f64, ProposalError> {
        self.validate()?;
        Ok(self.grant_requested as f64
            / self.num_researchers as f64
            / self.research_length_months as f64
            / self.assets_generated as f64)
    }

    fn validate(&self) -> Result<(), ProposalError> {
        let divisors = [
            ("num_researchers", self.num_researchers),
            ("research_length_months", self.research_length_months),
            ("assets_generated", self.assets_generated),
        ];
        for (field, value) in divisors {
            if value == 0 {
                return Err(ProposalError::Malformed { field, value: 0 });
            }
        }
        if self.grant_requested < 0 {
            return Err(ProposalError::Malformed {
                field: "grant_requested",
                value: self.grant_requested,
            });
        }
        Ok(())
    }
}

/// One scored entry in an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProposal {
    pub researcher: String,
    pub authored_tick: usize,
    pub grant_requested: i64,
    pub score: f64,
}

/// Winner selection over the proposals pending at one evaluation round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalEvaluation {
    pub winner: String,
    pub evaluated_tick: usize,
    pub scored: Vec<ScoredProposal>,
}

impl ProposalEvaluation {
    /// Score every candidate and pick the lowest score
    ///
    /// Candidates are scored in the order given; a later candidate only
    /// replaces the current best when its score is strictly lower.
    pub fn evaluate<'a, I>(candidates: I, tick: usize) -> Result<Self, ProposalError>
    where
        I: IntoIterator<Item = (&'a str, &'a Proposal)>,
    {
        let mut scored = Vec::new();
        let mut best: Option<(usize, f64)> = None;

        for (researcher, proposal) in candidates {
            let score = proposal.score()?;
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((scored.len(), score));
            }
            scored.push(ScoredProposal {
                researcher: researcher.to_string(),
                authored_tick: proposal.authored_tick,
                grant_requested: proposal.grant_requested,
                score,
            });
        }

        let (winner_idx, _) = best.ok_or(ProposalError::NoCandidates)?;
        Ok(Self {
            winner: scored[winner_idx].researcher.clone(),
            evaluated_tick: tick,
            scored,
        })
    }

    /// Whether this evaluation scored the given researcher's proposal
    pub fn covers(&self, researcher: &str, authored_tick: usize) -> bool {
        self.scored
            .iter()
            .any(|s| s.researcher == researcher && s.authored_tick == authored_tick)
    }

    pub fn winning_entry(&self) -> Option<&ScoredProposal> {
        self.scored.iter().find(|s| s.researcher == self.winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(grant: i64, researchers: u32, months: u32, assets: u32) -> Proposal {
        Proposal {
            grant_requested: grant,
            assets_generated: assets,
            num_researchers: researchers,
            research_length_months: months,
            knowledge_access: 1.0,
            authored_tick: 0,
        }
    }

    #[test]
    fn test_lower_score_wins() {
        let p0 = proposal(10_000, 5, 10, 2);
        let p1 = proposal(10_000, 2, 10, 2);
        assert_eq!(p0.score().unwrap(), 100.0);
        assert_eq!(p1.score().unwrap(), 250.0);

        let eval =
            ProposalEvaluation::evaluate([("researcher0", &p0), ("researcher1", &p1)], 1).unwrap();
        assert_eq!(eval.winner, "researcher0");

        let eval =
            ProposalEvaluation::evaluate([("researcher1", &p1), ("researcher0", &p0)], 1).unwrap();
        assert_eq!(eval.winner, "researcher0");
    }

    #[test]
    fn test_tie_goes_to_first_candidate() {
        let p0 = proposal(10_000, 5, 10, 2);
        let p1 = proposal(20_000, 10, 10, 2);
        assert_eq!(p0.score().unwrap(), p1.score().unwrap());

        for _ in 0..10 {
            let eval =
                ProposalEvaluation::evaluate([("first", &p0), ("second", &p1)], 3).unwrap();
            assert_eq!(eval.winner, "first");
        }
    }

    #[test]
    fn test_zero_divisor_is_malformed() {
        let p = proposal(10_000, 0, 10, 2);
        assert_eq!(
            p.score(),
            Err(ProposalError::Malformed {
                field: "num_researchers",
                value: 0
            })
        );
    }

    #[test]
    fn test_no_candidates() {
        let empty: Vec<(&str, &Proposal)> = Vec::new();
        assert_eq!(
            ProposalEvaluation::evaluate(empty, 0),
            Err(ProposalError::NoCandidates)
        );
    }

    #[test]
    fn test_covers_matches_authored_tick() {
        let mut p0 = proposal(10_000, 5, 10, 2);
        p0.authored_tick = 7;
        let eval = ProposalEvaluation::evaluate([("r0", &p0)], 8).unwrap();
        assert!(eval.covers("r0", 7));
        assert!(!eval.covers("r0", 6));
        assert!(!eval.covers("r1", 7));
    }
}
