//! Append-only records attached to an application: the per-round decision ledger and the
//! free-text trails (history and remarks).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{EmployeeProfile, RoundDecision};

/// Ordered round decisions, at most one per round number.
///
/// Entries are kept sorted by round so lookups are a binary search. The "who approved round N"
/// view is derived from here rather than stored alongside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundLedger {
    decisions: Vec<RoundDecision>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("round {round} already has a recorded decision")]
    DuplicateRound { round: u8 },
    #[error("round {round} precedes the latest recorded round {latest}")]
    OutOfOrder { round: u8, latest: u8 },
}

impl RoundLedger {
    pub fn record(&mut self, decision: RoundDecision) -> Result<&RoundDecision, LedgerError> {
        match self
            .decisions
            .binary_search_by_key(&decision.round, |entry| entry.round)
        {
            Ok(_) => Err(LedgerError::DuplicateRound {
                round: decision.round,
            }),
            Err(index) if index < self.decisions.len() => Err(LedgerError::OutOfOrder {
                round: decision.round,
                latest: self.decisions[self.decisions.len() - 1].round,
            }),
            Err(index) => {
                self.decisions.push(decision);
                Ok(&self.decisions[index])
            }
        }
    }

    pub fn decision_for(&self, round: u8) -> Option<&RoundDecision> {
        self.decisions
            .binary_search_by_key(&round, |entry| entry.round)
            .ok()
            .map(|index| &self.decisions[index])
    }

    pub fn approver_for(&self, round: u8) -> Option<&str> {
        self.decision_for(round)
            .map(|decision| decision.approver.as_str())
    }

    pub fn approvers_by_round(&self) -> BTreeMap<u8, String> {
        self.decisions
            .iter()
            .map(|decision| (decision.round, decision.approver.clone()))
            .collect()
    }

    /// Whether `employee` owned a decided round or signed one under their full name.
    pub fn decided_by(&self, employee: &EmployeeProfile) -> bool {
        self.decisions.iter().any(|decision| {
            decision.reviewer.as_ref() == Some(&employee.id)
                || employee.matches_approver(&decision.approver)
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RoundDecision> {
        self.decisions.iter()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

/// A single narrative entry in the history or remarks trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailEntry {
    pub recorded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub text: String,
}

/// Append-only sequence of [`TrailEntry`] values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trail {
    entries: Vec<TrailEntry>,
}

impl Trail {
    pub fn push(
        &mut self,
        recorded_at: DateTime<Utc>,
        actor: Option<&str>,
        text: impl Into<String>,
    ) {
        self.entries.push(TrailEntry {
            recorded_at,
            actor: actor.map(str::to_string),
            text: text.into(),
        });
    }

    pub fn entries(&self) -> &[TrailEntry] {
        &self.entries
    }

    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.text.as_str()).collect()
    }

    /// Joins the trail into a single display string.
    pub fn render(&self, delimiter: &str) -> String {
        self.texts().join(delimiter)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
