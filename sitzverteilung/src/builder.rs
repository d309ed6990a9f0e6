pub use crate::config::*;

use rust_decimal::Decimal;
use std::collections::HashMap;

/// A builder for assembling the vote data of an election.
///
/// States are declared first. Votes referring to an undeclared state are rejected.
///
/// ```
/// use rust_decimal::Decimal;
/// use sitzverteilung::builder::Builder;
/// # use sitzverteilung::ApportionmentError;
///
/// let mut builder = Builder::new()
///     .state("Nord", Decimal::from(2))?
///     .state("Süd", Decimal::from(3))?;
///
/// builder.add_second_votes("Blau", "Nord", 1200)?;
/// builder.add_second_votes("Rot", "Süd", 900)?;
/// builder.add_constituency("Nord", "Hafen", &[("Blau".to_string(), 410)])?;
///
/// let election = builder.build()?;
/// assert_eq!(election.parties(), &["Blau".to_string(), "Rot".to_string()]);
/// assert_eq!(election.second_votes("Rot", "Nord"), 0);
/// # Ok::<(), ApportionmentError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    _states: Vec<(String, Decimal)>,
    _parties: Vec<String>,
    _second_votes: HashMap<(String, String), u64>,
    _constituencies: Vec<Constituency>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Declares a state with its seat entitlement weight (usually its population).
    pub fn state(mut self, name: &str, weight: Decimal) -> Result<Builder, ApportionmentError> {
        if self._states.iter().any(|(n, _)| n == name) {
            return Err(ApportionmentError::DuplicateEntry {
                name: name.to_string(),
            });
        }
        if weight.is_sign_negative() && !weight.is_zero() {
            return Err(ApportionmentError::NegativeVotes {
                name: name.to_string(),
            });
        }
        self._states.push((name.to_string(), weight));
        Ok(self)
    }

    fn check_state(&self, state: &str) -> Result<(), ApportionmentError> {
        if self._states.iter().any(|(n, _)| n == state) {
            Ok(())
        } else {
            Err(ApportionmentError::UnknownState {
                name: state.to_string(),
            })
        }
    }

    /// Records the second votes of a party in a state.
    ///
    /// Parties are kept in the order in which they first appear.
    pub fn add_second_votes(
        &mut self,
        party: &str,
        state: &str,
        votes: u64,
    ) -> Result<(), ApportionmentError> {
        self.check_state(state)?;
        let key = (party.to_string(), state.to_string());
        if self._second_votes.contains_key(&key) {
            return Err(ApportionmentError::DuplicateEntry {
                name: format!("{} in {}", party, state),
            });
        }
        if !self._parties.iter().any(|p| p == party) {
            self._parties.push(party.to_string());
        }
        self._second_votes.insert(key, votes);
        Ok(())
    }

    /// Records the first-vote results of a constituency.
    pub fn add_constituency(
        &mut self,
        state: &str,
        name: &str,
        results: &[(String, u64)],
    ) -> Result<(), ApportionmentError> {
        self.check_state(state)?;
        if self
            ._constituencies
            .iter()
            .any(|c| c.state == state && c.name == name)
        {
            return Err(ApportionmentError::DuplicateEntry {
                name: format!("{} in {}", name, state),
            });
        }
        self._constituencies.push(Constituency {
            state: state.to_string(),
            name: name.to_string(),
            results: results.to_vec(),
        });
        Ok(())
    }

    pub fn build(self) -> Result<Election, ApportionmentError> {
        if self._states.is_empty() {
            return Err(ApportionmentError::EmptyElection);
        }
        Ok(Election {
            states: self._states,
            parties: self._parties,
            second_votes: self._second_votes,
            constituencies: self._constituencies,
        })
    }
}
