// ********* Input data structures ***********

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// Votes (or entitlement weights) per entity, in a significant order.
///
/// The insertion order is the fallback order whenever the apportionment
/// methods need to pick one entity among equals.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoteTable {
    entries: Vec<(String, Decimal)>,
}

impl VoteTable {
    pub fn new() -> VoteTable {
        VoteTable::default()
    }

    /// Adds an entity at the end of the table, or replaces the votes of an
    /// entity already present (keeping its position).
    pub fn insert(&mut self, name: &str, votes: Decimal) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = votes,
            None => self.entries.push((name.to_string(), votes)),
        }
    }

    pub fn from_counts(counts: &[(&str, u64)]) -> VoteTable {
        counts
            .iter()
            .map(|(name, votes)| (name.to_string(), Decimal::from(*votes)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Decimal)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|(_, v)| *v).sum()
    }
}

impl FromIterator<(String, Decimal)> for VoteTable {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        let mut table = VoteTable::new();
        for (name, votes) in iter {
            table.insert(&name, votes);
        }
        table
    }
}

/// The first-vote results of one constituency.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Constituency {
    pub state: String,
    pub name: String,
    pub results: Vec<(String, u64)>,
}

/// All the vote data of one election. Use the [`crate::builder::Builder`] to create one.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Election {
    pub(crate) states: Vec<(String, Decimal)>,
    pub(crate) parties: Vec<String>,
    // (party, state) -> second votes
    pub(crate) second_votes: HashMap<(String, String), u64>,
    pub(crate) constituencies: Vec<Constituency>,
}

impl Election {
    /// The states with their seat entitlement weight, in input order.
    pub fn states(&self) -> &[(String, Decimal)] {
        &self.states
    }

    /// The parties that received second votes, in input order.
    pub fn parties(&self) -> &[String] {
        &self.parties
    }

    pub fn constituencies(&self) -> &[Constituency] {
        &self.constituencies
    }

    pub fn second_votes(&self, party: &str, state: &str) -> u64 {
        self.second_votes
            .get(&(party.to_string(), state.to_string()))
            .cloned()
            .unwrap_or(0)
    }

    pub fn national_second_votes(&self, party: &str) -> u64 {
        self.states
            .iter()
            .map(|(state, _)| self.second_votes(party, state))
            .sum()
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SeatRow {
    pub name: String,
    pub votes: Decimal,
    pub seats: u64,
}

/// A vote table extended with the number of seats of every entity.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SeatTable {
    rows: Vec<SeatRow>,
}

impl SeatTable {
    pub(crate) fn new(rows: Vec<SeatRow>) -> SeatTable {
        SeatTable { rows }
    }

    pub fn rows(&self) -> &[SeatRow] {
        &self.rows
    }

    pub fn seats_of(&self, name: &str) -> Option<u64> {
        self.rows.iter().find(|r| r.name == name).map(|r| r.seats)
    }

    pub fn total_seats(&self) -> u64 {
        self.rows.iter().map(|r| r.seats).sum()
    }

    /// The seats per entity, in table order.
    pub fn seats(&self) -> Vec<(String, u64)> {
        self.rows.iter().map(|r| (r.name.clone(), r.seats)).collect()
    }

    pub(crate) fn add_seats(&mut self, name: &str, seats: u64) -> bool {
        match self.rows.iter_mut().find(|r| r.name == name) {
            Some(row) => {
                row.seats += seats;
                true
            }
            None => false,
        }
    }
}

/// The outcome of one apportionment call.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Apportionment {
    pub table: SeatTable,
    /// Entities tied for the remaining seats. Empty unless the seats could not be
    /// assigned deterministically.
    pub lottery: Vec<String>,
    /// The entities that won a seat in the lottery.
    pub drawn: Vec<String>,
    /// The citation divisor, if any entity holds a seat.
    pub divisor: Option<Decimal>,
}

/// How a party takes part in the final distribution.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Participation {
    /// Admitted to the proportional distribution with this many second votes.
    Proportional { second_votes: u64 },
    /// Only holds direct mandates (the party was not admitted or has no list).
    Independent,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartyResult {
    pub party: String,
    pub seats: u64,
    /// Uncompensated overhang mandates included in `seats`.
    pub overhang: u64,
    pub participation: Participation,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Admission {
    pub party: String,
    pub second_votes: u64,
    /// Share of the national second votes in percent (rounded to 4 places, display only).
    pub percent: Decimal,
    pub direct_mandates: u64,
    pub by_percent: bool,
    pub by_direct_mandates: bool,
    pub exempt: bool,
}

impl Admission {
    pub fn admitted(&self) -> bool {
        self.by_percent || self.by_direct_mandates || self.exempt
    }
}

/// The stages of the seat distribution that apportion seats, in execution order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Stage {
    StateApportionment,
    ListSubApportionment,
    UpperApportionment,
}

/// One entry of the audit protocol.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Decision {
    MajorityWinner {
        party: String,
    },
    Independent {
        party: String,
        seats: u64,
    },
    Divisor {
        stage: Stage,
        scope: String,
        seats: u64,
        divisor: Option<Decimal>,
    },
    Lottery {
        stage: Stage,
        scope: String,
        candidates: Vec<String>,
        drawn: Vec<String>,
    },
    Overhang {
        iteration: u32,
        total: u64,
        shortfall: Vec<(String, u64)>,
    },
    SeatCapReached {
        cap: u64,
        total: u64,
    },
    MajorityBonus {
        party: String,
        seats: u64,
        total: u64,
    },
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Distribution {
    pub total_seats: u64,
    pub parties: Vec<PartyResult>,
    /// Seats per state (the first level of the distribution).
    pub states: SeatTable,
    pub admissions: Vec<Admission>,
    pub minimum_seats: Vec<(String, u64)>,
    pub protocol: Vec<Decision>,
}

impl Distribution {
    pub fn seats_of(&self, party: &str) -> Option<u64> {
        self.parties
            .iter()
            .find(|p| p.party == party)
            .map(|p| p.seats)
    }
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ApportionmentError {
    NotANumber { value: String },
    UnknownMinimumSeatPolicy { name: String },
    UnknownMeanRounding { name: String },
    UnknownMethod { name: String },
    EmptyElection,
    NegativeVotes { name: String },
    UnknownState { name: String },
    DuplicateEntry { name: String },
    TooManyIndependents { independents: u64, planned: u64 },
    Inconsistent { reason: String },
    InconsistentMethods {
        divisor: Vec<(String, u64)>,
        rank_number: Vec<(String, u64)>,
    },
    LotteryAborted { reason: String },
    NoConvergence,
}

impl Error for ApportionmentError {}

impl Display for ApportionmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApportionmentError::NotANumber { value } => {
                write!(f, "{:?} is not a non-negative real number", value)
            }
            ApportionmentError::UnknownMinimumSeatPolicy { name } => write!(
                f,
                "unknown minimum seat policy {:?}, choose from {:?}",
                name,
                MinimumSeatPolicy::NAMES
            ),
            ApportionmentError::UnknownMeanRounding { name } => write!(
                f,
                "unknown rounding {:?} for the mean, choose from {:?}",
                name,
                MeanRounding::NAMES
            ),
            ApportionmentError::UnknownMethod { name } => write!(
                f,
                "{:?} is not a valid apportionment method, choose from {:?}",
                name,
                Method::NAMES
            ),
            ApportionmentError::EmptyElection => {
                write!(f, "seats cannot be apportioned without any votes")
            }
            ApportionmentError::NegativeVotes { name } => {
                write!(f, "negative vote count for {}", name)
            }
            ApportionmentError::UnknownState { name } => write!(f, "unknown state {}", name),
            ApportionmentError::DuplicateEntry { name } => write!(f, "duplicate entry {}", name),
            ApportionmentError::TooManyIndependents {
                independents,
                planned,
            } => write!(
                f,
                "{} independent seats exceed the {} planned seats",
                independents, planned
            ),
            ApportionmentError::Inconsistent { reason } => {
                write!(f, "internal inconsistency: {}", reason)
            }
            ApportionmentError::InconsistentMethods {
                divisor,
                rank_number,
            } => write!(
                f,
                "divisor method {:?} and rank-number method {:?} disagree",
                divisor, rank_number
            ),
            ApportionmentError::LotteryAborted { reason } => {
                write!(f, "lottery aborted: {}", reason)
            }
            ApportionmentError::NoConvergence => {
                write!(f, "the overhang balancing did not converge")
            }
        }
    }
}

// ********* Configuration **********

/// The apportionment strategy.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Method {
    /// Divisor method with discrepancy elimination ("divisor").
    Divisor,
    /// Seat-by-seat highest averages ("rangzahl").
    RankNumber,
    /// Runs both and fails if they disagree ("debug").
    CrossCheck,
}

impl Method {
    pub const NAMES: [&'static str; 3] = ["divisor", "rangzahl", "debug"];
}

impl FromStr for Method {
    type Err = ApportionmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "divisor" => Ok(Method::Divisor),
            "rangzahl" => Ok(Method::RankNumber),
            "debug" => Ok(Method::CrossCheck),
            _ => Err(ApportionmentError::UnknownMethod {
                name: s.to_string(),
            }),
        }
    }
}

/// How the mean of direct mandates and list seats is rounded.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MeanRounding {
    Down,
    Up,
}

impl MeanRounding {
    pub const NAMES: [&'static str; 2] = ["abrunden", "aufrunden"];
}

impl FromStr for MeanRounding {
    type Err = ApportionmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abrunden" => Ok(MeanRounding::Down),
            "aufrunden" => Ok(MeanRounding::Up),
            _ => Err(ApportionmentError::UnknownMeanRounding {
                name: s.to_string(),
            }),
        }
    }
}

/// The minimum number of seats guaranteed to a party in each state.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MinimumSeatPolicy {
    /// "Keine": the direct mandates only.
    DirectMandates,
    /// "Pur": the larger of direct mandates and list seats.
    Pure,
    /// "Mittelwert": the larger of direct mandates and the mean of direct
    /// mandates and list seats.
    Average(MeanRounding),
}

impl MinimumSeatPolicy {
    pub const NAMES: [&'static str; 3] = ["Keine", "Pur", "Mittelwert"];
}

impl FromStr for MinimumSeatPolicy {
    type Err = ApportionmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Keine" => Ok(MinimumSeatPolicy::DirectMandates),
            "Pur" => Ok(MinimumSeatPolicy::Pure),
            "Mittelwert" => Ok(MinimumSeatPolicy::Average(MeanRounding::Down)),
            _ => Err(ApportionmentError::UnknownMinimumSeatPolicy {
                name: s.to_string(),
            }),
        }
    }
}

/// The admission threshold ("Hürde"). A party passing any of the rules is admitted.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Threshold {
    pub percent: Option<Decimal>,
    pub direct_mandates: Option<u64>,
    pub exemptions: Vec<String>,
}

impl Threshold {
    /// Without a percentage or direct mandate rule, every party is admitted.
    pub fn is_enforced(&self) -> bool {
        self.percent.is_some() || self.direct_mandates.is_some()
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    /// The planned number of seats.
    pub seats: u64,
    pub threshold: Threshold,
    pub minimum_seats: MinimumSeatPolicy,
    /// Number of uncompensated overhang mandates that are tolerated.
    pub overhang_tolerance: u64,
    /// Maximum size of the parliament. `None` is unbounded.
    pub seat_cap: Option<u64>,
    pub method: Method,
}

impl Settings {
    pub fn new(seats: u64) -> Settings {
        Settings {
            seats,
            threshold: Threshold::default(),
            minimum_seats: MinimumSeatPolicy::DirectMandates,
            overhang_tolerance: 0,
            seat_cap: None,
            method: Method::Divisor,
        }
    }
}
