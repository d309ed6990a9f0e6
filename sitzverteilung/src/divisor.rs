//! The Sainte-Laguë divisor method with discrepancy elimination.

use log::{debug, info};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::*;
use crate::decimal::{nicest_between, Ratio};

// Outcome of the discrepancy elimination.
#[derive(Eq, PartialEq, Debug, Clone)]
enum Elimination {
    Resolved(Vec<i128>),
    // The window boundary is shared by this many thresholds: a lottery is needed.
    Tie(usize),
}

/// Reads the votes as exact rationals.
pub(crate) fn vote_ratios(votes: &VoteTable) -> Result<Vec<Ratio>, ApportionmentError> {
    let mut res = Vec::with_capacity(votes.len());
    for (name, v) in votes.iter() {
        let r = Ratio::from_decimal(*v);
        if r.is_negative() {
            return Err(ApportionmentError::NegativeVotes { name: name.clone() });
        }
        res.push(r);
    }
    Ok(res)
}

/// The divisor at which an entity holding `seats` seats sits exactly on the
/// rounding boundary `seats - half_steps / 2`. Only positive values are real
/// thresholds.
pub(crate) fn threshold(votes: &Ratio, seats: i128, half_steps: i128) -> Option<Ratio> {
    let boundary = Ratio::new(2 * seats - half_steps, 2)?;
    votes.div(&boundary).filter(|t| t.is_positive())
}

pub(crate) fn seats_for_divisor(votes: &[Ratio], divisor: &Ratio) -> Option<Vec<i128>> {
    votes
        .iter()
        .map(|v| v.div(divisor).and_then(|q| q.round_half_up()))
        .collect()
}

pub(crate) fn build_table(votes: &VoteTable, seats: &[i128]) -> Result<SeatTable, ApportionmentError> {
    let mut rows = Vec::with_capacity(votes.len());
    for ((name, v), s) in votes.iter().zip(seats.iter()) {
        let seats = u64::try_from(*s).map_err(|_| ApportionmentError::Inconsistent {
            reason: format!("negative seat count {} for {}", s, name),
        })?;
        rows.push(SeatRow {
            name: name.clone(),
            votes: *v,
            seats,
        });
    }
    Ok(SeatTable::new(rows))
}

pub(crate) fn empty_apportionment(votes: &VoteTable) -> Result<Apportionment, ApportionmentError> {
    Ok(Apportionment {
        table: build_table(votes, &vec![0; votes.len()])?,
        lottery: Vec::new(),
        drawn: Vec::new(),
        divisor: None,
    })
}

/// Chooses the citation divisor for a given seat distribution.
///
/// Any divisor above the largest `votes / (seats + 1/2)` and up to the smallest
/// `votes / (seats - 1/2)` reproduces the distribution. The lower bound is
/// rounded up and the upper bound down before picking a nice number between them.
pub(crate) fn citation_divisor(
    votes: &[Ratio],
    seats: &[i128],
) -> Result<Option<Decimal>, ApportionmentError> {
    let lower = votes
        .iter()
        .zip(seats.iter())
        .filter_map(|(v, s)| threshold(v, *s, -1))
        .max();
    let upper = votes
        .iter()
        .zip(seats.iter())
        .filter_map(|(v, s)| threshold(v, *s, 1))
        .min();
    let (lower, upper) = match (lower, upper) {
        (Some(l), Some(u)) => (l, u),
        // Nobody holds a seat.
        _ => return Ok(None),
    };
    let bounds = (
        lower.to_decimal(RoundingStrategy::AwayFromZero),
        upper.to_decimal(RoundingStrategy::ToZero),
    );
    match bounds {
        (Some(l), Some(u)) => {
            debug!("citation_divisor: bounds ({}, {}]", l, u);
            nicest_between(l, u).map(Some)
        }
        _ => Err(ApportionmentError::Inconsistent {
            reason: "divisor bounds out of decimal range".to_string(),
        }),
    }
}

fn eliminate_discrepancy(
    votes: &[Ratio],
    seats: &[i128],
    discrepancy: i128,
    divisor: &Ratio,
) -> Result<Elimination, ApportionmentError> {
    let sign = discrepancy.signum();

    // All the divisors at which some entity moves by one seat in the needed direction.
    let mut thresholds: Vec<(Ratio, usize)> = Vec::new();
    for (idx, (v, s)) in votes.iter().zip(seats.iter()).enumerate() {
        for step in 0..=discrepancy.abs() {
            if let Some(t) = threshold(v, *s, sign * (2 * step + 1)) {
                thresholds.push((t, idx));
            }
        }
    }
    thresholds.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(
        "eliminate_discrepancy: {} thresholds for discrepancy {}",
        thresholds.len(),
        discrepancy
    );

    let pointer = thresholds.partition_point(|(t, _)| t < divisor) as i128;
    let edge = pointer + discrepancy;
    if edge < 0 || edge > thresholds.len() as i128 {
        return Err(ApportionmentError::Inconsistent {
            reason: format!(
                "discrepancy {} outside of the {} thresholds",
                discrepancy,
                thresholds.len()
            ),
        });
    }
    let edge = edge as usize;

    if edge >= 1 && edge < thresholds.len() && thresholds[edge - 1].0 == thresholds[edge].0 {
        let tied_value = &thresholds[edge].0;
        let tied = thresholds.iter().filter(|(t, _)| t == tied_value).count();
        debug!("eliminate_discrepancy: {} entities tied at the window edge", tied);
        return Ok(Elimination::Tie(tied));
    }

    let (start, end) = if discrepancy > 0 {
        (pointer as usize, edge)
    } else {
        (edge, pointer as usize)
    };
    let mut adjusted = seats.to_vec();
    for (_, idx) in thresholds[start..end].iter() {
        adjusted[*idx] -= sign;
    }
    Ok(Elimination::Resolved(adjusted))
}

/// Apportions `seats` seats with the Sainte-Laguë divisor method.
///
/// Ties that cannot be resolved are returned in `lottery`, and the table then
/// holds fewer seats than requested. Nothing is drawn here.
pub fn divisor_method(votes: &VoteTable, seats: u64) -> Result<Apportionment, ApportionmentError> {
    let ratios = vote_ratios(votes)?;
    if seats == 0 {
        return empty_apportionment(votes);
    }
    let total = ratios.iter().fold(Ratio::zero(), |acc, v| acc.add(v));
    let provisional = total
        .div(&Ratio::from_int(seats as i128))
        .filter(|d| d.is_positive())
        .ok_or(ApportionmentError::EmptyElection)?;

    let mut counts = seats_for_divisor(&ratios, &provisional).ok_or(ApportionmentError::EmptyElection)?;
    let discrepancy = counts.iter().sum::<i128>() - seats as i128;
    debug!(
        "divisor_method: provisional divisor {:?}, seats {:?}, discrepancy {}",
        provisional.to_decimal(RoundingStrategy::MidpointAwayFromZero),
        counts,
        discrepancy
    );

    let mut lottery: Vec<String> = Vec::new();
    if discrepancy != 0 {
        match eliminate_discrepancy(&ratios, &counts, discrepancy, &provisional)? {
            Elimination::Resolved(adjusted) => counts = adjusted,
            Elimination::Tie(tied) => {
                // Bracket the tie: everything below it, and everything including it.
                let lower = divisor_method(votes, seats - 1)?;
                let upper = divisor_method(votes, lower.table.total_seats() + tied as u64)?;
                for (low, high) in lower.table.rows().iter().zip(upper.table.rows().iter()) {
                    if high.seats == low.seats + 1 {
                        lottery.push(low.name.clone());
                    }
                }
                counts = lower.table.rows().iter().map(|r| r.seats as i128).collect();
                info!(
                    "divisor_method: tie for {} seat(s) between {:?}",
                    seats - lower.table.total_seats(),
                    lottery
                );
            }
        }
    }

    let divisor = citation_divisor(&ratios, &counts)?;
    if let Some(d) = divisor {
        let check = seats_for_divisor(&ratios, &Ratio::from_decimal(d));
        if check.as_ref() != Some(&counts) {
            return Err(ApportionmentError::Inconsistent {
                reason: format!(
                    "divisor {} gives {:?} instead of {:?}",
                    d, check, counts
                ),
            });
        }
    }
    info!("divisor_method: {} seats, divisor {:?}", seats, divisor);

    Ok(Apportionment {
        table: build_table(votes, &counts)?,
        lottery,
        drawn: Vec::new(),
        divisor,
    })
}
