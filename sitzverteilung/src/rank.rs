//! The rank-number method: seats are handed out one by one to the highest score.

use log::{debug, info};

use crate::config::*;
use crate::decimal::Ratio;
use crate::divisor::{build_table, citation_divisor, empty_apportionment, vote_ratios};

// votes / (seats + 1/2), written as 2 * votes / (2 * seats + 1).
fn score(votes: &Ratio, seats: i128) -> Option<Ratio> {
    votes
        .mul(&Ratio::from_int(2))
        .div(&Ratio::from_int(2 * seats + 1))
}

/// Apportions `seats` seats by repeatedly awarding the next seat to the entity
/// with the highest rank number.
///
/// When more entities share the highest rank number than seats are left, the
/// distribution stops and they are returned in `lottery`.
pub fn rank_number_method(
    votes: &VoteTable,
    seats: u64,
) -> Result<Apportionment, ApportionmentError> {
    let ratios = vote_ratios(votes)?;
    if seats == 0 {
        return empty_apportionment(votes);
    }
    let mut counts: Vec<i128> = vec![0; ratios.len()];
    let mut lottery: Vec<String> = Vec::new();
    let mut left = seats;
    while left > 0 {
        let scores: Vec<Ratio> = ratios
            .iter()
            .zip(counts.iter())
            .map(|(v, s)| score(v, *s).unwrap_or_else(Ratio::zero))
            .collect();
        let best = match scores.iter().max() {
            Some(best) if best.is_positive() => best.clone(),
            _ => return Err(ApportionmentError::EmptyElection),
        };
        let tied: Vec<usize> = (0..scores.len()).filter(|i| scores[*i] == best).collect();
        if tied.len() as u64 > left {
            lottery = tied
                .iter()
                .map(|i| votes.iter().nth(*i).map(|(n, _)| n.clone()).unwrap_or_default())
                .collect();
            info!(
                "rank_number_method: {} entities tied for the last {} seat(s)",
                tied.len(),
                left
            );
            break;
        }
        counts[tied[0]] += 1;
        left -= 1;
    }
    debug!("rank_number_method: seats {:?}", counts);

    Ok(Apportionment {
        table: build_table(votes, &counts)?,
        lottery,
        drawn: Vec::new(),
        divisor: citation_divisor(&ratios, &counts)?,
    })
}
