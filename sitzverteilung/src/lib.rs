mod config;
use log::{info, warn};

pub use crate::config::*;

pub mod builder;
pub mod decimal;
mod distribution;
mod divisor;
pub mod lottery;
pub mod manual;
mod rank;

pub use crate::distribution::distribute_seats;
pub use crate::divisor::divisor_method;
pub use crate::rank::rank_number_method;

use crate::lottery::Lottery;

/// Apportions `seats` seats among the entries of `votes` with the Sainte-Laguë method.
///
/// Unresolvable ties are left in the `lottery` field of the result.
///
/// Arguments:
/// * `votes` the votes (or weights) of every entity, in tie-break order
/// * `seats` the number of seats to hand out
/// * `method` the algorithm. [`Method::CrossCheck`] runs both algorithms and fails
/// if they disagree.
pub fn apportion(
    votes: &VoteTable,
    seats: u64,
    method: Method,
) -> Result<Apportionment, ApportionmentError> {
    match method {
        Method::Divisor => divisor_method(votes, seats),
        Method::RankNumber => rank_number_method(votes, seats),
        Method::CrossCheck => {
            let by_divisor = divisor_method(votes, seats)?;
            let by_rank = rank_number_method(votes, seats)?;
            if by_divisor.table != by_rank.table || by_divisor.lottery != by_rank.lottery {
                warn!(
                    "apportion: methods disagree for {} seats: {:?} vs {:?}",
                    seats,
                    by_divisor.table.seats(),
                    by_rank.table.seats()
                );
                return Err(ApportionmentError::InconsistentMethods {
                    divisor: by_divisor.table.seats(),
                    rank_number: by_rank.table.seats(),
                });
            }
            Ok(by_divisor)
        }
    }
}

/// Apportions the seats like [`apportion`] and draws lots for the tied seats.
///
/// After this call the table holds exactly `seats` seats. The tied entities stay
/// listed in `lottery` and the winners are in `drawn`.
pub fn sainte_lague(
    votes: &VoteTable,
    seats: u64,
    method: Method,
    lottery: &mut Lottery,
) -> Result<Apportionment, ApportionmentError> {
    let mut res = apportion(votes, seats, method)?;
    if !res.lottery.is_empty() {
        info!(
            "sainte_lague: {} seat(s) to draw among {:?}",
            seats - res.table.total_seats(),
            res.lottery
        );
        let (table, drawn) = lottery.resolve(&res.table, &res.lottery, seats)?;
        res.table = table;
        res.drawn = drawn;
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lottery::{RandomResolver, ScriptedResolver};
    use rust_decimal_macros::dec;

    #[test]
    fn method_names() {
        assert_eq!("Rangzahl".parse::<Method>(), Ok(Method::RankNumber));
        assert_eq!("divisor".parse::<Method>(), Ok(Method::Divisor));
        assert_eq!("debug".parse::<Method>(), Ok(Method::CrossCheck));
        let err = "hare".parse::<Method>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"hare\" is not a valid apportionment method, choose from [\"divisor\", \"rangzahl\", \"debug\"]"
        );
    }

    #[test]
    fn cross_check_agrees() {
        let votes = VoteTable::from_counts(&[("A", 480), ("B", 320), ("C", 200)]);
        let res = apportion(&votes, 10, Method::CrossCheck).unwrap();
        assert_eq!(res.table.total_seats(), 10);
        assert_eq!(res.divisor, Some(dec!(100)));
    }

    #[test]
    fn draws_tied_seats() {
        let votes = VoteTable::from_counts(&[("X", 5), ("Y", 5)]);
        let mut resolver = RandomResolver;
        let mut lottery = Lottery::new(&mut resolver, 3);
        let res = sainte_lague(&votes, 1, Method::Divisor, &mut lottery).unwrap();
        assert_eq!(res.table.total_seats(), 1);
        assert_eq!(res.lottery.len(), 2);
        assert_eq!(res.drawn.len(), 1);
        assert_eq!(res.table.seats_of(&res.drawn[0]), Some(1));
    }

    #[test]
    fn no_lottery_without_ties() {
        let votes = VoteTable::from_counts(&[("A", 60), ("B", 40)]);
        let mut resolver = ScriptedResolver::new(&[]);
        let mut lottery = Lottery::new(&mut resolver, 0);
        let res = sainte_lague(&votes, 5, Method::RankNumber, &mut lottery).unwrap();
        assert_eq!(res.table.seats(), vec![("A".to_string(), 3), ("B".to_string(), 2)]);
        assert!(res.drawn.is_empty());
    }
}
