// The complete seat distribution of a parliament.

use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::config::*;
use crate::decimal::Ratio;
use crate::lottery::Lottery;
use crate::sainte_lague;

// Bound on the balancing loop. Each iteration adds at least one seat, so this is
// only reached with a runaway seat cap.
const MAX_ITERATIONS: u32 = 10_000;

const NATIONAL_SCOPE: &str = "Bund";
const STATES_SCOPE: &str = "Länder";

// Direct mandates per (party, state), with the parties in order of appearance.
struct DirectMandates {
    parties: Vec<String>,
    wins: HashMap<(String, String), u64>,
}

impl DirectMandates {
    fn of(&self, party: &str, state: &str) -> u64 {
        self.wins
            .get(&(party.to_string(), state.to_string()))
            .cloned()
            .unwrap_or(0)
    }

    fn total(&self, party: &str) -> u64 {
        self.wins
            .iter()
            .filter(|((p, _), _)| p == party)
            .map(|(_, n)| *n)
            .sum()
    }
}

fn count_direct_mandates(election: &Election) -> DirectMandates {
    let mut parties: Vec<String> = election.parties().to_vec();
    let mut wins: HashMap<(String, String), u64> = HashMap::new();
    for constituency in election.constituencies() {
        let mut winner: Option<&(String, u64)> = None;
        for result in constituency.results.iter() {
            // Equal maxima: the first party keeps the mandate.
            if winner.map_or(true, |w| result.1 > w.1) {
                winner = Some(result);
            }
        }
        match winner {
            Some((party, votes)) if *votes > 0 => {
                debug!(
                    "count_direct_mandates: {} wins {} in {}",
                    party, constituency.name, constituency.state
                );
                if !parties.contains(party) {
                    parties.push(party.clone());
                }
                *wins
                    .entry((party.clone(), constituency.state.clone()))
                    .or_insert(0) += 1;
            }
            _ => {
                debug!(
                    "count_direct_mandates: no winner in {} ({})",
                    constituency.name, constituency.state
                );
            }
        }
    }
    DirectMandates { parties, wins }
}

fn admit_parties(
    election: &Election,
    threshold: &Threshold,
    direct: &DirectMandates,
) -> Vec<Admission> {
    let all_votes: u64 = election
        .parties()
        .iter()
        .map(|p| election.national_second_votes(p))
        .sum();
    let enforced = threshold.is_enforced();
    election
        .parties()
        .iter()
        .map(|party| {
            let second_votes = election.national_second_votes(party);
            let share = Ratio::new(100 * second_votes as i128, all_votes as i128)
                .unwrap_or_else(Ratio::zero);
            let percent = Ratio::new(1_000_000 * second_votes as i128, all_votes as i128)
                .and_then(|r| r.round_half_up())
                .map(|n| Decimal::from_i128_with_scale(n, 4))
                .unwrap_or(Decimal::ZERO);
            let direct_mandates = direct.total(party);
            let by_percent = match threshold.percent {
                Some(p) => share >= Ratio::from_decimal(p),
                None => !enforced,
            };
            let by_direct_mandates = match threshold.direct_mandates {
                Some(n) => direct_mandates >= n,
                None => false,
            };
            let exempt = threshold.exemptions.iter().any(|e| e == party);
            Admission {
                party: party.clone(),
                second_votes,
                percent,
                direct_mandates,
                by_percent,
                by_direct_mandates,
                exempt,
            }
        })
        .collect()
}

fn majority_winner(admissions: &[Admission]) -> Option<String> {
    let all_votes: u64 = admissions.iter().map(|a| a.second_votes).sum();
    admissions
        .iter()
        .find(|a| 2 * a.second_votes > all_votes)
        .map(|a| a.party.clone())
}

fn minimum_seats(
    policy: MinimumSeatPolicy,
    direct: u64,
    list: u64,
) -> u64 {
    match policy {
        MinimumSeatPolicy::DirectMandates => direct,
        MinimumSeatPolicy::Pure => direct.max(list),
        MinimumSeatPolicy::Average(MeanRounding::Down) => direct.max((direct + list) / 2),
        MinimumSeatPolicy::Average(MeanRounding::Up) => direct.max((direct + list + 1) / 2),
    }
}

// Runs one apportionment and records its divisor and lottery in the protocol.
fn apportion_logged(
    votes: &VoteTable,
    seats: u64,
    stage: Stage,
    scope: &str,
    settings: &Settings,
    lottery: &mut Lottery,
    protocol: &mut Vec<Decision>,
) -> Result<SeatTable, ApportionmentError> {
    let res = sainte_lague(votes, seats, settings.method, lottery)?;
    debug!("{:?} {}: {:?}", stage, scope, res.table.seats());
    protocol.push(Decision::Divisor {
        stage,
        scope: scope.to_string(),
        seats,
        divisor: res.divisor,
    });
    if !res.lottery.is_empty() {
        protocol.push(Decision::Lottery {
            stage,
            scope: scope.to_string(),
            candidates: res.lottery.clone(),
            drawn: res.drawn.clone(),
        });
    }
    Ok(res.table)
}

// The seats each party misses to reach its minimum.
fn shortfall(upper: &SeatTable, minimum: &[(String, u64)]) -> Vec<(String, u64)> {
    minimum
        .iter()
        .map(|(party, min)| {
            let seats = upper.seats_of(party).unwrap_or(0);
            (party.clone(), min.saturating_sub(seats))
        })
        .collect()
}

fn sum_of(values: &[(String, u64)]) -> u64 {
    values.iter().map(|(_, n)| *n).sum()
}

struct Balanced {
    total: u64,
    upper: SeatTable,
    shortfall: Vec<(String, u64)>,
    iterations: u32,
}

/// Grows the parliament until the overhang is within the tolerance or the
/// seat cap is reached.
fn balance(
    national: &VoteTable,
    minimum: &[(String, u64)],
    start: u64,
    settings: &Settings,
    lottery: &mut Lottery,
    protocol: &mut Vec<Decision>,
) -> Result<Balanced, ApportionmentError> {
    let tolerance = settings.overhang_tolerance;
    let mut total = start;
    let mut upper = apportion_logged(
        national,
        total,
        Stage::UpperApportionment,
        NATIONAL_SCOPE,
        settings,
        lottery,
        protocol,
    )?;
    let mut missing = shortfall(&upper, minimum);
    let mut iterations: u32 = 0;
    info!("balance: {} seats, overhang {:?}", total, missing);

    loop {
        let overhang = sum_of(&missing);
        let limit = settings.seat_cap.map(|cap| cap.saturating_sub(overhang));
        if overhang <= tolerance || limit.map_or(false, |l| total >= l) {
            break;
        }
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            return Err(ApportionmentError::NoConvergence);
        }
        total += overhang - tolerance;
        let clamped = match limit {
            Some(l) if total >= l => {
                total = l;
                true
            }
            _ => false,
        };
        info!("balance: increasing the parliament to {} seats", total);
        upper = apportion_logged(
            national,
            total,
            Stage::UpperApportionment,
            NATIONAL_SCOPE,
            settings,
            lottery,
            protocol,
        )?;
        missing = shortfall(&upper, minimum);
        protocol.push(Decision::Overhang {
            iteration: iterations,
            total,
            shortfall: missing.clone(),
        });
        if clamped {
            if let Some(cap) = settings.seat_cap {
                warn!("balance: seat cap of {} reached", cap);
                protocol.push(Decision::SeatCapReached { cap, total });
            }
            break;
        }
    }
    Ok(Balanced {
        total,
        upper,
        shortfall: missing,
        iterations,
    })
}

/// Computes the seat distribution of an election.
///
/// The planned number of seats, minus the seats of independent winners, is
/// distributed among the states and within each state among the admitted
/// parties to derive the minimum seats of every party. The national
/// distribution then grows until the minimum seats are covered (up to the
/// tolerated overhang and the seat cap), and the majority clause is applied.
pub fn distribute_seats(
    election: &Election,
    settings: &Settings,
    lottery: &mut Lottery,
) -> Result<Distribution, ApportionmentError> {
    info!(
        "distribute_seats: {} states, {} parties, settings: {:?}",
        election.states().len(),
        election.parties().len(),
        settings
    );
    let mut protocol: Vec<Decision> = Vec::new();

    // Admission
    let direct = count_direct_mandates(election);
    let admissions = admit_parties(election, &settings.threshold, &direct);
    for a in admissions.iter() {
        info!(
            "distribute_seats: {} {}% {} direct mandate(s), admitted: {}",
            a.party,
            a.percent,
            a.direct_mandates,
            a.admitted()
        );
    }
    let winner = majority_winner(&admissions);
    if let Some(party) = winner.as_ref() {
        info!("distribute_seats: {} has the majority of the votes", party);
        protocol.push(Decision::MajorityWinner {
            party: party.clone(),
        });
    }
    let admitted: Vec<&Admission> = admissions.iter().filter(|a| a.admitted()).collect();

    let mut independents: Vec<(String, u64)> = Vec::new();
    for party in direct.parties.iter() {
        if admitted.iter().any(|a| a.party == *party) {
            continue;
        }
        let seats = direct.total(party);
        if seats > 0 {
            info!("distribute_seats: {} independent seat(s) for {}", seats, party);
            protocol.push(Decision::Independent {
                party: party.clone(),
                seats,
            });
            independents.push((party.clone(), seats));
        }
    }
    let independent_seats = sum_of(&independents);
    if independent_seats > settings.seats {
        return Err(ApportionmentError::TooManyIndependents {
            independents: independent_seats,
            planned: settings.seats,
        });
    }
    let proportional = settings.seats - independent_seats;

    // Seats per state
    let weights: VoteTable = election.states().iter().cloned().collect();
    let states = apportion_logged(
        &weights,
        proportional,
        Stage::StateApportionment,
        STATES_SCOPE,
        settings,
        lottery,
        &mut protocol,
    )?;

    // Seats per list, used for the minimum seats
    let mut list_seats: HashMap<(String, String), u64> = HashMap::new();
    for row in states.rows() {
        let votes: VoteTable = admitted
            .iter()
            .map(|a| {
                (
                    a.party.clone(),
                    Decimal::from(election.second_votes(&a.party, &row.name)),
                )
            })
            .collect();
        if votes.is_empty() || votes.total().is_zero() {
            info!(
                "distribute_seats: no list votes in {}, no list seats for its {} seat(s)",
                row.name, row.seats
            );
            for (party, _) in votes.iter() {
                list_seats.insert((party.clone(), row.name.clone()), 0);
            }
            continue;
        }
        let table = apportion_logged(
            &votes,
            row.seats,
            Stage::ListSubApportionment,
            &row.name,
            settings,
            lottery,
            &mut protocol,
        )?;
        for (party, seats) in table.seats() {
            list_seats.insert((party, row.name.clone()), seats);
        }
    }

    let minimum: Vec<(String, u64)> = admitted
        .iter()
        .map(|a| {
            let seats: u64 = election
                .states()
                .iter()
                .map(|(state, _)| {
                    let list = list_seats
                        .get(&(a.party.clone(), state.clone()))
                        .cloned()
                        .unwrap_or(0);
                    minimum_seats(settings.minimum_seats, direct.of(&a.party, state), list)
                })
                .sum();
            (a.party.clone(), seats)
        })
        .collect();
    info!("distribute_seats: minimum seats {:?}", minimum);

    // National distribution and overhang balancing
    let national: VoteTable = admitted
        .iter()
        .map(|a| (a.party.clone(), Decimal::from(a.second_votes)))
        .collect();
    let balanced = balance(
        &national,
        &minimum,
        proportional,
        settings,
        lottery,
        &mut protocol,
    )?;
    debug!(
        "distribute_seats: balanced after {} iteration(s)",
        balanced.iterations
    );
    let overhang = balanced.shortfall;
    let mut upper = balanced.upper;
    let mut total = balanced.total;
    for (party, missing) in overhang.iter() {
        if *missing > 0 {
            info!("distribute_seats: {} uncompensated overhang for {}", missing, party);
            upper.add_seats(party, *missing);
            total += missing;
        }
    }

    // Majority clause
    if let Some(party) = winner.as_ref() {
        match upper.seats_of(party) {
            Some(mut seats) => {
                let mut bonus = 0;
                while seats * 2 <= total {
                    seats += 1;
                    total += 1;
                    bonus += 1;
                }
                if bonus > 0 {
                    info!(
                        "distribute_seats: {} extra seat(s) for the majority of {}",
                        bonus, party
                    );
                    upper.add_seats(party, bonus);
                    protocol.push(Decision::MajorityBonus {
                        party: party.clone(),
                        seats: bonus,
                        total,
                    });
                }
            }
            None => warn!(
                "distribute_seats: majority winner {} is not admitted, no majority clause",
                party
            ),
        }
    }

    // Final
    let mut parties: Vec<PartyResult> = upper
        .rows()
        .iter()
        .map(|row| {
            let overhang = overhang
                .iter()
                .find(|(p, _)| *p == row.name)
                .map(|(_, n)| *n)
                .unwrap_or(0);
            PartyResult {
                party: row.name.clone(),
                seats: row.seats,
                overhang,
                participation: Participation::Proportional {
                    second_votes: election.national_second_votes(&row.name),
                },
            }
        })
        .collect();
    for (party, seats) in independents.iter() {
        parties.push(PartyResult {
            party: party.clone(),
            seats: *seats,
            overhang: 0,
            participation: Participation::Independent,
        });
    }
    total += independent_seats;
    info!("distribute_seats: {} seats in total", total);

    Ok(Distribution {
        total_seats: total,
        parties,
        states,
        admissions,
        minimum_seats: minimum,
        protocol,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::lottery::{LotteryResolver, LotterySelection, RandomResolver, ScriptedResolver};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn run(election: &Election, settings: &Settings) -> Result<Distribution, ApportionmentError> {
        let mut resolver = RandomResolver;
        let mut lottery = Lottery::new(&mut resolver, 0);
        distribute_seats(election, settings, &mut lottery)
    }

    fn seats(d: &Distribution) -> Vec<(String, u64)> {
        d.parties.iter().map(|p| (p.party.clone(), p.seats)).collect()
    }

    fn pairs(items: &[(&str, u64)]) -> Vec<(String, u64)> {
        items.iter().map(|(n, s)| (n.to_string(), *s)).collect()
    }

    // One state, no constituencies: a plain national apportionment.
    fn single_state(votes: &[(&str, u64)]) -> Election {
        let mut builder = Builder::new().state("Land", Decimal::from(1)).unwrap();
        for (party, v) in votes {
            builder.add_second_votes(party, "Land", *v).unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn proportional_only() {
        init();
        let election = single_state(&[("A", 480), ("B", 320), ("C", 200)]);
        let d = run(&election, &Settings::new(10)).unwrap();
        assert_eq!(d.total_seats, 10);
        assert_eq!(seats(&d), pairs(&[("A", 5), ("B", 3), ("C", 2)]));
        assert!(d
            .parties
            .iter()
            .all(|p| p.overhang == 0 && matches!(p.participation, Participation::Proportional { .. })));
    }

    #[test]
    fn state_without_list_votes() {
        init();
        let mut builder = Builder::new()
            .state("West", Decimal::from(1))
            .unwrap()
            .state("Ost", Decimal::from(1))
            .unwrap();
        builder.add_second_votes("A", "West", 600).unwrap();
        builder.add_second_votes("B", "West", 400).unwrap();
        let election = builder.build().unwrap();

        for policy in [MinimumSeatPolicy::DirectMandates, MinimumSeatPolicy::Pure] {
            let mut settings = Settings::new(10);
            settings.minimum_seats = policy;
            let d = run(&election, &settings).unwrap();
            assert_eq!(d.states.seats(), pairs(&[("West", 5), ("Ost", 5)]));
            assert_eq!(seats(&d), pairs(&[("A", 6), ("B", 4)]));
            assert_eq!(d.total_seats, 10);
            assert!(!d.protocol.iter().any(|p| matches!(
                p,
                Decision::Divisor { stage: Stage::ListSubApportionment, scope, .. } if scope == "Ost"
            )));
        }
    }

    // Two states, four constituencies. C is small but wins a constituency, D has
    // no list at all.
    fn threshold_election() -> Election {
        let mut builder = Builder::new()
            .state("Nord", Decimal::from(60))
            .unwrap()
            .state("Süd", Decimal::from(40))
            .unwrap();
        builder.add_second_votes("A", "Nord", 3000).unwrap();
        builder.add_second_votes("A", "Süd", 1500).unwrap();
        builder.add_second_votes("B", "Nord", 2000).unwrap();
        builder.add_second_votes("B", "Süd", 2000).unwrap();
        builder.add_second_votes("C", "Nord", 200).unwrap();
        builder.add_second_votes("C", "Süd", 100).unwrap();
        let c = |party: &str, v: u64| (party.to_string(), v);
        builder
            .add_constituency("Nord", "N1", &[c("A", 500), c("B", 300), c("C", 100)])
            .unwrap();
        builder
            .add_constituency("Nord", "N2", &[c("A", 200), c("B", 250), c("C", 400)])
            .unwrap();
        builder
            .add_constituency("Süd", "S1", &[c("A", 300), c("B", 400), c("D", 450)])
            .unwrap();
        builder
            .add_constituency("Süd", "S2", &[c("A", 0), c("B", 0)])
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn threshold_and_independents() {
        init();
        let election = threshold_election();
        let mut settings = Settings::new(20);
        settings.threshold = Threshold {
            percent: Some(Decimal::from(5)),
            direct_mandates: Some(3),
            exemptions: Vec::new(),
        };
        let d = run(&election, &settings).unwrap();

        let c = d.admissions.iter().find(|a| a.party == "C").unwrap();
        assert!(!c.admitted());
        assert_eq!(c.direct_mandates, 1);
        assert_eq!(c.percent, Decimal::new(34091, 4));

        assert_eq!(d.total_seats, 20);
        assert_eq!(
            seats(&d),
            pairs(&[("A", 10), ("B", 8), ("C", 1), ("D", 1)])
        );
        assert_eq!(d.parties[2].participation, Participation::Independent);
        assert_eq!(d.parties[3].participation, Participation::Independent);
        assert_eq!(d.states.seats(), pairs(&[("Nord", 11), ("Süd", 7)]));
    }

    #[test]
    fn exemption_and_no_threshold() {
        init();
        let election = threshold_election();
        let mut settings = Settings::new(20);
        settings.threshold.percent = Some(Decimal::from(5));
        settings.threshold.exemptions = vec!["C".to_string()];
        let d = run(&election, &settings).unwrap();
        let c = d.parties.iter().find(|p| p.party == "C").unwrap();
        assert!(matches!(c.participation, Participation::Proportional { second_votes: 300 }));

        // Without any rule every party is admitted.
        let d = run(&election, &Settings::new(20)).unwrap();
        assert!(d.admissions.iter().all(|a| a.admitted()));
        assert_eq!(d.seats_of("D"), Some(1));
    }

    #[test]
    fn too_many_independents() {
        let election = threshold_election();
        let mut settings = Settings::new(1);
        settings.threshold.percent = Some(Decimal::from(50));
        assert_eq!(
            run(&election, &settings),
            Err(ApportionmentError::TooManyIndependents {
                independents: 2,
                planned: 1
            })
        );
    }

    // A dominates the constituencies of a state where it is weak on lists.
    fn overhang_election() -> Election {
        let mut builder = Builder::new()
            .state("West", Decimal::from(1))
            .unwrap()
            .state("Ost", Decimal::from(1))
            .unwrap();
        builder.add_second_votes("A", "West", 320).unwrap();
        builder.add_second_votes("A", "Ost", 290).unwrap();
        builder.add_second_votes("B", "West", 680).unwrap();
        builder.add_second_votes("B", "Ost", 710).unwrap();
        let c = |party: &str, v: u64| (party.to_string(), v);
        for (i, state) in ["West", "Ost"].iter().enumerate() {
            for k in 0..3 {
                builder
                    .add_constituency(
                        state,
                        &format!("W{}", 3 * i + k),
                        &[c("A", 500), c("B", 400)],
                    )
                    .unwrap();
            }
        }
        builder.build().unwrap()
    }

    #[test]
    fn overhang_is_balanced() {
        init();
        let election = overhang_election();
        let d = run(&election, &Settings::new(10)).unwrap();
        assert_eq!(d.minimum_seats, pairs(&[("A", 6), ("B", 0)]));
        assert_eq!(seats(&d), pairs(&[("A", 6), ("B", 13)]));
        assert_eq!(d.total_seats, 19);
        assert!(d.parties.iter().all(|p| p.overhang == 0));
        assert!(d
            .protocol
            .iter()
            .any(|p| matches!(p, Decision::Overhang { iteration: 1, total: 13, .. })));
    }

    #[test]
    fn overhang_tolerance() {
        init();
        let election = overhang_election();
        let mut settings = Settings::new(10);
        settings.overhang_tolerance = 3;
        let d = run(&election, &settings).unwrap();
        // 13 seats cover all but the tolerated overhang.
        assert_eq!(seats(&d), pairs(&[("A", 6), ("B", 7)]));
        assert_eq!(d.total_seats, 13);
        assert_eq!(d.parties[0].overhang, 3);
    }

    #[test]
    fn seat_cap() {
        init();
        let election = overhang_election();
        let mut settings = Settings::new(10);
        settings.seat_cap = Some(15);
        let d = run(&election, &settings).unwrap();
        assert!(d
            .protocol
            .iter()
            .any(|p| matches!(p, Decision::SeatCapReached { cap: 15, total: 12 })));
        // The cap leaves room for the remaining overhang.
        assert_eq!(d.total_seats, 14);
        assert_eq!(seats(&d), pairs(&[("A", 6), ("B", 8)]));
        assert_eq!(d.parties[0].overhang, 2);
    }

    #[test]
    fn balancing_is_idempotent() {
        let election = overhang_election();
        let settings = Settings::new(10);
        let national = VoteTable::from_counts(&[("A", 610), ("B", 1390)]);
        let minimum = pairs(&[("A", 6), ("B", 0)]);
        let mut resolver = RandomResolver;
        let mut lottery = Lottery::new(&mut resolver, 0);
        let mut protocol = Vec::new();
        let first = balance(&national, &minimum, 10, &settings, &mut lottery, &mut protocol).unwrap();
        assert!(first.iterations > 0);
        let again = balance(
            &national,
            &minimum,
            first.total,
            &settings,
            &mut lottery,
            &mut protocol,
        )
        .unwrap();
        assert_eq!(again.iterations, 0);
        assert_eq!(again.total, first.total);
        assert_eq!(again.upper, first.upper);
        assert_eq!(run(&election, &settings).unwrap().total_seats, first.total);
    }

    #[test]
    fn average_minimum_seats() {
        let election = overhang_election();
        let mut settings = Settings::new(10);
        settings.minimum_seats = MinimumSeatPolicy::Average(MeanRounding::Down);
        let d = run(&election, &settings).unwrap();
        assert_eq!(d.minimum_seats, pairs(&[("A", 6), ("B", 3)]));
        settings.minimum_seats = MinimumSeatPolicy::Average(MeanRounding::Up);
        let d = run(&election, &settings).unwrap();
        assert_eq!(d.minimum_seats, pairs(&[("A", 6), ("B", 4)]));
        settings.minimum_seats = MinimumSeatPolicy::Pure;
        let d = run(&election, &settings).unwrap();
        assert_eq!(d.minimum_seats, pairs(&[("A", 6), ("B", 7)]));
        assert_eq!(d.total_seats, 19);
    }

    #[test]
    fn minimum_seat_policies() {
        assert_eq!(minimum_seats(MinimumSeatPolicy::DirectMandates, 2, 5), 2);
        assert_eq!(minimum_seats(MinimumSeatPolicy::Pure, 2, 5), 5);
        assert_eq!(minimum_seats(MinimumSeatPolicy::Pure, 6, 5), 6);
        assert_eq!(
            minimum_seats(MinimumSeatPolicy::Average(MeanRounding::Down), 2, 5),
            3
        );
        assert_eq!(
            minimum_seats(MinimumSeatPolicy::Average(MeanRounding::Up), 2, 5),
            4
        );
        assert_eq!(
            minimum_seats(MinimumSeatPolicy::Average(MeanRounding::Up), 6, 1),
            6
        );
        assert_eq!(
            "Mittelwerte".parse::<MinimumSeatPolicy>(),
            Err(ApportionmentError::UnknownMinimumSeatPolicy {
                name: "Mittelwerte".to_string()
            })
        );
    }

    #[test]
    fn majority_clause() {
        init();
        // 51 % of the votes, but the rounding gives A exactly half of the seats.
        let election = single_state(&[("A", 510), ("B", 490)]);
        let d = run(&election, &Settings::new(4)).unwrap();
        assert!(d
            .protocol
            .contains(&Decision::MajorityWinner { party: "A".to_string() }));
        assert_eq!(seats(&d), pairs(&[("A", 3), ("B", 2)]));
        assert_eq!(d.total_seats, 5);
        assert!(d.seats_of("A").unwrap() * 2 > d.total_seats);
    }

    #[test]
    fn scripted_lotteries() {
        init();
        let election = single_state(&[("A", 100), ("B", 100)]);
        // One lottery in the list apportionment of the state, one nationally.
        let mut resolver = ScriptedResolver::new(&[
            LotterySelection::Candidate(1),
            LotterySelection::Candidate(2),
        ]);
        let d = {
            let resolver: &mut dyn LotteryResolver = &mut resolver;
            let mut lottery = Lottery::new(resolver, 0);
            distribute_seats(&election, &Settings::new(3), &mut lottery).unwrap()
        };
        assert_eq!(seats(&d), pairs(&[("A", 1), ("B", 2)]));
        assert!(d.protocol.iter().any(|p| matches!(
            p,
            Decision::Lottery { stage: Stage::UpperApportionment, drawn, .. } if drawn == &vec!["B".to_string()]
        )));
    }

    #[test]
    fn exhausted_lottery_aborts() {
        let election = single_state(&[("A", 100), ("B", 100)]);
        let mut resolver = ScriptedResolver::new(&[]);
        let mut lottery = Lottery::new(&mut resolver, 0);
        assert!(matches!(
            distribute_seats(&election, &Settings::new(3), &mut lottery),
            Err(ApportionmentError::LotteryAborted { .. })
        ));
    }
}
