//! Drawing lots for the seats that the apportionment methods cannot assign.
//!
//! A [`Lottery`] receives the entities tied at the decision boundary and asks a
//! [`LotteryResolver`] which of them get the remaining seats. The resolver is
//! either a person at a terminal ([`InteractiveResolver`]), a seeded random draw
//! ([`RandomResolver`]) or a fixed list of answers ([`ScriptedResolver`]).

use log::{debug, info, warn};
use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::config::*;

/// One answer of a resolver.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum LotterySelection {
    /// Draw all the remaining seats at random.
    Random,
    /// The candidate at this position of the displayed list (starting at 1).
    Candidate(usize),
}

pub trait LotteryResolver {
    /// Chooses among `candidates`, which still compete for `seats_left` seats.
    fn propose(
        &mut self,
        candidates: &[String],
        seats_left: usize,
    ) -> Result<LotterySelection, ApportionmentError>;

    /// Called when the last proposal was not a valid option.
    fn reject(&mut self, _selection: &LotterySelection) {}
}

/// Asks the user on a terminal (or any reader/writer pair).
pub struct InteractiveResolver<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveResolver<R, W> {
    pub fn new(input: R, output: W) -> InteractiveResolver<R, W> {
        InteractiveResolver { input, output }
    }

    fn io_error(err: std::io::Error) -> ApportionmentError {
        ApportionmentError::LotteryAborted {
            reason: err.to_string(),
        }
    }
}

impl<R: BufRead, W: Write> LotteryResolver for InteractiveResolver<R, W> {
    fn propose(
        &mut self,
        candidates: &[String],
        seats_left: usize,
    ) -> Result<LotterySelection, ApportionmentError> {
        loop {
            writeln!(self.output, "Lose für {} Sitz(e) zwischen:", seats_left)
                .map_err(Self::io_error)?;
            writeln!(self.output, "  0: Zufall").map_err(Self::io_error)?;
            for (idx, name) in candidates.iter().enumerate() {
                writeln!(self.output, "  {}: {}", idx + 1, name).map_err(Self::io_error)?;
            }
            self.output.flush().map_err(Self::io_error)?;

            let mut line = String::new();
            let read = self.input.read_line(&mut line).map_err(Self::io_error)?;
            if read == 0 {
                return Err(ApportionmentError::LotteryAborted {
                    reason: "no more input".to_string(),
                });
            }
            match line.trim().parse::<usize>() {
                Ok(0) => return Ok(LotterySelection::Random),
                Ok(n) => return Ok(LotterySelection::Candidate(n)),
                Err(_) => {
                    writeln!(self.output, "Wähle eine Zahl").map_err(Self::io_error)?;
                }
            }
        }
    }

    fn reject(&mut self, selection: &LotterySelection) {
        if let LotterySelection::Candidate(n) = selection {
            // Nothing to do if the terminal is gone, the next prompt will fail.
            let _ = writeln!(self.output, "{} ist keine wählbare Option", n);
        }
    }
}

/// Always draws at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomResolver;

impl LotteryResolver for RandomResolver {
    fn propose(
        &mut self,
        _candidates: &[String],
        _seats_left: usize,
    ) -> Result<LotterySelection, ApportionmentError> {
        Ok(LotterySelection::Random)
    }
}

/// Replays a fixed list of answers.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResolver {
    answers: VecDeque<LotterySelection>,
    rejected: Vec<LotterySelection>,
}

impl ScriptedResolver {
    pub fn new(answers: &[LotterySelection]) -> ScriptedResolver {
        ScriptedResolver {
            answers: answers.iter().cloned().collect(),
            rejected: Vec::new(),
        }
    }

    /// The answers that were not valid options when they were given.
    pub fn rejected(&self) -> &[LotterySelection] {
        &self.rejected
    }
}

impl LotteryResolver for ScriptedResolver {
    fn propose(
        &mut self,
        candidates: &[String],
        _seats_left: usize,
    ) -> Result<LotterySelection, ApportionmentError> {
        self.answers
            .pop_front()
            .ok_or_else(|| ApportionmentError::LotteryAborted {
                reason: format!("no scripted answer left for {:?}", candidates),
            })
    }

    fn reject(&mut self, selection: &LotterySelection) {
        self.rejected.push(*selection);
    }
}

/// Orders the candidates by the hash of the seed, the lottery counter and their name.
fn draw_random(candidates: &[String], seed: u32, round: u32) -> Vec<String> {
    let mut keyed: Vec<(String, String)> = candidates
        .iter()
        .map(|name| {
            let key = sha256::digest(format!("{:08}{:08}{}", seed, round, name));
            (key, name.clone())
        })
        .collect();
    keyed.sort();
    keyed.into_iter().map(|(_, name)| name).collect()
}

/// Resolves the lotteries of one run.
pub struct Lottery<'a> {
    resolver: &'a mut dyn LotteryResolver,
    seed: u32,
    round: u32,
}

impl<'a> Lottery<'a> {
    pub fn new(resolver: &'a mut dyn LotteryResolver, seed: u32) -> Lottery<'a> {
        Lottery {
            resolver,
            seed,
            round: 0,
        }
    }

    /// Assigns the seats missing from `table` to `target` among `candidates`,
    /// one seat per drawn candidate.
    ///
    /// Returns the completed table and the drawn candidates in drawing order.
    pub fn resolve(
        &mut self,
        table: &SeatTable,
        candidates: &[String],
        target: u64,
    ) -> Result<(SeatTable, Vec<String>), ApportionmentError> {
        let assigned = table.total_seats();
        let deficit = target.saturating_sub(assigned) as usize;
        if deficit == 0 {
            return Ok((table.clone(), Vec::new()));
        }
        if deficit > candidates.len() {
            return Err(ApportionmentError::Inconsistent {
                reason: format!(
                    "{} seats to draw among {} candidates",
                    deficit,
                    candidates.len()
                ),
            });
        }
        self.round += 1;

        let mut remaining: Vec<String> = candidates.to_vec();
        let mut drawn: Vec<String> = Vec::new();
        while drawn.len() < deficit {
            let seats_left = deficit - drawn.len();
            let selection = self.resolver.propose(&remaining, seats_left)?;
            match selection {
                LotterySelection::Random => {
                    let order = draw_random(&remaining, self.seed, self.round);
                    debug!("Lottery::resolve: random order {:?}", order);
                    drawn.extend(order.into_iter().take(seats_left));
                }
                LotterySelection::Candidate(n) if n >= 1 && n <= remaining.len() => {
                    drawn.push(remaining.remove(n - 1));
                }
                LotterySelection::Candidate(n) => {
                    warn!("Lottery::resolve: {} is not a valid option", n);
                    self.resolver.reject(&selection);
                }
            }
        }

        let mut res = table.clone();
        for name in drawn.iter() {
            if !res.add_seats(name, 1) {
                return Err(ApportionmentError::Inconsistent {
                    reason: format!("lottery winner {} is not in the table", name),
                });
            }
        }
        info!(
            "Lottery::resolve: seats drawn for {:?} among {:?}",
            drawn, candidates
        );
        Ok((res, drawn))
    }
}
