// Reading an election directory made of JSON files.

use log::debug;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::fs;
use std::path::Path;

use sitzverteilung::builder::Builder;
use sitzverteilung::decimal::parse_number;
use sitzverteilung::Election;

use crate::election::*;

pub const SECOND_VOTES_FILE: &str = "Zweitstimmen.json";
pub const FIRST_VOTES_FILE: &str = "Erststimmen.json";
pub const STATES_FILE: &str = "Länder.json";
pub const SETTINGS_FILE: &str = "Einstellungen.json";

pub fn read_json(path: &Path) -> SeatResult<JSValue> {
    let path_s = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path_s.clone(),
    })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: path_s })
}

fn as_object<'a>(js: &'a JSValue, path: &str, what: &str) -> SeatResult<&'a JSMap<String, JSValue>> {
    js.as_object().context(MalformedInputSnafu {
        path,
        reason: format!("{} should be an object", what),
    })
}

fn read_count(js: &JSValue, path: &str, what: &str) -> SeatResult<u64> {
    js.as_u64().context(MalformedInputSnafu {
        path,
        reason: format!("{} should be a non-negative integer, found {}", what, js),
    })
}

/// state -> weight, in file order.
pub fn read_states(js: &JSValue, path: &str, builder: Builder) -> SeatResult<Builder> {
    let mut builder = builder;
    for (state, weight) in as_object(js, path, "the states")?.iter() {
        let weight = match weight {
            JSValue::Number(n) => parse_number(&n.to_string()).context(ApportionmentSnafu {})?,
            x => {
                return MalformedInputSnafu {
                    path,
                    reason: format!("the weight of {} should be a number, found {}", state, x),
                }
                .fail()
            }
        };
        builder = builder.state(state, weight).context(ApportionmentSnafu {})?;
    }
    Ok(builder)
}

/// party -> (state -> votes)
pub fn read_second_votes(js: &JSValue, path: &str, builder: &mut Builder) -> SeatResult<()> {
    for (party, per_state) in as_object(js, path, "the second votes")?.iter() {
        for (state, votes) in as_object(per_state, path, party)?.iter() {
            let votes = read_count(votes, path, &format!("{} in {}", party, state))?;
            builder
                .add_second_votes(party, state, votes)
                .context(ApportionmentSnafu {})?;
        }
    }
    Ok(())
}

/// state -> (constituency -> (party -> votes))
pub fn read_first_votes(js: &JSValue, path: &str, builder: &mut Builder) -> SeatResult<()> {
    for (state, constituencies) in as_object(js, path, "the first votes")?.iter() {
        for (name, results) in as_object(constituencies, path, state)?.iter() {
            let mut parsed: Vec<(String, u64)> = Vec::new();
            for (party, votes) in as_object(results, path, name)?.iter() {
                let votes = read_count(votes, path, &format!("{} in {}", party, name))?;
                parsed.push((party.clone(), votes));
            }
            builder
                .add_constituency(state, name, &parsed)
                .context(ApportionmentSnafu {})?;
        }
    }
    Ok(())
}

/// Reads the vote files of an election directory.
pub fn read_election(dir: &Path) -> SeatResult<Election> {
    let states_p = dir.join(STATES_FILE);
    let second_p = dir.join(SECOND_VOTES_FILE);
    let first_p = dir.join(FIRST_VOTES_FILE);

    let mut builder = read_states(
        &read_json(&states_p)?,
        &states_p.display().to_string(),
        Builder::new(),
    )?;
    read_second_votes(
        &read_json(&second_p)?,
        &second_p.display().to_string(),
        &mut builder,
    )?;
    read_first_votes(
        &read_json(&first_p)?,
        &first_p.display().to_string(),
        &mut builder,
    )?;
    let election = builder.build().context(ApportionmentSnafu {})?;
    debug!(
        "read_election: {} states, {} parties, {} constituencies",
        election.states().len(),
        election.parties().len(),
        election.constituencies().len()
    );
    Ok(election)
}
