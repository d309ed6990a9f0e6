use log::{debug, info, warn};

use sitzverteilung::lottery::*;
use sitzverteilung::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::election::config_reader::*;
use crate::election::io_json::*;

mod io_json;

#[derive(Debug, Snafu)]
pub enum SeatError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Malformed input in {path}: {reason}"))]
    MalformedInput { path: String, reason: String },
    #[snafu(display("Invalid settings: {reason}"))]
    InvalidSettings { reason: String },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary { source: std::io::Error, path: String },
    #[snafu(display("{source}"))]
    Apportionment { source: ApportionmentError },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},
}

pub type SeatResult<T> = Result<T, SeatError>;

pub mod config_reader {
    use crate::election::*;

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ThresholdConfig {
        #[serde(rename = "Prozent", skip_serializing_if = "Option::is_none")]
        pub percent: Option<JSValue>,
        #[serde(rename = "Direkt", skip_serializing_if = "Option::is_none")]
        pub direct_mandates: Option<u64>,
        #[serde(rename = "Ausnahmen", default, skip_serializing_if = "Vec::is_empty")]
        pub exemptions: Vec<String>,
    }

    /// The contents of `Einstellungen.json`.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ElectionConfig {
        #[serde(rename = "Sitze")]
        pub seats: u64,
        #[serde(rename = "Hürde", skip_serializing_if = "Option::is_none")]
        pub threshold: Option<ThresholdConfig>,
        #[serde(rename = "Mindestsitze", skip_serializing_if = "Option::is_none")]
        pub minimum_seats: Option<String>,
        #[serde(rename = "Mittelwertrundung", skip_serializing_if = "Option::is_none")]
        pub mean_rounding: Option<String>,
        #[serde(rename = "Überhang", skip_serializing_if = "Option::is_none")]
        pub overhang: Option<JSValue>,
        #[serde(rename = "Obergrenze", skip_serializing_if = "Option::is_none")]
        pub seat_cap: Option<JSValue>,
        #[serde(rename = "Verfahren", skip_serializing_if = "Option::is_none")]
        pub method: Option<String>,
    }

    pub fn read_config(path: &Path) -> SeatResult<ElectionConfig> {
        let path_s = path.display().to_string();
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
            path: path_s.clone(),
        })?;
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: path_s })
    }

    pub fn read_summary(path: &str) -> SeatResult<JSValue> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
        debug!("read content: {:?}", contents);
        let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
        Ok(js)
    }
}

/// How the lotteries are resolved when running from the command line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum LotteryMode {
    Interactive,
    Random,
    Scripted(Vec<usize>),
}

impl LotteryMode {
    pub fn parse(name: &str, draws: Option<Vec<usize>>) -> SeatResult<LotteryMode> {
        match (name, draws) {
            (_, Some(draws)) => Ok(LotteryMode::Scripted(draws)),
            ("interactive", None) => Ok(LotteryMode::Interactive),
            ("random", None) => Ok(LotteryMode::Random),
            (x, None) => InvalidSettingsSnafu {
                reason: format!(
                    "unknown lottery mode {:?}, choose from [\"interactive\", \"random\"]",
                    x
                ),
            }
            .fail(),
        }
    }

    fn resolver(&self) -> Box<dyn LotteryResolver> {
        match self {
            LotteryMode::Interactive => {
                // The summary may go to stdout.
                Box::new(InteractiveResolver::new(io::stdin().lock(), io::stderr()))
            }
            LotteryMode::Random => Box::new(RandomResolver),
            LotteryMode::Scripted(draws) => {
                let answers: Vec<LotterySelection> = draws
                    .iter()
                    .map(|n| match n {
                        0 => LotterySelection::Random,
                        n => LotterySelection::Candidate(*n),
                    })
                    .collect();
                Box::new(ScriptedResolver::new(&answers))
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunOptions {
    /// Reference summary to compare the results with.
    pub reference: Option<String>,
    /// Where to write the summary. `None` or "stdout" prints it.
    pub out: Option<String>,
    /// Overrides `Verfahren`.
    pub method: Option<String>,
    pub seed: u32,
    pub lottery: LotteryMode,
}

fn invalid<T>(reason: String) -> SeatResult<T> {
    InvalidSettingsSnafu { reason }.fail()
}

fn count_setting(name: &str, value: Option<&JSValue>) -> SeatResult<Option<u64>> {
    match value {
        None => Ok(None),
        Some(js) => match js.as_u64() {
            Some(n) => Ok(Some(n)),
            None => invalid(format!("{} must be a non-negative integer, found {}", name, js)),
        },
    }
}

fn validate_settings(config: &ElectionConfig, method: Option<&str>) -> SeatResult<Settings> {
    if config.seats == 0 {
        return invalid("Sitze must be a positive number of seats".to_string());
    }
    let mut settings = Settings::new(config.seats);

    if let Some(t) = config.threshold.as_ref() {
        let percent = match t.percent.as_ref() {
            None => None,
            Some(JSValue::Number(n)) => {
                let p = sitzverteilung::decimal::parse_number(&n.to_string())
                    .context(ApportionmentSnafu {})?;
                if p < Decimal::ZERO || p > Decimal::from(100) {
                    return invalid(format!("Prozent must be between 0 and 100, found {}", p));
                }
                Some(p)
            }
            Some(x) => return invalid(format!("Prozent must be a number, found {}", x)),
        };
        settings.threshold = Threshold {
            percent,
            direct_mandates: t.direct_mandates,
            exemptions: t.exemptions.clone(),
        };
    }

    if let Some(name) = config.minimum_seats.as_ref() {
        settings.minimum_seats = name
            .parse::<MinimumSeatPolicy>()
            .context(ApportionmentSnafu {})?;
    }
    if let Some(name) = config.mean_rounding.as_ref() {
        let rounding = name.parse::<MeanRounding>().context(ApportionmentSnafu {})?;
        match settings.minimum_seats {
            MinimumSeatPolicy::Average(_) => {
                settings.minimum_seats = MinimumSeatPolicy::Average(rounding)
            }
            _ => warn!(
                "validate_settings: Mittelwertrundung {} is ignored without Mittelwert",
                name
            ),
        }
    }

    settings.overhang_tolerance =
        count_setting("Überhang", config.overhang.as_ref())?.unwrap_or(0);
    settings.seat_cap = match count_setting("Obergrenze", config.seat_cap.as_ref())? {
        Some(0) => return invalid("Obergrenze must be positive".to_string()),
        x => x,
    };
    if let Some(name) = method.or(config.method.as_deref()) {
        settings.method = name.parse::<Method>().context(ApportionmentSnafu {})?;
    }
    Ok(settings)
}

fn method_name(method: Method) -> &'static str {
    match method {
        Method::Divisor => "divisor",
        Method::RankNumber => "rangzahl",
        Method::CrossCheck => "debug",
    }
}

fn stage_name(stage: Stage) -> &'static str {
    match stage {
        Stage::StateApportionment => "states",
        Stage::ListSubApportionment => "lists",
        Stage::UpperApportionment => "national",
    }
}

fn counts_to_json(counts: &[(String, u64)]) -> JSMap<String, JSValue> {
    counts
        .iter()
        .map(|(name, n)| (name.clone(), json!(n)))
        .collect()
}

fn decision_to_json(decision: &Decision) -> JSValue {
    match decision {
        Decision::MajorityWinner { party } => json!({"event": "majorityWinner", "party": party}),
        Decision::Independent { party, seats } => {
            json!({"event": "independent", "party": party, "seats": seats})
        }
        Decision::Divisor {
            stage,
            scope,
            seats,
            divisor,
        } => json!({
            "event": "divisor",
            "stage": stage_name(*stage),
            "scope": scope,
            "seats": seats,
            "divisor": divisor.map(|d| d.to_string()),
        }),
        Decision::Lottery {
            stage,
            scope,
            candidates,
            drawn,
        } => json!({
            "event": "lottery",
            "stage": stage_name(*stage),
            "scope": scope,
            "candidates": candidates,
            "drawn": drawn,
        }),
        Decision::Overhang {
            iteration,
            total,
            shortfall,
        } => json!({
            "event": "overhang",
            "iteration": iteration,
            "totalSeats": total,
            "shortfall": counts_to_json(shortfall),
        }),
        Decision::SeatCapReached { cap, total } => {
            json!({"event": "seatCap", "cap": cap, "totalSeats": total})
        }
        Decision::MajorityBonus {
            party,
            seats,
            total,
        } => json!({
            "event": "majorityBonus",
            "party": party,
            "seats": seats,
            "totalSeats": total,
        }),
    }
}

fn results_to_json(d: &Distribution) -> JSValue {
    let parties: Vec<JSValue> = d
        .parties
        .iter()
        .map(|p| match p.participation {
            Participation::Proportional { second_votes } => json!({
                "party": p.party,
                "seats": p.seats,
                "overhang": p.overhang,
                "secondVotes": second_votes,
            }),
            Participation::Independent => json!({
                "party": p.party,
                "seats": p.seats,
                "overhang": p.overhang,
                "independent": true,
            }),
        })
        .collect();
    json!({"totalSeats": d.total_seats, "parties": parties})
}

fn build_summary_js(config: &ElectionConfig, settings: &Settings, d: &Distribution) -> JSValue {
    let mut c = config.clone();
    c.method = Some(method_name(settings.method).to_string());
    let states: Vec<JSValue> = d
        .states
        .rows()
        .iter()
        .map(|r| json!({"state": r.name, "weight": r.votes.to_string(), "seats": r.seats}))
        .collect();
    let admission: Vec<JSValue> = d
        .admissions
        .iter()
        .map(|a| {
            json!({
                "party": a.party,
                "secondVotes": a.second_votes,
                "percent": a.percent.to_string(),
                "directMandates": a.direct_mandates,
                "admitted": a.admitted(),
                "byPercent": a.by_percent,
                "byDirectMandates": a.by_direct_mandates,
                "exempt": a.exempt,
            })
        })
        .collect();
    let protocol: Vec<JSValue> = d.protocol.iter().map(decision_to_json).collect();
    json!({
        "config": c,
        "results": results_to_json(d),
        "states": states,
        "admission": admission,
        "minimumSeats": counts_to_json(&d.minimum_seats),
        "protocol": protocol,
    })
}

fn write_summary(js: &JSValue, out: &Option<String>) -> SeatResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(ParsingJsonSnafu { path: "summary" })?;
    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty);
            Ok(())
        }
        Some(path) => fs::write(path, pretty).context(WritingSummarySnafu { path }),
    }
}

fn check_reference(js: &JSValue, reference_path: &str) -> SeatResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_ref = serde_json::to_string_pretty(&summary_ref["results"])
        .context(ParsingJsonSnafu { path: reference_path })?;
    let pretty = serde_json::to_string_pretty(&js["results"])
        .context(ParsingJsonSnafu { path: reference_path })?;
    if pretty_ref != pretty {
        warn!("Found differences with the reference string");
        print_diff(pretty_ref.as_str(), pretty.as_ref(), "\n");
        return ReferenceMismatchSnafu {}.fail();
    }
    info!("check_reference: results match {}", reference_path);
    Ok(())
}

/// Computes the seat distribution of the election in directory `input` and
/// returns the summary.
pub fn compute_summary(input: &str, options: &RunOptions) -> SeatResult<JSValue> {
    let dir = Path::new(input);
    let config_p: PathBuf = dir.join(SETTINGS_FILE);
    let config = read_config(&config_p)?;
    info!("config: {:?}", config);
    let settings = validate_settings(&config, options.method.as_deref())?;
    let election = read_election(dir)?;

    let mut resolver = options.lottery.resolver();
    let mut lottery = Lottery::new(resolver.as_mut(), options.seed);
    let distribution =
        distribute_seats(&election, &settings, &mut lottery).context(ApportionmentSnafu {})?;
    debug!("distribution: {:?}", distribution);
    Ok(build_summary_js(&config, &settings, &distribution))
}

pub fn run_election(input: &str, options: &RunOptions) -> SeatResult<()> {
    let summary = compute_summary(input, options)?;
    write_summary(&summary, &options.out)?;
    if let Some(reference) = options.reference.as_ref() {
        check_reference(&summary, reference)?;
    }
    Ok(())
}

pub fn report_error(e: &SeatError) {
    eprintln!("An error occured: {}", e);
    if let Some(bt) = ErrorCompat::backtrace(e) {
        eprintln!("trace: {}", bt);
    }
}

#[cfg(test)]
fn test_wrapper(test_name: &str) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), test_name);
    info!("Running test {}", test_name);
    let options = RunOptions {
        reference: Some(format!("{}/expected_summary.json", dir)),
        out: Some(format!(
            "{}/sitzrechner_{}.json",
            std::env::temp_dir().display(),
            test_name
        )),
        method: Some("debug".to_string()),
        seed: 0,
        lottery: LotteryMode::Random,
    };
    if let Err(e) = run_election(&dir, &options) {
        report_error(&e);
        panic!("test {} failed: {}", test_name, e);
    }
}
