mod args;
mod election;

use clap::Parser;
use log::{debug, LevelFilter};

use crate::election::{report_error, run_election, LotteryMode, RunOptions, SeatResult};

fn run(args: &args::Args) -> SeatResult<()> {
    let options = RunOptions {
        reference: args.reference.clone(),
        out: args.out.clone(),
        method: args.method.clone(),
        seed: args.seed,
        lottery: LotteryMode::parse(args.lottery.as_str(), args.draws.clone())?,
    };
    debug!("options: {:?}", options);
    run_election(args.input.as_str(), &options)
}

fn main() {
    let args = args::Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        report_error(&e);
        std::process::exit(1);
    }
}
