use clap::Parser;

/// Computes the seat distribution of a parliament elected with first and second votes.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (directory) The election directory, with the files Zweitstimmen.json, Erststimmen.json,
    /// Länder.json and Einstellungen.json.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (file path) A reference summary in JSON format. If provided, sitzrechner will
    /// check that the computed results match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) Where the JSON summary of the distribution is written.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (divisor, rangzahl or debug) The apportionment method. Overrides the Verfahren setting.
    #[clap(short, long, value_parser)]
    pub method: Option<String>,

    /// (default 0) The seed of the random draws.
    #[clap(long, value_parser, default_value_t = 0)]
    pub seed: u32,

    /// (interactive or random, default interactive) How lotteries are decided.
    #[clap(long, value_parser, default_value = "interactive")]
    pub lottery: String,

    /// (list of comma-separated numbers) The answers to the lottery prompts, given in
    /// advance. 0 draws at random.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub draws: Option<Vec<usize>>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
