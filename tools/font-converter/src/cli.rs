//! Command line parsing and [`ConvertConfig`] construction.

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use log::LevelFilter;

/// Description of a single conversion and how much of it should be logged.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ConvertConfig {
    /// The BDF font to convert.
    pub input: PathBuf,
    /// The path to which the glyph table should be written.
    pub output: PathBuf,
    /// The most verbose [`LevelFilter`] that should be logged.
    pub log_level: LevelFilter,
}

/// Parses `font-converter`'s arguments to construct a [`ConvertConfig`].
pub fn get_config() -> ConvertConfig {
    parse_arguments(&command_parser().get_matches())
}

/// Parses the arguments required to produce a valid [`ConvertConfig`].
pub fn parse_arguments(matches: &ArgMatches) -> ConvertConfig {
    let input = matches
        .get_one::<PathBuf>("input")
        .cloned()
        .unwrap_or_else(|| unreachable!("`input` is a required argument"));

    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| unreachable!("`output` is a required argument"));

    let log_level = match matches.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    ConvertConfig {
        input,
        output,
        log_level,
    }
}

/// Returns the command parser for `font-converter`.
pub fn command_parser() -> Command {
    let input = Arg::new("input")
        .help("BDF font to convert")
        .value_parser(value_parser!(PathBuf))
        .required(true);

    let output = Arg::new("output")
        .help("Path of the glyph table to create or replace")
        .value_parser(value_parser!(PathBuf))
        .required(true);

    let verbose = Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help("Log more details, repeat to dump every glyph")
        .action(ArgAction::Count);

    Command::new("font-converter")
        .about("Converts a BDF font into a fixed-width glyph table for printable ASCII")
        .arg(input)
        .arg(output)
        .arg(verbose)
}
