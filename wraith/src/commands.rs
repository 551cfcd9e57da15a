use crate::CLAP_STYLING;
use clap::{arg, command};
use wraith_core::DEFAULT_USER_AGENT;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("wraith")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wraith")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("check")
                .about(
                    "Classify a list of URLs as genuinely live or soft-404 and write the \
                live ones out.",
                )
                .arg(
                    arg!(-i --"input-file" <PATH>)
                        .required(true)
                        .help("Newline-delimited file of candidate URLs"),
                )
                .arg(
                    arg!(-o --"output-file" <PATH>)
                        .required(true)
                        .help("Where to write the newline-delimited live URLs"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' for the HTTP phase.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(-p --"processes" <NUM_BROWSERS>)
                        .required(false)
                        .help("Browser workers for the JS phase (default: CPU count)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-u --"user-agent" <STRING>)
                        .required(false)
                        .help("User-Agent header sent on every request")
                        .default_value(DEFAULT_USER_AGENT),
                )
                .arg(
                    arg!(--"max-depth" <SEGMENTS>)
                        .required(false)
                        .help("Drop URLs nested deeper than this many path segments")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    arg!(--"max-repeats" <COUNT>)
                        .required(false)
                        .help("Drop URLs repeating one path segment more than this many times in a row")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("2"),
                )
                .arg(
                    arg!(--"max-urls" <COUNT>)
                        .required(false)
                        .help("Classify at most this many URLs after reduction and sitemap filtering")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"js-ceiling-secs" <SECONDS>)
                        .required(false)
                        .help("Wall-clock ceiling on the JS rendering phase")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("36000"),
                )
                .arg(
                    arg!(--"json" "Print the run summary as JSON instead of text")
                        .required(false)
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-v --"verbose" ... "Be verbose (-v for info, -vv for debug)")
                        .required(false),
                ),
        )
}
