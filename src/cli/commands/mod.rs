pub mod gateway;

use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_ORIGIN_URL: &str = "origin-url";
pub const ARG_VERBOSITY: &str = "verbosity";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts `0..=5` or a level name; `-v` occurrences are counted instead.
fn log_level_parser() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        level
            .parse::<u8>()
            .ok()
            .filter(|count| *count <= 5)
            .or_else(|| {
                LOG_LEVELS
                    .iter()
                    .position(|name| name.eq_ignore_ascii_case(level))
                    .and_then(|index| u8::try_from(index).ok())
            })
            .ok_or_else(|| {
                format!(
                    "invalid log level {level}, expected 0-5 or one of: {}",
                    LOG_LEVELS.join(", ")
                )
            })
    })
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("fxguard")
        .about("Edge access-control gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("FXGUARD_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_ORIGIN_URL)
                .short('o')
                .long(ARG_ORIGIN_URL)
                .help("Origin server every request is relayed to, example: http://127.0.0.1:3000")
                .env("FXGUARD_ORIGIN_URL")
                .required(true),
        );

    gateway::with_args(command).arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Gateway log verbosity, repeat for more (RUST_LOG takes precedence)")
            .env("FXGUARD_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(log_level_parser()),
    )
}
