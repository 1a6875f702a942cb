use clap::{builder::BoolishValueParser, Arg, Command};

pub const ARG_LOGIN_URL: &str = "login-url";
pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_OMIT_RESTRICTED: &str = "omit-restricted";
pub const ARG_RELOAD_ON_AUTH: &str = "reload-on-auth";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_LOGIN_URL)
                .long(ARG_LOGIN_URL)
                .help("Login page anonymous visitors are sent to, absolute or relative to the request")
                .env("FXGUARD_LOGIN_URL"),
        )
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Shared secret used to verify fx.customer.jwt (HS256)")
                .env("FXGUARD_JWT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_OMIT_RESTRICTED)
                .long(ARG_OMIT_RESTRICTED)
                .help("Remove [data-restricted] elements for anonymous visitors")
                .env("FXGUARD_OMIT_RESTRICTED")
                .default_value("true")
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_RELOAD_ON_AUTH)
                .long(ARG_RELOAD_ON_AUTH)
                .help("Reload the page when the customer portal signs in or out")
                .env("FXGUARD_RELOAD_ON_AUTH")
                .default_value("false")
                .value_parser(BoolishValueParser::new()),
        )
}
