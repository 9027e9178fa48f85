use clap::{Arg, Command, builder::PossibleValuesParser};

pub const ARG_AUTH_BACKEND: &str = "auth-backend";
pub const ARG_SUPABASE_URL: &str = "supabase-url";
pub const ARG_SUPABASE_ANON_KEY: &str = "supabase-anon-key";
pub const ARG_AUTH_TIMEOUT: &str = "auth-timeout-seconds";

pub const BACKEND_SUPABASE: &str = "supabase";
pub const BACKEND_MEMORY: &str = "memory";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_BACKEND)
                .long(ARG_AUTH_BACKEND)
                .help("Authentication backend")
                .long_help(
                    "Authentication backend. `memory` keeps accounts in process and logs confirmation links instead of sending email.",
                )
                .env("SAVVY_AUTH_BACKEND")
                .default_value(BACKEND_SUPABASE)
                .value_parser(PossibleValuesParser::new([BACKEND_SUPABASE, BACKEND_MEMORY])),
        )
        .arg(
            Arg::new(ARG_SUPABASE_URL)
                .long(ARG_SUPABASE_URL)
                .help("Supabase project URL, example: https://<ref>.supabase.co")
                .env("SAVVY_SUPABASE_URL"),
        )
        .arg(
            Arg::new(ARG_SUPABASE_ANON_KEY)
                .long(ARG_SUPABASE_ANON_KEY)
                .help("Supabase anon (public) API key")
                .env("SAVVY_SUPABASE_ANON_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_AUTH_TIMEOUT)
                .long(ARG_AUTH_TIMEOUT)
                .help("Timeout for requests to the auth service")
                .env("SAVVY_AUTH_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
