pub mod auth;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

/// The `supabase` backend cannot start without its project URL and key.
///
/// # Errors
/// Returns an error string naming the first missing argument.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    let backend = matches
        .get_one::<String>(auth::ARG_AUTH_BACKEND)
        .map_or(auth::BACKEND_SUPABASE, String::as_str);

    if backend == auth::BACKEND_SUPABASE {
        if !matches.contains_id(auth::ARG_SUPABASE_URL) {
            return Err(
                "Missing required argument: --supabase-url (required for the supabase backend)"
                    .to_string(),
            );
        }
        if !matches.contains_id(auth::ARG_SUPABASE_ANON_KEY) {
            return Err(
                "Missing required argument: --supabase-anon-key (required for the supabase backend)"
                    .to_string(),
            );
        }
    }
    Ok(())
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

    let command = Command::new("savvy")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("SAVVY_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("site-url")
                .long("site-url")
                .help("Public URL of the site, used for confirmation links")
                .long_help(
                    "Public URL of the site. Confirmation emails redirect to <site-url>/auth/confirm, and an https URL marks cookies Secure.",
                )
                .env("SAVVY_SITE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new("signup-ttl-seconds")
                .long("signup-ttl-seconds")
                .help("Seconds an idle signup wizard is kept")
                .env("SAVVY_SIGNUP_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        );

    let command = auth::with_args(command);
    logging::with_args(command)
}
