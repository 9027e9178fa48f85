use crate::cli::{
    actions::{
        Action,
        server::{Args, Backend},
    },
    commands::{self, auth},
};
use anyhow::{Context, Result, anyhow};
use secrecy::SecretString;
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    commands::validate(matches).map_err(|e| anyhow!(e))?;

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let site_url = matches
        .get_one::<String>("site-url")
        .context("missing required argument: --site-url")?;
    let site_url = Url::parse(site_url).context("invalid SAVVY_SITE_URL")?;

    let signup_ttl_seconds = matches
        .get_one::<u64>("signup-ttl-seconds")
        .copied()
        .unwrap_or(3600);

    let backend = match matches
        .get_one::<String>(auth::ARG_AUTH_BACKEND)
        .map(String::as_str)
    {
        Some(auth::BACKEND_MEMORY) => Backend::Memory,
        _ => {
            let url = matches
                .get_one::<String>(auth::ARG_SUPABASE_URL)
                .context("missing required argument: --supabase-url")?;
            let anon_key = matches
                .get_one::<String>(auth::ARG_SUPABASE_ANON_KEY)
                .cloned()
                .context("missing required argument: --supabase-anon-key")?;
            Backend::Supabase {
                url: Url::parse(url).context("invalid SAVVY_SUPABASE_URL")?,
                anon_key: SecretString::from(anon_key),
                timeout_seconds: matches
                    .get_one::<u64>(auth::ARG_AUTH_TIMEOUT)
                    .copied()
                    .unwrap_or(10),
            }
        }
    };

    Ok(Action::Server(Args {
        port,
        site_url,
        signup_ttl_seconds,
        backend,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn matches(args: &[&str]) -> clap::ArgMatches {
        let mut argv = vec!["savvy"];
        argv.extend_from_slice(args);
        commands::new().get_matches_from(argv)
    }

    fn isolated<R>(test: impl FnOnce() -> R) -> R {
        temp_env::with_vars(
            [
                ("SAVVY_AUTH_BACKEND", None::<&str>),
                ("SAVVY_SUPABASE_URL", None),
                ("SAVVY_SUPABASE_ANON_KEY", None),
                ("SAVVY_SITE_URL", None),
            ],
            test,
        )
    }

    #[test]
    fn supabase_action() -> Result<()> {
        let action = isolated(|| {
            handler(&matches(&[
                "--supabase-url",
                "https://project.supabase.co",
                "--supabase-anon-key",
                "anon-key",
                "--port",
                "9000",
            ]))
        })?;

        let Action::Server(args) = action;
        assert_eq!(args.port, 9000);
        match args.backend {
            Backend::Supabase {
                url,
                anon_key,
                timeout_seconds,
            } => {
                assert_eq!(url.as_str(), "https://project.supabase.co/");
                assert_eq!(anon_key.expose_secret(), "anon-key");
                assert_eq!(timeout_seconds, 10);
            }
            Backend::Memory => panic!("expected supabase backend"),
        }
        Ok(())
    }

    #[test]
    fn memory_action() -> Result<()> {
        let action = isolated(|| {
            handler(&matches(&[
                "--auth-backend",
                "memory",
                "--site-url",
                "https://savvy.example",
            ]))
        })?;

        let Action::Server(args) = action;
        assert!(matches!(args.backend, Backend::Memory));
        assert_eq!(args.site_url.as_str(), "https://savvy.example/");
        Ok(())
    }

    #[test]
    fn missing_credentials_fail() {
        let result = isolated(|| handler(&matches(&[])));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_site_url_fails() {
        let result = isolated(|| {
            handler(&matches(&["--auth-backend", "memory", "--site-url", "not a url"]))
        });
        assert!(
            result
                .err()
                .is_some_and(|err| err.to_string().contains("SAVVY_SITE_URL"))
        );
    }
}
