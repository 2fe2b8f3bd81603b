use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Yoga practice dashboard backend")]
pub struct Cli {
    /// SQLite database URL or file path.
    #[arg(
        long = "db",
        env = "WELLNESS_DB_URL",
        default_value = "sqlite://dev.sqlite3",
        global = true
    )]
    pub db_url: String,

    /// Secret used to sign session tokens; falls back to /run/secrets/JWT_SECRET.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true, global = true)]
    pub jwt_secret: Option<String>,

    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Write a demo user, its practice tree and a synthetic timeline.
    Seed(SeedArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, env = "WELLNESS_HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    #[arg(long, env = "WELLNESS_PORT", default_value_t = 1111, global = true)]
    pub port: u16,
}

#[derive(Debug, Clone, Args)]
pub struct SeedArgs {
    #[arg(long, default_value = "demo@example.com")]
    pub email: String,

    #[arg(long, default_value = "Demo Yogi")]
    pub name: String,

    #[arg(long, default_value = "namaste")]
    pub password: String,

    /// Days of synthetic timeline history ending today.
    #[arg(long, default_value_t = 90)]
    pub days: u32,

    /// Pin the clock (RFC 3339) for reproducible output.
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,

    /// Seed for the timeline generator.
    #[arg(long)]
    pub rng_seed: Option<u64>,

    /// Replace an existing practice tree.
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn seed_flags_parse() {
        let cli = Cli::try_parse_from([
            "app",
            "seed",
            "--force",
            "--days",
            "14",
            "--rng-seed",
            "9",
            "--now",
            "2023-11-14T22:13:20Z",
            "--db",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(cli.db_url, "sqlite::memory:");
        let Some(Command::Seed(seed)) = cli.command else {
            panic!("expected seed");
        };
        assert!(seed.force);
        assert_eq!(seed.days, 14);
        assert_eq!(seed.rng_seed, Some(9));
        assert_eq!(seed.now.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn serve_flags_work_with_or_without_subcommand() {
        let cli = Cli::try_parse_from(["app", "--port", "8080"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.port, 8080);

        let cli = Cli::try_parse_from(["app", "serve", "--host", "127.0.0.1"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Serve)));
        assert_eq!(cli.serve.host, "127.0.0.1");
    }
}
