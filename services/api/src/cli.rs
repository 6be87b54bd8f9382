use crate::screen::{run_screen, run_underlyings, ScreenArgs, UnderlyingsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use warrant_sop::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Warrant SOP Screener",
    about = "Screen vendor warrant reports against the steady-state SOP, or serve the screener over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Screen one underlying's warrant chain from a report export
    Screen(ScreenArgs),
    /// List the underlyings present in a report export
    Underlyings(UnderlyingsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Screen(args) => run_screen(args),
        Command::Underlyings(args) => run_underlyings(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warrant_sop::screening::SopProfile;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["warrant-sop-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn screen_accepts_profile_and_dates() {
        let cli = Cli::try_parse_from([
            "warrant-sop-api",
            "screen",
            "--report",
            "report.csv",
            "--underlying",
            "台積電",
            "--profile",
            "scoring",
            "--as-of",
            "2025-03-18",
            "--capital",
            "500000",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Screen(args)) => {
                assert_eq!(args.profile, Some(SopProfile::Scoring));
                assert_eq!(args.underlying.as_deref(), Some("台積電"));
                assert_eq!(args.capital, Some(500_000.0));
                assert!(args.as_of.is_some());
            }
            other => panic!("expected screen command, got {other:?}"),
        }
    }

    #[test]
    fn unknown_profile_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "warrant-sop-api",
            "screen",
            "--report",
            "report.csv",
            "--profile",
            "yolo",
        ]);
        assert!(result.is_err());
    }
}
