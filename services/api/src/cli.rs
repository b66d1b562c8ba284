use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use staffing_review::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Staffing Review Pipeline",
    about = "Run or demonstrate the multi-round candidate review pipeline",
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
    /// Walk one application through assignment, review rounds and a final decision
    Demo(DemoArgs),
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
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["staffing-review-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_demo_flags() {
        let cli = Cli::try_parse_from(["staffing-review-api", "demo", "--max-rounds", "3"])
            .expect("parses");
        match cli.command {
            Some(Command::Demo(args)) => assert_eq!(args.max_rounds, Some(3)),
            other => panic!("expected demo command, got {other:?}"),
        }
    }
}
