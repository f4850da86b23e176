use crate::commands::{run_coach, run_simulate, CoachArgs, SimulateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use credit_coach::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Credit Coach",
    about = "Score applicants, explore what-if scenarios and coach rejected applications",
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
    /// Assess one applicant (or a CSV batch) and print the coaching plan for rejections
    Coach(CoachArgs),
    /// Replay feature edits through a live what-if session and print the trend
    Simulate(SimulateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the prediction service base URL
    #[arg(long)]
    pub(crate) scoring_url: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Coach(args) => run_coach(args).await,
        Command::Simulate(args) => run_simulate(args).await,
    }
}
