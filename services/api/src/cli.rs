use crate::demo::{
    run_batch, run_demo, run_explain, run_generate, BatchArgs, DemoArgs, ExplainArgs,
    GenerateArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use duty_rota::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Duty Rota",
    about = "Generate fair volunteer schedules from the command line or over HTTP",
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
    /// Preview assignments for one date against the demo organization
    Generate(GenerateArgs),
    /// Create draft events for several dates, spreading volunteers across them
    Batch(BatchArgs),
    /// Show the fairness breakdown for one person and role
    Explain(ExplainArgs),
    /// Run an end-to-end demo: preview, fairness ranking and a batch schedule
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
        Command::Generate(args) => run_generate(args),
        Command::Batch(args) => run_batch(args),
        Command::Explain(args) => run_explain(args),
        Command::Demo(args) => run_demo(args),
    }
}
