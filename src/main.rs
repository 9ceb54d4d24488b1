use clap::Parser;
use echoalpha::cli::{run, Cli};
use tracing::Level;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();
    run(cli)
}
