// HomeGate - Household Automation Gateway
use clap::Parser;
use homegate::cli::args::Args;
use homegate::cli::commands::execute_command;
use homegate::cli::output::{ConsoleWriter, OutputWriter};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let writer = ConsoleWriter::new(args.output);

    if let Err(e) = execute_command(args).await {
        if writer.write_error(&e.to_string()).is_err() {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}
