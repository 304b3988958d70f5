mod commands;
mod terminal;

use commands::{CommandLine, Commands, run, wait, wake};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);

    match commands.command {
        Commands::Wake { mac, broadcast } => {
            print::header("waking up");
            wake::wake(&mac, &broadcast).await
        }
        Commands::Wait { host, timing } => {
            print::header("waiting for host");
            wait::wait(&host, timing).await
        }
        Commands::Run(args) => {
            print::header("wake, wait and launch");
            run::run(args).await
        }
    }
}
