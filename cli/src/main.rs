mod commands;
mod terminal;

use commands::{CommandLine, Commands, discover, interfaces};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);

    match commands.command {
        Commands::Interfaces(args) => {
            print::header("network interfaces");
            interfaces::interfaces(&args.into_config())
        }
        Commands::Discover(args) => {
            print::header("getting ready for discovery");
            let simulate = args.simulate;
            discover::discover(args.into_config(), simulate).await
        }
    }
}
