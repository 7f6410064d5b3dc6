use std::process::ExitCode;

use clap::Parser;
use rules::Deploy;

#[derive(Parser, Debug)]
#[command(author, version, about = "Push access-control rules for the clinic document store")]
struct Args {
    /// Deploy CLI to drive
    #[arg(long, default_value = "firebase")]
    cli: String,

    /// Deploy target
    #[arg(long, default_value = "firestore:rules")]
    only: String,

    /// Project to deploy to, the CLI's active project otherwise
    #[arg(long)]
    project: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let deploy = Deploy {
        cli: args.cli,
        only: args.only,
        project: args.project,
    };

    match rules::run(&deploy) {
        Ok(()) => {
            println!("All done! Your access rules have been updated.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
