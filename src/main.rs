use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use psarc_codec::archive;

#[derive(Parser)]
#[command(name = "psarc", about = "Pack and unpack PSARC game-asset archives")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce <normalized-directory>.psarc for each argument.
    Pack { directories: Vec<PathBuf> },
    /// Explode each <name>.psarc into a sibling <name>/ tree.
    Unpack { files: Vec<PathBuf> },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Pack { directories } => directories.iter().try_for_each(|dir| {
            archive::pack_directory(dir).map(|out| {
                tracing::info!(input = %dir.display(), output = %out.display(), "packed");
            })
        }),
        Command::Unpack { files } => files.iter().try_for_each(|file| {
            archive::unpack_file(file).map(|out| {
                tracing::info!(input = %file.display(), output = %out.display(), "unpacked");
            })
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
