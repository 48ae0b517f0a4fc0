mod cmd;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use cmd::{ci::CiSubcommand, notify::NotifySubcommand};
use pyinit_core::config::TEMPLATE_URL_ENV;
use pyinit_core::fetch::DEFAULT_TEMPLATE_URL;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pyinit",
    about = "Bootstrap a Python cloud-function project from a zip template and report to a webhook",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the project template and set it up in the target directory
    Init {
        /// Remove the bootstrap helper packages with `uv remove` and exit
        #[arg(long)]
        clean: bool,

        /// Template archive URL
        #[arg(long, env = TEMPLATE_URL_ENV, default_value = DEFAULT_TEMPLATE_URL)]
        url: String,

        /// Target directory
        #[arg(long, default_value = ".")]
        target: PathBuf,

        /// File that marks the content root inside the archive
        #[arg(long)]
        marker: Option<String>,
    },

    /// Render an already extracted template directory into the target
    Render {
        /// Template content root
        #[arg(long)]
        source: PathBuf,

        /// Target directory
        #[arg(long, default_value = ".")]
        target: PathBuf,
    },

    /// Send webhook notifications and build CI payloads
    Notify {
        #[command(subcommand)]
        subcommand: NotifySubcommand,
    },

    /// GitHub Actions helpers
    Ci {
        #[command(subcommand)]
        subcommand: CiSubcommand,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here; only real usage errors fail.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    logging::init();

    let result = match cli.command {
        Commands::Init {
            clean,
            url,
            target,
            marker,
        } => {
            if clean {
                cmd::init::clean(&target)
            } else {
                cmd::init::run(&target, url, marker, cli.json)
            }
        }
        Commands::Render { source, target } => cmd::render::run(&source, &target, cli.json),
        Commands::Notify { subcommand } => cmd::notify::run(subcommand, cli.json),
        Commands::Ci { subcommand } => cmd::ci::run(subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
