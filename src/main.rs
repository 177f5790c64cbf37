/// main.rs — pwv entry point
use clap::Parser;

use pwv::cli::{Cli, Command};
use pwv::error::{Error, Result};
use pwv::ui::TerminalPrompter;
use pwv::vault::{self, VaultPaths};
use pwv::{logging, secure, signals};

fn main() {
    logging::init();
    secure::lock_memory();
    signals::install();

    let exit_code = match run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    secure::zeroize_all();
    std::process::exit(exit_code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = VaultPaths::new()?;
    let mut prompter = TerminalPrompter;

    match cli.command {
        Command::Init => vault::init(&paths, &mut prompter),
        Command::Destroy => vault::destroy(&paths, &mut prompter),
        Command::List => vault::list(&paths, &mut prompter),
        Command::Config => vault::config(&paths, &mut prompter),
        Command::Create { name } => vault::create(&paths, &mut prompter, &name),
        Command::Get { name } => vault::get(&paths, &mut prompter, &name),
        Command::Update { name } => vault::update(&paths, &mut prompter, &name),
        Command::Delete { name } => vault::delete(&paths, &mut prompter, &name),
    }
    .map_err(|e| match e {
        // authenticate() never returns this to its callers; surfacing it
        // here would mean an internal bug, not a runtime condition.
        Error::AuthFailed => Error::internal("unexpected unhandled authentication failure"),
        other => other,
    })
}
