use clap::Parser;
use credvault::cli::commands;
use credvault::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { force } => commands::init::execute(&cli, force),
        Commands::Add {
            ref service,
            ref username,
            ref note,
        } => commands::add::execute(&cli, service.clone(), username.clone(), note.clone()),
        Commands::List { ref service } => commands::list::execute(&cli, service.as_deref()),
        Commands::Get {
            ref id,
            ref service,
            copy,
            show,
        } => commands::get::execute(&cli, id.as_deref(), service.as_deref(), copy, show),
        Commands::Update {
            ref id,
            ref service,
            ref username,
            ref note,
            password,
        } => commands::update::execute(
            &cli,
            id.as_deref(),
            service.as_deref(),
            username.as_deref(),
            note.as_deref(),
            password,
        ),
        Commands::Delete { ref id, force } => commands::delete::execute(&cli, id, force),
        Commands::Unlock => commands::unlock::execute(&cli),
        Commands::Purge { keep_audit, force } => {
            commands::purge::execute(&cli, keep_audit, force)
        }
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        credvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
