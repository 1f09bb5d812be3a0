pub mod bill;
pub mod client;
pub mod config;
pub mod ledger;
pub mod payment;
pub mod report;
pub mod system;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::registry::CommandRegistry;

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in system::definitions()
        .into_iter()
        .chain(ledger::definitions())
        .chain(client::definitions())
        .chain(bill::definitions())
        .chain(payment::definitions())
        .chain(report::definitions())
        .chain(config::definitions())
    {
        registry.register(entry);
    }
}

/// Subcommand names offered by shell completion.
pub fn subcommands(command: &str) -> &'static [&'static str] {
    match command {
        "ledger" => ledger::SUBCOMMANDS,
        "client" => client::SUBCOMMANDS,
        "bill" => bill::SUBCOMMANDS,
        "payment" => payment::SUBCOMMANDS,
        "config" => config::SUBCOMMANDS,
        _ => &[],
    }
}

/// Routes `<command> <subcommand> args...` to the matching handler.
pub(crate) fn dispatch_subcommand(
    context: &mut ShellContext,
    command: &str,
    args: &[&str],
    routes: &[(&str, fn(&mut ShellContext, &[&str]) -> CommandResult)],
) -> CommandResult {
    let available = || {
        routes
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let Some((subcommand, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(format!(
            "usage: {} <{}>",
            command,
            available().replace(", ", "|")
        )));
    };
    let wanted = subcommand.to_ascii_lowercase();
    match routes.iter().find(|(name, _)| *name == wanted) {
        Some((_, handler)) => handler(context, rest),
        None => Err(CommandError::InvalidArguments(format!(
            "unknown {} subcommand `{}`. Available: {}",
            command,
            subcommand,
            available()
        ))),
    }
}
