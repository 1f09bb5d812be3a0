use dialoguer::Select;

use crate::cli::commands::dispatch_subcommand;
use crate::cli::core::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::config::Config;

pub(crate) const SUBCOMMANDS: &[&str] = &["show", "set", "backup", "backups", "restore"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and change preferences",
        "config show
         config set <key> <value>
         config backup [note]
         config backups
         config restore [backup-file]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return handle_show(context, args);
    }
    dispatch_subcommand(
        context,
        "config",
        args,
        &[
            ("show", handle_show),
            ("set", handle_set),
            ("backup", handle_backup),
            ("backups", handle_backups),
            ("restore", handle_restore),
        ],
    )
}

fn handle_show(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output_section("Configuration");
    for (key, value) in context.config.entries() {
        io::print_info(format!("  {:<20} {}", key, value));
    }
    io::print_info(format!(
        "  Stored at {}",
        context.config_manager.path().display()
    ));
    Ok(())
}

fn handle_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (Some(key), Some(_)) = (args.first(), args.get(1)) else {
        return Err(CommandError::InvalidArguments(format!(
            "usage: config set <{}> <value>",
            Config::KEYS.join("|")
        )));
    };
    let key = key.to_ascii_lowercase().replace('-', "_");
    let value = args[1..].join(" ");
    let mut updated = context.config.clone();
    updated.set(&key, &value)?;
    context.config_manager.save(&updated)?;
    context.config = updated;
    io::print_success(format!("`{}` set to `{}`.", key, value.trim()));
    if key == "backup_retention" {
        io::print_hint("The new retention applies from the next start.");
    }
    Ok(())
}

fn handle_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = args.join(" ");
    let note = Some(note.trim()).filter(|text| !text.is_empty());
    let name = context.config_manager.backup(&context.config, note)?;
    io::print_success(format!("Configuration backed up as `{}`.", name));
    Ok(())
}

fn handle_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.config_manager.list_backups()?;
    if backups.is_empty() {
        io::print_info("No configuration backups yet.");
        return Ok(());
    }
    output_section("Configuration backups (newest first)");
    for name in backups {
        io::print_info(format!("  {}", name));
    }
    Ok(())
}

fn handle_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = match args.first() {
        Some(name) => name.to_string(),
        None => match pick_backup(context)? {
            Some(name) => name,
            None => {
                io::print_info("Restore cancelled.");
                return Ok(());
            }
        },
    };
    context.config = context.config_manager.restore(&name)?;
    io::print_success(format!("Configuration restored from `{}`.", name));
    Ok(())
}

/// Lets an interactive user choose a backup; scripts must name one.
fn pick_backup(context: &ShellContext) -> Result<Option<String>, CommandError> {
    if context.mode != CliMode::Interactive {
        return Err(CommandError::InvalidArguments(
            "usage: config restore <backup-file>".into(),
        ));
    }
    let mut backups = context.config_manager.list_backups()?;
    if backups.is_empty() {
        return Err(CommandError::Message("No configuration backups to restore.".into()));
    }
    let choice = Select::with_theme(&context.theme)
        .with_prompt("Select configuration backup")
        .items(&backups)
        .default(0)
        .interact_opt()?;
    Ok(choice.map(|index| backups.swap_remove(index)))
}
