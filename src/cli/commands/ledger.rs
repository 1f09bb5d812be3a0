//! Ledger lifecycle: create, open, save, back up, and restore.

use std::path::Path;

use crate::cli::commands::dispatch_subcommand;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::storage::integrity_warnings;

pub(crate) const SUBCOMMANDS: &[&str] = &[
    "new", "load", "save", "save-as", "list", "backup", "backups", "restore", "check", "delete",
];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "ledger",
        "Create, open, save, and back up ledgers",
        "ledger new <name>
         ledger load <name|path.json>
         ledger save [path.json]
         ledger save-as <name>
         ledger list
         ledger backup [note]
         ledger backups
         ledger restore <backup-file>
         ledger check
         ledger delete <name>",
        cmd_ledger,
    )]
}

fn cmd_ledger(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    dispatch_subcommand(
        context,
        "ledger",
        args,
        &[
            ("new", handle_new),
            ("load", handle_load),
            ("save", handle_save),
            ("save-as", handle_save_as),
            ("list", handle_list),
            ("backup", handle_backup),
            ("backups", handle_backups),
            ("restore", handle_restore),
            ("check", handle_check),
            ("delete", handle_delete),
        ],
    )
}

fn joined(args: &[&str]) -> Option<String> {
    let text = args.join(" ");
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn handle_new(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = joined(args)
        .ok_or_else(|| CommandError::InvalidArguments("usage: ledger new <name>".into()))?;
    if context.ledger_manager.storage().ledger_path(&name).exists() {
        return Err(CommandError::InvalidArguments(format!(
            "ledger `{}` already exists; use `ledger load {}`",
            name, name
        )));
    }
    context.ledger_manager.create(&name);
    let path = context.ledger_manager.save()?;
    context.remember_ledger(Some(&name))?;
    io::print_success(format!(
        "New ledger `{}` created at {}.",
        name,
        path.display()
    ));
    Ok(())
}

fn handle_load(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let target = joined(args)
        .ok_or_else(|| CommandError::InvalidArguments("usage: ledger load <name|path>".into()))?;
    let path = Path::new(&target);
    let by_path = path.extension().is_some_and(|ext| ext == "json") && path.exists();
    let report = if by_path {
        context.ledger_manager.load_from_path(path)?
    } else {
        context.ledger_manager.load(&target)?
    };
    context.remember_ledger(report.name.as_deref())?;
    let (clients, bills) = context.with_ledger(|l| Ok((l.clients.len(), l.bills.len())))?;
    io::print_success(format!(
        "Ledger loaded from {} ({} clients, {} bills).",
        report.path.display(),
        clients,
        bills
    ));
    context.report_load(&report.warnings);
    Ok(())
}

fn handle_save(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match joined(args) {
        Some(path) => {
            context.ledger_manager.save_to_path(Path::new(&path))?;
            io::print_success(format!("Ledger saved to {}.", path));
        }
        None => {
            let path = context.ledger_manager.save()?;
            io::print_success(format!("Ledger saved to {}.", path.display()));
        }
    }
    Ok(())
}

fn handle_save_as(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = joined(args)
        .ok_or_else(|| CommandError::InvalidArguments("usage: ledger save-as <name>".into()))?;
    let path = context.ledger_manager.save_as(&name)?;
    context.remember_ledger(Some(&name))?;
    io::print_success(format!("Ledger saved as `{}` ({}).", name, path.display()));
    Ok(())
}

fn handle_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let names = context.ledger_manager.list_ledgers()?;
    if names.is_empty() {
        io::print_info("No saved ledgers.");
        return Ok(());
    }
    let current = context
        .ledger_manager
        .current_path()
        .and_then(|path| path.file_stem())
        .and_then(|stem| stem.to_str())
        .map(str::to_string);
    output_section("Ledgers");
    for name in names {
        let marker = if current.as_deref() == Some(name.as_str()) { "*" } else { " " };
        io::print_info(format!(" {} {}", marker, name));
    }
    Ok(())
}

fn handle_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = joined(args);
    let path = context.ledger_manager.backup(note.as_deref())?;
    io::print_success(format!("Backup written to {}.", path.display()));
    Ok(())
}

fn handle_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.ledger_manager.list_backups()?;
    if backups.is_empty() {
        io::print_info("No backups yet.");
        return Ok(());
    }
    output_section("Backups (newest first)");
    for name in backups {
        io::print_info(format!("  {}", name));
    }
    Ok(())
}

fn handle_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let backup = args.first().ok_or_else(|| {
        CommandError::InvalidArguments("usage: ledger restore <backup-file>".into())
    })?;
    if !context.confirm(&format!("Replace the current ledger with `{}`?", backup))? {
        io::print_info("Restore cancelled.");
        return Ok(());
    }
    let report = context.ledger_manager.restore_backup(backup)?;
    io::print_success(format!("Restored `{}`.", backup));
    context.report_load(&report.warnings);
    Ok(())
}

fn handle_check(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let warnings = context.with_ledger(|ledger| Ok(integrity_warnings(ledger)))?;
    if warnings.is_empty() {
        io::print_success("No integrity issues found.");
    } else {
        io::print_warning(format!("{} integrity issue(s):", warnings.len()));
        context.report_load(&warnings);
    }
    Ok(())
}

fn handle_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = joined(args)
        .ok_or_else(|| CommandError::InvalidArguments("usage: ledger delete <name>".into()))?;
    if !context.confirm(&format!("Delete ledger `{}`? Backups are kept.", name))? {
        io::print_info("Delete cancelled.");
        return Ok(());
    }
    let target = context.ledger_manager.storage().ledger_path(&name);
    context.ledger_manager.storage().delete(&name)?;
    if context.ledger_manager.current_path() == Some(target.as_path()) {
        context.ledger_manager.clear();
        context.remember_ledger(None)?;
    }
    io::print_success(format!("Ledger `{}` deleted.", name));
    Ok(())
}
