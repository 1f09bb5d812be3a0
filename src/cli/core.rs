//! Command dispatch, error reporting, and helpers shared by command handlers.

use std::{io, path::PathBuf};

use chrono::NaiveDate;
use dialoguer::theme::ColorfulTheme;
use rustyline::error::ReadlineError;
use strsim::levenshtein;

use crate::{
    config::ConfigManager,
    core::{
        ledger_manager::LedgerManager,
        services::ServiceError,
        time::{Clock, SystemClock},
        utils::PathResolver,
    },
    currency::{Amount, CurrencyFormatter},
    errors::BillingError,
    ledger::{Ledger, Service},
    storage::JsonStorage,
};
pub use crate::errors::CliError;

use super::commands;
use super::io as cli_io;
use super::output::{self, OutputPreferences};
use super::registry::{CommandEntry, CommandRegistry};
pub use super::shell_context::{CliMode, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, PathResolver::base_dir(), Box::new(SystemClock))
    }

    /// Builds a shell whose ledgers, backups, and settings live under `base`.
    pub fn with_base_dir(
        mode: CliMode,
        base: PathBuf,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(base.clone())?;
        let config = config_manager.load()?;
        let storage = JsonStorage::new(Some(base), Some(config.backup_retention))?;
        output::set_preferences(OutputPreferences {
            plain_mode: mode == CliMode::Script,
        });

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let mut context = ShellContext {
            mode,
            registry,
            ledger_manager: LedgerManager::new(Box::new(storage)),
            config_manager,
            config,
            theme: ColorfulTheme::default(),
            clock,
            last_command: None,
            running: true,
        };
        context.auto_load_last();
        Ok(context)
    }

    fn auto_load_last(&mut self) {
        if self.mode != CliMode::Interactive {
            return;
        }
        let Some(name) = self.config.last_opened_ledger.clone() else {
            return;
        };
        if let Ok(report) = self.ledger_manager.load(&name) {
            self.report_load(&report.warnings);
            cli_io::print_success(format!("Automatically loaded last ledger `{}`.", name));
        }
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        match self.ledger_manager.current_name() {
            Some(name) => format!("billing ({})> ", name),
            None => "billing> ".into(),
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                cli_io::print_warning(err);
                return Ok(LoopControl::Continue);
            }
        };
        let Some(first) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let command = first.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&command, first, &args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        let lowered = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &lowered), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", name));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        self.confirm("Exit shell?").map_err(CliError::from)
    }

    /// Asks before destructive actions. Scripted runs never prompt.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        match self.mode {
            CliMode::Script => Ok(true),
            CliMode::Interactive => cli_io::confirm_action(&self.theme, prompt, false),
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::LedgerNotLoaded => {
                cli_io::print_error("Ledger not loaded. Use `ledger new` or `ledger load` first.");
                cli_io::print_hint("Try `ledger new Fleet` to get started.");
            }
            other => cli_io::print_error(other),
        }
        Ok(())
    }

    pub(crate) fn report_load(&self, warnings: &[String]) {
        for warning in warnings {
            cli_io::print_warning(warning);
        }
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn format_amount(&self, amount: Amount) -> String {
        self.config.formatter().format_amount(amount)
    }

    pub(crate) fn with_ledger<T>(
        &self,
        f: impl FnOnce(&Ledger) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let ledger = self
            .ledger_manager
            .current()
            .ok_or(CommandError::LedgerNotLoaded)?;
        f(ledger)
    }

    /// Applies a change to the open ledger and saves it. When the change or
    /// the save fails, the open ledger is put back as it was.
    pub(crate) fn mutate_ledger<T>(
        &mut self,
        f: impl FnOnce(&mut Ledger) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let snapshot = self.with_ledger(|ledger| Ok(ledger.clone()))?;
        let outcome = self
            .ledger_manager
            .with_current_mut(f)
            .map_err(CommandError::from)?
            .and_then(|value| {
                self.ledger_manager.save()?;
                Ok(value)
            });
        if outcome.is_err() {
            self.ledger_manager.replace_current(snapshot);
        }
        outcome
    }

    pub(crate) fn remember_ledger(&mut self, name: Option<&str>) -> CommandResult {
        self.config.last_opened_ledger = name.map(str::to_string);
        self.persist_config()
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }
}

/// Positional arguments and `--flag value` pairs of one command line.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    positionals: Vec<&'a str>,
    flags: Vec<(&'a str, &'a str)>,
}

impl<'a> ParsedArgs<'a> {
    /// Splits `args` into positionals and flags. Every flag takes a value,
    /// either as the next argument or inline as `--flag=value`.
    pub(crate) fn parse(args: &[&'a str], allowed: &[&str]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            let Some(flag) = arg.strip_prefix("--").filter(|rest| !rest.is_empty()) else {
                parsed.positionals.push(arg);
                continue;
            };
            let (name, inline) = match flag.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (flag, None),
            };
            if !allowed.contains(&name) {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown flag `--{}`",
                    name
                )));
            }
            let value = match inline.or_else(|| iter.next()) {
                Some(value) => value,
                None => {
                    return Err(CommandError::InvalidArguments(format!(
                        "flag `--{}` expects a value",
                        name
                    )))
                }
            };
            parsed.flags.push((name, value));
        }
        Ok(parsed)
    }

    pub(crate) fn positional(&self, index: usize) -> Option<&'a str> {
        self.positionals.get(index).copied()
    }

    pub(crate) fn positionals(&self) -> &[&'a str] {
        &self.positionals
    }

    pub(crate) fn require(&self, index: usize, usage: &str) -> Result<&'a str, CommandError> {
        self.positional(index)
            .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {}", usage)))
    }

    /// Last value given for `name`.
    pub(crate) fn flag(&self, name: &str) -> Option<&'a str> {
        self.flags
            .iter()
            .rev()
            .find(|(flag, _)| *flag == name)
            .map(|(_, value)| *value)
    }

    pub(crate) fn all(&self, name: &str) -> Vec<&'a str> {
        self.flags
            .iter()
            .filter(|(flag, _)| *flag == name)
            .map(|(_, value)| *value)
            .collect()
    }
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

pub(crate) fn parse_id(input: &str, what: &str) -> Result<u64, CommandError> {
    input
        .trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid {} id `{}`", what, input)))
}

/// Parses a `vehicle|from|to|amount` service line.
pub(crate) fn parse_service(line: &str) -> Result<Service, CommandError> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let [vehicle, origin, destination, amount] = parts.as_slice() else {
        return Err(CommandError::InvalidArguments(format!(
            "service `{}` must look like \"vehicle|from|to|amount\"",
            line
        )));
    };
    let amount = Amount::parse(amount)?;
    Ok(Service::new(*vehicle, *origin, *destination, amount))
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Ledger not loaded. Use `ledger new` or `ledger load` first.")]
    LedgerNotLoaded,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(BillingError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<BillingError> for CommandError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::LedgerNotLoaded => CommandError::LedgerNotLoaded,
            BillingError::InvalidInput(message) => CommandError::InvalidArguments(message),
            other => CommandError::Core(other),
        }
    }
}

impl From<ServiceError> for CommandError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(err) => CommandError::from(err),
            ServiceError::Invalid(message) => CommandError::InvalidArguments(message),
        }
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

/// Runs `lines` against a scripted shell rooted at `base`.
#[cfg(test)]
pub(crate) fn process_script(
    base: &std::path::Path,
    today: NaiveDate,
    lines: &[&str],
) -> Result<ShellContext, CliError> {
    use crate::core::time::FixedClock;

    let mut app = ShellContext::with_base_dir(
        CliMode::Script,
        base.to_path_buf(),
        Box::new(FixedClock::new(today)),
    )?;
    for line in lines {
        match app.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => app.report_error(err)?,
        }
    }
    Ok(app)
}
