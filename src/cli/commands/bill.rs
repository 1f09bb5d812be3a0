//! Bill entry, editing, listing, and the overdue sweep.

use crate::cli::commands::dispatch_subcommand;
use crate::cli::core::{
    parse_date, parse_id, parse_service, CommandError, CommandResult, ParsedArgs, ShellContext,
};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::calculator::{filter_bills, StatusFilter};
use crate::core::services::{BillDraft, BillService, PaymentService};
use crate::currency::{Amount, CurrencyFormatter};
use crate::ledger::{BillStatus, Service};

pub(crate) const SUBCOMMANDS: &[&str] = &["add", "edit", "remove", "list", "show", "sweep-overdue"];

const SERVICE_HINT: &str = "--service \"vehicle|from|to|amount\"";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "bill",
        "Create, edit, and list bills",
        "bill add <client-id> [date] [--status S] --service \"vehicle|from|to|amount\" ...
         bill edit <id> [--client ID] [--date D] [--status S] [--service ...]
         bill remove <id>
         bill list [--search TEXT] [--status all|unpaid|paid|overdue]
         bill show <id>
         bill sweep-overdue [--as-of D] [--terms DAYS]",
        cmd_bill,
    )]
}

fn cmd_bill(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    dispatch_subcommand(
        context,
        "bill",
        args,
        &[
            ("add", handle_add),
            ("edit", handle_edit),
            ("remove", handle_remove),
            ("list", handle_list),
            ("show", handle_show),
            ("sweep-overdue", handle_sweep),
        ],
    )
}

fn services_from(parsed: &ParsedArgs<'_>) -> Result<Vec<Service>, CommandError> {
    parsed.all("service").into_iter().map(parse_service).collect()
}

fn status_from(parsed: &ParsedArgs<'_>) -> Result<Option<BillStatus>, CommandError> {
    parsed
        .flag("status")
        .map(|raw| raw.parse::<BillStatus>().map_err(CommandError::from))
        .transpose()
}

fn handle_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["status", "service"])?;
    let client_id = parse_id(
        parsed.require(0, &format!("bill add <client-id> [date] {}", SERVICE_HINT))?,
        "client",
    )?;
    let date = match parsed.positional(1) {
        Some(raw) => parse_date(raw)?,
        None => context.today(),
    };
    let services = services_from(&parsed)?;
    if services.is_empty() {
        return Err(CommandError::InvalidArguments(format!(
            "a bill needs at least one {}",
            SERVICE_HINT
        )));
    }
    let mut draft = BillDraft::new(client_id, date, services);
    if let Some(status) = status_from(&parsed)? {
        draft = draft.with_status(status);
    }
    let total = draft.total();
    let id = context.mutate_ledger(|ledger| Ok(BillService::create(ledger, draft)?))?;
    io::print_success(format!(
        "Bill #{} created for {}.",
        id,
        context.format_amount(total)
    ));
    Ok(())
}

fn handle_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["client", "date", "status", "service"])?;
    let id = parse_id(parsed.require(0, "bill edit <id> [--client ID] ...")?, "bill")?;
    let client_id = parsed
        .flag("client")
        .map(|raw| parse_id(raw, "client"))
        .transpose()?;
    let date = parsed.flag("date").map(parse_date).transpose()?;
    let status = status_from(&parsed)?;
    let services = services_from(&parsed)?;

    let amount = context.mutate_ledger(|ledger| {
        let mut draft = BillDraft::from_bill(BillService::get(ledger, id)?);
        if let Some(client_id) = client_id {
            draft.client_id = client_id;
        }
        if let Some(date) = date {
            draft.date = date;
        }
        if let Some(status) = status {
            draft.status = status;
        }
        // Any --service replaces the whole line list.
        if !services.is_empty() {
            draft.services = services;
        }
        let amount = draft.total();
        BillService::update(ledger, id, draft)?;
        Ok(amount)
    })?;
    io::print_success(format!(
        "Bill #{} updated ({}).",
        id,
        context.format_amount(amount)
    ));
    Ok(())
}

fn handle_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[])?;
    let id = parse_id(parsed.require(0, "bill remove <id>")?, "bill")?;
    let (client, amount) = context.with_ledger(|ledger| {
        let bill = BillService::get(ledger, id)?;
        Ok((bill.client_name.clone(), bill.amount))
    })?;
    let prompt = format!(
        "Remove bill #{} for {} ({})?",
        id,
        client,
        context.format_amount(amount)
    );
    if !context.confirm(&prompt)? {
        io::print_info("Removal cancelled.");
        return Ok(());
    }
    context.mutate_ledger(|ledger| Ok(BillService::remove(ledger, id)?))?;
    io::print_success(format!("Bill #{} removed.", id));
    Ok(())
}

fn handle_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["search", "status"])?;
    let search = match parsed.flag("search") {
        Some(text) => text.to_string(),
        None => parsed.positionals().join(" "),
    };
    let status: StatusFilter = parsed.flag("status").unwrap_or("all").parse()?;

    let formatter = context.config.formatter();
    let (table, total) = context.with_ledger(|ledger| {
        let mut table = Table::new(vec![
            TableColumn::right("ID"),
            TableColumn::left("Date"),
            TableColumn::left("Client").max_width(24),
            TableColumn::left("Route").max_width(32),
            TableColumn::right("Amount"),
            TableColumn::left("Status"),
        ]);
        let matching = filter_bills(&ledger.bills, &search, status);
        let total: Amount = matching.clone().map(|bill| bill.amount).sum();
        for bill in matching {
            table.push(vec![
                bill.id.to_string(),
                bill.date.to_string(),
                bill.client_name.clone(),
                route_summary(&bill.services),
                formatter.format_amount(bill.amount),
                bill.status.to_string(),
            ]);
        }
        Ok((table, total))
    })?;
    if table.rows.is_empty() {
        io::print_info("No bills match.");
        return Ok(());
    }
    output_section("Bills");
    io::print_info(table.render());
    io::print_info(format!(
        "{} bill(s), {} in total.",
        table.rows.len(),
        context.format_amount(total)
    ));
    Ok(())
}

fn route_summary(services: &[Service]) -> String {
    match services {
        [] => String::new(),
        [only] => only.route_label(),
        [first, rest @ ..] => format!("{} (+{} more)", first.route_label(), rest.len()),
    }
}

fn handle_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[])?;
    let id = parse_id(parsed.require(0, "bill show <id>")?, "bill")?;
    let formatter = context.config.formatter();
    let money = |amount: Amount| formatter.format_amount(amount);
    let (header, services, payments) = context.with_ledger(|ledger| {
        let bill = BillService::get(ledger, id)?;
        let header = vec![
            format!("  Client : {} (#{})", bill.client_name, bill.client_id),
            format!("  Date   : {}", bill.date),
            format!("  Status : {}", bill.status),
            format!("  Amount : {}", money(bill.amount)),
        ];
        let mut services = Table::new(vec![
            TableColumn::left("Vehicle"),
            TableColumn::left("From"),
            TableColumn::left("To"),
            TableColumn::right("Amount"),
        ]);
        for service in &bill.services {
            services.push(vec![
                service.vehicle.clone(),
                service.origin.clone(),
                service.destination.clone(),
                money(service.amount),
            ]);
        }
        let payments: Vec<String> = PaymentService::for_bill(ledger, id)
            .into_iter()
            .map(|payment| {
                let mut line = format!("  {} {}", payment.date, money(payment.amount));
                if let Some(mode) = &payment.mode {
                    line.push_str(&format!(" via {}", mode));
                }
                if let Some(reference) = &payment.reference {
                    line.push_str(&format!(" (ref {})", reference));
                }
                line
            })
            .collect();
        Ok((header, services, payments))
    })?;

    output_section(format!("Bill #{}", id));
    for line in header {
        io::print_info(line);
    }
    io::print_info(services.render());
    if !payments.is_empty() {
        io::print_info("Payments:");
        for line in payments {
            io::print_info(line);
        }
    }
    Ok(())
}

fn handle_sweep(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["as-of", "terms"])?;
    let as_of = match parsed.flag("as-of") {
        Some(raw) => parse_date(raw)?,
        None => context.today(),
    };
    let terms = match parsed.flag("terms") {
        Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
            CommandError::InvalidArguments(format!(
                "--terms expects a number of days, got `{}`",
                raw
            ))
        })?,
        None => context.config.payment_terms_days,
    };
    let pending = context
        .with_ledger(|ledger| Ok(BillService::overdue_candidates(ledger, as_of, terms)))?;
    // Only save when a bill actually changes.
    let changed = if pending.is_empty() {
        pending
    } else {
        context.mutate_ledger(|ledger| Ok(BillService::sweep_overdue(ledger, as_of, terms)))?
    };
    if changed.is_empty() {
        io::print_info(format!("No unpaid bills past {} day(s) as of {}.", terms, as_of));
    } else {
        let ids: Vec<String> = changed.iter().map(|id| format!("#{}", id)).collect();
        io::print_success(format!(
            "Marked {} bill(s) overdue: {}.",
            changed.len(),
            ids.join(", ")
        ));
    }
    Ok(())
}
