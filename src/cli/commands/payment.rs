use crate::cli::commands::dispatch_subcommand;
use crate::cli::core::{parse_date, parse_id, CommandResult, ParsedArgs, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::calculator::{filter_bills, StatusFilter};
use crate::core::services::{PaymentDetails, PaymentService, SummaryService};
use crate::currency::CurrencyFormatter;
use crate::ledger::Payment;

pub(crate) const SUBCOMMANDS: &[&str] = &["record", "list"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "payment",
        "Record settlements and review collections",
        "payment record <bill-id> [--date D] [--mode M] [--ref R]
         payment list [--search TEXT] [--status all|unpaid|paid|overdue]",
        cmd_payment,
    )]
}

fn cmd_payment(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    dispatch_subcommand(
        context,
        "payment",
        args,
        &[("record", handle_record), ("list", handle_list)],
    )
}

fn handle_record(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["date", "mode", "ref"])?;
    let bill_id = parse_id(
        parsed.require(0, "payment record <bill-id> [--date D] [--mode M] [--ref R]")?,
        "bill",
    )?;
    let date = match parsed.flag("date") {
        Some(raw) => parse_date(raw)?,
        None => context.today(),
    };
    let mut details = PaymentDetails::on(date);
    if let Some(mode) = parsed.flag("mode") {
        details = details.with_mode(mode);
    }
    if let Some(reference) = parsed.flag("ref") {
        details = details.with_reference(reference);
    }

    let amount = context.mutate_ledger(|ledger| {
        PaymentService::record(ledger, bill_id, details)?;
        Ok(ledger.bill(bill_id).map(|bill| bill.amount).unwrap_or_default())
    })?;
    io::print_success(format!(
        "Bill #{} marked paid: {} received on {}.",
        bill_id,
        context.format_amount(amount),
        date
    ));
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

    let (overview, table) = context.with_ledger(|ledger| {
        let overview = SummaryService::payments_overview(ledger);
        let mut table = Table::new(vec![
            TableColumn::right("Bill"),
            TableColumn::left("Date"),
            TableColumn::left("Client").max_width(24),
            TableColumn::right("Amount"),
            TableColumn::left("Status"),
            TableColumn::left("Paid on"),
            TableColumn::left("Mode"),
            TableColumn::left("Ref").max_width(16),
        ]);
        for bill in filter_bills(&ledger.bills, &search, status) {
            let settlement = PaymentService::settlement(ledger, bill);
            let field = |pick: fn(&Payment) -> Option<String>| {
                settlement.and_then(pick).unwrap_or_else(|| "-".into())
            };
            table.push(vec![
                bill.id.to_string(),
                bill.date.to_string(),
                bill.client_name.clone(),
                formatter.format_amount(bill.amount),
                bill.status.to_string(),
                field(|p| Some(p.date.to_string())),
                field(|p| p.mode.clone()),
                field(|p| p.reference.clone()),
            ]);
        }
        Ok((overview, table))
    })?;

    output_section("Payments");
    io::print_info(format!("  Received    : {}", context.format_amount(overview.received)));
    io::print_info(format!("  Outstanding : {}", context.format_amount(overview.outstanding)));
    io::print_info(format!(
        "  Overdue     : {} ({} bill(s))",
        context.format_amount(overview.overdue),
        overview.overdue_count
    ));
    if table.rows.is_empty() {
        io::print_info("No bills match.");
    } else {
        io::print_info(table.render());
    }
    Ok(())
}
