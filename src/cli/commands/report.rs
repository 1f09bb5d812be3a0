//! Dashboard and revenue report views.

use chrono::NaiveDate;

use crate::cli::core::{parse_date, CommandError, CommandResult, ParsedArgs, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::calculator::Period;
use crate::core::services::SummaryService;
use crate::currency::{Amount, CurrencyFormatter};
use crate::ledger::BillStatus;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "dashboard",
            "Show bill counts, revenue, and recent bills",
            "dashboard [--as-of YYYY-MM-DD]",
            cmd_dashboard,
        ),
        CommandEntry::new(
            "report",
            "Show revenue figures and client-wise revenue",
            "report [--as-of YYYY-MM-DD] [--range month|year|30d|3m|6m|all|START..END]",
            cmd_report,
        ),
    ]
}

fn reference_date(
    context: &ShellContext,
    parsed: &ParsedArgs<'_>,
) -> Result<NaiveDate, CommandError> {
    match parsed.flag("as-of") {
        Some(raw) => parse_date(raw),
        None => Ok(context.today()),
    }
}

fn cmd_dashboard(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["as-of"])?;
    let reference = reference_date(context, &parsed)?;
    let summary =
        context.with_ledger(|ledger| Ok(SummaryService::dashboard(ledger, reference)))?;
    let formatter = context.config.formatter();

    output_section(format!("Dashboard ({})", reference));
    let total = summary.breakdown.total();
    io::print_info(format!("  Clients         : {}", summary.client_count));
    io::print_info(format!("  Bills           : {}", total.count));
    for status in BillStatus::ALL {
        let bucket = summary.breakdown.bucket(status);
        io::print_info(format!(
            "    {:<13} : {} ({})",
            status.as_str(),
            bucket.count,
            formatter.format_amount(bucket.amount)
        ));
    }
    io::print_info(format!(
        "  Monthly revenue : {}",
        formatter.format_amount(summary.monthly_revenue)
    ));
    io::print_info(format!(
        "  Overdue amount  : {}",
        formatter.format_amount(summary.overdue_amount)
    ));

    if summary.recent_bills.is_empty() {
        io::print_info("No bills yet. Add one with `bill add`.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::right("ID"),
        TableColumn::left("Date"),
        TableColumn::left("Client").max_width(24),
        TableColumn::right("Amount"),
        TableColumn::left("Status"),
    ]);
    for bill in &summary.recent_bills {
        table.push(vec![
            bill.id.to_string(),
            bill.date.to_string(),
            bill.client_name.clone(),
            formatter.format_amount(bill.amount),
            bill.status.to_string(),
        ]);
    }
    output_section("Recent bills");
    io::print_info(table.render());
    Ok(())
}

fn cmd_report(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["as-of", "range"])?;
    let reference = reference_date(context, &parsed)?;
    let period: Period = parsed.flag("range").unwrap_or("month").parse()?;
    let report =
        context.with_ledger(|ledger| Ok(SummaryService::report(ledger, reference, period)))?;
    let money = |amount: Amount| context.format_amount(amount);

    output_section(format!("Report as of {}", reference));
    let rows = [
        ("Monthly revenue", money(report.monthly_revenue)),
        ("Yearly revenue", money(report.yearly_revenue)),
        ("Average bill value", money(report.average_bill_value)),
        ("Outstanding", money(report.outstanding)),
        ("Overdue", money(report.overdue)),
        ("Received", money(report.received)),
        ("Total bills", report.total_bills.to_string()),
        ("Paid bills", report.paid_bills.to_string()),
        ("Pending bills", report.pending_bills.to_string()),
    ];
    for (label, value) in rows {
        io::print_info(format!("  {:<18} : {}", label, value));
    }
    io::print_info(format!(
        "  {:<18} : {}",
        report.period.label(),
        money(report.period_revenue)
    ));

    if report.by_client.is_empty() {
        io::print_info("No paid revenue to attribute yet.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::left("Client").max_width(28),
        TableColumn::right("Paid bills"),
        TableColumn::right("Revenue"),
    ]);
    for row in &report.by_client {
        table.push(vec![
            row.client_name.clone(),
            row.bill_count.to_string(),
            money(row.revenue),
        ]);
    }
    output_section("Revenue by client");
    io::print_info(table.render());
    Ok(())
}
