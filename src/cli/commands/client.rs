use crate::cli::commands::dispatch_subcommand;
use crate::cli::core::{parse_id, CommandError, CommandResult, ParsedArgs, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::calculator::filter_clients;
use crate::core::services::{ClientDraft, ClientService};
use crate::ledger::common::sum_amounts;

pub(crate) const SUBCOMMANDS: &[&str] = &["add", "edit", "remove", "list", "show"];

const DETAIL_FLAGS: &[&str] = &["company", "contact", "email", "address", "gst"];
const EDIT_FLAGS: &[&str] = &["name", "company", "contact", "email", "address", "gst"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "client",
        "Manage the client directory",
        "client add <name> [--company C] [--contact P] [--email E] [--address A] [--gst G]
         client edit <id> [--name N] [--company C] [--contact P] [--email E] [--address A] [--gst G]
         client remove <id>
         client list [search]
         client show <id>",
        cmd_client,
    )]
}

fn cmd_client(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    dispatch_subcommand(
        context,
        "client",
        args,
        &[
            ("add", handle_add),
            ("edit", handle_edit),
            ("remove", handle_remove),
            ("list", handle_list),
            ("show", handle_show),
        ],
    )
}

/// Copies detail flags onto `draft`. An empty value clears the field.
fn apply_details(draft: &mut ClientDraft, parsed: &ParsedArgs<'_>) {
    let fields = [
        ("company", &mut draft.company),
        ("contact", &mut draft.contact),
        ("email", &mut draft.email),
        ("address", &mut draft.address),
        ("gst", &mut draft.gst),
    ];
    for (flag, slot) in fields {
        if let Some(value) = parsed.flag(flag) {
            *slot = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        }
    }
}

fn handle_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, DETAIL_FLAGS)?;
    if parsed.positionals().is_empty() {
        return Err(CommandError::InvalidArguments(
            "usage: client add <name> [--company C] [--gst G] ...".into(),
        ));
    }
    let mut draft = ClientDraft::named(parsed.positionals().join(" "));
    apply_details(&mut draft, &parsed);
    let name = draft.name.trim().to_string();
    let id = context.mutate_ledger(|ledger| Ok(ClientService::add(ledger, draft)?))?;
    io::print_success(format!("Client #{} `{}` added.", id, name));
    Ok(())
}

fn handle_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, EDIT_FLAGS)?;
    let id = parse_id(parsed.require(0, "client edit <id> [--name N] ...")?, "client")?;
    context.mutate_ledger(|ledger| {
        let mut draft = ClientDraft::from_client(ClientService::get(ledger, id)?);
        if let Some(name) = parsed.flag("name") {
            draft.name = name.to_string();
        }
        apply_details(&mut draft, &parsed);
        ClientService::edit(ledger, id, draft)?;
        Ok(())
    })?;
    io::print_success(format!("Client #{} updated.", id));
    Ok(())
}

fn handle_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[])?;
    let id = parse_id(parsed.require(0, "client remove <id>")?, "client")?;
    let (name, bills) = context.with_ledger(|ledger| {
        let client = ClientService::get(ledger, id)?;
        Ok((client.name.clone(), ClientService::bill_count(ledger, id)))
    })?;
    let prompt = if bills > 0 {
        format!("Remove client `{}`? Their {} bill(s) stay in the ledger.", name, bills)
    } else {
        format!("Remove client `{}`?", name)
    };
    if !context.confirm(&prompt)? {
        io::print_info("Removal cancelled.");
        return Ok(());
    }
    context.mutate_ledger(|ledger| Ok(ClientService::remove(ledger, id)?))?;
    io::print_success(format!("Client #{} `{}` removed.", id, name));
    Ok(())
}

fn handle_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let search = args.join(" ");
    let table = context.with_ledger(|ledger| {
        let mut table = Table::new(vec![
            TableColumn::right("ID"),
            TableColumn::left("Name").max_width(28),
            TableColumn::left("Company").max_width(24),
            TableColumn::left("GST"),
            TableColumn::right("Bills"),
        ]);
        for client in filter_clients(&ledger.clients, &search) {
            table.push(vec![
                client.id.to_string(),
                client.name.clone(),
                client.company.clone().unwrap_or_default(),
                client.gst.clone().unwrap_or_default(),
                ClientService::bill_count(ledger, client.id).to_string(),
            ]);
        }
        Ok(table)
    })?;
    if table.rows.is_empty() {
        io::print_info("No clients match.");
        return Ok(());
    }
    output_section("Clients");
    io::print_info(table.render());
    Ok(())
}

fn handle_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[])?;
    let id = parse_id(parsed.require(0, "client show <id>")?, "client")?;
    let (lines, billed, outstanding) = context.with_ledger(|ledger| {
        let client = ClientService::get(ledger, id)?;
        let bills: Vec<_> = ledger.bills.iter().filter(|b| b.client_id == id).collect();
        let billed = sum_amounts(bills.iter().copied());
        let outstanding =
            sum_amounts(bills.iter().copied().filter(|b| b.status.is_outstanding()));
        let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".into());
        let lines = vec![
            format!("  Name    : {}", client.name),
            format!("  Company : {}", optional(&client.company)),
            format!("  Contact : {}", optional(&client.contact)),
            format!("  Email   : {}", optional(&client.email)),
            format!("  Address : {}", optional(&client.address)),
            format!("  GST     : {}", optional(&client.gst)),
            format!("  Bills   : {}", bills.len()),
        ];
        Ok((lines, billed, outstanding))
    })?;
    output_section(format!("Client #{}", id));
    for line in lines {
        io::print_info(line);
    }
    io::print_info(format!("  Billed  : {}", context.format_amount(billed)));
    io::print_info(format!("  Due     : {}", context.format_amount(outstanding)));
    Ok(())
}
