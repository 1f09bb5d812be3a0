mod common;

use common::{date, june_ledger, push_bill};
use transport_billing::{
    core::calculator::{
        self, average_bill_value, filter_bills, outstanding, revenue_for_period,
        total_for_status, total_received, Period, StatusBreakdown, StatusFilter,
    },
    currency::Amount,
    ledger::{BillStatus, Client, Ledger, Payment},
};

fn mixed_ledger() -> Ledger {
    let mut ledger = Ledger::new("Mixed");
    let acme = ledger.add_client(Client::new("Acme Transport"));
    let zen = ledger.add_client(Client::new("Zen Logistics"));
    let rows = [
        (acme, 1200, BillStatus::Paid, date(2024, 1, 9)),
        (zen, 450, BillStatus::Unpaid, date(2024, 3, 2)),
        (acme, 980, BillStatus::Overdue, date(2023, 11, 30)),
        (zen, 3100, BillStatus::Paid, date(2024, 6, 1)),
        (zen, 75, BillStatus::Unpaid, date(2024, 6, 14)),
        (acme, 2200, BillStatus::Overdue, date(2024, 2, 29)),
    ];
    for (client, amount, status, on) in rows {
        push_bill(&mut ledger, client, amount, status, on);
    }
    ledger
}

#[test]
fn status_totals_partition_the_bill_set() {
    let ledger = mixed_ledger();
    let all: Amount = ledger.bills.iter().map(|bill| bill.amount).sum();
    let parts: Amount = BillStatus::ALL
        .iter()
        .map(|status| total_for_status(&ledger.bills, *status))
        .sum();
    assert_eq!(parts, all);

    let breakdown = StatusBreakdown::of(&ledger.bills);
    assert_eq!(breakdown.total().amount, all);
    assert_eq!(breakdown.total().count, ledger.bills.len());
    assert_eq!(breakdown.pending_count(), 4);
}

#[test]
fn average_bill_value_edges() {
    let empty = Ledger::new("Empty");
    assert_eq!(average_bill_value(&empty.bills, date(2024, 6, 15)), Amount::ZERO);

    let mut single = Ledger::new("Single");
    let client = single.add_client(Client::new("Acme"));
    push_bill(&mut single, client, 1000, BillStatus::Paid, date(2024, 5, 2));
    assert_eq!(
        average_bill_value(&single.bills, date(2024, 6, 15)),
        Amount::from_major(1000)
    );
}

#[test]
fn empty_filter_returns_every_bill_and_filtering_is_idempotent() {
    let ledger = mixed_ledger();
    let everything: Vec<u64> = filter_bills(&ledger.bills, "", StatusFilter::All)
        .map(|bill| bill.id)
        .collect();
    let ids: Vec<u64> = ledger.bills.iter().map(|bill| bill.id).collect();
    assert_eq!(everything, ids);

    let once: Vec<_> = filter_bills(&ledger.bills, "zen", StatusFilter::Only(BillStatus::Unpaid))
        .cloned()
        .collect();
    let twice: Vec<u64> = filter_bills(&once, "zen", StatusFilter::Only(BillStatus::Unpaid))
        .map(|bill| bill.id)
        .collect();
    assert_eq!(twice, once.iter().map(|bill| bill.id).collect::<Vec<_>>());
    assert_eq!(twice.len(), 2);
}

#[test]
fn june_scenario_figures() {
    let ledger = june_ledger();
    let today = date(2024, 6, 15);
    assert_eq!(outstanding(&ledger.bills), Amount::from_major(3000));
    assert_eq!(
        total_for_status(&ledger.bills, BillStatus::Paid),
        Amount::from_major(5000)
    );
    assert_eq!(
        revenue_for_period(&ledger.bills, &Period::CurrentMonth, today),
        Amount::from_major(5000)
    );
}

#[test]
fn received_sums_every_payment() {
    let payments = vec![
        Payment::new(1, Amount::from_major(1200), date(2024, 6, 1)),
        Payment::new(2, Amount::from_major(800), date(2024, 6, 2)),
    ];
    assert_eq!(total_received(&payments), Amount::from_major(2000));
}

#[test]
fn trailing_ranges_end_on_the_reference_date() {
    let ledger = mixed_ledger();
    let reference = date(2024, 6, 15);
    // Only the 3100 paid bill on 2024-06-01 falls inside the last 30 days.
    assert_eq!(
        revenue_for_period(&ledger.bills, &Period::LastDays(30), reference),
        Amount::from_major(3100)
    );
    assert_eq!(
        revenue_for_period(&ledger.bills, &Period::LastMonths(6), reference),
        Amount::from_major(4300)
    );
    let window: Period = "2024-01-01..2024-01-31".parse().unwrap();
    assert_eq!(
        revenue_for_period(&ledger.bills, &window, reference),
        Amount::from_major(1200)
    );
    assert_eq!(
        revenue_for_period(&ledger.bills, &Period::AllTime, reference),
        Amount::from_major(4300)
    );
}

#[test]
fn client_revenue_is_sorted_highest_first() {
    let ledger = mixed_ledger();
    let rows = calculator::revenue_by_client(&ledger.bills);
    let names: Vec<&str> = rows.iter().map(|row| row.client_name.as_str()).collect();
    assert_eq!(names, vec!["Zen Logistics", "Acme Transport"]);
    assert_eq!(rows[0].revenue, Amount::from_major(3100));
    assert_eq!(rows[1].bill_count, 1);
}
