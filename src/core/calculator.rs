//! Billing ledger calculator.
//!
//! Pure aggregation over a snapshot of bills and payments: status buckets,
//! revenue for calendar periods, outstanding and overdue totals, and the
//! filtered bill view used by listings. Nothing here mutates its input or
//! reads the system clock; date-dependent operations take the reference date
//! as an argument.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::currency::Amount;
use crate::errors::BillingError;
use crate::ledger::{common::sum_amounts, Bill, BillStatus, Client, Payment};

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BillingError> {
        if end < start {
            return Err(BillingError::InvalidInput(format!(
                "window end {} precedes start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Date buckets used for revenue figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Same calendar month and year as the reference date.
    CurrentMonth,
    /// Same calendar year as the reference date.
    CurrentYear,
    /// The `n` days ending on the reference date.
    LastDays(u32),
    /// From `n` months before the reference date (exclusive) up to it.
    LastMonths(u32),
    Window(DateWindow),
    AllTime,
}

impl Period {
    pub fn contains(&self, date: NaiveDate, reference: NaiveDate) -> bool {
        match self {
            Period::CurrentMonth => {
                date.year() == reference.year() && date.month() == reference.month()
            }
            Period::CurrentYear => date.year() == reference.year(),
            Period::LastDays(days) => {
                let start = reference
                    .checked_sub_days(Days::new((*days).into()))
                    .unwrap_or(NaiveDate::MIN);
                date > start && date <= reference
            }
            Period::LastMonths(months) => {
                let start = reference
                    .checked_sub_months(Months::new(*months))
                    .unwrap_or(NaiveDate::MIN);
                date > start && date <= reference
            }
            Period::Window(window) => window.contains(date),
            Period::AllTime => true,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Period::CurrentMonth => "This month".into(),
            Period::CurrentYear => "This year".into(),
            Period::LastDays(days) => format!("Last {} days", days),
            Period::LastMonths(1) => "Last month".into(),
            Period::LastMonths(months) => format!("Last {} months", months),
            Period::Window(window) => window.to_string(),
            Period::AllTime => "All time".into(),
        }
    }
}

impl FromStr for Period {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        if let Some((start, end)) = token.split_once("..") {
            let parse = |value: &str| {
                NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                    BillingError::InvalidInput(format!(
                        "invalid date `{}` in range (use YYYY-MM-DD..YYYY-MM-DD)",
                        value
                    ))
                })
            };
            return DateWindow::new(parse(start)?, parse(end)?).map(Period::Window);
        }
        let period = match token.as_str() {
            "month" | "this-month" => Period::CurrentMonth,
            "year" | "this-year" => Period::CurrentYear,
            "30d" | "last-30-days" => Period::LastDays(30),
            "3m" | "last-3-months" => Period::LastMonths(3),
            "6m" | "last-6-months" => Period::LastMonths(6),
            "all" => Period::AllTime,
            other => {
                return Err(BillingError::InvalidInput(format!(
                    "unknown range `{}` (month, year, 30d, 3m, 6m, all, or START..END)",
                    other
                )))
            }
        };
        Ok(period)
    }
}

/// Restricts listings to one status, or lets everything through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(BillStatus),
}

impl StatusFilter {
    pub fn allows(&self, status: BillStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => *expected == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Search text and status predicate combined with AND.
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    needle: String,
    status: StatusFilter,
}

impl BillFilter {
    pub fn new(search: &str, status: StatusFilter) -> Self {
        Self {
            needle: search.to_lowercase(),
            status,
        }
    }

    pub fn matches(&self, bill: &Bill) -> bool {
        bill.matches_search(&self.needle) && self.status.allows(bill.status)
    }

    /// Lazily yields matching bills in input order. The iterator is `Clone`,
    /// so a view can be walked again without re-filtering the source.
    pub fn apply<'a>(&self, bills: &'a [Bill]) -> impl Iterator<Item = &'a Bill> + Clone + 'a {
        let filter = self.clone();
        bills.iter().filter(move |bill| filter.matches(bill))
    }
}

pub fn filter_bills<'a>(
    bills: &'a [Bill],
    search: &str,
    status: StatusFilter,
) -> impl Iterator<Item = &'a Bill> + Clone + 'a {
    BillFilter::new(search, status).apply(bills)
}

/// Case-insensitive match on client name, company, or tax id.
pub fn filter_clients<'a>(
    clients: &'a [Client],
    search: &str,
) -> impl Iterator<Item = &'a Client> + Clone + 'a {
    let needle = search.to_lowercase();
    clients.iter().filter(move |client| client.matches(&needle))
}

pub fn total_for_status(bills: &[Bill], status: BillStatus) -> Amount {
    sum_amounts(bills.iter().filter(|bill| bill.status == status))
}

pub fn count_for_status(bills: &[Bill], status: BillStatus) -> usize {
    bills.iter().filter(|bill| bill.status == status).count()
}

/// Paid revenue for bills whose date satisfies `predicate`.
pub fn revenue_matching<P>(bills: &[Bill], predicate: P) -> Amount
where
    P: Fn(NaiveDate) -> bool,
{
    sum_amounts(
        bills
            .iter()
            .filter(|bill| bill.status == BillStatus::Paid && predicate(bill.date)),
    )
}

pub fn revenue_for_period(bills: &[Bill], period: &Period, reference: NaiveDate) -> Amount {
    revenue_matching(bills, |date| period.contains(date, reference))
}

/// Paid revenue of the reference year divided by the number of paid bills;
/// zero when nothing has been paid.
pub fn average_bill_value(bills: &[Bill], reference: NaiveDate) -> Amount {
    let paid = count_for_status(bills, BillStatus::Paid);
    if paid == 0 {
        return Amount::ZERO;
    }
    revenue_for_period(bills, &Period::CurrentYear, reference).div_round(paid as u64)
}

pub fn outstanding(bills: &[Bill]) -> Amount {
    sum_amounts(bills.iter().filter(|bill| bill.status.is_outstanding()))
}

pub fn overdue_total(bills: &[Bill]) -> Amount {
    total_for_status(bills, BillStatus::Overdue)
}

pub fn total_received(payments: &[Payment]) -> Amount {
    sum_amounts(payments)
}

/// Count and amount of the bills in one status bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bucket {
    pub count: usize,
    pub amount: Amount,
}

/// Status partition of a bill set; every bill lands in exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusBreakdown {
    pub unpaid: Bucket,
    pub paid: Bucket,
    pub overdue: Bucket,
}

impl StatusBreakdown {
    pub fn of(bills: &[Bill]) -> Self {
        let mut breakdown = StatusBreakdown::default();
        for bill in bills {
            let bucket = breakdown.bucket_mut(bill.status);
            bucket.count += 1;
            bucket.amount += bill.amount;
        }
        breakdown
    }

    pub fn bucket(&self, status: BillStatus) -> Bucket {
        match status {
            BillStatus::Unpaid => self.unpaid,
            BillStatus::Paid => self.paid,
            BillStatus::Overdue => self.overdue,
        }
    }

    fn bucket_mut(&mut self, status: BillStatus) -> &mut Bucket {
        match status {
            BillStatus::Unpaid => &mut self.unpaid,
            BillStatus::Paid => &mut self.paid,
            BillStatus::Overdue => &mut self.overdue,
        }
    }

    pub fn total(&self) -> Bucket {
        Bucket {
            count: self.unpaid.count + self.paid.count + self.overdue.count,
            amount: self.unpaid.amount + self.paid.amount + self.overdue.amount,
        }
    }

    /// Bills not yet paid (unpaid plus overdue).
    pub fn pending_count(&self) -> usize {
        self.unpaid.count + self.overdue.count
    }
}

/// Paid revenue attributed to one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRevenue {
    pub client_id: u64,
    pub client_name: String,
    pub bill_count: usize,
    pub revenue: Amount,
}

/// Client-wise paid revenue, highest first. Grouping uses the client id; the
/// name shown is the snapshot from the client's most recent bill.
pub fn revenue_by_client(bills: &[Bill]) -> Vec<ClientRevenue> {
    let mut grouped: BTreeMap<u64, (ClientRevenue, NaiveDate)> = BTreeMap::new();
    for bill in bills.iter().filter(|bill| bill.is_paid()) {
        let (entry, latest) = grouped.entry(bill.client_id).or_insert_with(|| {
            (
                ClientRevenue {
                    client_id: bill.client_id,
                    client_name: bill.client_name.clone(),
                    bill_count: 0,
                    revenue: Amount::ZERO,
                },
                bill.date,
            )
        });
        entry.bill_count += 1;
        entry.revenue += bill.amount;
        if bill.date > *latest {
            *latest = bill.date;
            entry.client_name = bill.client_name.clone();
        }
    }
    let mut rows: Vec<ClientRevenue> = grouped.into_values().map(|(row, _)| row).collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.client_name.cmp(&b.client_name))
    });
    rows
}
