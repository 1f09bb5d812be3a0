//! Read-only figures for the dashboard, reports, and payments views.

use chrono::NaiveDate;

use crate::core::calculator::{self, ClientRevenue, Period, StatusBreakdown};
use crate::currency::Amount;
use crate::ledger::{Bill, BillStatus, Ledger};

const RECENT_BILLS: usize = 4;

#[derive(Debug, Clone)]
pub struct DashboardSummary {
    pub reference: NaiveDate,
    pub breakdown: StatusBreakdown,
    pub client_count: usize,
    pub monthly_revenue: Amount,
    pub overdue_amount: Amount,
    pub recent_bills: Vec<Bill>,
}

#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub reference: NaiveDate,
    pub period: Period,
    pub monthly_revenue: Amount,
    pub yearly_revenue: Amount,
    pub period_revenue: Amount,
    pub total_bills: usize,
    pub paid_bills: usize,
    pub pending_bills: usize,
    pub average_bill_value: Amount,
    pub outstanding: Amount,
    pub overdue: Amount,
    pub received: Amount,
    pub by_client: Vec<ClientRevenue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentsOverview {
    pub received: Amount,
    pub outstanding: Amount,
    pub overdue: Amount,
    pub overdue_count: usize,
}

pub struct SummaryService;

impl SummaryService {
    pub fn dashboard(ledger: &Ledger, reference: NaiveDate) -> DashboardSummary {
        let bills = &ledger.bills;
        let mut recent: Vec<&Bill> = bills.iter().collect();
        // Newest first; ties keep the higher bill number on top.
        recent.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        DashboardSummary {
            reference,
            breakdown: StatusBreakdown::of(bills),
            client_count: ledger.clients.len(),
            monthly_revenue: calculator::revenue_for_period(
                bills,
                &Period::CurrentMonth,
                reference,
            ),
            overdue_amount: calculator::overdue_total(bills),
            recent_bills: recent.into_iter().take(RECENT_BILLS).cloned().collect(),
        }
    }

    pub fn report(ledger: &Ledger, reference: NaiveDate, period: Period) -> ReportSummary {
        let bills = &ledger.bills;
        let breakdown = StatusBreakdown::of(bills);
        ReportSummary {
            reference,
            period,
            monthly_revenue: calculator::revenue_for_period(
                bills,
                &Period::CurrentMonth,
                reference,
            ),
            yearly_revenue: calculator::revenue_for_period(bills, &Period::CurrentYear, reference),
            period_revenue: calculator::revenue_for_period(bills, &period, reference),
            total_bills: breakdown.total().count,
            paid_bills: breakdown.paid.count,
            pending_bills: breakdown.pending_count(),
            average_bill_value: calculator::average_bill_value(bills, reference),
            outstanding: calculator::outstanding(bills),
            overdue: calculator::overdue_total(bills),
            received: calculator::total_received(&ledger.payments),
            by_client: calculator::revenue_by_client(bills),
        }
    }

    pub fn payments_overview(ledger: &Ledger) -> PaymentsOverview {
        PaymentsOverview {
            received: calculator::total_received(&ledger.payments),
            outstanding: calculator::outstanding(&ledger.bills),
            overdue: calculator::overdue_total(&ledger.bills),
            overdue_count: calculator::count_for_status(&ledger.bills, BillStatus::Overdue),
        }
    }
}
