use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use transport_billing::{
    core::calculator::{self, Period, StatusFilter},
    core::services::SummaryService,
    currency::Amount,
    ledger::{Bill, BillStatus, Client, Ledger, Service},
};

fn build_ledger(bills: usize) -> Ledger {
    let mut ledger = Ledger::new("Bench");
    let clients: Vec<u64> = (0..50)
        .map(|n| ledger.add_client(Client::new(format!("Client {n}"))))
        .collect();
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    for idx in 0..bills {
        let client = clients[idx % clients.len()];
        let status = BillStatus::ALL[idx % BillStatus::ALL.len()];
        let services = (0..3)
            .map(|leg| {
                Service::new(
                    format!("KA-{:02}", leg),
                    "Hubli",
                    "Goa",
                    Amount::from_minor(((idx * 37 + leg * 11) % 90_000) as i64 * 100),
                )
            })
            .collect();
        let on = start + Duration::days((idx % 900) as i64);
        ledger.add_bill(Bill::new(client, format!("Client {}", client - 1), on, status, services));
    }
    ledger
}

fn bench_calculator(c: &mut Criterion) {
    let ledger = build_ledger(10_000);
    let reference = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

    c.bench_function("report_10k_bills", |b| {
        b.iter(|| SummaryService::report(black_box(&ledger), reference, Period::LastMonths(6)))
    });
    c.bench_function("filter_10k_bills", |b| {
        b.iter(|| {
            calculator::filter_bills(
                black_box(&ledger.bills),
                "client 4",
                StatusFilter::Only(BillStatus::Unpaid),
            )
            .count()
        })
    });
}

criterion_group!(benches, bench_calculator);
criterion_main!(benches);
