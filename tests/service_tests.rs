mod common;

use common::{date, service, setup_test_env};
use transport_billing::{
    core::calculator,
    core::services::{
        BillDraft, BillService, ClientDraft, ClientService, PaymentDetails, PaymentService,
        ServiceError,
    },
    currency::Amount,
    errors::BillingError,
    ledger::BillStatus,
};

#[test]
fn recording_a_payment_settles_the_bill_and_persists() {
    let (mut manager, _config) = setup_test_env();
    manager.create("Fleet");

    manager
        .with_current_mut(|ledger| {
            let acme = ClientService::add(ledger, ClientDraft::named("Acme Transport")).unwrap();
            let first = BillDraft::new(acme, date(2024, 6, 3), vec![service(5000)])
                .with_status(BillStatus::Paid);
            BillService::create(ledger, first).unwrap();
            let second = BillDraft::new(acme, date(2024, 6, 10), vec![service(3000)]);
            BillService::create(ledger, second).unwrap();
        })
        .unwrap();

    manager
        .with_current_mut(|ledger| {
            assert_eq!(calculator::outstanding(&ledger.bills), Amount::from_major(3000));
            let details = PaymentDetails::on(date(2024, 6, 15)).with_mode("NEFT");
            PaymentService::record(ledger, 2, details).unwrap();
        })
        .unwrap();
    manager.save().unwrap();

    manager.load("Fleet").unwrap();
    manager
        .with_current(|ledger| {
            let bill = ledger.bill(2).unwrap();
            assert_eq!(bill.status, BillStatus::Paid);
            let payments = PaymentService::for_bill(ledger, 2);
            assert_eq!(payments.len(), 1);
            assert_eq!(payments[0].amount, Amount::from_major(3000));
            assert_eq!(payments[0].mode.as_deref(), Some("NEFT"));
            assert_eq!(calculator::outstanding(&ledger.bills), Amount::ZERO);
        })
        .unwrap();
}

#[test]
fn rejected_payment_leaves_the_ledger_untouched() {
    let (mut manager, _config) = setup_test_env();
    manager.create("Fleet");
    manager
        .with_current_mut(|ledger| {
            let acme = ClientService::add(ledger, ClientDraft::named("Acme")).unwrap();
            BillService::create(ledger, BillDraft::new(acme, date(2024, 6, 3), vec![service(500)]))
                .unwrap();
            PaymentService::record(ledger, 1, PaymentDetails::on(date(2024, 6, 4))).unwrap();
            let snapshot = serde_json::to_string(&*ledger).unwrap();

            let again = PaymentService::record(ledger, 1, PaymentDetails::on(date(2024, 6, 5)));
            assert!(matches!(again, Err(ServiceError::Invalid(_))));
            let missing = PaymentService::record(ledger, 42, PaymentDetails::on(date(2024, 6, 5)));
            assert!(matches!(
                missing,
                Err(ServiceError::Core(BillingError::BillNotFound(42)))
            ));
            assert_eq!(serde_json::to_string(&*ledger).unwrap(), snapshot);
        })
        .unwrap();
}

#[test]
fn editing_services_recomputes_the_amount() {
    let (mut manager, _config) = setup_test_env();
    manager.create("Fleet");
    manager
        .with_current_mut(|ledger| {
            let acme = ClientService::add(ledger, ClientDraft::named("Acme")).unwrap();
            let id = BillService::create(
                ledger,
                BillDraft::new(acme, date(2024, 6, 3), vec![service(100), service(250)]),
            )
            .unwrap();
            assert_eq!(ledger.bill(id).unwrap().amount, Amount::from_major(350));

            let mut draft = BillDraft::from_bill(ledger.bill(id).unwrap());
            draft.services = vec![service(400)];
            BillService::update(ledger, id, draft).unwrap();
            assert_eq!(ledger.bill(id).unwrap().amount, Amount::from_major(400));
        })
        .unwrap();
}

#[test]
fn renaming_a_client_reaches_bills_only_when_they_are_saved_again() {
    let (mut manager, _config) = setup_test_env();
    manager.create("Fleet");
    manager
        .with_current_mut(|ledger| {
            let id = ClientService::add(ledger, ClientDraft::named("Acme")).unwrap();
            let draft = BillDraft::new(id, date(2024, 6, 3), vec![service(10)]);
            let bill = BillService::create(ledger, draft).unwrap();

            let mut draft = ClientDraft::from_client(ClientService::get(ledger, id).unwrap());
            draft.name = "Acme Roadways".into();
            ClientService::edit(ledger, id, draft).unwrap();
            assert_eq!(ledger.bill(bill).unwrap().client_name, "Acme");

            let draft = BillDraft::from_bill(ledger.bill(bill).unwrap());
            BillService::update(ledger, bill, draft).unwrap();
            assert_eq!(ledger.bill(bill).unwrap().client_name, "Acme Roadways");
        })
        .unwrap();
}

#[test]
fn overdue_sweep_respects_payment_terms() {
    let (mut manager, _config) = setup_test_env();
    manager.create("Fleet");
    manager
        .with_current_mut(|ledger| {
            let acme = ClientService::add(ledger, ClientDraft::named("Acme")).unwrap();
            for on in [date(2024, 5, 1), date(2024, 6, 1), date(2024, 6, 14)] {
                BillService::create(ledger, BillDraft::new(acme, on, vec![service(100)])).unwrap();
            }
            let changed = BillService::sweep_overdue(ledger, date(2024, 6, 15), 30);
            assert_eq!(changed, vec![1]);
            let changed = BillService::sweep_overdue(ledger, date(2024, 6, 15), 0);
            assert_eq!(changed, vec![2, 3]);
            assert_eq!(calculator::overdue_total(&ledger.bills), Amount::from_major(300));
        })
        .unwrap();
}
