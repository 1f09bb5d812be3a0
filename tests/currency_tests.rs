use transport_billing::{
    config::Config,
    currency::{format_inr, Amount, CurrencyFormatter, InrFormatter},
};

#[test]
fn default_config_renders_whole_rupees_with_indian_grouping() {
    let formatter = Config::default().formatter();
    assert_eq!(formatter.format_amount(Amount::from_major(1_234_567)), "₹12,34,567");
    assert_eq!(formatter.format_amount(Amount::from_minor(99_950)), "₹1,000");
    assert_eq!(formatter.format_amount(Amount::ZERO), "₹0");
}

#[test]
fn configured_fraction_digits_and_locale_apply() {
    let mut config = Config::default();
    config.set("fraction_digits", "2").unwrap();
    assert_eq!(
        config.formatter().format_amount(Amount::from_minor(12_345_678)),
        "₹1,23,456.78"
    );

    let western = InrFormatter::new("USD", "en-US", 2);
    assert_eq!(western.format_amount(Amount::from_minor(12_345_678)), "$123,456.78");
    assert!(config.set("fraction_digits", "3").is_err());
}

#[test]
fn parsing_accepts_what_users_type() {
    assert_eq!(Amount::parse("₹1,25,000").unwrap(), Amount::from_major(125_000));
    assert_eq!(Amount::parse("750.5").unwrap(), Amount::from_minor(75_050));
    assert!(Amount::parse("12.345").is_err());
    assert!(Amount::parse("-10").is_err());
    assert_eq!(format_inr(Amount::parse("2,500").unwrap()), "₹2,500");
}
