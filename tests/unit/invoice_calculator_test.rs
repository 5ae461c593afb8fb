/// Property-based tests for invoice calculation
///
/// Line amounts are rounded half-up to two decimals; aggregates are sums of
/// the rounded line values, and payable = net + tax always holds exactly.
use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use invoiceflow::core::Currency;
use invoiceflow::modules::invoices::models::{LineItemRequest, Recipient, Supplier};
use invoiceflow::modules::invoices::{InvoiceCalculator, InvoiceRequest};

fn recipient(name: &str) -> Recipient {
    Recipient {
        name: name.to_string(),
        email: None,
        phone: None,
        tin: None,
        registration_number: None,
        address_line1: None,
        postcode: None,
        city: None,
        state: None,
        country_code: None,
    }
}

fn supplier() -> Supplier {
    Supplier {
        name: "Acme Learning Sdn Bhd".to_string(),
        tin: None,
        registration_number: None,
        msic_code: None,
        business_activity_description: None,
    }
}

fn request(items: Vec<LineItemRequest>, tax_rate: Option<Decimal>) -> InvoiceRequest {
    InvoiceRequest {
        invoice_type: "01".to_string(),
        currency: Currency::MYR,
        due_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        tax_rate,
        recipient: recipient("Alice Tan"),
        supplier: supplier(),
        items,
        original_invoice_ref: None,
    }
}

fn item(quantity: u32, unit_price: Decimal) -> LineItemRequest {
    LineItemRequest {
        item_name: "Course material".to_string(),
        quantity,
        unit_price,
        tax_rate: None,
        discount_amount: None,
        classification_code: None,
    }
}

fn line_strategy() -> impl Strategy<Value = LineItemRequest> {
    (
        1u32..50u32,
        0i64..10_000_000i64,   // unit price in thousandths
        0u32..=100u32,         // discount as percent of subtotal
        prop::option::of(0i64..=10_000i64), // line tax rate in hundredths of a percent
    )
        .prop_map(|(quantity, price_mills, discount_pct, rate_bp)| {
            let unit_price = Decimal::new(price_mills, 3);
            let subtotal = Currency::MYR.round(Decimal::from(quantity) * unit_price);
            let discount = Currency::MYR.round(subtotal * Decimal::from(discount_pct) / dec!(100));

            LineItemRequest {
                item_name: "Line".to_string(),
                quantity,
                unit_price,
                tax_rate: rate_bp.map(|bp| Decimal::new(bp, 2)),
                discount_amount: Some(discount),
                classification_code: None,
            }
        })
}

proptest! {
    /// Property: payable = net + tax, and every aggregate is the sum of its lines
    #[test]
    fn test_totals_are_sums_of_rounded_lines(
        items in prop::collection::vec(line_strategy(), 1..8),
        invoice_rate_bp in prop::option::of(0i64..=10_000i64),
    ) {
        let invoice_rate = invoice_rate_bp.map(|bp| Decimal::new(bp, 2));
        let calculated = InvoiceCalculator::new()
            .calculate(&request(items, invoice_rate))
            .unwrap();

        let net: Decimal = calculated.items.iter().map(|i| i.net_amount).sum();
        let tax: Decimal = calculated.items.iter().map(|i| i.tax_amount).sum();
        let discount: Decimal = calculated.items.iter().map(|i| i.discount_amount).sum();

        prop_assert_eq!(calculated.total_net_amount, net);
        prop_assert_eq!(calculated.total_tax_amount, tax);
        prop_assert_eq!(calculated.total_discount_amount, discount);
        prop_assert_eq!(
            calculated.total_payable_amount,
            calculated.total_net_amount + calculated.total_tax_amount
        );
        prop_assert!(calculated.total_payable_amount >= Decimal::ZERO);
    }

    /// Property: each line is rounded to two decimals and net never goes negative
    #[test]
    fn test_line_amounts_are_rounded(
        items in prop::collection::vec(line_strategy(), 1..8),
    ) {
        let calculated = InvoiceCalculator::new()
            .calculate(&request(items, Some(dec!(6))))
            .unwrap();

        for line in &calculated.items {
            prop_assert!(line.subtotal.scale() <= 2);
            prop_assert!(line.tax_amount.scale() <= 2);
            prop_assert_eq!(line.net_amount, line.subtotal - line.discount_amount);
            prop_assert_eq!(line.line_total, line.net_amount + line.tax_amount);
            prop_assert!(line.net_amount >= Decimal::ZERO);
        }
    }

    /// Property: lines without their own rate inherit the invoice rate
    #[test]
    fn test_invoice_rate_is_the_fallback(
        quantity in 1u32..20u32,
        price_cents in 1i64..1_000_000i64,
        rate in 0u32..=30u32,
    ) {
        let rate = Decimal::from(rate);
        let calculated = InvoiceCalculator::new()
            .calculate(&request(vec![item(quantity, Decimal::new(price_cents, 2))], Some(rate)))
            .unwrap();

        prop_assert_eq!(calculated.items[0].tax_rate, rate);
        prop_assert_eq!(calculated.tax_rate, rate);
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_half_up_rounding_at_line_level() {
        // 3 × 10.005 = 30.015 -> 30.02; 8% of 30.02 = 2.4016 -> 2.40
        let mut line = item(3, dec!(10.005));
        line.tax_rate = Some(dec!(8));

        let calculated = InvoiceCalculator::new()
            .calculate(&request(vec![line], None))
            .unwrap();

        assert_eq!(calculated.items[0].subtotal, dec!(30.02));
        assert_eq!(calculated.items[0].tax_amount, dec!(2.40));
        assert_eq!(calculated.total_net_amount, dec!(30.02));
        assert_eq!(calculated.total_tax_amount, dec!(2.40));
        assert_eq!(calculated.total_payable_amount, dec!(32.42));
    }

    #[test]
    fn test_discount_applies_before_tax() {
        let mut line = item(2, dec!(50.00));
        line.discount_amount = Some(dec!(10.00));
        line.tax_rate = Some(dec!(10));

        let calculated = InvoiceCalculator::new()
            .calculate(&request(vec![line], None))
            .unwrap();

        assert_eq!(calculated.items[0].net_amount, dec!(90.00));
        assert_eq!(calculated.items[0].tax_amount, dec!(9.00));
        assert_eq!(calculated.total_discount_amount, dec!(10.00));
        assert_eq!(calculated.total_payable_amount, dec!(99.00));
    }

    #[test]
    fn test_line_rate_overrides_invoice_rate() {
        let mut exempt = item(1, dec!(100));
        exempt.tax_rate = Some(Decimal::ZERO);
        let taxed = item(1, dec!(100));

        let calculated = InvoiceCalculator::new()
            .calculate(&request(vec![exempt, taxed], Some(dec!(6))))
            .unwrap();

        assert_eq!(calculated.items[0].tax_amount, Decimal::ZERO);
        assert_eq!(calculated.items[1].tax_amount, dec!(6.00));
        assert_eq!(calculated.total_payable_amount, dec!(206.00));
    }

    #[test]
    fn test_no_rate_means_no_tax() {
        let calculated = InvoiceCalculator::new()
            .calculate(&request(vec![item(4, dec!(20.40))], None))
            .unwrap();

        assert_eq!(calculated.total_tax_amount, Decimal::ZERO);
        assert_eq!(calculated.total_payable_amount, dec!(81.60));
    }

    #[test]
    fn test_discount_above_subtotal_rejected() {
        let mut line = item(1, dec!(10));
        line.discount_amount = Some(dec!(10.01));

        let err = InvoiceCalculator::new()
            .calculate(&request(vec![line], None))
            .unwrap_err();

        assert!(err.to_string().contains("exceeds subtotal"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_empty_items_rejected() {
        let err = InvoiceCalculator::new()
            .calculate(&request(vec![], None))
            .unwrap_err();

        assert!(err.to_string().contains("at least one line item"));
    }

    #[test]
    fn test_oversized_amounts_are_errors_not_panics() {
        let mut line = item(10, Decimal::MAX);
        let err = InvoiceCalculator::new()
            .calculate(&request(vec![line.clone()], None))
            .unwrap_err();
        assert!(err.to_string().contains("unit price cannot exceed"), "{}", err);
        assert!(!err.is_retryable());

        // Each line fits, the total does not
        line.unit_price = dec!(9999999999999.99);
        line.quantity = 1;
        let err = InvoiceCalculator::new()
            .calculate(&request(vec![line.clone(), line], None))
            .unwrap_err();
        assert!(err.to_string().contains("Total net amount exceeds"), "{}", err);
    }

    #[test]
    fn test_tax_rate_above_hundred_rejected() {
        let result = InvoiceCalculator::new().calculate(&request(vec![item(1, dec!(10))], Some(dec!(101))));
        assert!(result.is_err());
    }

    #[test]
    fn test_invoice_number_uses_recipient_and_issue_time() {
        // 16:30 UTC = 00:30 MYT the next day
        let issued_at = Utc.with_ymd_and_hms(2025, 10, 31, 16, 30, 0).unwrap();

        let calculated = InvoiceCalculator::new()
            .calculate_at(&request(vec![item(1, dec!(10))], None), issued_at)
            .unwrap();

        assert!(calculated.invoice_no.starts_with("INV-2511010030-ALICE-"));
        assert_eq!(calculated.issued_date, issued_at);
    }

    #[test]
    fn test_each_calculation_gets_a_new_invoice_number() {
        let calculator = InvoiceCalculator::new();
        let request = request(vec![item(1, dec!(10))], None);
        let issued_at = Utc::now();

        let numbers: std::collections::HashSet<String> = (0..10)
            .map(|_| calculator.calculate_at(&request, issued_at).unwrap().invoice_no)
            .collect();

        assert!(numbers.len() > 1);
    }
}
