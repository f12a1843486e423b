use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::change_feed::{ChangeEvent, ChangeFeed, Entity};
use crate::domain::invoice::Invoice;
use crate::domain::order::Order;
use crate::domain::payment::{Payment, TipBase};
use crate::forms::payments::SettleOrderForm;
use crate::repository::{MenuItemReader, PaymentReader, PaymentWriter, TableReader};
use crate::services::{ServiceError, ServiceResult, rejected};

/// Failure reported by an invoice printer.
#[derive(Debug, Error)]
#[error("invoice printing failed: {0}")]
pub struct PrintError(pub String);

/// Receives the invoice of every settled order.
pub trait InvoicePrinter: Send + Sync {
    fn print(&self, invoice: &Invoice) -> Result<(), PrintError>;
}

/// Printer that writes invoices to the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogInvoicePrinter;

impl InvoicePrinter for LogInvoicePrinter {
    fn print(&self, invoice: &Invoice) -> Result<(), PrintError> {
        log::info!(
            "Invoice for order {} at table {} paid by {}",
            invoice.order_id,
            invoice.table_number,
            invoice.payment_method
        );
        for line in &invoice.items {
            log::info!(
                "  {} x {} @ {} = {}",
                line.quantity,
                line.name,
                line.unit_price,
                line.subtotal
            );
        }
        log::info!(
            "  subtotal {} tax {} tip {} total {}",
            invoice.subtotal,
            invoice.tax_amount,
            invoice.tip_amount,
            invoice.grand_total
        );
        if let Some(received) = invoice.received_amount {
            log::info!("  received {received} change {}", invoice.change_amount);
        }
        Ok(())
    }
}

/// Result of a committed settlement.
#[derive(Debug, Serialize)]
pub struct SettlementOutcome {
    pub order: Order,
    pub payment: Payment,
    /// Invoice handed to the printer, when it could be assembled.
    pub invoice: Option<Invoice>,
    /// Set when the invoice could not be produced. The payment stands.
    pub print_warning: Option<String>,
}

/// Settles an order: records the payment, closes the order, frees the table
/// and prints the invoice.
pub fn settle_order<R, P>(
    repo: &R,
    feed: &ChangeFeed,
    printer: &P,
    order_id: i32,
    form: SettleOrderForm,
    tip_base: TipBase,
) -> ServiceResult<SettlementOutcome>
where
    R: PaymentReader + PaymentWriter + TableReader + MenuItemReader + ?Sized,
    P: InvoicePrinter + ?Sized,
{
    let settlement = form
        .into_settlement(order_id, tip_base)
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let (order, payment) = repo
        .settle_order(&settlement)
        .map_err(|err| rejected(format_args!("Settlement of order {order_id} rejected"), err))?;

    log::info!(
        "Order {order_id} paid: {} (tip {}, change {})",
        payment.total_paid,
        payment.tip_amount,
        payment.change_amount
    );

    feed.publish_all([
        ChangeEvent::inserted(Entity::Payments, payment.id),
        ChangeEvent::updated(Entity::Orders, order.id),
        ChangeEvent::updated(Entity::Tables, order.table_id),
    ]);

    let (invoice, print_warning) = match print_invoice(repo, printer, &order, &payment) {
        Ok(invoice) => (Some(invoice), None),
        Err((invoice, err)) => {
            log::warn!("Order {order_id} settled but its invoice was not printed: {err}");
            (invoice, Some(err))
        }
    };

    Ok(SettlementOutcome {
        order,
        payment,
        invoice,
        print_warning,
    })
}

/// Build and print the invoice. On failure returns the invoice when it was
/// assembled, together with the reason.
fn print_invoice<R, P>(
    repo: &R,
    printer: &P,
    order: &Order,
    payment: &Payment,
) -> Result<Invoice, (Option<Invoice>, String)>
where
    R: PaymentReader + TableReader + MenuItemReader + ?Sized,
    P: InvoicePrinter + ?Sized,
{
    let invoice = build_invoice(repo, order, payment).map_err(|err| (None, err.to_string()))?;

    match printer.print(&invoice) {
        Ok(()) => Ok(invoice),
        Err(err) => Err((Some(invoice), err.to_string())),
    }
}

fn build_invoice<R>(repo: &R, order: &Order, payment: &Payment) -> ServiceResult<Invoice>
where
    R: PaymentReader + TableReader + MenuItemReader + ?Sized,
{
    let table = repo
        .get_table_by_id(order.table_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;
    let method = repo
        .get_payment_method_by_id(payment.payment_method_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    let menu_item_ids: Vec<i32> = order.items.iter().map(|item| item.menu_item_id).collect();
    let item_names: HashMap<i32, String> = repo
        .list_menu_items_by_ids(&menu_item_ids)
        .map_err(ServiceError::from)?
        .into_iter()
        .map(|item| (item.id, item.name))
        .collect();

    Ok(Invoice::build(order, &table, payment, &method, &item_names))
}

/// Lists the payments recorded for an order.
pub fn list_payments<R>(repo: &R, order_id: i32) -> ServiceResult<Vec<Payment>>
where
    R: PaymentReader + ?Sized,
{
    repo.list_payments_for_order(order_id)
        .map_err(ServiceError::from)
}

#[cfg(test)]
mod tests {
    use mockall::mock;

    use super::*;
    use crate::domain::menu_item::MenuItem;
    use crate::domain::order::OrderStatus;
    use crate::domain::payment::{PaymentMethod, Settlement, SettlementError, Tip};
    use crate::domain::table::{Table, TableListQuery};
    use crate::repository::errors::{RepositoryError, RepositoryResult};
    use crate::repository::mock::{
        MockMenuItemReader, MockPaymentReader, MockPaymentWriter, MockTableReader,
    };
    use crate::services::fixtures::{
        datetime, drain, sample_method, sample_order, sample_payment, sample_table,
    };

    mock! {
        pub Printer {}

        impl InvoicePrinter for Printer {
            fn print(&self, invoice: &Invoice) -> Result<(), PrintError>;
        }
    }

    struct FakeRepo {
        payment_reader: MockPaymentReader,
        payment_writer: MockPaymentWriter,
        table_reader: MockTableReader,
        menu_item_reader: MockMenuItemReader,
    }

    impl FakeRepo {
        fn new() -> Self {
            Self {
                payment_reader: MockPaymentReader::new(),
                payment_writer: MockPaymentWriter::new(),
                table_reader: MockTableReader::new(),
                menu_item_reader: MockMenuItemReader::new(),
            }
        }

        /// Expect the lookups made while assembling an invoice.
        fn with_invoice_lookups(mut self) -> Self {
            self.table_reader
                .expect_get_table_by_id()
                .returning(|id| Ok(Some(sample_table(id, true))));
            self.payment_reader
                .expect_get_payment_method_by_id()
                .returning(|id| Ok(Some(sample_method(id, true))));
            self.menu_item_reader
                .expect_list_menu_items_by_ids()
                .returning(|ids| {
                    Ok(ids
                        .iter()
                        .map(|&id| MenuItem {
                            id,
                            name: format!("Dish {id}"),
                            price: 21600.0,
                            base_price: Some(20000.0),
                            tax_rate: 8.0,
                            fee_percent: 0.0,
                            active: true,
                            created_at: datetime(),
                            updated_at: datetime(),
                        })
                        .collect())
                });
            self
        }
    }

    impl PaymentReader for FakeRepo {
        fn get_payment_method_by_id(&self, id: i32) -> RepositoryResult<Option<PaymentMethod>> {
            self.payment_reader.get_payment_method_by_id(id)
        }

        fn list_payments_for_order(&self, order_id: i32) -> RepositoryResult<Vec<Payment>> {
            self.payment_reader.list_payments_for_order(order_id)
        }
    }

    impl PaymentWriter for FakeRepo {
        fn create_payment_method(
            &self,
            new_method: &crate::domain::payment::NewPaymentMethod,
        ) -> RepositoryResult<PaymentMethod> {
            self.payment_writer.create_payment_method(new_method)
        }

        fn settle_order(&self, settlement: &Settlement) -> RepositoryResult<(Order, Payment)> {
            self.payment_writer.settle_order(settlement)
        }
    }

    impl TableReader for FakeRepo {
        fn get_table_by_id(&self, id: i32) -> RepositoryResult<Option<Table>> {
            self.table_reader.get_table_by_id(id)
        }

        fn list_tables(&self, query: TableListQuery) -> RepositoryResult<Vec<Table>> {
            self.table_reader.list_tables(query)
        }
    }

    impl MenuItemReader for FakeRepo {
        fn get_menu_item_by_id(&self, id: i32) -> RepositoryResult<Option<MenuItem>> {
            self.menu_item_reader.get_menu_item_by_id(id)
        }

        fn list_menu_items_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<MenuItem>> {
            self.menu_item_reader.list_menu_items_by_ids(ids)
        }
    }

    fn settle_form(received_amount: Option<f64>) -> SettleOrderForm {
        SettleOrderForm {
            payment_method_id: 1,
            tip: Tip::Percentage(10.0),
            received_amount,
            reference: None,
            notes: None,
            expected_version: None,
        }
    }

    /// Order of 20000 + 8% tax settled with a 10% tip and 25000 in cash.
    fn paid_order(settlement: &Settlement) -> RepositoryResult<(Order, Payment)> {
        let mut order = sample_order(settlement.order_id, 2, OrderStatus::Paid);
        order.subtotal = 20000;
        order.tax_amount = 1600;
        order.total_amount = 21600;
        order.tip_amount = 2000;
        order.grand_total = 23600;
        order.paid_amount = 23600;
        order.change_amount = 1400;

        let mut payment = sample_payment(30, &order, settlement.payment_method_id);
        payment.tip_percentage = Some(10.0);
        payment.received_amount = Some(25000);
        payment.change_amount = 1400;
        Ok((order, payment))
    }

    #[test]
    fn settle_order_prints_invoice_and_publishes() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();
        let mut repo = FakeRepo::new().with_invoice_lookups();
        repo.payment_writer
            .expect_settle_order()
            .withf(|settlement| {
                settlement.order_id == 7
                    && settlement.received_amount == Some(25000.0)
                    && settlement.tip_base == TipBase::Menu
            })
            .returning(paid_order);
        let mut printer = MockPrinter::new();
        printer
            .expect_print()
            .withf(|invoice| {
                invoice.order_id == 7
                    && invoice.table_number == 20
                    && invoice.grand_total == 23600
                    && invoice.items[0].name == "Dish 101"
            })
            .times(1)
            .returning(|_| Ok(()));

        let outcome = settle_order(
            &repo,
            &feed,
            &printer,
            7,
            settle_form(Some(25000.0)),
            TipBase::Menu,
        )
        .expect("expected the order to be settled");

        assert_eq!(outcome.order.status, OrderStatus::Paid);
        assert_eq!(outcome.payment.change_amount, 1400);
        assert_eq!(
            outcome.order.grand_total,
            outcome.order.total_amount + outcome.order.tip_amount
        );
        assert!(outcome.invoice.is_some());
        assert!(outcome.print_warning.is_none());
        assert_eq!(
            drain(&mut rx),
            vec![
                ChangeEvent::inserted(Entity::Payments, 30),
                ChangeEvent::updated(Entity::Orders, 7),
                ChangeEvent::updated(Entity::Tables, 2),
            ]
        );
    }

    #[test]
    fn printer_failure_is_a_warning() {
        let feed = ChangeFeed::default();
        let mut repo = FakeRepo::new().with_invoice_lookups();
        repo.payment_writer
            .expect_settle_order()
            .returning(paid_order);
        let mut printer = MockPrinter::new();
        printer
            .expect_print()
            .returning(|_| Err(PrintError("paper jam".into())));

        let outcome = settle_order(
            &repo,
            &feed,
            &printer,
            7,
            settle_form(Some(25000.0)),
            TipBase::Menu,
        )
        .expect("settlement must survive a printer failure");

        assert_eq!(outcome.order.status, OrderStatus::Paid);
        assert!(outcome.invoice.is_some());
        assert!(
            outcome
                .print_warning
                .is_some_and(|warning| warning.contains("paper jam"))
        );
    }

    #[test]
    fn missing_invoice_data_is_a_warning() {
        let feed = ChangeFeed::default();
        let mut repo = FakeRepo::new();
        repo.payment_writer
            .expect_settle_order()
            .returning(paid_order);
        repo.table_reader
            .expect_get_table_by_id()
            .returning(|_| Err(RepositoryError::NotFound));
        let mut printer = MockPrinter::new();
        printer.expect_print().never();

        let outcome = settle_order(&repo, &feed, &printer, 7, settle_form(None), TipBase::Menu)
            .expect("settlement must survive a missing invoice");

        assert!(outcome.invoice.is_none());
        assert!(outcome.print_warning.is_some());
    }

    #[test]
    fn insufficient_cash_is_rejected_without_events() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();
        let mut repo = FakeRepo::new();
        repo.payment_writer.expect_settle_order().returning(|_| {
            Err(RepositoryError::Settlement(
                SettlementError::InsufficientCash {
                    due: 23600,
                    received: 20000,
                },
            ))
        });
        let mut printer = MockPrinter::new();
        printer.expect_print().never();

        let result = settle_order(
            &repo,
            &feed,
            &printer,
            7,
            settle_form(Some(20000.0)),
            TipBase::Menu,
        );

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn invalid_tip_is_a_form_error() {
        let feed = ChangeFeed::default();
        let repo = FakeRepo::new();
        let printer = MockPrinter::new();
        let mut form = settle_form(None);
        form.tip = Tip::Percentage(250.0);

        let result = settle_order(&repo, &feed, &printer, 7, form, TipBase::Menu);

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn log_printer_accepts_invoices() {
        let (order, payment) = paid_order(&Settlement::new(7, 1)).expect("fixture");
        let invoice = Invoice::build(
            &order,
            &sample_table(2, true),
            &payment,
            &sample_method(1, true),
            &HashMap::new(),
        );

        assert!(LogInvoicePrinter.print(&invoice).is_ok());
        assert_eq!(invoice.items[0].name, "#101");
    }
}
