use diesel::prelude::*;

use crate::domain::money::base_subtotal;
use crate::domain::order::{Order as DomainOrder, OrderStatus};
use crate::domain::payment::{
    NewPayment as DomainNewPayment, NewPaymentMethod as DomainNewPaymentMethod,
    Payment as DomainPayment, PaymentMethod as DomainPaymentMethod, Settlement, SettlementQuote,
    TipBase,
};
use crate::models::order::SettleOrder;
use crate::models::payment::{
    NewPayment as DbNewPayment, NewPaymentMethod as DbNewPaymentMethod, Payment as DbPayment,
    PaymentMethod as DbPaymentMethod,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::order::{ensure_editable, load_order, load_order_row, priced_lines};
use crate::repository::table::release_table;
use crate::repository::{DieselRepository, PaymentReader, PaymentWriter};

impl PaymentReader for DieselRepository {
    fn get_payment_method_by_id(&self, id: i32) -> RepositoryResult<Option<DomainPaymentMethod>> {
        use crate::schema::payment_methods;

        let mut conn = self.conn()?;
        let method = payment_methods::table
            .find(id)
            .first::<DbPaymentMethod>(&mut conn)
            .optional()?;

        Ok(method.map(DomainPaymentMethod::from))
    }

    fn list_payments_for_order(&self, order_id: i32) -> RepositoryResult<Vec<DomainPayment>> {
        use crate::schema::payments;

        let mut conn = self.conn()?;
        let rows = payments::table
            .filter(payments::order_id.eq(order_id))
            .order(payments::id.asc())
            .load::<DbPayment>(&mut conn)?;

        rows.into_iter().map(DomainPayment::try_from).collect()
    }
}

impl PaymentWriter for DieselRepository {
    fn create_payment_method(
        &self,
        new_method: &DomainNewPaymentMethod,
    ) -> RepositoryResult<DomainPaymentMethod> {
        use crate::schema::payment_methods;

        let mut conn = self.conn()?;
        let created = diesel::insert_into(payment_methods::table)
            .values(&DbNewPaymentMethod::from(new_method))
            .get_result::<DbPaymentMethod>(&mut conn)?;

        Ok(created.into())
    }

    fn settle_order(
        &self,
        settlement: &Settlement,
    ) -> RepositoryResult<(DomainOrder, DomainPayment)> {
        use crate::schema::{orders, payment_methods, payments};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            let order_id = settlement.order_id;
            let row = load_order_row(conn, order_id)?;
            ensure_editable(&row, settlement.expected_version)?;

            if row.total_amount <= 0 {
                return Err(RepositoryError::ValidationError(format!(
                    "order {order_id} has nothing to pay"
                )));
            }

            let method = payment_methods::table
                .find(settlement.payment_method_id)
                .first::<DbPaymentMethod>(conn)
                .optional()?
                .ok_or_else(|| {
                    RepositoryError::ValidationError(format!(
                        "payment method {} does not exist",
                        settlement.payment_method_id
                    ))
                })?;
            if !method.active {
                return Err(RepositoryError::ValidationError(format!(
                    "payment method {} is disabled",
                    method.name
                )));
            }
            if settlement.received_amount.is_some() && !method.is_cash {
                return Err(RepositoryError::ValidationError(format!(
                    "received amount only applies to cash, {} is not cash",
                    method.name
                )));
            }

            let tip_base = match settlement.tip_base {
                TipBase::Menu => base_subtotal(&priced_lines(conn, order_id)?)?,
                TipBase::Order => row.subtotal,
            };

            let quote = SettlementQuote::compute(
                row.total_amount,
                tip_base,
                settlement.tip,
                settlement.received_amount,
            )?;

            let new_payment = DomainNewPayment::from_quote(settlement, &quote);
            let payment = diesel::insert_into(payments::table)
                .values(&DbNewPayment::from(&new_payment))
                .get_result::<DbPayment>(conn)?;

            diesel::update(orders::table.find(order_id))
                .set((
                    SettleOrder {
                        tip_amount: quote.tip_amount,
                        grand_total: quote.total_to_pay,
                        paid_amount: quote.total_to_pay,
                        change_amount: quote.change_amount,
                        status: OrderStatus::Paid.as_str(),
                        updated_at: settlement.updated_at,
                    },
                    orders::version.eq(orders::version + 1),
                ))
                .execute(conn)?;

            release_table(conn, row.table_id, settlement.updated_at)?;

            log::info!(
                "Order {order_id} settled with {}: paid {} (tip {}, change {})",
                method.name,
                quote.total_to_pay,
                quote.tip_amount,
                quote.change_amount
            );

            let order = load_order(conn, order_id)?;
            Ok((order, DomainPayment::try_from(payment)?))
        })
    }
}
