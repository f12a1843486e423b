use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::payment::{
    NewPayment as DomainNewPayment, NewPaymentMethod as DomainNewPaymentMethod,
    Payment as DomainPayment, PaymentMethod as DomainPaymentMethod, PaymentStatus,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::payment_methods)]
pub struct PaymentMethod {
    pub id: i32,
    pub name: String,
    pub is_cash: bool,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::payment_methods)]
pub struct NewPaymentMethod<'a> {
    pub name: &'a str,
    pub is_cash: bool,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::payments)]
pub struct Payment {
    pub id: i32,
    pub order_id: i32,
    pub payment_method_id: i32,
    pub amount: i64,
    pub tip_amount: i64,
    pub tip_percentage: Option<f64>,
    pub total_paid: i64,
    pub received_amount: Option<i64>,
    pub change_amount: i64,
    pub status: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment<'a> {
    pub order_id: i32,
    pub payment_method_id: i32,
    pub amount: i64,
    pub tip_amount: i64,
    pub tip_percentage: Option<f64>,
    pub total_paid: i64,
    pub received_amount: Option<i64>,
    pub change_amount: i64,
    pub status: &'a str,
    pub reference: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl From<PaymentMethod> for DomainPaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        Self {
            id: value.id,
            name: value.name,
            is_cash: value.is_cash,
            active: value.active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewPaymentMethod> for NewPaymentMethod<'a> {
    fn from(value: &'a DomainNewPaymentMethod) -> Self {
        Self {
            name: value.name.as_str(),
            is_cash: value.is_cash,
        }
    }
}

impl TryFrom<Payment> for DomainPayment {
    type Error = RepositoryError;

    fn try_from(value: Payment) -> RepositoryResult<Self> {
        let status = value
            .status
            .parse::<PaymentStatus>()
            .map_err(RepositoryError::InvalidData)?;

        Ok(Self {
            id: value.id,
            order_id: value.order_id,
            payment_method_id: value.payment_method_id,
            amount: value.amount,
            tip_amount: value.tip_amount,
            tip_percentage: value.tip_percentage,
            total_paid: value.total_paid,
            received_amount: value.received_amount,
            change_amount: value.change_amount,
            status,
            reference: value.reference,
            notes: value.notes,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewPayment> for NewPayment<'a> {
    fn from(value: &'a DomainNewPayment) -> Self {
        Self {
            order_id: value.order_id,
            payment_method_id: value.payment_method_id,
            amount: value.amount,
            tip_amount: value.tip_amount,
            tip_percentage: value.tip_percentage,
            total_paid: value.total_paid,
            received_amount: value.received_amount,
            change_amount: value.change_amount,
            status: value.status.as_str(),
            reference: value.reference.as_deref(),
            notes: value.notes.as_deref(),
            updated_at: value.updated_at,
        }
    }
}
