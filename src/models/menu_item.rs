use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::menu_item::{MenuItem as DomainMenuItem, NewMenuItem as DomainNewMenuItem};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::menu_items)]
pub struct MenuItem {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub base_price: Option<f64>,
    pub tax_rate: f64,
    pub fee_percent: f64,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::menu_items)]
pub struct NewMenuItem<'a> {
    pub name: &'a str,
    pub price: f64,
    pub base_price: Option<f64>,
    pub tax_rate: f64,
    pub fee_percent: f64,
}

impl From<MenuItem> for DomainMenuItem {
    fn from(value: MenuItem) -> Self {
        Self {
            id: value.id,
            name: value.name,
            price: value.price,
            base_price: value.base_price,
            tax_rate: value.tax_rate,
            fee_percent: value.fee_percent,
            active: value.active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewMenuItem> for NewMenuItem<'a> {
    fn from(value: &'a DomainNewMenuItem) -> Self {
        Self {
            name: value.name.as_str(),
            price: value.price,
            base_price: value.base_price,
            tax_rate: value.tax_rate,
            fee_percent: value.fee_percent,
        }
    }
}
