use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, ContentEncoding};
use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use futures::{StreamExt, future};
use serde::Deserialize;

use crate::change_feed::{ChangeFeed, Entity, FeedMessage, feed_stream};
use crate::config::ServerConfig;
use crate::forms::order_items::{
    AddOrderItemForm, RemoveQuantityForm, ReplaceSidesForm, UpdateQuantityForm,
};
use crate::forms::orders::{CreateOrderForm, TransferOrderForm, UpdateStatusForm, VersionForm};
use crate::forms::payments::SettleOrderForm;
use crate::repository::DieselRepository;
use crate::routes::{error_response, respond};
use crate::services::payments::InvoicePrinter;
use crate::services::{order_items, orders, payments, tables};

#[get("/v1/tables")]
/// List tables, optionally only the available ones.
pub async fn api_v1_tables(
    params: web::Query<tables::TablesQuery>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    respond(tables::list_tables(repo.get_ref(), params.0), StatusCode::OK)
}

#[get("/v1/tables/{table_id}")]
pub async fn api_v1_table(
    path: web::Path<i32>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    respond(
        tables::get_table(repo.get_ref(), path.into_inner()),
        StatusCode::OK,
    )
}

#[post("/v1/tables/{table_id}/sync")]
/// Rewrite one table's occupancy flag from its active orders.
pub async fn api_v1_sync_table(
    path: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    respond(
        tables::sync_table(repo.get_ref(), feed.get_ref(), path.into_inner()),
        StatusCode::OK,
    )
}

#[post("/v1/tables/reconcile")]
/// Rewrite every occupancy flag and return the corrections made.
pub async fn api_v1_reconcile_tables(
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    respond(
        tables::reconcile_tables(repo.get_ref(), feed.get_ref()),
        StatusCode::OK,
    )
}

#[get("/v1/orders")]
/// Return a page of orders filtered by status or table.
pub async fn api_v1_orders(
    params: web::Query<orders::OrdersQuery>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    respond(orders::list_orders(repo.get_ref(), params.0), StatusCode::OK)
}

#[post("/v1/orders")]
/// Open an order with its initial cart on a free table.
pub async fn api_v1_create_order(
    form: web::Json<CreateOrderForm>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
    config: web::Data<ServerConfig>,
) -> impl Responder {
    respond(
        orders::create_order(
            repo.get_ref(),
            feed.get_ref(),
            form.into_inner(),
            config.initial_order_status,
        ),
        StatusCode::CREATED,
    )
}

#[get("/v1/orders/{order_id}")]
pub async fn api_v1_order(
    path: web::Path<i32>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    respond(
        orders::get_order(repo.get_ref(), path.into_inner()),
        StatusCode::OK,
    )
}

#[put("/v1/orders/{order_id}/status")]
pub async fn api_v1_update_order_status(
    path: web::Path<i32>,
    form: web::Json<UpdateStatusForm>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    respond(
        orders::update_order_status(
            repo.get_ref(),
            feed.get_ref(),
            path.into_inner(),
            form.into_inner(),
        ),
        StatusCode::OK,
    )
}

#[post("/v1/orders/{order_id}/cancel")]
pub async fn api_v1_cancel_order(
    path: web::Path<i32>,
    form: web::Json<VersionForm>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    respond(
        orders::cancel_order(
            repo.get_ref(),
            feed.get_ref(),
            path.into_inner(),
            form.into_inner(),
        ),
        StatusCode::OK,
    )
}

#[post("/v1/orders/{order_id}/transfer")]
/// Move an order to another table. Answers 409 when the destination is
/// occupied and the move was not confirmed.
pub async fn api_v1_transfer_order(
    path: web::Path<i32>,
    form: web::Json<TransferOrderForm>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    respond(
        orders::transfer_order(
            repo.get_ref(),
            feed.get_ref(),
            path.into_inner(),
            form.into_inner(),
        ),
        StatusCode::OK,
    )
}

#[post("/v1/orders/{order_id}/recalculate")]
pub async fn api_v1_recalculate_order(
    path: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    respond(
        orders::recalculate_order(repo.get_ref(), feed.get_ref(), path.into_inner()),
        StatusCode::OK,
    )
}

#[delete("/v1/orders/{order_id}")]
pub async fn api_v1_delete_order(
    path: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    match orders::delete_order(repo.get_ref(), feed.get_ref(), path.into_inner()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response(err),
    }
}

#[post("/v1/orders/{order_id}/items")]
pub async fn api_v1_add_order_item(
    path: web::Path<i32>,
    form: web::Json<AddOrderItemForm>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    respond(
        order_items::add_order_item(
            repo.get_ref(),
            feed.get_ref(),
            path.into_inner(),
            form.into_inner(),
        ),
        StatusCode::CREATED,
    )
}

#[put("/v1/order-items/{item_id}/quantity")]
/// Set a line's quantity. Zero removes the line.
pub async fn api_v1_update_item_quantity(
    path: web::Path<i32>,
    form: web::Json<UpdateQuantityForm>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    respond(
        order_items::update_order_item_quantity(
            repo.get_ref(),
            feed.get_ref(),
            path.into_inner(),
            form.into_inner(),
        ),
        StatusCode::OK,
    )
}

#[post("/v1/order-items/{item_id}/remove")]
pub async fn api_v1_remove_item_quantity(
    path: web::Path<i32>,
    form: web::Json<RemoveQuantityForm>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    respond(
        order_items::remove_order_item_quantity(
            repo.get_ref(),
            feed.get_ref(),
            path.into_inner(),
            form.into_inner(),
        ),
        StatusCode::OK,
    )
}

#[put("/v1/order-items/{item_id}/sides")]
pub async fn api_v1_replace_item_sides(
    path: web::Path<i32>,
    form: web::Json<ReplaceSidesForm>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    respond(
        order_items::replace_order_item_sides(
            repo.get_ref(),
            feed.get_ref(),
            path.into_inner(),
            form.into_inner(),
        ),
        StatusCode::OK,
    )
}

#[post("/v1/orders/{order_id}/settle")]
/// Settle an order and print its invoice.
pub async fn api_v1_settle_order(
    path: web::Path<i32>,
    form: web::Json<SettleOrderForm>,
    repo: web::Data<DieselRepository>,
    feed: web::Data<ChangeFeed>,
    printer: web::Data<dyn InvoicePrinter>,
    config: web::Data<ServerConfig>,
) -> impl Responder {
    respond(
        payments::settle_order(
            repo.get_ref(),
            feed.get_ref(),
            printer.get_ref(),
            path.into_inner(),
            form.into_inner(),
            config.tip_base,
        ),
        StatusCode::CREATED,
    )
}

#[get("/v1/orders/{order_id}/payments")]
pub async fn api_v1_order_payments(
    path: web::Path<i32>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    respond(
        payments::list_payments(repo.get_ref(), path.into_inner()),
        StatusCode::OK,
    )
}

/// Filter accepted by the change stream.
#[derive(Debug, Default, Deserialize)]
pub struct ChangesQuery {
    pub entity: Option<Entity>,
}

/// Encode `message` as one server-sent event frame.
pub fn sse_frame(message: &FeedMessage) -> Result<web::Bytes, serde_json::Error> {
    let data = serde_json::to_string(message)?;
    Ok(web::Bytes::from(format!(
        "event: {}\ndata: {data}\n\n",
        message.event_name()
    )))
}

#[get("/v1/changes")]
/// Stream row-level change events as server-sent events. A `refresh_all`
/// event means events were dropped and the client must re-fetch.
pub async fn api_v1_changes(
    params: web::Query<ChangesQuery>,
    feed: web::Data<ChangeFeed>,
) -> impl Responder {
    let entity = params.entity;
    let frames = feed_stream(feed.subscribe())
        .filter(move |message| future::ready(message.concerns(entity)))
        .map(|message| sse_frame(&message));

    log::debug!("Change stream opened, {} subscriber(s)", feed.subscriber_count());

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((CACHE_CONTROL, "no-cache"))
        .insert_header(ContentEncoding::Identity)
        .streaming(frames)
}

/// Register every API handler on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_v1_tables)
        .service(api_v1_reconcile_tables)
        .service(api_v1_table)
        .service(api_v1_sync_table)
        .service(api_v1_orders)
        .service(api_v1_create_order)
        .service(api_v1_order)
        .service(api_v1_update_order_status)
        .service(api_v1_cancel_order)
        .service(api_v1_transfer_order)
        .service(api_v1_recalculate_order)
        .service(api_v1_delete_order)
        .service(api_v1_add_order_item)
        .service(api_v1_update_item_quantity)
        .service(api_v1_remove_item_quantity)
        .service(api_v1_replace_item_sides)
        .service(api_v1_settle_order)
        .service(api_v1_order_payments)
        .service(api_v1_changes);
}
