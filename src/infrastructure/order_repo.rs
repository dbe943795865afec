use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{page_offset, Order, OrderId, OrderItem, OrderPage, OrderStatus};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_items, orders};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Row mapping ──────────────────────────────────────────────────────────────

fn to_order(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
    let status: OrderStatus = row.status.parse().map_err(|_| {
        DomainError::Internal(format!("order {} has unknown status '{}'", row.id, row.status))
    })?;
    let items = items
        .into_iter()
        .map(|i| {
            OrderItem::new(i.menu_id, i.menu_name, i.menu_price, i.quantity).map_err(|e| {
                DomainError::Internal(format!("order item {} is corrupt: {}", i.id, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Order::restore(
        row.id,
        row.customer_name,
        status,
        items,
        row.ordered_at,
    ))
}

fn load_order(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>, DomainError> {
    let order = orders::table
        .filter(orders::id.eq(id))
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;

    let Some(order) = order else {
        return Ok(None);
    };

    let items = OrderItemRow::belonging_to(&order)
        .select(OrderItemRow::as_select())
        .order(order_items::id.asc())
        .load(conn)?;

    to_order(order, items).map(Some)
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn insert(&self, mut order: Order) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        let id = conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order header
            let id: i64 = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    customer_name: order.customer_name(),
                    status: order.status().as_str(),
                    total_price: order.total_price(),
                    ordered_at: order.ordered_at(),
                })
                .returning(orders::id)
                .get_result(conn)?;

            // 2. Insert the items; serial ids keep them in insertion order
            let new_items: Vec<NewOrderItemRow> = order
                .items()
                .iter()
                .map(|item| NewOrderItemRow {
                    order_id: id,
                    menu_id: item.menu_id(),
                    menu_name: item.menu_name(),
                    menu_price: item.menu_price(),
                    quantity: item.quantity(),
                })
                .collect();
            if !new_items.is_empty() {
                diesel::insert_into(order_items::table)
                    .values(&new_items)
                    .execute(conn)?;
            }

            Ok(id)
        })?;

        order.assign_id(id);
        Ok(order)
    }

    fn update(&self, id: OrderId, order: Order) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        // Items are immutable once stored, so only the header changes.
        let updated = diesel::update(orders::table.find(id))
            .set((
                orders::status.eq(order.status().as_str()),
                orders::total_price.eq(order.total_price()),
                orders::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(DomainError::OrderNotFound(id));
        }
        Ok(order)
    }
}

impl OrderRepository for DieselOrderRepository {
    fn save(&self, order: Order) -> Result<Order, DomainError> {
        match order.id() {
            Some(id) => self.update(id, order),
            None => self.insert(order),
        }
    }

    fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        load_order(&mut conn, id)
    }

    fn find_by_id_with_items(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| load_order(conn, id))
    }

    fn list(&self, page: i64, limit: i64) -> Result<OrderPage, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table.count().get_result(conn)?;

            let Some(offset) = page_offset(page, limit) else {
                return Ok(OrderPage {
                    items: Vec::new(),
                    total,
                });
            };

            let rows = orders::table
                .select(OrderRow::as_select())
                .order((orders::ordered_at.desc(), orders::id.desc()))
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            let items = OrderItemRow::belonging_to(&rows)
                .select(OrderItemRow::as_select())
                .order(order_items::id.asc())
                .load::<OrderItemRow>(conn)?
                .grouped_by(&rows);

            let orders = rows
                .into_iter()
                .zip(items)
                .map(|(row, items)| to_order(row, items))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(OrderPage {
                items: orders,
                total,
            })
        })
    }

    fn delete(&self, id: OrderId) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        // order_items rows go with it through ON DELETE CASCADE
        let deleted = diesel::delete(orders::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
