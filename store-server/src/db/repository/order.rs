//! Order Repository
//!
//! Status mutations are guarded conditional updates: `confirm` and `cancel`
//! only fire while the row is still `pending`, which keeps `confirmed_at`
//! and `cancelled_at` mutually exclusive and write-once.

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderCreate, OrderItem, OrderStatus};
use sqlx::SqlitePool;

const ORDER_SELECT: &str = "SELECT id, order_number, user_id, guest_email, status, payment_method, total_amount, customer_name, customer_phone, customer_address, customer_city, customer_zip, notes, confirmed_at, cancelled_at, created_at, updated_at FROM orders";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_order_number(pool: &SqlitePool, number: &str) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE order_number = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(number)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_all(pool: &SqlitePool, limit: i64, offset: i64) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} ORDER BY created_at DESC LIMIT ? OFFSET ?");
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, name, quantity, price FROM order_item WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Insert the order and its lines in one transaction; returns the stored row.
pub async fn create(pool: &SqlitePool, data: OrderCreate) -> RepoResult<Order> {
    if data.items.is_empty() {
        return Err(RepoError::Validation("Order has no items".into()));
    }
    if find_by_order_number(pool, &data.order_number).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Order number '{}' already exists",
            data.order_number
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, guest_email, status, payment_method, total_amount, customer_name, customer_phone, customer_address, customer_city, customer_zip, notes, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 'pending', 'cod', ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
    )
    .bind(id)
    .bind(&data.order_number)
    .bind(&data.user_id)
    .bind(&data.guest_email)
    .bind(data.total_amount)
    .bind(&data.customer_name)
    .bind(&data.customer_phone)
    .bind(&data.customer_address)
    .bind(&data.customer_city)
    .bind(&data.customer_zip)
    .bind(&data.notes)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for item in &data.items {
        sqlx::query(
            "INSERT INTO order_item (id, order_id, product_id, name, quantity, price) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(shared::util::snowflake_id())
        .bind(id)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create order".into()))
}

/// Transition `pending -> confirmed`, stamping `confirmed_at`.
///
/// Returns `false` when the row was not `pending` anymore. The caller holds
/// the claimed session, so a miss here means some unrelated path (e.g. a
/// manual admin cancellation) raced the order row itself.
pub async fn confirm(pool: &SqlitePool, id: i64, now: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'confirmed', confirmed_at = ?1, updated_at = ?1 WHERE id = ?2 AND status = 'pending'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Transition `pending -> cancelled`, stamping `cancelled_at`.
pub async fn cancel(pool: &SqlitePool, id: i64, now: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'cancelled', cancelled_at = ?1, updated_at = ?1 WHERE id = ?2 AND status = 'pending'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Admin fulfillment transitions.
///
/// Forward-only: processing from confirmed, shipped from processing,
/// delivered from shipped. Confirm/cancel route through the guarded
/// transitions above so the timestamps stay consistent. `pending` is not a
/// reachable target.
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    status: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let from: &str = match status {
        OrderStatus::Confirmed => return confirm(pool, id, now).await,
        OrderStatus::Cancelled => return cancel(pool, id, now).await,
        OrderStatus::Processing => "confirmed",
        OrderStatus::Shipped => "processing",
        OrderStatus::Delivered => "shipped",
        OrderStatus::Pending => {
            return Err(RepoError::Validation(
                "Orders cannot be moved back to pending".into(),
            ));
        }
    };

    let result =
        sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4")
            .bind(status.as_str())
            .bind(now)
            .bind(id)
            .bind(from)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::OrderItemCreate;

    async fn test_pool() -> SqlitePool {
        DbService::open_in_memory().await.unwrap().pool
    }

    fn sample_order(number: &str) -> OrderCreate {
        OrderCreate {
            order_number: number.to_string(),
            user_id: None,
            guest_email: Some("client@example.com".to_string()),
            total_amount: 249.5,
            customer_name: "Yassine A.".to_string(),
            customer_phone: "+212612345678".to_string(),
            customer_address: "12 Rue des Orangers".to_string(),
            customer_city: "Casablanca".to_string(),
            customer_zip: Some("20000".to_string()),
            notes: None,
            items: vec![OrderItemCreate {
                product_id: "prod-77".to_string(),
                quantity: 2,
                name: "Tajine 28cm".to_string(),
                price: 124.75,
            }],
        }
    }

    #[tokio::test]
    async fn create_starts_pending_with_lines() {
        let pool = test_pool().await;
        let order = create(&pool, sample_order("CMD-1001")).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, "cod");
        assert!(order.confirmed_at.is_none());
        assert!(order.cancelled_at.is_none());

        let items = find_items(&pool, order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Tajine 28cm");
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_order_number() {
        let pool = test_pool().await;
        create(&pool, sample_order("CMD-1002")).await.unwrap();

        let err = create(&pool, sample_order("CMD-1002")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn create_rejects_empty_cart() {
        let pool = test_pool().await;
        let mut data = sample_order("CMD-1003");
        data.items.clear();

        let err = create(&pool, data).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn confirm_stamps_once_and_only_from_pending() {
        let pool = test_pool().await;
        let order = create(&pool, sample_order("CMD-1004")).await.unwrap();

        assert!(confirm(&pool, order.id, 1_000).await.unwrap());
        let confirmed = find_by_id(&pool, order.id).await.unwrap().unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert_eq!(confirmed.confirmed_at, Some(1_000));
        assert!(confirmed.cancelled_at.is_none());

        // Second confirm misses the guard and must not touch the timestamp
        assert!(!confirm(&pool, order.id, 2_000).await.unwrap());
        let unchanged = find_by_id(&pool, order.id).await.unwrap().unwrap();
        assert_eq!(unchanged.confirmed_at, Some(1_000));
    }

    #[tokio::test]
    async fn cancel_after_confirm_is_rejected() {
        let pool = test_pool().await;
        let order = create(&pool, sample_order("CMD-1005")).await.unwrap();

        assert!(confirm(&pool, order.id, 1_000).await.unwrap());
        assert!(!cancel(&pool, order.id, 2_000).await.unwrap());

        let row = find_by_id(&pool, order.id).await.unwrap().unwrap();
        assert_eq!(row.status, OrderStatus::Confirmed);
        assert!(row.cancelled_at.is_none());
    }

    #[tokio::test]
    async fn fulfillment_moves_forward_only() {
        let pool = test_pool().await;
        let order = create(&pool, sample_order("CMD-1006")).await.unwrap();

        // Cannot ship a pending order
        assert!(
            !update_status(&pool, order.id, OrderStatus::Shipped, 1_000)
                .await
                .unwrap()
        );

        assert!(confirm(&pool, order.id, 1_000).await.unwrap());
        assert!(
            update_status(&pool, order.id, OrderStatus::Processing, 2_000)
                .await
                .unwrap()
        );
        assert!(
            update_status(&pool, order.id, OrderStatus::Shipped, 3_000)
                .await
                .unwrap()
        );
        assert!(
            update_status(&pool, order.id, OrderStatus::Delivered, 4_000)
                .await
                .unwrap()
        );

        // Delivered is terminal for this path
        assert!(
            !update_status(&pool, order.id, OrderStatus::Processing, 5_000)
                .await
                .unwrap()
        );

        let err = update_status(&pool, order.id, OrderStatus::Pending, 6_000)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }
}
