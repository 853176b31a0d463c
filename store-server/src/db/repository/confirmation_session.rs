//! Confirmation Session Repository
//!
//! The claim is the concurrency primitive of the whole confirmation
//! workflow: a single `DELETE ... RETURNING` statement, so under concurrent
//! callbacks for the same order exactly one caller walks away with the row.
//! No in-process map is involved anywhere; multiple server processes over
//! the same database file get the same guarantee.

use super::{RepoError, RepoResult};
use shared::models::ConfirmationSession;
use sqlx::SqlitePool;

const SESSION_SELECT: &str = "SELECT order_id, order_number, total_amount, chat_id, created_at, expires_at FROM confirmation_session";

/// Persist a new session for the order.
///
/// Fails with [`RepoError::Duplicate`] while a non-expired session exists.
/// An expired leftover row (not yet swept) is deleted first, so re-placing
/// a confirmation after TTL does not require a manual sweep.
pub async fn create(pool: &SqlitePool, session: &ConfirmationSession) -> RepoResult<()> {
    sqlx::query("DELETE FROM confirmation_session WHERE order_id = ?1 AND expires_at < ?2")
        .bind(session.order_id)
        .bind(shared::util::now_millis())
        .execute(pool)
        .await?;

    let result = sqlx::query(
        "INSERT OR IGNORE INTO confirmation_session (order_id, order_number, total_amount, chat_id, created_at, expires_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(session.order_id)
    .bind(&session.order_number)
    .bind(session.total_amount)
    .bind(&session.chat_id)
    .bind(session.created_at)
    .bind(session.expires_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Duplicate(format!(
            "Confirmation session for order {} already exists",
            session.order_id
        )));
    }
    Ok(())
}

/// Read-only lookup, does not consume the session.
pub async fn peek(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<ConfirmationSession>> {
    let sql = format!("{SESSION_SELECT} WHERE order_id = ?");
    let row = sqlx::query_as::<_, ConfirmationSession>(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Atomic read-and-delete.
///
/// Exactly one concurrent caller for a given order id receives the session;
/// every other caller (a duplicate delivery, the racing opposite action)
/// observes `None`. SQLite serializes the writes; the statement is the
/// entire critical section.
pub async fn claim(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<ConfirmationSession>> {
    let sql = "DELETE FROM confirmation_session WHERE order_id = ? RETURNING order_id, order_number, total_amount, chat_id, created_at, expires_at";
    let row = sqlx::query_as::<_, ConfirmationSession>(sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Delete every session past its expiry; returns the number removed.
/// Safe to run concurrently with claims (an already-claimed session is
/// simply absent).
pub async fn sweep_expired(pool: &SqlitePool, now: i64) -> RepoResult<u64> {
    let result = sqlx::query("DELETE FROM confirmation_session WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn test_pool() -> SqlitePool {
        DbService::open_in_memory().await.unwrap().pool
    }

    fn session(order_id: i64, expires_at: i64) -> ConfirmationSession {
        ConfirmationSession {
            order_id,
            order_number: format!("CMD-{order_id}"),
            total_amount: 150.0,
            chat_id: "123456789".to_string(),
            created_at: 0,
            expires_at,
        }
    }

    fn live_session(order_id: i64) -> ConfirmationSession {
        // Far enough in the future that test runtime never crosses it
        session(order_id, shared::util::now_millis() + 86_400_000)
    }

    #[tokio::test]
    async fn create_then_peek_roundtrip() {
        let pool = test_pool().await;
        create(&pool, &live_session(1)).await.unwrap();

        let found = peek(&pool, 1).await.unwrap().unwrap();
        assert_eq!(found.order_number, "CMD-1");
        assert_eq!(found.chat_id, "123456789");

        // Peek does not consume
        assert!(peek(&pool, 1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_rejects_live_duplicate() {
        let pool = test_pool().await;
        create(&pool, &live_session(2)).await.unwrap();

        let err = create(&pool, &live_session(2)).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn create_replaces_expired_leftover() {
        let pool = test_pool().await;
        // Expired long ago, never swept
        create(&pool, &session(3, 1)).await.unwrap();

        create(&pool, &live_session(3)).await.unwrap();
        let found = peek(&pool, 3).await.unwrap().unwrap();
        assert!(found.expires_at > shared::util::now_millis());
    }

    #[tokio::test]
    async fn claim_consumes_exactly_once() {
        let pool = test_pool().await;
        create(&pool, &live_session(4)).await.unwrap();

        assert!(claim(&pool, 4).await.unwrap().is_some());
        assert!(claim(&pool, 4).await.unwrap().is_none());
        assert!(peek(&pool, 4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claim_unknown_order_is_none() {
        let pool = test_pool().await;
        assert!(claim(&pool, 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let pool = test_pool().await;
        create(&pool, &session(5, 1)).await.unwrap();
        create(&pool, &live_session(6)).await.unwrap();

        let removed = sweep_expired(&pool, shared::util::now_millis())
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(peek(&pool, 5).await.unwrap().is_none());
        assert!(peek(&pool, 6).await.unwrap().is_some());
    }

    /// The fencing-token property: N concurrent claims over a real
    /// file-backed pool, exactly one winner.
    #[tokio::test]
    async fn concurrent_claims_have_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("claims.db");
        let pool = DbService::new(&db_path.to_string_lossy())
            .await
            .unwrap()
            .pool;

        create(&pool, &live_session(7)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(
                async move { claim(&pool, 7).await.unwrap() },
            ));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
