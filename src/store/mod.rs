//! SQLite-backed order persistence.
//!
//! The store is the only writer of order rows. Status changes go through
//! [`OrderStore::transition`], a single conditional `UPDATE`, which is what
//! serializes concurrent claims.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::order::{DeliveryOrder, NewOrder, OrderStatus};

const ORDER_COLUMNS: &str =
    "id, origin_lat, origin_long, dest_lat, dest_long, distance, status, created_at";

#[derive(Clone)]
pub struct OrderStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    origin_lat: f64,
    origin_long: f64,
    dest_lat: f64,
    dest_long: f64,
    distance: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for DeliveryOrder {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&row.status)
            .map_err(|err| AppError::ReadError(format!("order {}: {err}", row.id)))?;

        Ok(DeliveryOrder {
            id: row.id,
            origin: GeoPoint {
                lat: row.origin_lat,
                lng: row.origin_long,
            },
            destination: GeoPoint {
                lat: row.dest_lat,
                lng: row.dest_long,
            },
            distance: row.distance,
            status,
            created_at: row.created_at,
        })
    }
}

impl OrderStore {
    /// Opens the pool and applies migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|err| AppError::Internal(format!("invalid database url: {err}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|err| AppError::Internal(format!("failed to open database: {err}")))?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        tracing::info!("database connection established");

        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| AppError::Internal(format!("failed to apply migrations: {err}")))
    }

    /// Inserts an `UNASSIGNED` order and returns the row exactly as this
    /// statement wrote it, generated id included.
    pub async fn insert(&self, order: &NewOrder) -> Result<DeliveryOrder, AppError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (origin_lat, origin_long, dest_lat, dest_long, distance, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.origin.lat)
        .bind(order.origin.lng)
        .bind(order.destination.lat)
        .bind(order.destination.lng)
        .bind(order.distance)
        .bind(OrderStatus::Unassigned.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| AppError::WriteError(format!("insert order: {err}")))?;

        DeliveryOrder::try_from(row)
    }

    pub async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM orders WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| AppError::ReadError(format!("check order {id}: {err}")))?;

        Ok(found != 0)
    }

    pub async fn find(&self, id: i64) -> Result<Option<DeliveryOrder>, AppError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| AppError::ReadError(format!("find order {id}: {err}")))?;

        row.map(DeliveryOrder::try_from).transpose()
    }

    /// Moves `id` from `expected` to `next` only if it is currently `expected`.
    /// Returns the number of rows changed (0 or 1).
    pub async fn transition(
        &self,
        id: i64,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<u64, AppError> {
        if !expected.can_advance_to(next) {
            return Err(AppError::WriteError(format!(
                "illegal transition {expected} -> {next} for order {id}"
            )));
        }

        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status = ?")
            .bind(next.as_str())
            .bind(id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| AppError::WriteError(format!("update order {id}: {err}")))?;

        Ok(result.rows_affected())
    }

    /// Every order, oldest first.
    pub async fn list_all(&self) -> Result<Vec<DeliveryOrder>, AppError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| AppError::ReadError(format!("list orders: {err}")))?;

        rows.into_iter().map(DeliveryOrder::try_from).collect()
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| AppError::ReadError(format!("count orders: {err}")))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory store. A single connection, since every SQLite `:memory:`
    /// connection is its own database.
    pub(crate) async fn memory_store() -> OrderStore {
        OrderStore::connect("sqlite::memory:", 1).await.unwrap()
    }

    /// File-backed store with several pooled connections, so statements from
    /// concurrent tasks really run side by side. Keep the `TempDir` alive for
    /// as long as the store is used.
    pub(crate) async fn file_store(max_connections: u32) -> (tempfile::TempDir, OrderStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("orders.db").display());
        let store = OrderStore::connect(&url, max_connections).await.unwrap();
        (dir, store)
    }

    fn new_order(distance: i64) -> NewOrder {
        NewOrder {
            origin: GeoPoint {
                lat: 22.28,
                lng: 114.17,
            },
            destination: GeoPoint {
                lat: 22.28,
                lng: 114.18,
            },
            distance,
        }
    }

    #[tokio::test]
    async fn insert_returns_increasing_ids_and_unassigned_rows() {
        let store = memory_store().await;

        let first = store.insert(&new_order(1100)).await.unwrap();
        let second = store.insert(&new_order(2200)).await.unwrap();
        assert!(second.id > first.id);

        assert_eq!(first.distance, 1100);
        assert_eq!(first.status, OrderStatus::Unassigned);
        assert_eq!(first.destination.lng, 114.18);

        let stored = store.find(first.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Unassigned);
        assert_eq!(stored.created_at, first.created_at);
    }

    #[tokio::test]
    async fn exists_and_find_for_missing_id() {
        let store = memory_store().await;
        let id = store.insert(&new_order(10)).await.unwrap().id;

        assert!(store.exists(id).await.unwrap());
        assert!(!store.exists(id + 100).await.unwrap());
        assert!(store.find(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transition_only_matches_expected_status() {
        let store = memory_store().await;
        let id = store.insert(&new_order(10)).await.unwrap().id;

        let changed = store
            .transition(id, OrderStatus::Taken, OrderStatus::Success)
            .await
            .unwrap();
        assert_eq!(changed, 0);

        let changed = store
            .transition(id, OrderStatus::Unassigned, OrderStatus::Taken)
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let changed = store
            .transition(id, OrderStatus::Unassigned, OrderStatus::Taken)
            .await
            .unwrap();
        assert_eq!(changed, 0);

        let order = store.find(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Taken);
    }

    #[tokio::test]
    async fn backward_transition_is_rejected_without_touching_the_row() {
        let store = memory_store().await;
        let id = store.insert(&new_order(10)).await.unwrap().id;

        let err = store
            .transition(id, OrderStatus::Unassigned, OrderStatus::Success)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WriteError(_)));

        let order = store.find(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Unassigned);
    }

    #[tokio::test]
    async fn list_all_is_in_insertion_order() {
        let store = memory_store().await;
        let mut ids = Vec::new();
        for distance in [300, 100, 200] {
            ids.push(store.insert(&new_order(distance)).await.unwrap().id);
        }

        let orders = store.list_all().await.unwrap();
        let listed: Vec<i64> = orders.iter().map(|o| o.id).collect();
        assert_eq!(listed, ids);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_refused_by_the_schema() {
        let store = memory_store().await;
        let mut order = new_order(10);
        order.origin.lat = 91.0;

        let err = store.insert(&order).await.unwrap_err();
        assert!(matches!(err, AppError::WriteError(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_inserts_get_distinct_ids() {
        let (_dir, store) = file_store(8).await;

        let inserts = (0..32).map(|distance| {
            let store = store.clone();
            tokio::spawn(async move { store.insert(&new_order(distance)).await })
        });
        let mut ids: Vec<i64> = futures::future::join_all(inserts)
            .await
            .into_iter()
            .map(|result| result.unwrap().unwrap().id)
            .collect();

        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 32);
        assert_eq!(store.count().await.unwrap(), 32);
    }
}
