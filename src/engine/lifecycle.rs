use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::AppError;
use crate::geo::distance::{DistanceResolver, RouteStatus};
use crate::geo::{validated_point, Endpoint};
use crate::models::order::{DeliveryOrder, NewOrder, OrderStatus};
use crate::observability::metrics::Metrics;
use crate::store::OrderStore;

/// The only status a claim request may ask for.
const CLAIM_STATUS: &str = "TAKEN";

/// Creates and claims orders. Holds no order state of its own; every decision
/// is made against the store.
#[derive(Clone)]
pub struct OrderService {
    store: OrderStore,
    resolver: Arc<dyn DistanceResolver>,
    metrics: Metrics,
}

impl OrderService {
    pub fn new(store: OrderStore, resolver: Arc<dyn DistanceResolver>, metrics: Metrics) -> Self {
        Self {
            store,
            resolver,
            metrics,
        }
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    /// Validates coordinates, resolves the route distance and persists a new
    /// `UNASSIGNED` order. Nothing is written unless the route resolved `OK`.
    pub async fn place_order(
        &self,
        origin: &[f64],
        destination: &[f64],
    ) -> Result<DeliveryOrder, AppError> {
        let result = self.try_place_order(origin, destination).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::MalformedRequest(_) | AppError::CoordinateOutOfRange(_)) => "invalid",
            Err(AppError::RouteNotFound(_)) => "no_route",
            Err(_) => "error",
        };
        self.metrics
            .orders_placed_total
            .with_label_values(&[outcome])
            .inc();
        result
    }

    async fn try_place_order(
        &self,
        origin: &[f64],
        destination: &[f64],
    ) -> Result<DeliveryOrder, AppError> {
        let (Ok(origin_pair), Ok(destination_pair)) =
            (<[f64; 2]>::try_from(origin), <[f64; 2]>::try_from(destination))
        else {
            return Err(AppError::MalformedRequest(format!(
                "expected 2 coordinates each, got origin={} destination={}",
                origin.len(),
                destination.len()
            )));
        };
        let origin = validated_point(Endpoint::Origin, origin_pair)?;
        let destination = validated_point(Endpoint::Destination, destination_pair)?;

        let start = Instant::now();
        let resolved = self.resolver.resolve(origin, destination).await;
        let lookup_outcome = if resolved.is_ok() { "success" } else { "error" };
        self.metrics
            .distance_lookup_seconds
            .with_label_values(&[lookup_outcome])
            .observe(start.elapsed().as_secs_f64());

        let route = resolved.inspect_err(|err| warn!(error = %err, "distance lookup failed"))?;
        match &route.status {
            RouteStatus::Ok => {}
            status => {
                info!(route_status = status.as_str(), "no route between endpoints");
                return Err(AppError::RouteNotFound(status.as_str().to_string()));
            }
        }

        let new_order = NewOrder {
            origin,
            destination,
            distance: route.distance_meters,
        };
        let order = self.store.insert(&new_order).await?;

        info!(order_id = order.id, distance = order.distance, "order placed");
        Ok(order)
    }

    /// Claims `id` for a runner and completes it in one step. Exactly one of any
    /// number of concurrent claims on the same order succeeds; the rest get
    /// `AlreadyTaken`.
    pub async fn claim_order(
        &self,
        id: i64,
        requested_status: &str,
    ) -> Result<OrderStatus, AppError> {
        let result = self.try_claim_order(id, requested_status).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::AlreadyTaken(_)) => "already_taken",
            Err(AppError::OrderNotFound(_)) => "not_found",
            Err(AppError::InvalidStatusValue(_)) => "invalid",
            Err(_) => "error",
        };
        self.metrics
            .order_claims_total
            .with_label_values(&[outcome])
            .inc();
        result
    }

    async fn try_claim_order(
        &self,
        id: i64,
        requested_status: &str,
    ) -> Result<OrderStatus, AppError> {
        if requested_status != CLAIM_STATUS {
            return Err(AppError::InvalidStatusValue(requested_status.to_string()));
        }

        if !self.store.exists(id).await? {
            return Err(AppError::OrderNotFound(id));
        }

        let claimed = self
            .store
            .transition(id, OrderStatus::Unassigned, OrderStatus::Taken)
            .await?;
        if claimed == 0 {
            info!(order_id = id, "claim lost: order already taken");
            return Err(AppError::AlreadyTaken(id));
        }

        let completed = self
            .store
            .transition(id, OrderStatus::Taken, OrderStatus::Success)
            .await?;
        if completed == 0 {
            return Err(AppError::WriteError(format!(
                "order {id} left TAKEN before completion"
            )));
        }

        info!(order_id = id, "order claimed and completed");
        Ok(OrderStatus::Success)
    }

    pub async fn get_order(&self, id: i64) -> Result<DeliveryOrder, AppError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| AppError::OrderNotFound(id))
    }

    pub async fn list_orders(&self) -> Result<Vec<DeliveryOrder>, AppError> {
        self.store.list_all().await
    }
}
