use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_placed_total: IntCounterVec,
    pub order_claims_total: IntCounterVec,
    pub distance_lookup_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let orders_placed_total = IntCounterVec::new(
            Opts::new("orders_placed_total", "Order placement attempts by outcome"),
            &["outcome"],
        )?;

        let order_claims_total = IntCounterVec::new(
            Opts::new("order_claims_total", "Order claim attempts by outcome"),
            &["outcome"],
        )?;

        let distance_lookup_seconds = HistogramVec::new(
            HistogramOpts::new(
                "distance_lookup_seconds",
                "Latency of routing service lookups in seconds",
            ),
            &["outcome"],
        )?;

        registry.register(Box::new(orders_placed_total.clone()))?;
        registry.register(Box::new(order_claims_total.clone()))?;
        registry.register(Box::new(distance_lookup_seconds.clone()))?;

        Ok(Self {
            registry,
            orders_placed_total,
            order_claims_total,
            distance_lookup_seconds,
        })
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
