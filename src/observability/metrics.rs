use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub ledger_mutations_total: IntCounterVec,
    pub payment_quotes_total: IntCounterVec,
    pub payment_quote_latency_seconds: Histogram,
    pub driver_online_hours: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let ledger_mutations_total = IntCounterVec::new(
            Opts::new(
                "ledger_mutations_total",
                "Ledger mutations by entity, operation and outcome",
            ),
            &["entity", "operation", "outcome"],
        )
        .expect("valid ledger_mutations_total metric");

        let payment_quotes_total = IntCounterVec::new(
            Opts::new("payment_quotes_total", "Payment quotes by outcome"),
            &["outcome"],
        )
        .expect("valid payment_quotes_total metric");

        let payment_quote_latency_seconds = Histogram::with_opts(HistogramOpts::new(
            "payment_quote_latency_seconds",
            "Latency of payment quote computation in seconds",
        ))
        .expect("valid payment_quote_latency_seconds metric");

        let driver_online_hours = GaugeVec::new(
            Opts::new("driver_online_hours", "Accumulated online hours per driver"),
            &["driver_id"],
        )
        .expect("valid driver_online_hours metric");

        registry
            .register(Box::new(ledger_mutations_total.clone()))
            .expect("register ledger_mutations_total");
        registry
            .register(Box::new(payment_quotes_total.clone()))
            .expect("register payment_quotes_total");
        registry
            .register(Box::new(payment_quote_latency_seconds.clone()))
            .expect("register payment_quote_latency_seconds");
        registry
            .register(Box::new(driver_online_hours.clone()))
            .expect("register driver_online_hours");

        Self {
            registry,
            ledger_mutations_total,
            payment_quotes_total,
            payment_quote_latency_seconds,
            driver_online_hours,
        }
    }

    /// Counts one ledger mutation attempt.
    pub fn record_mutation<T, E>(&self, entity: &str, operation: &str, result: &Result<T, E>) {
        let outcome = if result.is_ok() { "success" } else { "error" };
        self.ledger_mutations_total
            .with_label_values(&[entity, operation, outcome])
            .inc();
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
