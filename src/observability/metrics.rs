use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub readings_ingested_total: IntCounterVec,
    pub collections_total: IntCounterVec,
    pub payouts_total: IntCounter,
    pub revenue_minor_units_total: IntCounterVec,
    pub alerts_total: IntCounterVec,
    pub bins_tracked: IntGauge,
    pub tick_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let readings_ingested_total = IntCounterVec::new(
            Opts::new("readings_ingested_total", "Sensor readings applied by category"),
            &["category"],
        )
        .expect("valid readings_ingested_total metric");

        let collections_total = IntCounterVec::new(
            Opts::new("collections_total", "Bin collections by outcome"),
            &["outcome"],
        )
        .expect("valid collections_total metric");

        let payouts_total = IntCounter::new("payouts_total", "Payout events created")
            .expect("valid payouts_total metric");

        let revenue_minor_units_total = IntCounterVec::new(
            Opts::new(
                "revenue_minor_units_total",
                "Distributed revenue in paise by recipient",
            ),
            &["recipient"],
        )
        .expect("valid revenue_minor_units_total metric");

        let alerts_total = IntCounterVec::new(
            Opts::new("alerts_total", "Fill level alerts raised by severity"),
            &["level"],
        )
        .expect("valid alerts_total metric");

        let bins_tracked = IntGauge::new("bins_tracked", "Bins seen by the last simulation tick")
            .expect("valid bins_tracked metric");

        let tick_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "tick_duration_seconds",
            "Duration of a simulation tick in seconds",
        ))
        .expect("valid tick_duration_seconds metric");

        registry
            .register(Box::new(readings_ingested_total.clone()))
            .expect("register readings_ingested_total");
        registry
            .register(Box::new(collections_total.clone()))
            .expect("register collections_total");
        registry
            .register(Box::new(payouts_total.clone()))
            .expect("register payouts_total");
        registry
            .register(Box::new(revenue_minor_units_total.clone()))
            .expect("register revenue_minor_units_total");
        registry
            .register(Box::new(alerts_total.clone()))
            .expect("register alerts_total");
        registry
            .register(Box::new(bins_tracked.clone()))
            .expect("register bins_tracked");
        registry
            .register(Box::new(tick_duration_seconds.clone()))
            .expect("register tick_duration_seconds");

        Self {
            registry,
            readings_ingested_total,
            collections_total,
            payouts_total,
            revenue_minor_units_total,
            alerts_total,
            bins_tracked,
            tick_duration_seconds,
        }
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
