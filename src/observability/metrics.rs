use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub order_transitions_total: IntCounterVec,
    pub location_reports_total: IntCounter,
    pub location_fanout_orders_total: IntCounter,
    pub board_ticks_total: IntCounterVec,
    pub tracking_sessions_active: IntGauge,
    pub menu_suggestions_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let order_transitions_total = IntCounterVec::new(
            Opts::new(
                "order_transitions_total",
                "Order lifecycle operations by transition and outcome",
            ),
            &["transition", "outcome"],
        )
        .expect("valid order_transitions_total metric");

        let location_reports_total =
            IntCounter::new("location_reports_total", "Courier location reports accepted")
                .expect("valid location_reports_total metric");

        let location_fanout_orders_total = IntCounter::new(
            "location_fanout_orders_total",
            "In-transit orders updated by courier location reports",
        )
        .expect("valid location_fanout_orders_total metric");

        let board_ticks_total = IntCounterVec::new(
            Opts::new("board_ticks_total", "Board refresh ticks by board and outcome"),
            &["board", "outcome"],
        )
        .expect("valid board_ticks_total metric");

        let tracking_sessions_active = IntGauge::new(
            "tracking_sessions_active",
            "Positioning subscriptions currently held by courier agents",
        )
        .expect("valid tracking_sessions_active metric");

        let menu_suggestions_total = IntCounterVec::new(
            Opts::new("menu_suggestions_total", "Menu suggestion requests by outcome"),
            &["outcome"],
        )
        .expect("valid menu_suggestions_total metric");

        registry
            .register(Box::new(order_transitions_total.clone()))
            .expect("register order_transitions_total");
        registry
            .register(Box::new(location_reports_total.clone()))
            .expect("register location_reports_total");
        registry
            .register(Box::new(location_fanout_orders_total.clone()))
            .expect("register location_fanout_orders_total");
        registry
            .register(Box::new(board_ticks_total.clone()))
            .expect("register board_ticks_total");
        registry
            .register(Box::new(tracking_sessions_active.clone()))
            .expect("register tracking_sessions_active");
        registry
            .register(Box::new(menu_suggestions_total.clone()))
            .expect("register menu_suggestions_total");

        Self {
            registry,
            order_transitions_total,
            location_reports_total,
            location_fanout_orders_total,
            board_ticks_total,
            tracking_sessions_active,
            menu_suggestions_total,
        }
    }

    pub fn record_transition(&self, transition: &str, ok: bool) {
        let outcome = if ok { "success" } else { "rejected" };
        self.order_transitions_total
            .with_label_values(&[transition, outcome])
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
