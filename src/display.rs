// Console dashboard
// Pure text rendering of the latest estimate; the binary owns the refresh loop

use crate::clients::FeedStatsSnapshot;
use crate::simulation::{OrderBookSnapshot, OrderParams, SimulationResult};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// ANSI sequence that clears the terminal and homes the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Everything the dashboard shows for one refresh
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    pub exchange: &'a str,
    pub asset: &'a str,
    pub params: &'a OrderParams,
    pub result: &'a SimulationResult,
    pub latest_book: Option<&'a OrderBookSnapshot>,
    pub history_len: usize,
    pub history_capacity: usize,
    pub feed: Option<FeedStatsSnapshot>,
    pub max_latency_ms: f64,
}

impl DashboardView<'_> {
    pub fn is_latency_high(&self) -> bool {
        self.result.compute_latency_ms > self.max_latency_ms
    }
}

pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    let mut lines = vec![
        "📈 Trade Cost Simulator".to_string(),
        RULE.to_string(),
        format!("Exchange:        {}", view.exchange),
        format!("Asset:           {}", view.asset),
        String::new(),
        "Input Parameters".to_string(),
        "  Order Type:    Market".to_string(),
        format!("  Quantity:      {}", view.params.quantity),
        format!("  Volatility:    {}", view.params.volatility),
        format!("  Fee Tier:      {:.4}%", view.params.fee_tier * 100.0),
        String::new(),
    ];

    lines.extend(render_book(view));
    lines.push(String::new());

    let result = view.result;
    lines.extend([
        "Output Parameters".to_string(),
        format!("  Expected Slippage:   {:.6}", result.slippage_per_unit),
        format!("  Expected Fees:       {:.6}", result.fees),
        format!("  Market Impact:       {:.6}", result.market_impact),
        format!("  Net Cost:            {:.6}", result.net_cost),
        format!("  Maker/Taker Ratio:   {:.4}", result.maker_taker_ratio),
        format!("  Internal Latency:    {:.0} ms", result.compute_latency_ms),
    ]);

    if let Some(feed) = view.feed {
        lines.push(String::new());
        lines.push(format!(
            "Feed: {} frames, {} snapshots, {} dropped, {} sessions, {} connect attempts",
            feed.frames_received,
            feed.snapshots_ingested,
            feed.frames_dropped,
            feed.sessions_established,
            feed.connect_attempts
        ));
    }

    if view.is_latency_high() {
        lines.push(String::new());
        lines.push(format!(
            "⚠️  High latency detected ({:.0} ms > {:.0} ms)",
            result.compute_latency_ms, view.max_latency_ms
        ));
    }

    lines.push(RULE.to_string());
    lines.join("\n")
}

fn render_book(view: &DashboardView<'_>) -> Vec<String> {
    let mut lines = vec!["Order Book".to_string()];

    match view.latest_book {
        Some(book) => {
            lines.push(format!("  Best Bid:      {}", format_level(book.best_bid().map(|l| l.price))));
            lines.push(format!("  Best Ask:      {}", format_level(book.best_ask().map(|l| l.price))));
            lines.push(format!("  Spread:        {}", format_level(book.spread())));
            lines.push(format!("  Mid Price:     {}", format_level(book.mid_price())));
            lines.push(format!(
                "  Depth:         {:.4} bid / {:.4} ask",
                book.bid_depth(),
                book.ask_depth()
            ));
            lines.push(format!("  Updated:       {}", book.captured_at().format("%H:%M:%S%.3f UTC")));
        }
        None => lines.push("  Waiting for order book data...".to_string()),
    }

    lines.push(format!("  History:       {}/{}", view.history_len, view.history_capacity));
    lines
}

fn format_level(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}
