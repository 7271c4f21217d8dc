//! Rendering of change events into the outbound notification text
//!
//! One cycle produces exactly one message:
//!
//! ```text
//! Top-100 BTC holders changes (2 events):
//! - NEW #57: bc1q... (1234.50000000 BTC)
//! - RANK 3 -> 4: 1P5Z...
//! ```

use crate::config::DisplayConfig;
use crate::reconcile::ChangeEvent;
use crate::units::{format_signed_units, format_units};

/// Render one event as a single line (without the list bullet)
pub fn render_event(event: &ChangeEvent, display: &DisplayConfig) -> String {
    let unit = &display.unit;
    let decimals = display.decimals;

    match event {
        ChangeEvent::New {
            address,
            rank,
            balance_sats,
        } => format!(
            "NEW #{}: {} ({} {})",
            rank,
            address,
            format_units(*balance_sats, decimals),
            unit
        ),
        ChangeEvent::RankChanged {
            address,
            old_rank,
            new_rank,
        } => format!("RANK {} -> {}: {}", old_rank, new_rank, address),
        ChangeEvent::BalanceChanged {
            address,
            old_balance_sats,
            new_balance_sats,
            delta_sats,
        } => format!(
            "BALANCE change for {}: {} -> {} {} ({})",
            address,
            format_units(*old_balance_sats, decimals),
            format_units(*new_balance_sats, decimals),
            unit,
            format_signed_units(*delta_sats, decimals)
        ),
        ChangeEvent::Removed {
            address,
            rank,
            balance_sats,
        } => format!(
            "REMOVED #{}: {} ({} {})",
            rank,
            address,
            format_units(*balance_sats, decimals),
            unit
        ),
    }
}

/// Render all events of one cycle into one message
pub fn format_changes(events: &[ChangeEvent], limit: usize, display: &DisplayConfig) -> String {
    let mut message = format!(
        "Top-{} {} changes ({} events):",
        limit,
        display.entity,
        events.len()
    );
    for event in events {
        message.push_str("\n- ");
        message.push_str(&render_event(event, display));
    }
    message
}

/// Render a cycle failure report
pub fn format_failure(error: &crate::Error) -> String {
    format!("Monitor error: {}", error)
}
