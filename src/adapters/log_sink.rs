//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one trace line per reactor event
//! through the `log` facade.  The line formats follow the board's
//! console trace, so existing captures stay comparable.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Armed { sources } => {
                info!("ARMED | {} interrupt sources", sources);
            }
            AppEvent::Motion { value, count } => {
                info!("PIR2 detection: val={:01x},cnt={}", value, count);
            }
            AppEvent::SwitchesChanged { value, count } => {
                info!("SWS  detection: val={:01x},cnt={}", value, count);
            }
            AppEvent::ButtonsChanged { value, count } => {
                info!("BTNS detection: val={:01x},cnt={}", value, count);
            }
            AppEvent::PaletteApplied { silk, palette } => {
                info!(
                    "RGB  | LED{} r={} g={} b={}",
                    silk, palette.red, palette.green, palette.blue
                );
            }
            AppEvent::PaletteRejected { silk, error } => {
                warn!("RGB  | LED{} rejected: {}", silk, error);
            }
            AppEvent::WaitFailed(kind) => {
                warn!("WAIT | failed: {}", kind);
            }
            AppEvent::Stopped => {
                info!("STOP | event loop exited");
            }
        }
    }
}
