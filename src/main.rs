//! uio-rgb main entry point.
//!
//! Hexagonal architecture around a single blocking event loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UioBus           PollMultiplexer   StdDelay    LogEventSink   │
//! │  (DevicePort)     (Multiplexer)     (DelayNs)   (EventSink)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              EventLoop (pure logic)                    │    │
//! │  │  Board · ReactorContext · ColorModel · PaletteRule     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  CancelToken (SIGINT / SIGHUP / SIGTERM)                       │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use uio_rgb::adapters::delay::StdDelay;
use uio_rgb::adapters::log_sink::LogEventSink;
use uio_rgb::adapters::poll::PollMultiplexer;
use uio_rgb::adapters::uio::UioBus;
use uio_rgb::app::service::EventLoop;
use uio_rgb::board::Board;
use uio_rgb::config::AppConfig;
use uio_rgb::drivers::color::ColorModel;
use uio_rgb::shutdown::CancelToken;

/// Environment variable naming an optional JSON board configuration.
const CONFIG_ENV: &str = "UIO_RGB_CONFIG";

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  uio-rgb v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = match env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            let config = AppConfig::load(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            info!("Configuration loaded from {}", path.display());
            config
        }
        None => AppConfig::default(),
    };

    // ── 3. Signals ────────────────────────────────────────────
    let cancel = CancelToken::new();
    cancel
        .install_signal_handlers()
        .context("installing signal handlers")?;

    // ── 4. Bring-up ───────────────────────────────────────────
    let mut bus = UioBus::new(config.uio.clone());
    let mut board = Board::bring_up(&config, &mut bus);
    board.configure_interrupts();
    ColorModel::new(&config.leds).all_leds_off(&mut board.pwm);

    // ── 5. Event loop ─────────────────────────────────────────
    let mut reactor = EventLoop::new(
        board,
        &config,
        PollMultiplexer::new(),
        StdDelay::new(),
        LogEventSink::new(),
    );
    reactor.arm();
    reactor.run(&cancel);

    // ── 6. Shutdown ───────────────────────────────────────────
    info!("Quitting");
    reactor.into_board().shutdown();
    Ok(())
}
