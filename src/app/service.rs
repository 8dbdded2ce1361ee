//! Event loop: the hexagonal core.
//!
//! [`EventLoop`] owns the board, the reactor context and the colour
//! model.  Everything it touches outside memory arrives through port
//! traits: the [`Multiplexer`] it blocks on, the [`DelayNs`] it settles
//! with, and the [`EventSink`] it reports to.  The whole loop therefore
//! runs against the mock adapters in `tests/`.
//!
//! ```text
//!  Multiplexer ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                  │        EventLoop          │
//!   NotifyHandle ◀─│ drain · dispatch · rearm  │──▶ RegisterWindow
//!                  └──────────────────────────┘
//! ```
//!
//! One iteration ([`step`](EventLoop::step)):
//!
//! 1. quit requested? stop.
//! 2. block in the multiplexer until a handle is ready.
//! 3. quit requested? stop without servicing.
//! 4. for each ready handle in increasing token order: drain the count,
//!    settle, dispatch to the handler.
//! 5. pause, back to idle.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{debug, info, warn};

use super::context::ReactorContext;
use super::events::AppEvent;
use super::handler;
use super::ports::{EventSink, Multiplexer, NotifyHandle, ReadyList, WaitSource};
use crate::board::Board;
use crate::config::{AppConfig, MAX_GPIO_DEVICES, TimingConfig};
use crate::drivers::color::ColorModel;
use crate::drivers::gpio;
use crate::drivers::regs::RegisterWindow;
use crate::shutdown::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Blocked in, or about to enter, the wait.
    Idle,
    /// Working through a batch of ready handles.
    Servicing,
}

/// Outcome of one [`EventLoop::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Quit was requested; nothing was serviced.
    Quit,
    /// This many ready handles were serviced.
    Serviced(usize),
    /// The wait failed; the caller should simply step again.
    WaitFailed,
}

pub struct EventLoop<W, H, M, D, S> {
    board: Board<W, H>,
    ctx: ReactorContext,
    color: ColorModel,
    timing: TimingConfig,
    mux: M,
    delay: D,
    sink: S,
    /// Wait-set slots, ordered by handle token.
    wait_set: Vec<usize, MAX_GPIO_DEVICES>,
    state: LoopState,
}

impl<W, H, M, D, S> EventLoop<W, H, M, D, S>
where
    W: RegisterWindow,
    H: NotifyHandle,
    M: Multiplexer<H>,
    D: DelayNs,
    S: EventSink,
{
    pub fn new(board: Board<W, H>, config: &AppConfig, mux: M, delay: D, sink: S) -> Self {
        Self {
            board,
            ctx: ReactorContext::new(&config.palette),
            color: ColorModel::new(&config.leds),
            timing: config.timing,
            mux,
            delay,
            sink,
            wait_set: Vec::new(),
            state: LoopState::Idle,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Build the wait set and clear any interrupt left pending from
    /// before start-up.  Returns the number of sources armed.
    pub fn arm(&mut self) -> usize {
        self.wait_set.clear();
        for slot in self.board.wait_slots() {
            // Wait set capacity equals the device table's.
            let _ = self.wait_set.push(slot);
        }
        let board = &self.board;
        self.wait_set.sort_unstable_by_key(|&slot| token_of(board, slot));

        for &slot in &self.wait_set {
            let dev = &mut self.board.gpio[slot];
            if let (Some(window), Some(handle)) = (dev.window.as_mut(), dev.handle.as_mut()) {
                info!("Arming {} on handle {}", dev.name, handle.token());
                gpio::rearm(window, handle, &mut self.delay, &self.timing);
            }
        }

        let sources = self.wait_set.len();
        self.sink.emit(&AppEvent::Armed { sources });
        sources
    }

    /// Run one wait-and-service iteration.
    pub fn step(&mut self, cancel: &CancelToken) -> Step {
        if cancel.is_cancelled() {
            return Step::Quit;
        }

        let mut ready = ReadyList::new();
        let waited = {
            let board = &self.board;
            let sources: Vec<WaitSource<'_, H>, MAX_GPIO_DEVICES> = self
                .wait_set
                .iter()
                .filter_map(|&slot| {
                    board.gpio[slot]
                        .handle
                        .as_ref()
                        .map(|handle| WaitSource { slot, handle })
                })
                .collect();
            self.mux.wait(&sources, &mut ready)
        };

        if cancel.is_cancelled() {
            return Step::Quit;
        }
        if let Err(e) = waited {
            warn!("wait failed: {}", e);
            self.sink.emit(&AppEvent::WaitFailed(e.kind()));
            return Step::WaitFailed;
        }

        self.state = LoopState::Servicing;
        let board = &self.board;
        ready.sort_unstable_by_key(|&slot| token_of(board, slot));

        for &slot in &ready {
            if let Some(handle) = self.board.gpio.get_mut(slot).and_then(|d| d.handle.as_mut()) {
                match handle.drain() {
                    Ok(count) => debug!("handle {}: irq count {}", handle.token(), count),
                    Err(e) => warn!("handle {}: drain failed: {}", handle.token(), e),
                }
            }
            self.delay.delay_us(self.timing.drain_settle_us);

            handler::dispatch(
                slot,
                &mut self.board,
                &mut self.ctx,
                &self.color,
                &mut self.delay,
                &mut self.sink,
                &self.timing,
            );
        }

        self.delay.delay_us(self.timing.batch_pause_us);
        self.state = LoopState::Idle;
        Step::Serviced(ready.len())
    }

    /// Step until quit is requested.
    pub fn run(&mut self, cancel: &CancelToken) {
        while self.step(cancel) != Step::Quit {}
        info!("Event loop stopped");
        self.sink.emit(&AppEvent::Stopped);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn context(&self) -> &ReactorContext {
        &self.ctx
    }

    pub fn board(&self) -> &Board<W, H> {
        &self.board
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Wait-set slots in service order.
    pub fn wait_set(&self) -> &[usize] {
        &self.wait_set
    }

    /// Give the board back for shutdown.
    pub fn into_board(self) -> Board<W, H> {
        self.board
    }
}

fn token_of<W, H: NotifyHandle>(board: &Board<W, H>, slot: usize) -> u64 {
    board
        .gpio
        .get(slot)
        .and_then(|d| d.handle.as_ref())
        .map_or(u64::MAX, NotifyHandle::token)
}
