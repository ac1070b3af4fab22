//! Terminal progress indicator.
//!
//! A background thread redraws `<glyph> <message>` over the current line on a
//! fixed tick until it is stopped, then clears the line once. The message and
//! active flag share one mutex; the glyph index belongs to the render thread
//! alone. Callers must `stop()` (which joins) before printing anything else,
//! or the spinner would interleave with their output.

use crossbeam_channel::{bounded, tick, Receiver, Sender};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

const GLYPHS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const TICK_INTERVAL: Duration = Duration::from_millis(100);
const CLEAR_LINE: &str = "\r\x1b[K";

struct IndicatorState {
    message: String,
    active: bool,
}

fn lock(state: &Mutex<IndicatorState>) -> MutexGuard<'_, IndicatorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a running indicator thread.
pub struct Indicator {
    shared: Arc<Mutex<IndicatorState>>,
    stop_tx: Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Indicator {
    /// Spawn the render thread and start animating immediately.
    pub fn start(message: &str) -> Self {
        let shared = Arc::new(Mutex::new(IndicatorState {
            message: message.to_string(),
            active: true,
        }));
        let (stop_tx, stop_rx) = bounded(1);
        let render_shared = shared.clone();
        let handle = thread::spawn(move || {
            let ticker = tick(TICK_INTERVAL);
            let mut out = io::stdout();
            render_loop(&render_shared, &stop_rx, &ticker, &mut out);
        });
        Self {
            shared,
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Swap the message, optionally (re)activating rendering.
    pub fn set_text(&self, message: &str, activate: bool) {
        let mut state = lock(&self.shared);
        state.message = message.to_string();
        if activate {
            state.active = true;
        }
    }

    /// Deactivate, wake the render thread, and join it. Safe to call any
    /// number of times; the line is cleared exactly once, by the render
    /// thread on its way out.
    pub fn stop(&mut self) {
        lock(&self.shared).active = false;
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_active(&self) -> bool {
        lock(&self.shared).active
    }
}

impl Drop for Indicator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Draw on every tick until stopped or deactivated, then clear the line.
/// The tick source is injected so tests can drive the loop without timing.
fn render_loop<W: Write>(
    shared: &Mutex<IndicatorState>,
    stop_rx: &Receiver<()>,
    ticker: &Receiver<Instant>,
    out: &mut W,
) {
    let mut glyph = 0usize;
    loop {
        let drawn = {
            let state = lock(shared);
            if !state.active {
                break;
            }
            let _ = write!(out, "\r{} {}", GLYPHS[glyph], state.message);
            true
        };
        if drawn {
            let _ = out.flush();
            glyph = (glyph + 1) % GLYPHS.len();
        }
        crossbeam_channel::select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> msg => {
                if msg.is_err() {
                    break;
                }
            }
        }
    }
    let _ = write!(out, "{CLEAR_LINE}");
    let _ = out.flush();
}
