//! Interrupt handling: SIGINT/SIGTERM request a graceful stop.
use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Shared view of the stop request, checked by workers between jobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelToken {
    flag: Option<&'static AtomicBool>,
}

impl CancelToken {
    /// Token backed by the process-wide signal flag.
    pub fn process() -> Self {
        Self {
            flag: Some(&INTERRUPTED),
        }
    }

    /// Token backed by a caller-owned flag.
    #[cfg(test)]
    pub fn from_flag(flag: &'static AtomicBool) -> Self {
        Self { flag: Some(flag) }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

#[cfg(unix)]
extern "C" fn on_signal(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install handlers so an interrupt stops dispatch instead of killing us.
#[cfg(unix)]
pub fn install() {
    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signal in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only stores to an atomic, which is signal-safe.
        let previous = unsafe { libc::signal(signal, handler) };
        if previous == libc::SIG_ERR {
            tracing::warn!(signal, "failed to install interrupt handler");
        }
    }
}

#[cfg(not(unix))]
pub fn install() {}
