//! Fatal-signal handling: ensure every sensitive buffer is zeroized no
//! matter how the process dies.
//!
//! Two distinct mechanisms, because they have different safety
//! requirements:
//!
//! - Catchable termination signals (`SIGTERM`, `SIGINT`, `SIGHUP`,
//!   `SIGPIPE`, `SIGQUIT`) go through `signal_hook`, which defers the
//!   actual handler body out of signal context via a self-pipe, so it is
//!   safe to call `std::process::exit` from the registered closure.
//! - Crash signals (`SIGSEGV`, `SIGBUS`, `SIGILL`, `SIGABRT`) are
//!   registered directly with `libc::signal`, because the handler runs
//!   in genuine signal context with the process already in an
//!   inconsistent state — `zeroize_all` is written to be safe there
//!   (atomic loads, volatile writes, no allocation), but `signal_hook`'s
//!   own setup machinery is not meant to be invoked from inside a crash
//!   handler, so the raw libc route is used instead.

use crate::secure;

const CRASH_SIGNALS: [libc::c_int; 4] = [libc::SIGSEGV, libc::SIGBUS, libc::SIGILL, libc::SIGABRT];
const TERM_SIGNALS: [libc::c_int; 5] = [
    libc::SIGTERM,
    libc::SIGINT,
    libc::SIGHUP,
    libc::SIGPIPE,
    libc::SIGQUIT,
];

extern "C" fn on_crash_signal(signum: libc::c_int) {
    secure::zeroize_all();
    unsafe {
        libc::signal(signum, libc::SIG_DFL);
        libc::raise(signum);
    }
}

/// Install handlers for both signal classes. Best-effort: a failure to
/// register is logged and otherwise ignored, since running without
/// signal-triggered zeroization is strictly worse than refusing to
/// start, but still better than crashing on the installation itself.
pub fn install() {
    for &sig in &CRASH_SIGNALS {
        let rc = unsafe { libc::signal(sig, on_crash_signal as libc::sighandler_t) };
        if rc == libc::SIG_ERR {
            tracing::warn!(signal = sig, "failed to install crash signal handler");
        }
    }

    let mut signals = match signal_hook::iterator::Signals::new(TERM_SIGNALS) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to install terminating signal handler");
            return;
        }
    };
    std::thread::spawn(move || {
        for signal in signals.forever() {
            secure::zeroize_all();
            std::process::exit(128 + signal);
        }
    });
}
