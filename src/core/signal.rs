//! Interrupt policy: SIGINT is observed by the controlling thread only.
//!
//! Worker threads block SIGINT for themselves with
//! [`block_interrupts_for_current_thread`], so the kernel delivers it to a
//! thread that leaves it unblocked. The handler only flips an atomic flag;
//! the controller checks it between bounded polls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::core::error::BatchError;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Something the controller can ask "has the batch been interrupted?".
pub trait InterruptSource {
    fn interrupted(&self) -> bool;
}

/// Manually triggered interrupt, for embedding and tests.
impl InterruptSource for Arc<AtomicBool> {
    fn interrupted(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

/// Process-wide SIGINT handler, installed at batch start and restored on
/// drop.
pub struct SigintGuard {
    previous: SigAction,
}

impl SigintGuard {
    pub fn install() -> Result<Self, BatchError> {
        INTERRUPTED.store(false, Ordering::SeqCst);
        let action = SigAction::new(
            SigHandler::Handler(on_interrupt),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        // SAFETY: the handler only performs an atomic store.
        let previous = unsafe { signal::sigaction(Signal::SIGINT, &action) }?;
        tracing::debug!("SIGINT handler installed");
        Ok(Self { previous })
    }
}

impl InterruptSource for SigintGuard {
    fn interrupted(&self) -> bool {
        INTERRUPTED.load(Ordering::SeqCst)
    }
}

impl Drop for SigintGuard {
    fn drop(&mut self) {
        // SAFETY: restores the disposition that was active before install.
        if let Err(err) = unsafe { signal::sigaction(Signal::SIGINT, &self.previous) } {
            tracing::warn!(error = %err, "failed to restore SIGINT disposition");
        }
    }
}

pub fn block_interrupts_for_current_thread() -> Result<(), BatchError> {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.thread_block()?;
    Ok(())
}
