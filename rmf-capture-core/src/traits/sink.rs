use crate::models::state::Status;

/// Receiver of captured audio.
///
/// Invoked from the provider's delivery thread, never from the caller's
/// control thread. `buffer` is never empty. Implementations should return
/// promptly; a stalled sink shows up as missed throughput and jitter.
///
/// A sink must not call back into the registry for the session that is
/// delivering to it.
pub trait BufferSink: Send + Sync {
    fn on_buffer_ready(&self, buffer: &[u8]);
}

/// Receiver of session status changes (start and stop).
///
/// Called on the control thread after the transition has completed.
pub trait StatusSink: Send + Sync {
    fn on_status_change(&self, status: &Status);
}

impl<F> BufferSink for F
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn on_buffer_ready(&self, buffer: &[u8]) {
        self(buffer)
    }
}
