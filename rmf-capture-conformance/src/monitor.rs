//! Delivery-side instrumentation for the data-flow suites.
//!
//! [`DeliveryCounter`] is the buffer sink handed to the HAL. Every callback
//! updates its counts under one lock and wakes anyone waiting on it.
//! [`JitterMonitor`] samples a counter once per interval on its own thread,
//! sleeping with a timed wait that a cancel wakes immediately.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use rmf_capture_core::BufferSink;

#[derive(Debug, Default)]
struct Counts {
    bytes: u64,
    callbacks: u64,
    empty_buffers: u64,
    captured: Vec<u8>,
}

/// Counts of one counter at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub bytes: u64,
    pub callbacks: u64,
    /// Callbacks that carried no data. Always a contract violation.
    pub empty_buffers: u64,
}

pub struct DeliveryCounter {
    counts: Mutex<Counts>,
    delivered: Condvar,
    record: bool,
}

impl DeliveryCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            counts: Mutex::new(Counts::default()),
            delivered: Condvar::new(),
            record: false,
        })
    }

    /// A counter that also keeps every delivered byte, for artifacts.
    pub fn recording() -> Arc<Self> {
        Arc::new(Self {
            counts: Mutex::new(Counts::default()),
            delivered: Condvar::new(),
            record: true,
        })
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        let counts = self.counts.lock();
        CounterSnapshot {
            bytes: counts.bytes,
            callbacks: counts.callbacks,
            empty_buffers: counts.empty_buffers,
        }
    }

    pub fn bytes(&self) -> u64 {
        self.counts.lock().bytes
    }

    pub fn take_captured(&self) -> Vec<u8> {
        std::mem::take(&mut self.counts.lock().captured)
    }

    /// Block until at least `at_least` bytes have arrived or `timeout` passes.
    pub fn wait_for_bytes(&self, at_least: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut counts = self.counts.lock();
        while counts.bytes < at_least {
            if self.delivered.wait_until(&mut counts, deadline).timed_out() {
                return counts.bytes >= at_least;
            }
        }
        true
    }
}

impl BufferSink for DeliveryCounter {
    fn on_buffer_ready(&self, buffer: &[u8]) {
        let mut counts = self.counts.lock();
        counts.callbacks += 1;
        if buffer.is_empty() {
            counts.empty_buffers += 1;
            return;
        }
        counts.bytes += buffer.len() as u64;
        if self.record {
            counts.captured.extend_from_slice(buffer);
        }
        drop(counts);
        self.delivered.notify_all();
    }
}

/// One sampling interval that delivered less than the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    /// Zero-based interval index.
    pub interval: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JitterReport {
    pub intervals: u64,
    pub min_bytes: Option<u64>,
    pub shortfalls: Vec<Shortfall>,
}

impl JitterReport {
    pub fn is_clean(&self) -> bool {
        self.intervals > 0 && self.shortfalls.is_empty()
    }
}

/// Parameters of one jitter run.
#[derive(Debug, Clone, Copy)]
pub struct JitterConfig {
    pub interval: Duration,
    pub threshold_bytes: u64,
    pub window: Duration,
}

struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Checks that every interval of a window delivers at least the threshold.
pub struct JitterMonitor {
    signal: Arc<StopSignal>,
    handle: thread::JoinHandle<JitterReport>,
}

impl JitterMonitor {
    pub fn spawn(name: &str, counter: Arc<DeliveryCounter>, config: JitterConfig) -> std::io::Result<Self> {
        let signal = Arc::new(StopSignal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });
        let thread_signal = Arc::clone(&signal);
        let label = name.to_string();
        let handle = thread::Builder::new()
            .name(format!("jitter-{name}"))
            .spawn(move || monitor_loop(&label, &counter, config, &thread_signal))?;
        Ok(Self { signal, handle })
    }

    /// Wait for the window to run out. `None` if the monitor thread panicked.
    pub fn finish(self) -> Option<JitterReport> {
        self.handle.join().ok()
    }

    /// End the run early, keeping the intervals completed so far.
    pub fn cancel(self) -> Option<JitterReport> {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();
        self.finish()
    }
}

fn monitor_loop(name: &str, counter: &DeliveryCounter, config: JitterConfig, signal: &StopSignal) -> JitterReport {
    let started = Instant::now();
    let end = started + config.window;
    let mut report = JitterReport::default();
    let mut last = counter.bytes();
    let mut next = started + config.interval;

    log::debug!(
        "Jitter monitor {} running: {:?} intervals, {} bytes minimum, {:?} window",
        name,
        config.interval,
        config.threshold_bytes,
        config.window
    );

    while next <= end {
        {
            let mut stopped = signal.stopped.lock();
            while !*stopped {
                if signal.wake.wait_until(&mut stopped, next).timed_out() {
                    break;
                }
            }
            if *stopped {
                break;
            }
        }

        let now = counter.bytes();
        let delta = now.saturating_sub(last);
        if delta < config.threshold_bytes {
            log::warn!(
                "Jitter monitor {}: interval {} delivered {} bytes, below {}",
                name,
                report.intervals,
                delta,
                config.threshold_bytes
            );
            report.shortfalls.push(Shortfall {
                interval: report.intervals,
                bytes: delta,
            });
        }
        report.min_bytes = Some(report.min_bytes.map_or(delta, |m| m.min(delta)));
        report.intervals += 1;
        last = now;
        next += config.interval;
    }

    log::debug!(
        "Jitter monitor {} done: {} intervals, {} shortfalls",
        name,
        report.intervals,
        report.shortfalls.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_flags_empty_buffers() {
        let counter = DeliveryCounter::new();
        counter.on_buffer_ready(&[1, 2, 3, 4]);
        counter.on_buffer_ready(&[]);
        counter.on_buffer_ready(&[5, 6]);

        let snap = counter.snapshot();
        assert_eq!(snap.bytes, 6);
        assert_eq!(snap.callbacks, 3);
        assert_eq!(snap.empty_buffers, 1);
        assert!(counter.take_captured().is_empty());
    }

    #[test]
    fn recording_keeps_payload() {
        let counter = DeliveryCounter::recording();
        counter.on_buffer_ready(&[1, 2]);
        counter.on_buffer_ready(&[3]);
        assert_eq!(counter.take_captured(), vec![1, 2, 3]);
        assert_eq!(counter.bytes(), 3);
    }

    #[test]
    fn wait_for_bytes_wakes_on_delivery() {
        let counter = DeliveryCounter::new();
        let feeder = Arc::clone(&counter);
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            feeder.on_buffer_ready(&[0u8; 64]);
        });
        assert!(counter.wait_for_bytes(64, Duration::from_secs(5)));
        t.join().unwrap();
        assert!(!counter.wait_for_bytes(65, Duration::from_millis(20)));
    }

    #[test]
    fn silent_stream_shows_shortfalls() {
        let counter = DeliveryCounter::new();
        let config = JitterConfig {
            interval: Duration::from_millis(20),
            threshold_bytes: 1,
            window: Duration::from_millis(100),
        };
        let report = JitterMonitor::spawn("silent", counter, config).unwrap().finish().unwrap();
        assert_eq!(report.intervals, 5);
        assert_eq!(report.shortfalls.len(), 5);
        assert_eq!(report.min_bytes, Some(0));
        assert!(!report.is_clean());
    }

    #[test]
    fn steady_stream_is_clean() {
        let counter = DeliveryCounter::new();
        let running = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let feeder = {
            let counter = Arc::clone(&counter);
            let running = Arc::clone(&running);
            thread::spawn(move || {
                while running.load(std::sync::atomic::Ordering::SeqCst) {
                    counter.on_buffer_ready(&[0u8; 100]);
                    thread::sleep(Duration::from_millis(2));
                }
            })
        };
        let config = JitterConfig {
            interval: Duration::from_millis(50),
            threshold_bytes: 100,
            window: Duration::from_millis(200),
        };
        let report = JitterMonitor::spawn("steady", Arc::clone(&counter), config)
            .unwrap()
            .finish()
            .unwrap();
        running.store(false, std::sync::atomic::Ordering::SeqCst);
        feeder.join().unwrap();

        assert_eq!(report.intervals, 4);
        assert!(report.is_clean(), "{report:?}");
    }

    #[test]
    fn cancel_returns_promptly() {
        let counter = DeliveryCounter::new();
        let config = JitterConfig {
            interval: Duration::from_secs(1),
            threshold_bytes: 1,
            window: Duration::from_secs(60),
        };
        let started = Instant::now();
        let report = JitterMonitor::spawn("cancelled", counter, config).unwrap().cancel().unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(report.intervals, 0);
    }
}
