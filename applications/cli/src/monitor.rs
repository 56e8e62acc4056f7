//! Display thread polling a meter handle on its own timer

use bullseye_loudness::{MeterHandle, MeterReading};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Background poller standing in for a GUI refresh timer
pub struct DisplayMonitor {
    shutdown: Arc<AtomicBool>,
    thread_handle: JoinHandle<MonitorSummary>,
}

/// What the display thread saw while it ran
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonitorSummary {
    pub polls: u64,
    pub last_reading: Option<MeterReading>,
}

impl DisplayMonitor {
    /// Start polling `handle` every `interval`
    pub fn spawn(handle: MeterHandle, interval: Duration) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let thread_handle = thread::Builder::new()
            .name("meter-display".to_string())
            .spawn(move || Self::display_thread(&handle, interval, &shutdown_clone))?;

        Ok(Self {
            shutdown,
            thread_handle,
        })
    }

    /// Stop the thread and collect its summary
    pub fn stop(self) -> MonitorSummary {
        self.shutdown.store(true, Ordering::Release);
        self.thread_handle.join().unwrap_or_else(|_| {
            tracing::error!("Display thread panicked");
            MonitorSummary::default()
        })
    }

    fn display_thread(
        handle: &MeterHandle,
        interval: Duration,
        shutdown: &AtomicBool,
    ) -> MonitorSummary {
        let mut summary = MonitorSummary::default();
        let mut last_total = None;

        while !shutdown.load(Ordering::Acquire) {
            let reading = handle.reading();
            summary.polls += 1;

            // Only report when a block has closed since the last poll
            if last_total != Some(reading.total_samples_processed) {
                last_total = Some(reading.total_samples_processed);
                tracing::info!(
                    "{:>7.1} LUFS  {:>6.1} dBTP  {:>+6.1} LU",
                    reading.integrated_lufs,
                    reading.true_peak_db,
                    reading.deviation_lu
                );
            }
            summary.last_reading = Some(reading);

            thread::sleep(interval);
        }

        // Final refresh so the summary reflects everything published before stop
        summary.polls += 1;
        summary.last_reading = Some(handle.reading());
        summary
    }
}
