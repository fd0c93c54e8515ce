//! Injected event sinks: progress, log lines and the final summary.

use std::sync::Mutex;
use std::sync::mpsc::Sender;

use tracing::{debug, error, info, warn};

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumLogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One event emitted by a split run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitEvent {
    /// Progress update in percent (0..=100).
    Progress { message: String, pct: u8 },
    /// Discrete leveled log line.
    Log { level: EnumLogLevel, message: String },
    /// Terminal signal, sent exactly once per run.
    Finished { success: bool, summary: String },
}

/// Receiver of split events.
pub trait SplitEventSink {
    fn event(&self, event: SplitEvent);

    fn progress(&self, message: impl Into<String>, pct: u8)
    where
        Self: Sized,
    {
        self.event(SplitEvent::Progress {
            message: message.into(),
            pct,
        });
    }

    fn log(&self, level: EnumLogLevel, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.event(SplitEvent::Log {
            level,
            message: message.into(),
        });
    }
}

/// Emit helpers usable through `&dyn SplitEventSink`.
pub(crate) fn emit_progress(sink: &dyn SplitEventSink, message: impl Into<String>, pct: u8) {
    sink.event(SplitEvent::Progress {
        message: message.into(),
        pct,
    });
}

pub(crate) fn emit_log(sink: &dyn SplitEventSink, level: EnumLogLevel, message: impl Into<String>) {
    sink.event(SplitEvent::Log {
        level,
        message: message.into(),
    });
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl SplitEventSink for TracingEventSink {
    fn event(&self, event: SplitEvent) {
        match event {
            SplitEvent::Progress { message, pct } => info!(pct, "{message}"),
            SplitEvent::Log { level, message } => match level {
                EnumLogLevel::Debug => debug!("{message}"),
                EnumLogLevel::Info => info!("{message}"),
                EnumLogLevel::Warning => warn!("{message}"),
                EnumLogLevel::Error => error!("{message}"),
            },
            SplitEvent::Finished { success, summary } => {
                if success {
                    info!("{summary}");
                } else {
                    error!("{summary}");
                }
            }
        }
    }
}

/// Records every event in memory.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    l_events: Mutex<Vec<SplitEvent>>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<SplitEvent> {
        match self.l_events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Progress percentages in emit order.
    pub fn progress_values(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SplitEvent::Progress { pct, .. } => Some(pct),
                _ => None,
            })
            .collect()
    }

    /// Log messages at `level`.
    pub fn messages_at(&self, level: EnumLogLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SplitEvent::Log { level: l, message } if l == level => Some(message),
                _ => None,
            })
            .collect()
    }

    /// The terminal event, if sent.
    pub fn finished(&self) -> Option<(bool, String)> {
        self.events().into_iter().find_map(|event| match event {
            SplitEvent::Finished { success, summary } => Some((success, summary)),
            _ => None,
        })
    }
}

impl SplitEventSink for CollectingEventSink {
    fn event(&self, event: SplitEvent) {
        match self.l_events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Message-queue sink; a dropped receiver silently discards events.
impl SplitEventSink for Sender<SplitEvent> {
    fn event(&self, event: SplitEvent) {
        let _ = self.send(event);
    }
}
