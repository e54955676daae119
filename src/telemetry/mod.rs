//! 解析过程遥测：记录每次候选尝试、失败、成功与耗尽事件，由应用决定发往何处。
//!
//! Resolution telemetry.
//!
//! The fallback loop reports a [`ResolutionEvent`] for every attempt it makes.
//! Where those events go is up to the application; nothing is collected by
//! default.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResolutionSink`] | Trait for event destinations |
//! | [`NoopSink`] | Default sink, drops everything |
//! | [`InMemorySink`] | Bounded in-memory sink for tests |
//! | [`TracingSink`] | Re-emits events as `tracing` records |
//! | [`CompositeSink`] | Fans out to several sinks |

mod events;

pub use events::{AttemptFailed, AttemptStarted, Exhausted, ResolutionEvent, Succeeded};

use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Destination for resolution events.
#[async_trait]
pub trait ResolutionSink: Send + Sync {
    async fn report(&self, event: ResolutionEvent) -> Result<()>;
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// No-op sink (always available).
pub struct NoopSink;

#[async_trait]
impl ResolutionSink for NoopSink {
    async fn report(&self, _: ResolutionEvent) -> Result<()> {
        Ok(())
    }
}

/// Returns a no-op sink.
pub fn noop_sink() -> Arc<dyn ResolutionSink> {
    Arc::new(NoopSink)
}

/// In-memory sink for testing. Keeps at most `max_events`, dropping the oldest.
pub struct InMemorySink {
    events: RwLock<Vec<ResolutionEvent>>,
    max_events: usize,
}

impl InMemorySink {
    pub fn new(max: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events: max,
        }
    }

    pub fn events(&self) -> Vec<ResolutionEvent> {
        self.events
            .read()
            .map(|e| e.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn events_by_request(&self, req_id: &str) -> Vec<ResolutionEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.request_id() == req_id)
            .collect()
    }

    pub fn clear(&self) {
        match self.events.write() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResolutionSink for InMemorySink {
    async fn report(&self, event: ResolutionEvent) -> Result<()> {
        let mut events = match self.events.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event);
        if events.len() > self.max_events {
            events.remove(0);
        }
        Ok(())
    }
}

/// Logs each event at `info` with its JSON body under the `pen2pdf::resolution` target.
#[derive(Default)]
pub struct TracingSink;

#[async_trait]
impl ResolutionSink for TracingSink {
    async fn report(&self, event: ResolutionEvent) -> Result<()> {
        let body = serde_json::to_string(&event)?;
        tracing::info!(
            target: "pen2pdf::resolution",
            request_id = event.request_id(),
            event = event.event_type(),
            "{}",
            body
        );
        Ok(())
    }
}

/// Composite sink for multiple destinations.
#[derive(Default)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn ResolutionSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(mut self, sink: Arc<dyn ResolutionSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl ResolutionSink for CompositeSink {
    async fn report(&self, event: ResolutionEvent) -> Result<()> {
        for s in &self.sinks {
            let _ = s.report(event.clone()).await;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        for s in &self.sinks {
            let _ = s.close().await;
        }
        Ok(())
    }
}
