use crate::obs::{event::ChangeBatch, metrics};
use std::{cell::RefCell, rc::Rc};

///
/// SinkEvent
///

#[derive(Clone, Debug)]
pub enum SinkEvent {
    /// One external mutation's consolidated diff.
    Batch(ChangeBatch),
    /// A detected recompute cycle (programming error; the pass stopped).
    RecomputeCycle { model: String, field: String },
}

///
/// EventSink
///

pub trait EventSink {
    fn record(&self, event: &SinkEvent);
}

/// GlobalEventSink
/// Default process-local sink that writes into global counters state.
/// Acts as the concrete sink when no scoped override is installed.

struct GlobalEventSink;

impl EventSink for GlobalEventSink {
    fn record(&self, event: &SinkEvent) {
        match event {
            SinkEvent::Batch(batch) => {
                metrics::with_state_mut(|m| {
                    m.batches_flushed = m.batches_flushed.saturating_add(1);
                    m.records_created = m.records_created.saturating_add(batch.created.len() as u64);
                    m.records_deleted = m.records_deleted.saturating_add(batch.deleted.len() as u64);
                    let changed: u64 = batch
                        .updated
                        .iter()
                        .map(|(_, fields)| fields.len() as u64)
                        .sum();
                    m.fields_changed = m.fields_changed.saturating_add(changed);
                });
            }
            SinkEvent::RecomputeCycle { .. } => {
                // Counted at the detection site; nothing further globally.
            }
        }
    }
}

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn EventSink>>> = const { RefCell::new(None) };
}

///
/// SinkGuard
/// Restores the previously installed sink on drop.
///

pub struct SinkGuard {
    previous: Option<Rc<dyn EventSink>>,
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        SINK_OVERRIDE.with_borrow_mut(|current| {
            *current = self.previous.take();
        });
    }
}

/// Install a scoped sink override for the current thread. UI layers and
/// tests subscribe to change batches this way.
#[must_use]
pub fn install(sink: Rc<dyn EventSink>) -> SinkGuard {
    let previous = SINK_OVERRIDE.with_borrow_mut(|current| current.replace(sink));

    SinkGuard { previous }
}

/// Dispatch one event to the installed sink, defaulting to global counters.
pub(crate) fn record(event: &SinkEvent) {
    let sink = SINK_OVERRIDE.with_borrow(Clone::clone);
    match sink {
        Some(sink) => sink.record(event),
        None => GlobalEventSink.record(event),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingSink {
        seen: Cell<usize>,
    }

    impl EventSink for CountingSink {
        fn record(&self, _event: &SinkEvent) {
            self.seen.set(self.seen.get() + 1);
        }
    }

    #[test]
    fn override_is_scoped() {
        let sink = Rc::new(CountingSink { seen: Cell::new(0) });
        {
            let _guard = install(sink.clone());
            record(&SinkEvent::Batch(ChangeBatch::default()));
            record(&SinkEvent::Batch(ChangeBatch::default()));
        }
        // Guard dropped; this one goes to the global sink.
        record(&SinkEvent::Batch(ChangeBatch::default()));

        assert_eq!(sink.seen.get(), 2);
    }
}
