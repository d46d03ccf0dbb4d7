use heapless::Deque;

use super::error::ClientError;
use super::mapping::{MappingKey, ParameterMapping};
use super::value::ParameterValue;
use super::MAX_PENDING_EVENTS;

/// Identifies a listener towards the client. Assigned by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ListenerId(pub u16);

/// Snapshot of a mapping handed to listeners.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParameterUpdate {
    pub key: MappingKey,
    pub name: &'static str,
    /// Value right after the parse (or the feedback write). Always `None`
    /// for terminations of requests that never got an answer.
    pub value: Option<ParameterValue>,
}

impl ParameterUpdate {
    pub(crate) fn of(key: MappingKey, mapping: &ParameterMapping) -> Self {
        Self {
            key,
            name: mapping.name,
            value: mapping.value.clone(),
        }
    }

    /// Returns `true` if this update is about `mapping` (or an equal one).
    pub fn concerns(&self, mapping: &ParameterMapping) -> bool {
        mapping.has_key(self.key)
    }
}

/// Capability to react to parameter notifications.
pub trait ClientListener {
    /// A response for the mapping arrived (or a feedback value was set).
    fn parameter_changed(&mut self, update: &ParameterUpdate);

    /// The request for the mapping was given up (timeout or connection loss).
    fn request_terminated(&mut self, update: &ParameterUpdate);
}

/// Placeholder upstream that ignores everything.
impl ClientListener for () {
    fn parameter_changed(&mut self, _update: &ParameterUpdate) {}
    fn request_terminated(&mut self, _update: &ParameterUpdate) {}
}

/// Resolves listener ids when notifications are dispatched.
pub trait Listeners {
    fn listener(&mut self, id: ListenerId) -> Option<&mut dyn ClientListener>;
}

// ── Outbox ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventKind {
    Changed,
    Terminated,
}

#[derive(Debug, Clone)]
pub(crate) struct PendingEvent {
    pub listener: ListenerId,
    pub kind: EventKind,
    pub update: ParameterUpdate,
}

/// Notifications queued until the next dispatch.
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    events: Deque<PendingEvent, MAX_PENDING_EVENTS>,
}

impl Outbox {
    pub fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    /// Queue one event per listener, in the given order.
    ///
    /// All or nothing: if the batch does not fit, nothing is queued.
    pub fn push_all(
        &mut self,
        listeners: &[ListenerId],
        kind: EventKind,
        update: &ParameterUpdate,
    ) -> Result<(), ClientError> {
        if self.events.capacity() - self.events.len() < listeners.len() {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Client: outbox full, dropping {} notifications for {}",
                listeners.len(),
                update.name
            );
            return Err(ClientError::OutboxFull);
        }
        for &listener in listeners {
            let event = PendingEvent {
                listener,
                kind,
                update: update.clone(),
            };
            // Room was checked above.
            let _ = self.events.push_back(event);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Deliver and remove all queued events, oldest first.
    pub fn dispatch(&mut self, listeners: &mut dyn Listeners) {
        while let Some(event) = self.events.pop_front() {
            let Some(target) = listeners.listener(event.listener) else {
                #[cfg(feature = "defmt")]
                defmt::debug!("Client: no listener with id {}", event.listener);
                continue;
            };
            match event.kind {
                EventKind::Changed => target.parameter_changed(&event.update),
                EventKind::Terminated => target.request_terminated(&event.update),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MAX_LISTENERS_PER_REQUEST;

    #[derive(Default)]
    struct Recorder {
        changed: std::vec::Vec<Option<ParameterValue>>,
        terminated: usize,
    }

    impl ClientListener for Recorder {
        fn parameter_changed(&mut self, update: &ParameterUpdate) {
            self.changed.push(update.value.clone());
        }
        fn request_terminated(&mut self, _update: &ParameterUpdate) {
            self.terminated += 1;
        }
    }

    struct Two {
        a: Recorder,
        b: Recorder,
    }

    impl Listeners for Two {
        fn listener(&mut self, id: ListenerId) -> Option<&mut dyn ClientListener> {
            match id.0 {
                0 => Some(&mut self.a),
                1 => Some(&mut self.b),
                _ => None,
            }
        }
    }

    fn update(value: i32) -> ParameterUpdate {
        ParameterUpdate {
            key: MappingKey(1),
            name: "p",
            value: Some(ParameterValue::Number(value)),
        }
    }

    #[test]
    fn dispatch_delivers_in_order_and_drains() {
        let mut outbox = Outbox::new();
        let mut two = Two {
            a: Recorder::default(),
            b: Recorder::default(),
        };

        outbox
            .push_all(&[ListenerId(0), ListenerId(1)], EventKind::Changed, &update(3))
            .unwrap();
        outbox
            .push_all(&[ListenerId(0)], EventKind::Changed, &update(4))
            .unwrap();
        outbox
            .push_all(&[ListenerId(1)], EventKind::Terminated, &update(0))
            .unwrap();
        assert_eq!(outbox.len(), 4);

        outbox.dispatch(&mut two);
        assert!(outbox.is_empty());
        assert_eq!(
            two.a.changed,
            vec![Some(ParameterValue::Number(3)), Some(ParameterValue::Number(4))]
        );
        assert_eq!(two.b.changed, vec![Some(ParameterValue::Number(3))]);
        assert_eq!(two.b.terminated, 1);
    }

    #[test]
    fn unknown_listener_is_skipped() {
        let mut outbox = Outbox::new();
        let mut two = Two {
            a: Recorder::default(),
            b: Recorder::default(),
        };
        outbox
            .push_all(&[ListenerId(7), ListenerId(0)], EventKind::Changed, &update(1))
            .unwrap();
        outbox.dispatch(&mut two);
        assert_eq!(two.a.changed.len(), 1);
    }

    // ── Capacity ─────────────────────────────────────────────────────

    #[test]
    fn batch_that_does_not_fit_is_rejected_whole() {
        let mut outbox = Outbox::new();
        let ids: std::vec::Vec<ListenerId> = (0..MAX_LISTENERS_PER_REQUEST as u16)
            .map(ListenerId)
            .collect();
        let batches = MAX_PENDING_EVENTS / MAX_LISTENERS_PER_REQUEST;
        for i in 0..batches {
            outbox
                .push_all(&ids, EventKind::Changed, &update(i as i32))
                .unwrap();
        }
        let free = MAX_PENDING_EVENTS - outbox.len();
        assert!(free < ids.len());

        assert_eq!(
            outbox.push_all(&ids, EventKind::Terminated, &update(-1)),
            Err(ClientError::OutboxFull)
        );
        assert_eq!(outbox.len(), MAX_PENDING_EVENTS - free);

        // A batch that fits the remainder is still taken.
        outbox
            .push_all(&ids[..free], EventKind::Changed, &update(-2))
            .unwrap();
        assert_eq!(outbox.len(), MAX_PENDING_EVENTS);

        let mut two = Two {
            a: Recorder::default(),
            b: Recorder::default(),
        };
        outbox.dispatch(&mut two);
        assert!(outbox.is_empty());
        assert_eq!(two.a.terminated, 0);
        assert_eq!(two.a.changed.len(), batches + usize::from(free > 0));
    }
}
