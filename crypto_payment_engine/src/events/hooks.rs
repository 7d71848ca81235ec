use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PaymentConfirmedEvent, PaymentDetectedEvent};

/// Publishes engine events to their handlers.
///
/// Publishing never blocks the caller. If a handler's queue is full, for instance because
/// [`EventHandlers::start_handlers`] was never called, the event is dropped with a warning.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_detected_producer: Vec<EventProducer<PaymentDetectedEvent>>,
    pub payment_confirmed_producer: Vec<EventProducer<PaymentConfirmedEvent>>,
}

impl EventProducers {
    pub fn publish_payment_detected(&self, event: PaymentDetectedEvent) {
        for producer in &self.payment_detected_producer {
            producer.try_publish_event(event.clone());
        }
    }

    pub fn publish_payment_confirmed(&self, event: PaymentConfirmedEvent) {
        for producer in &self.payment_confirmed_producer {
            producer.try_publish_event(event.clone());
        }
    }
}

pub struct EventHandlers {
    pub on_payment_detected: Option<EventHandler<PaymentDetectedEvent>>,
    pub on_payment_confirmed: Option<EventHandler<PaymentConfirmedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_detected = hooks.on_payment_detected.map(|f| EventHandler::new(buffer_size, f));
        let on_payment_confirmed = hooks.on_payment_confirmed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_detected, on_payment_confirmed }
    }

    /// Producers for every configured handler. Events queue up to `buffer_size` per handler until
    /// [`Self::start_handlers`] runs; anything beyond that is dropped.
    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_detected {
            result.payment_detected_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_confirmed {
            result.payment_confirmed_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawn a task for each configured handler. The tasks end once every producer has been dropped.
    pub fn start_handlers(self) {
        if let Some(handler) = self.on_payment_detected {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_confirmed {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_detected: Option<Handler<PaymentDetectedEvent>>,
    pub on_payment_confirmed: Option<Handler<PaymentConfirmedEvent>>,
}

impl EventHooks {
    pub fn on_payment_detected<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentDetectedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_detected = Some(Arc::new(f));
        self
    }

    pub fn on_payment_confirmed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentConfirmedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_confirmed = Some(Arc::new(f));
        self
    }
}
