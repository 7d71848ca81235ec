//! Organic sweep triggers.
//!
//! Every request that passes through this middleware offers the sweeper a [`SweepTrigger::PageLoad`]. The sweep runs
//! in the background on the worker's local task set, so the request itself is never delayed. The sweeper's guard
//! decides whether a sweep actually happens.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use crypto_payment_engine::{OrderStore, SweepTrigger, Sweeper};
use futures::future::LocalBoxFuture;
use log::*;

pub struct SweepTriggerMiddlewareFactory<D> {
    sweeper: Sweeper<D>,
    // Requests to these paths never trigger a sweep
    excluded: Vec<String>,
}

impl<D> SweepTriggerMiddlewareFactory<D> {
    pub fn new(sweeper: Sweeper<D>, excluded: &[&str]) -> Self {
        Self { sweeper, excluded: excluded.iter().map(|s| s.to_string()).collect() }
    }
}

impl<S, B, D> Transform<S, ServiceRequest> for SweepTriggerMiddlewareFactory<D>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    D: OrderStore + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SweepTriggerMiddlewareService<S, D>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SweepTriggerMiddlewareService {
            sweeper: self.sweeper.clone(),
            excluded: self.excluded.clone(),
            service: Rc::new(service),
        }))
    }
}

pub struct SweepTriggerMiddlewareService<S, D> {
    sweeper: Sweeper<D>,
    excluded: Vec<String>,
    service: Rc<S>,
}

impl<S, B, D> Service<ServiceRequest> for SweepTriggerMiddlewareService<S, D>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    D: OrderStore + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.excluded.iter().any(|p| p == req.path()) {
            let sweeper = self.sweeper.clone();
            actix_web::rt::spawn(async move {
                let n = sweeper.run_sweep_if_due(SweepTrigger::PageLoad).await;
                if n > 0 {
                    debug!("💻️ Page load sweep processed {n} orders");
                }
            });
        }
        let service = Rc::clone(&self.service);
        Box::pin(async move { service.call(req).await })
    }
}
