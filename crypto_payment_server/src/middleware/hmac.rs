//! Storefront request signing.
//!
//! Calls from the storefront back end carry a signature over the raw request body: base64(HMAC-SHA256(body)), keyed
//! with `CPG_STOREFRONT_HMAC_SECRET` and sent in `X-Cpg-Hmac-Sha256`. Only the body is signed, so the storefront must
//! not re-serialize the JSON after signing it.
//!
//! Everything under `/storefront` is wrapped with [`StorefrontSignatureFactory`]. Customer-facing routes are not; they
//! identify the customer with [`crate::auth::CustomerIdentity`] instead.
//!
//! With `CPG_HMAC_CHECKS=false` every request is let through. Only do that in development.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::*;

use crate::{
    config::{StorefrontConfig, STOREFRONT_HMAC_HEADER},
    helpers::verify_hmac,
};

pub const UNSIGNED_REQUEST: &str = "Request is not signed by the storefront.";
pub const BAD_SIGNATURE: &str = "Storefront signature does not match the request body.";

/// Why a storefront request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureRejection {
    Unsigned,
    Mismatch,
}

impl SignatureRejection {
    pub fn message(&self) -> &'static str {
        match self {
            SignatureRejection::Unsigned => UNSIGNED_REQUEST,
            SignatureRejection::Mismatch => BAD_SIGNATURE,
        }
    }
}

/// Check `signature` (the raw header value, if any) against `body`.
pub fn check_signature(
    config: &StorefrontConfig,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), SignatureRejection> {
    if !config.hmac_checks {
        return Ok(());
    }
    let signature = signature.map(str::trim).filter(|s| !s.is_empty()).ok_or(SignatureRejection::Unsigned)?;
    if verify_hmac(config.hmac_secret.reveal(), body, signature) {
        Ok(())
    } else {
        Err(SignatureRejection::Mismatch)
    }
}

pub struct StorefrontSignatureFactory {
    config: Rc<StorefrontConfig>,
}

impl StorefrontSignatureFactory {
    pub fn new(config: StorefrontConfig) -> Self {
        if !config.hmac_checks {
            warn!("🔐️ Storefront signature checks are OFF. Anyone can call the /storefront routes.");
        }
        Self { config: Rc::new(config) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for StorefrontSignatureFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = StorefrontSignatureService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StorefrontSignatureService { config: Rc::clone(&self.config), service: Rc::new(service) }))
    }
}

pub struct StorefrontSignatureService<S> {
    config: Rc<StorefrontConfig>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for StorefrontSignatureService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let config = Rc::clone(&self.config);
        Box::pin(async move {
            if !config.hmac_checks {
                return service.call(req).await;
            }
            // The body can only be read once, so it is buffered here and handed back to the handler afterwards
            let body = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Could not read the body of {} {}. {e}", req.method(), req.path());
                ErrorBadRequest("Could not read the request body.")
            })?;
            let signature = req.headers().get(STOREFRONT_HMAC_HEADER).and_then(|v| v.to_str().ok());
            match check_signature(&config, body.as_ref(), signature) {
                Ok(()) => {
                    trace!("🔐️ Storefront signature on {} is valid", req.path());
                    req.set_payload(replay(body));
                    service.call(req).await
                },
                Err(rejection) => {
                    warn!("🔐️ Refusing storefront call to {}. {}", req.path(), rejection.message());
                    Err(ErrorForbidden(rejection.message()))
                },
            }
        })
    }
}

fn replay(body: web::Bytes) -> Payload {
    let (_, mut payload) = h1::Payload::create(true);
    payload.unread_data(body);
    Payload::from(payload)
}
