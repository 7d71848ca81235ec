//! Customer identity for order-scoped routes.
//!
//! The storefront knows who its customers are; the gateway does not. When the storefront calls an order route on a
//! customer's behalf, it sends the customer id in `X-Cpg-Customer-Id`, signed with the shared secret in
//! `X-Cpg-Customer-Hmac`. Handlers take a [`CustomerIdentity`] argument and check ownership with
//! [`CustomerIdentity::check_owner`] before doing anything else.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use crypto_payment_engine::db_types::Order;
use log::*;

use crate::{
    config::{StorefrontConfig, CUSTOMER_HMAC_HEADER, CUSTOMER_ID_HEADER},
    errors::{AuthError, ServerError},
    helpers::verify_hmac,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerIdentity {
    pub customer_id: String,
}

impl CustomerIdentity {
    pub fn check_owner(&self, order: &Order) -> Result<(), ServerError> {
        if order.customer_id == self.customer_id {
            Ok(())
        } else {
            warn!("💻️ Customer {} tried to access order {}, which is not theirs", self.customer_id, order.order_id);
            Err(AuthError::NotOrderOwner.into())
        }
    }
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|s| !s.is_empty())
}

pub fn identify_customer(req: &HttpRequest) -> Result<CustomerIdentity, ServerError> {
    let customer_id = header_value(req, CUSTOMER_ID_HEADER).ok_or(AuthError::MissingCustomerId)?;
    let checks = req.app_data::<web::Data<StorefrontConfig>>().map(|c| (c.hmac_checks, c.hmac_secret.clone()));
    match checks {
        Some((false, _)) => trace!("💻️ HMAC checks are disabled. Trusting customer id {customer_id}"),
        Some((true, secret)) => {
            let signature = header_value(req, CUSTOMER_HMAC_HEADER).ok_or(AuthError::InvalidSignature)?;
            if !verify_hmac(secret.reveal(), customer_id.as_bytes(), signature) {
                warn!("💻️ Invalid customer signature for customer id {customer_id}");
                return Err(AuthError::InvalidSignature.into());
            }
        },
        None => {
            error!("💻️ No storefront configuration was registered with the app. Denying access.");
            return Err(AuthError::InvalidSignature.into());
        },
    }
    Ok(CustomerIdentity { customer_id: customer_id.to_string() })
}

impl FromRequest for CustomerIdentity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identify_customer(req))
    }
}
