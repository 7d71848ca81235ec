mod hmac;
mod sweep_trigger;

pub use hmac::{
    check_signature,
    SignatureRejection,
    StorefrontSignatureFactory,
    StorefrontSignatureService,
    BAD_SIGNATURE,
    UNSIGNED_REQUEST,
};
pub use sweep_trigger::{SweepTriggerMiddlewareFactory, SweepTriggerMiddlewareService};
