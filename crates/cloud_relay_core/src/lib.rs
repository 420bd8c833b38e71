//! Provider-neutral queue relay primitives.
//!
//! This crate owns the message envelope, the size-bounded offload protocol and
//! the request shaping shared by every cloud operation. AWS SDK and Lambda
//! runtime concerns live in `cloud_relay_aws` behind the collaborator traits
//! in [`transport`].

pub mod documents;
pub mod envelope;
pub mod events;
pub mod expiry;
pub mod identifier;
pub mod invoke;
pub mod offload;
pub mod paging;
pub mod transport;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_support;
