/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod await_updates;
mod client;
mod config;
mod cookie;
mod error;
mod factory;
mod property_collector;
mod session;
mod transport;
pub mod vapi;
mod version;

pub use await_updates::{
    decode_state_value, AwaitOptions, AwaitOutcome, LegacyState, StateValue,
    DEFAULT_MAX_WAIT,
};
pub use client::{EsxiClient, VcenterClient, VimClient};
pub use config::{Config, HttpsStrategy};
pub use cookie::{cookie_header, extract_session_id, VMWARE_SOAP_SESSION_COOKIE};
pub use error::{AuthenticationError, Error, Result, TransportError};
pub use factory::{EsxiClientFactory, VcenterClientFactory};
pub use property_collector::{
    create_property_filter_spec,
    create_property_filter_specs_for_container_view, create_property_spec,
    PropertyCollectorHelper, PropertyMap, DEFAULT_CHUNK_SIZE,
};
pub use session::SessionId;
pub use version::{is_803_or_later, ApiVersion, VersionError};
