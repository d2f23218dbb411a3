/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod error;
mod port;
pub mod request;
mod response;
mod service_content;
mod sibling;
mod types;
mod value;

pub use error::{Error, Result};
pub use port::{LoginResponse, VimApi, VimPort, VIM_NAMESPACE, VIM_SOAP_ACTION};
pub use service_content::{AboutInfo, ServiceContent, UserSession};
pub use sibling::{
    ServiceInstanceContent, SiblingAbout, SiblingPort, SiblingService,
};
pub use types::{
    DynamicProperty, HttpNfcLeaseState, ManagedObjectReference,
    ManagedObjectType, ObjectContent, ObjectSpec, ObjectUpdate,
    ObjectUpdateKind, PropertyChange, PropertyChangeOp, PropertyFilterSpec,
    PropertyFilterUpdate, PropertySpec, RetrieveOptions, RetrieveResult,
    SelectionSpec, TaskInfoState, TraversalSpec, UpdateSet, WaitOptions,
};
pub use value::{
    EnumValue, GenericObject, GenericValue, LocalizedMethodFault, Value,
};
