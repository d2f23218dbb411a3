/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::value::{EnumValue, Value};

/// A reference to a server-side object: (type, opaque id).
#[derive(
    Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Default, Debug,
)]
pub struct ManagedObjectReference {
    pub r#type: String,
    pub value: String,
}

impl ManagedObjectReference {
    pub fn new<T: Into<String>, V: Into<String>>(r#type: T, value: V) -> Self {
        Self {
            r#type: r#type.into(),
            value: value.into(),
        }
    }

    pub fn is(&self, typ: &ManagedObjectType) -> bool {
        self.r#type == typ.as_str()
    }
}

impl fmt::Display for ManagedObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.r#type, self.value)
    }
}

macro_rules! managed_object_types {
    ($($name:ident),* $(,)?) => {
        /// Managed object types used in container views and property
        /// specs. Types without a variant are carried as `Other`.
        #[derive(Clone, PartialEq, Eq, Hash, Debug)]
        pub enum ManagedObjectType {
            $($name,)*
            Other(String),
        }

        impl ManagedObjectType {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$name => stringify!($name),)*
                    Self::Other(name) => name.as_str(),
                }
            }
        }

        impl FromStr for ManagedObjectType {
            type Err = Infallible;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(match s {
                    $(stringify!($name) => Self::$name,)*
                    _ => Self::Other(s.to_string()),
                })
            }
        }
    };
}

managed_object_types!(
    ClusterComputeResource,
    ComputeResource,
    ContainerView,
    Datacenter,
    Datastore,
    DistributedVirtualPortgroup,
    DistributedVirtualSwitch,
    Folder,
    HostSystem,
    HttpNfcLease,
    ManagedEntity,
    Network,
    PropertyCollector,
    PropertyFilter,
    ResourcePool,
    SessionManager,
    StoragePod,
    Task,
    ViewManager,
    VirtualApp,
    VirtualMachine,
    VmwareDistributedVirtualSwitch,
);

impl fmt::Display for ManagedObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/* Request types. */

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct PropertySpec {
    pub r#type: String,
    pub all: Option<bool>,
    pub path_set: Vec<String>,
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct ObjectSpec {
    pub obj: ManagedObjectReference,
    pub skip: Option<bool>,
    pub select_set: Vec<SelectionSpec>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SelectionSpec {
    /// Reference to a traversal spec by name.
    Named(String),
    Traversal(TraversalSpec),
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct TraversalSpec {
    pub name: Option<String>,
    pub r#type: String,
    pub path: String,
    pub skip: Option<bool>,
    pub select_set: Vec<SelectionSpec>,
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct PropertyFilterSpec {
    pub prop_set: Vec<PropertySpec>,
    pub object_set: Vec<ObjectSpec>,
    pub report_missing_objects_in_results: Option<bool>,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct RetrieveOptions {
    pub max_objects: Option<i32>,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct WaitOptions {
    pub max_wait_seconds: Option<i32>,
    pub max_object_updates: Option<i32>,
}

/* Response types. */

#[derive(Serialize, Clone, PartialEq, Default, Debug)]
pub struct RetrieveResult {
    pub token: Option<String>,
    pub objects: Vec<ObjectContent>,
}

#[derive(Serialize, Clone, PartialEq, Default, Debug)]
pub struct ObjectContent {
    pub obj: ManagedObjectReference,
    pub prop_set: Vec<DynamicProperty>,
}

impl ObjectContent {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.prop_set
            .iter()
            .find(|prop| prop.name == name)
            .and_then(|prop| prop.val.as_ref())
    }
}

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct DynamicProperty {
    pub name: String,
    pub val: Option<Value>,
}

#[derive(Clone, PartialEq, Default, Debug)]
pub struct UpdateSet {
    pub version: String,
    pub filter_set: Vec<PropertyFilterUpdate>,
    pub truncated: Option<bool>,
}

#[derive(Clone, PartialEq, Default, Debug)]
pub struct PropertyFilterUpdate {
    pub filter: ManagedObjectReference,
    pub object_set: Vec<ObjectUpdate>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ObjectUpdate {
    pub kind: ObjectUpdateKind,
    pub obj: ManagedObjectReference,
    pub change_set: Vec<PropertyChange>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ObjectUpdateKind {
    Modify,
    Enter,
    Leave,
    Other(String),
}

impl From<&str> for ObjectUpdateKind {
    fn from(s: &str) -> Self {
        match s {
            "modify" => Self::Modify,
            "enter" => Self::Enter,
            "leave" => Self::Leave,
            _ => Self::Other(s.to_string()),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct PropertyChange {
    pub name: String,
    pub op: PropertyChangeOp,
    pub val: Option<Value>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PropertyChangeOp {
    Add,
    Remove,
    Assign,
    IndirectRemove,
    Other(String),
}

impl From<&str> for PropertyChangeOp {
    fn from(s: &str) -> Self {
        match s {
            "add" => Self::Add,
            "remove" => Self::Remove,
            "assign" => Self::Assign,
            "indirectRemove" => Self::IndirectRemove,
            _ => Self::Other(s.to_string()),
        }
    }
}

/* Enumerations compared against property values. */

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskInfoState {
    Queued,
    Running,
    Success,
    Error,
}

impl TaskInfoState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl From<TaskInfoState> for Value {
    fn from(state: TaskInfoState) -> Self {
        Value::Enum(EnumValue::new("TaskInfoState", state.as_str()))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HttpNfcLeaseState {
    Initializing,
    Ready,
    Done,
    Error,
}

impl HttpNfcLeaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl From<HttpNfcLeaseState> for Value {
    fn from(state: HttpNfcLeaseState) -> Self {
        Value::Enum(EnumValue::new("HttpNfcLeaseState", state.as_str()))
    }
}
