/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::ManagedObjectReference,
};

/// The root descriptor of a vim25 endpoint.
#[derive(Serialize, Clone, PartialEq, Default, Debug)]
pub struct ServiceContent {
    pub root_folder: ManagedObjectReference,
    pub property_collector: ManagedObjectReference,
    pub view_manager: ManagedObjectReference,
    pub session_manager: ManagedObjectReference,
    pub search_index: Option<ManagedObjectReference>,
    pub task_manager: Option<ManagedObjectReference>,
    pub event_manager: Option<ManagedObjectReference>,
    pub perf_manager: Option<ManagedObjectReference>,
    pub about: AboutInfo,
}

#[derive(Serialize, Clone, PartialEq, Eq, Default, Debug)]
pub struct AboutInfo {
    pub name: String,
    pub full_name: String,
    pub vendor: String,
    pub version: String,
    pub build: String,
    pub os_type: Option<String>,
    pub product_line_id: Option<String>,
    pub api_type: String,
    pub api_version: String,
    pub instance_uuid: Option<String>,
}

#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct UserSession {
    pub key: String,
    pub user_name: String,
    pub full_name: Option<String>,
    pub login_time: DateTime<Utc>,
    pub last_active_time: Option<DateTime<Utc>>,
    pub locale: Option<String>,
    pub message_locale: Option<String>,
}

pub(crate) fn parse_service_content(body: &str) -> Result<ServiceContent> {
    let res: Envelope<ServiceContentBody> = serde_xml_rs::from_str(body)
        .map_err(|e| Error::Deserialize("RetrieveServiceContent", e))?;
    Ok(res.body.response.returnval.into())
}

pub(crate) fn parse_login(body: &str) -> Result<UserSession> {
    let res: Envelope<LoginBody> = serde_xml_rs::from_str(body)
        .map_err(|e| Error::Deserialize("Login", e))?;
    Ok(res.body.response.returnval.into())
}

#[derive(Deserialize, Debug, Clone)]
struct Value<T> {
    #[serde(rename = "$value")]
    data: T,
}

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    #[serde(rename = "Body")]
    body: T,
}

#[derive(Deserialize, Debug)]
struct Response<T> {
    returnval: T,
}

#[derive(Deserialize, Debug)]
struct ServiceContentBody {
    #[serde(rename = "RetrieveServiceContentResponse")]
    response: Response<ReturnValue>,
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    #[serde(rename = "LoginResponse")]
    response: Response<Session>,
}

#[derive(Deserialize, Debug)]
struct ReturnValue {
    #[serde(rename = "rootFolder")]
    root_folder: Value<String>,
    #[serde(rename = "propertyCollector")]
    property_collector: Value<String>,
    #[serde(rename = "viewManager")]
    view_manager: Value<String>,
    about: About,
    #[serde(rename = "sessionManager")]
    session_manager: Value<String>,
    #[serde(rename = "searchIndex")]
    search_index: Option<Value<String>>,
    #[serde(rename = "taskManager")]
    task_manager: Option<Value<String>>,
    #[serde(rename = "eventManager")]
    event_manager: Option<Value<String>>,
    #[serde(rename = "perfManager")]
    perf_manager: Option<Value<String>>,
}

#[derive(Deserialize, Debug)]
struct About {
    name: Value<String>,
    #[serde(rename = "fullName")]
    fullname: Value<String>,
    vendor: Value<String>,
    version: Value<String>,
    build: Value<String>,
    #[serde(rename = "osType")]
    os_type: Option<Value<String>>,
    #[serde(rename = "productLineId")]
    product_line_id: Option<Value<String>>,
    #[serde(rename = "apiType")]
    api_type: Value<String>,
    #[serde(rename = "apiVersion")]
    api_version: Value<String>,
    #[serde(rename = "instanceUuid")]
    instance_uuid: Option<Value<String>>,
}

#[derive(Deserialize, Debug)]
struct Session {
    key: Value<String>,
    #[serde(rename = "userName")]
    username: Value<String>,
    #[serde(rename = "fullName")]
    fullname: Option<Value<String>>,
    #[serde(rename = "loginTime")]
    login_time: Value<DateTime<Utc>>,
    #[serde(rename = "lastActiveTime")]
    last_active_time: Option<Value<DateTime<Utc>>>,
    locale: Option<Value<String>>,
    #[serde(rename = "messageLocale")]
    message_locale: Option<Value<String>>,
}

fn moref(typ: &str, value: Value<String>) -> ManagedObjectReference {
    ManagedObjectReference::new(typ, value.data)
}

impl From<ReturnValue> for ServiceContent {
    fn from(val: ReturnValue) -> Self {
        Self {
            root_folder: moref("Folder", val.root_folder),
            property_collector: moref(
                "PropertyCollector",
                val.property_collector,
            ),
            view_manager: moref("ViewManager", val.view_manager),
            session_manager: moref("SessionManager", val.session_manager),
            search_index: val.search_index.map(|v| moref("SearchIndex", v)),
            task_manager: val.task_manager.map(|v| moref("TaskManager", v)),
            event_manager: val
                .event_manager
                .map(|v| moref("EventManager", v)),
            perf_manager: val
                .perf_manager
                .map(|v| moref("PerformanceManager", v)),
            about: val.about.into(),
        }
    }
}

impl From<About> for AboutInfo {
    fn from(about: About) -> Self {
        Self {
            name: about.name.data,
            full_name: about.fullname.data,
            vendor: about.vendor.data,
            version: about.version.data,
            build: about.build.data,
            os_type: about.os_type.map(|v| v.data),
            product_line_id: about.product_line_id.map(|v| v.data),
            api_type: about.api_type.data,
            api_version: about.api_version.data,
            instance_uuid: about.instance_uuid.map(|v| v.data),
        }
    }
}

impl From<Session> for UserSession {
    fn from(session: Session) -> Self {
        Self {
            key: session.key.data,
            user_name: session.username.data,
            full_name: session.fullname.map(|v| v.data),
            login_time: session.login_time.data,
            last_active_time: session.last_active_time.map(|v| v.data),
            locale: session.locale.map(|v| v.data),
            message_locale: session.message_locale.map(|v| v.data),
        }
    }
}
