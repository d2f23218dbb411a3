/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! Request bodies for the vim25 methods used by this crate.

use std::io::Write;

use handlebars::Handlebars;
use serde::Serialize;
use soap::writer::{
    body, end, moref, request, simple_elem, start, start_typed,
};
use xml::writer::EventWriter;

use crate::{
    error::Result,
    port::VIM_NAMESPACE,
    types::{
        ManagedObjectReference, ObjectSpec, PropertyFilterSpec, PropertySpec,
        RetrieveOptions, SelectionSpec, TraversalSpec, WaitOptions,
    },
};

type XmlResult = xml::writer::Result<()>;

#[derive(Serialize)]
struct LoginArgs<'a> {
    session_manager: &'a str,
    username: &'a str,
    password: &'a str,
    locale: Option<&'a str>,
}

pub fn login(
    session_manager: &ManagedObjectReference,
    username: &str,
    password: &str,
    locale: Option<&str>,
) -> Result<String> {
    let template = r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:Login xsi:type="ns1:LoginRequestType">
								<ns1:_this type="SessionManager">{{session_manager}}</ns1:_this>
								<ns1:userName>{{username}}</ns1:userName>
								<ns1:password>{{password}}</ns1:password>
								{{#if locale}}<ns1:locale>{{locale}}</ns1:locale>{{/if}}
							</ns1:Login>
						</SOAP-ENV:Body>"#;
    let args = LoginArgs {
        session_manager: &session_manager.value,
        username,
        password,
        locale,
    };
    Ok(Handlebars::new().render_template(template, &args)?)
}

#[derive(Serialize)]
struct ThisArgs<'a> {
    this: &'a str,
}

pub fn logout(session_manager: &ManagedObjectReference) -> Result<String> {
    let template = r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:Logout xsi:type="ns1:LogoutRequestType">
								<ns1:_this type="SessionManager">{{this}}</ns1:_this>
							</ns1:Logout>
						</SOAP-ENV:Body>"#;
    let args = ThisArgs {
        this: &session_manager.value,
    };
    Ok(Handlebars::new().render_template(template, &args)?)
}

pub fn retrieve_service_content() -> String {
    r#"<SOAP-ENV:Body xmlns:ns1="urn:vim25">
							<ns1:RetrieveServiceContent xsi:type="ns1:RetrieveServiceContentRequestType">
								<ns1:_this type="ServiceInstance">ServiceInstance</ns1:_this>
							</ns1:RetrieveServiceContent>
						</SOAP-ENV:Body>"#
        .to_string()
}

pub fn retrieve_properties_ex(
    collector: &ManagedObjectReference,
    specs: &[PropertyFilterSpec],
    options: &RetrieveOptions,
) -> Result<String> {
    Ok(body(VIM_NAMESPACE, |xml| {
        request(xml, "RetrievePropertiesEx")?;
        this(xml, collector)?;
        for spec in specs {
            property_filter_spec(xml, "ns1:specSet", spec)?;
        }
        start(xml, "ns1:options")?;
        if let Some(max_objects) = options.max_objects {
            simple_elem(xml, "ns1:maxObjects", &max_objects.to_string())?;
        }
        end(xml)?; // ns1:options
        end(xml) // ns1:RetrievePropertiesEx
    })?)
}

pub fn continue_retrieve_properties_ex(
    collector: &ManagedObjectReference,
    token: &str,
) -> Result<String> {
    token_request("ContinueRetrievePropertiesEx", collector, token)
}

pub fn cancel_retrieve_properties_ex(
    collector: &ManagedObjectReference,
    token: &str,
) -> Result<String> {
    token_request("CancelRetrievePropertiesEx", collector, token)
}

fn token_request(
    method: &str,
    collector: &ManagedObjectReference,
    token: &str,
) -> Result<String> {
    Ok(body(VIM_NAMESPACE, |xml| {
        request(xml, method)?;
        this(xml, collector)?;
        simple_elem(xml, "ns1:token", token)?;
        end(xml)
    })?)
}

pub fn create_filter(
    collector: &ManagedObjectReference,
    spec: &PropertyFilterSpec,
    partial_updates: bool,
) -> Result<String> {
    Ok(body(VIM_NAMESPACE, |xml| {
        request(xml, "CreateFilter")?;
        this(xml, collector)?;
        property_filter_spec(xml, "ns1:spec", spec)?;
        simple_elem(xml, "ns1:partialUpdates", bool_str(partial_updates))?;
        end(xml)
    })?)
}

pub fn destroy_property_filter(
    filter: &ManagedObjectReference,
) -> Result<String> {
    this_request("DestroyPropertyFilter", filter)
}

pub fn wait_for_updates_ex(
    collector: &ManagedObjectReference,
    version: &str,
    options: &WaitOptions,
) -> Result<String> {
    Ok(body(VIM_NAMESPACE, |xml| {
        request(xml, "WaitForUpdatesEx")?;
        this(xml, collector)?;
        simple_elem(xml, "ns1:version", version)?;
        start(xml, "ns1:options")?;
        if let Some(max_wait) = options.max_wait_seconds {
            simple_elem(xml, "ns1:maxWaitSeconds", &max_wait.to_string())?;
        }
        if let Some(max_updates) = options.max_object_updates {
            simple_elem(
                xml,
                "ns1:maxObjectUpdates",
                &max_updates.to_string(),
            )?;
        }
        end(xml)?; // ns1:options
        end(xml)
    })?)
}

pub fn create_container_view(
    view_manager: &ManagedObjectReference,
    container: &ManagedObjectReference,
    types: &[String],
    recursive: bool,
) -> Result<String> {
    Ok(body(VIM_NAMESPACE, |xml| {
        request(xml, "CreateContainerView")?;
        this(xml, view_manager)?;
        moref(xml, "ns1:container", &container.r#type, &container.value)?;
        for typ in types {
            simple_elem(xml, "ns1:type", typ)?;
        }
        simple_elem(xml, "ns1:recursive", bool_str(recursive))?;
        end(xml)
    })?)
}

pub fn destroy_view(view: &ManagedObjectReference) -> Result<String> {
    this_request("DestroyView", view)
}

pub fn power_on_vm_task(vm: &ManagedObjectReference) -> Result<String> {
    this_request("PowerOnVM_Task", vm)
}

pub fn power_off_vm_task(vm: &ManagedObjectReference) -> Result<String> {
    this_request("PowerOffVM_Task", vm)
}

/// A request without arguments other than `_this`, in the given
/// namespace.
pub fn this_request_ns(
    namespace: &str,
    method: &str,
    obj: &ManagedObjectReference,
) -> Result<String> {
    Ok(body(namespace, |xml| {
        request(xml, method)?;
        this(xml, obj)?;
        end(xml)
    })?)
}

fn this_request(method: &str, obj: &ManagedObjectReference) -> Result<String> {
    this_request_ns(VIM_NAMESPACE, method, obj)
}

fn this<W: Write>(
    xml: &mut EventWriter<W>,
    obj: &ManagedObjectReference,
) -> XmlResult {
    moref(xml, "ns1:_this", &obj.r#type, &obj.value)
}

fn bool_str(b: bool) -> &'static str {
    match b {
        true => "true",
        false => "false",
    }
}

fn property_filter_spec<W: Write>(
    xml: &mut EventWriter<W>,
    name: &str,
    spec: &PropertyFilterSpec,
) -> XmlResult {
    start(xml, name)?;
    for prop in &spec.prop_set {
        property_spec(xml, prop)?;
    }
    for obj in &spec.object_set {
        object_spec(xml, obj)?;
    }
    if let Some(report) = spec.report_missing_objects_in_results {
        simple_elem(
            xml,
            "ns1:reportMissingObjectsInResults",
            bool_str(report),
        )?;
    }
    end(xml)
}

fn property_spec<W: Write>(
    xml: &mut EventWriter<W>,
    spec: &PropertySpec,
) -> XmlResult {
    start(xml, "ns1:propSet")?;
    simple_elem(xml, "ns1:type", &spec.r#type)?;
    if let Some(all) = spec.all {
        simple_elem(xml, "ns1:all", bool_str(all))?;
    }
    for path in &spec.path_set {
        simple_elem(xml, "ns1:pathSet", path)?;
    }
    end(xml)
}

fn object_spec<W: Write>(
    xml: &mut EventWriter<W>,
    spec: &ObjectSpec,
) -> XmlResult {
    start(xml, "ns1:objectSet")?;
    moref(xml, "ns1:obj", &spec.obj.r#type, &spec.obj.value)?;
    if let Some(skip) = spec.skip {
        simple_elem(xml, "ns1:skip", bool_str(skip))?;
    }
    for sel in &spec.select_set {
        selection_spec(xml, sel)?;
    }
    end(xml)
}

fn selection_spec<W: Write>(
    xml: &mut EventWriter<W>,
    spec: &SelectionSpec,
) -> XmlResult {
    match spec {
        SelectionSpec::Named(name) => {
            start(xml, "ns1:selectSet")?;
            simple_elem(xml, "ns1:name", name)?;
            end(xml)
        }
        SelectionSpec::Traversal(spec) => traversal_spec(xml, spec),
    }
}

fn traversal_spec<W: Write>(
    xml: &mut EventWriter<W>,
    spec: &TraversalSpec,
) -> XmlResult {
    start_typed(xml, "ns1:selectSet", "ns1:TraversalSpec")?;
    if let Some(name) = &spec.name {
        simple_elem(xml, "ns1:name", name)?;
    }
    simple_elem(xml, "ns1:type", &spec.r#type)?;
    simple_elem(xml, "ns1:path", &spec.path)?;
    if let Some(skip) = spec.skip {
        simple_elem(xml, "ns1:skip", bool_str(skip))?;
    }
    for sel in &spec.select_set {
        selection_spec(xml, sel)?;
    }
    end(xml)
}
