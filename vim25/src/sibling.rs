/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use serde::Serialize;
use soap::{
    from_xml::{attribute, children, ignore_until_end_tag, text, FromElement},
    ParseResult, SessionCookie, SoapClient, SoapResponse,
};
use xml::{attribute::OwnedAttribute, name::OwnedName};

use crate::{
    error::{Error, Result},
    request,
    response::parse_required,
    types::ManagedObjectReference,
};

/// Services that share the vim25 session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SiblingService {
    /// Storage policy based management.
    Pbm,
    /// Storage monitoring.
    Sms,
    /// Storage lifecycle (first class disks).
    Vslm,
    /// vSAN health on vCenter.
    VsanHealth,
    /// vSAN on an ESXi host.
    VsanEsx,
}

impl SiblingService {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Pbm => "/pbm",
            Self::Sms => "/sms/sdk",
            Self::Vslm => "/vslm/sdk",
            Self::VsanHealth => "/vsanHealth",
            Self::VsanEsx => "/vsan",
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Pbm => "urn:pbm",
            Self::Sms => "urn:sms",
            Self::Vslm => "urn:vslm",
            Self::VsanHealth | Self::VsanEsx => "urn:vim25",
        }
    }

    pub fn soap_action(&self) -> &'static str {
        match self {
            Self::Pbm => "urn:pbm/2.0",
            Self::Sms => "urn:sms/6.0",
            Self::Vslm => "urn:vslm/7.0.3.0",
            Self::VsanHealth | Self::VsanEsx => "urn:vsan/7.0.3",
        }
    }

    /// The session cookie as this service expects it. The storage
    /// services read it from the SOAP header, vSAN from the HTTP cookie.
    pub fn session_cookie(
        &self,
        session_id: &str,
        cookie: &str,
    ) -> SessionCookie {
        match self {
            Self::Pbm | Self::Sms | Self::Vslm => {
                SessionCookie::SoapHeader(session_id.to_string())
            }
            Self::VsanHealth | Self::VsanEsx => {
                SessionCookie::Http(cookie.to_string())
            }
        }
    }

    /// The method and `_this` type of the content retrieval call, for the
    /// services that publish one.
    fn content_method(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Pbm => {
                Some(("PbmRetrieveServiceContent", "PbmServiceInstance"))
            }
            Self::Vslm => Some(("RetrieveContent", "VslmServiceInstance")),
            Self::Sms => Some(("QueryAboutInfo", "SmsServiceInstance")),
            Self::VsanHealth | Self::VsanEsx => None,
        }
    }
}

#[derive(Serialize, Clone, PartialEq, Eq, Default, Debug)]
pub struct SiblingAbout {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub version: Option<String>,
    pub api_version: Option<String>,
    pub instance_uuid: Option<String>,
}

/// The service-instance content of a sibling service.
#[derive(Serialize, Clone, PartialEq, Eq, Default, Debug)]
pub struct ServiceInstanceContent {
    pub about: SiblingAbout,
    /// Managed object references by field name (e.g. `profileManager`).
    pub refs: Vec<(String, ManagedObjectReference)>,
}

impl ServiceInstanceContent {
    pub fn get(&self, name: &str) -> Option<&ManagedObjectReference> {
        self.refs.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }
}

#[derive(Clone, Debug)]
pub struct SiblingPort {
    service: SiblingService,
    soap: SoapClient,
}

impl SiblingPort {
    pub fn new(service: SiblingService, soap: SoapClient) -> Self {
        Self { service, soap }
    }

    pub fn service(&self) -> SiblingService {
        self.service
    }

    pub fn soap(&self) -> &SoapClient {
        &self.soap
    }

    /// Send a raw request body (a `SOAP-ENV:Body` element).
    pub async fn request(&self, body: String) -> Result<SoapResponse> {
        Ok(self.soap.request(body).await?)
    }

    /// Retrieve the service-instance content of the storage services.
    pub async fn retrieve_content(&self) -> Result<ServiceInstanceContent> {
        let (method, this_type) = self
            .service
            .content_method()
            .ok_or(Error::NoServiceContent(self.service.path()))?;
        let this = ManagedObjectReference::new(this_type, "ServiceInstance");
        let body =
            request::this_request_ns(self.service.namespace(), method, &this)?;
        let res = self.request(body).await?;
        parse_required(method, &res.body)
    }
}

fn about_field(about: &mut SiblingAbout, field: &str, value: String) {
    match field {
        "name" => about.name = Some(value),
        "fullName" => about.full_name = Some(value),
        "version" => about.version = Some(value),
        "apiVersion" => about.api_version = Some(value),
        "instanceUuid" => about.instance_uuid = Some(value),
        _ => {}
    }
}

fn about_children<'a>(
    xml: &'a [xml::reader::XmlEvent],
    tag: &'a OwnedName,
    about: &mut SiblingAbout,
) -> ParseResult<'a, ()> {
    children(xml, tag, |name, _, xml| {
        let (value, xml) = text(xml, name)?;
        about_field(about, &name.local_name, value);
        Ok(((), xml))
    })
}

impl FromElement for ServiceInstanceContent {
    fn from_element<'a>(
        xml: &'a [xml::reader::XmlEvent],
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut content = ServiceInstanceContent::default();
        let (_, xml) = children(xml, tag, |name, attrs, xml| {
            if name.local_name == "aboutInfo" {
                return about_children(xml, name, &mut content.about);
            }
            match attribute(attrs, None, "type") {
                Some(typ) => {
                    let (value, xml) = text(xml, name)?;
                    content.refs.push((
                        name.local_name.clone(),
                        ManagedObjectReference::new(typ, value.trim()),
                    ));
                    Ok(((), xml))
                }
                // A bare about info (sms), or unknown data.
                None => match text(xml, name) {
                    Ok((value, xml)) => {
                        let field = name.local_name.as_str();
                        about_field(&mut content.about, field, value);
                        Ok(((), xml))
                    }
                    Err(_) => ignore_until_end_tag(xml, name),
                },
            }
        })?;
        Ok((content, xml))
    }
}
