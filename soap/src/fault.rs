/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;

use xml::reader::{EventReader, XmlEvent};

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A SOAP fault as returned in the body of a failed request.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Fault {
    pub code: String,
    pub message: String,
    /// The fault type from the fault detail (e.g. `InvalidProperty`).
    pub kind: Option<String>,
}

impl Fault {
    /// Extract the fault from a response body. Returns `None` when the
    /// body does not contain a `Fault` element.
    pub fn parse(body: &str) -> Option<Self> {
        let mut reader = EventReader::from_str(body);
        let mut path: Vec<String> = Vec::new();
        let mut in_fault = false;
        let mut code = String::new();
        let mut message = String::new();
        let mut kind = None;

        loop {
            match reader.next() {
                Ok(XmlEvent::StartElement {
                    name, attributes, ..
                }) => {
                    if in_fault
                        && kind.is_none()
                        && path.last().map(String::as_str) == Some("detail")
                    {
                        let typ = attributes
                            .iter()
                            .find(|attr| {
                                attr.name.namespace.as_deref() == Some(XSI_NS)
                                    && attr.name.local_name == "type"
                            })
                            .map(|attr| match attr.value.split_once(':') {
                                Some((_, local)) => local.to_string(),
                                None => attr.value.clone(),
                            });
                        kind = Some(typ.unwrap_or_else(|| {
                            let local = name.local_name.as_str();
                            local
                                .strip_suffix("Fault")
                                .unwrap_or(local)
                                .to_string()
                        }));
                    }
                    if name.local_name == "Fault" {
                        in_fault = true;
                    }
                    path.push(name.local_name);
                }
                Ok(XmlEvent::Characters(s)) | Ok(XmlEvent::CData(s)) => {
                    if in_fault {
                        match path.last().map(String::as_str) {
                            Some("faultcode") => code.push_str(&s),
                            Some("faultstring") => message.push_str(&s),
                            _ => {}
                        }
                    }
                }
                Ok(XmlEvent::EndElement { .. }) => {
                    path.pop();
                }
                Ok(XmlEvent::EndDocument) | Err(_) => break,
                Ok(_) => {}
            }
        }

        in_fault.then_some(Self {
            code,
            message,
            kind,
        })
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{}: {}", kind, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Fault;

    #[test]
    fn parse_invalid_property_fault() {
        const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"
                  xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<soapenv:Body>
<soapenv:Fault><faultcode>ServerFaultCode</faultcode><faultstring></faultstring><detail><InvalidPropertyFault xmlns="urn:vim25" xsi:type="InvalidProperty"><name>nam</name></InvalidPropertyFault></detail></soapenv:Fault>
</soapenv:Body>
</soapenv:Envelope>"#;
        let fault = Fault::parse(BODY).unwrap();
        assert_eq!(fault.code, "ServerFaultCode");
        assert_eq!(fault.message, "");
        assert!(fault.is("InvalidProperty"));
    }

    #[test]
    fn parse_fault_without_type_attribute() {
        const BODY: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><soapenv:Fault><faultcode>ServerFaultCode</faultcode><faultstring>Cannot complete login due to an incorrect user name or password.</faultstring><detail><InvalidLoginFault xmlns="urn:vim25"/></detail></soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;
        let fault = Fault::parse(BODY).unwrap();
        assert_eq!(fault.kind.as_deref(), Some("InvalidLogin"));
        assert_eq!(
            fault.to_string(),
            "InvalidLogin: Cannot complete login due to an incorrect user \
             name or password."
        );
    }

    #[test]
    fn no_fault_in_regular_response() {
        assert_eq!(
            Fault::parse("<Envelope><Body><LogoutResponse/></Body></Envelope>"),
            None
        );
        assert_eq!(Fault::parse("not xml at all"), None);
    }
}
