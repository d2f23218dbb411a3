/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use log::{debug, trace};
use reqwest::{
    header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    Client, StatusCode,
};
use crate::{
    error::{Result, SoapError},
    fault::Fault,
};

/// How an authenticated session is presented to the endpoint.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SessionCookie {
    /// Sent as the HTTP `Cookie` header (value is the full header).
    Http(String),
    /// Sent as a `vcSessionCookie` element in the SOAP header.
    SoapHeader(String),
}

#[derive(Clone, Debug)]
pub struct SoapClient {
    endpoint: String,
    action: String,
    client: Client,
    session: Option<SessionCookie>,
}

#[derive(Debug)]
pub struct SoapResponse {
    pub status: StatusCode,
    pub set_cookie: Vec<String>,
    pub body: String,
}

impl SoapClient {
    pub fn new(endpoint: String, action: String, client: Client) -> Self {
        Self {
            endpoint,
            action,
            client,
            session: None,
        }
    }

    pub fn with_session(mut self, session: SessionCookie) -> Self {
        self.session = Some(session);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn session(&self) -> Option<&SessionCookie> {
        self.session.as_ref()
    }

    fn envelope(&self, body: &str) -> String {
        let header = match &self.session {
            Some(SessionCookie::SoapHeader(id)) => format!(
                "<vcSessionCookie>{}</vcSessionCookie>",
                xml::escape::escape_str_pcdata(id)
            ),
            _ => String::new(),
        };
        format!(
            r#"<SOAP-ENV:Envelope
						xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/"
						xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
						xmlns:xsd="http://www.w3.org/2001/XMLSchema"
						xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
					<SOAP-ENV:Header>{}</SOAP-ENV:Header>
					{}
				</SOAP-ENV:Envelope>"#,
            header, body
        )
    }

    /// Post a request body. Request bodies are not logged since they may
    /// contain credentials.
    pub async fn request(&self, body: String) -> Result<SoapResponse> {
        debug!("sending soap request to {}", self.endpoint);
        let mut req = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=\"utf-8\"")
            .header("SOAPAction", self.action.as_str())
            .body(self.envelope(&body));
        if let Some(SessionCookie::Http(cookie)) = &self.session {
            req = req.header(COOKIE, cookie.as_str());
        }

        let response = req
            .send()
            .await
            .map_err(|e| SoapError::Request(self.endpoint.clone(), e))?;
        let status = response.status();
        let set_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| SoapError::Response(self.endpoint.clone(), e))?;
        trace!("soap response ({}): {}", status, body);

        if status.is_success() {
            return Ok(SoapResponse {
                status,
                set_cookie,
                body,
            });
        }

        let err = match Fault::parse(&body) {
            Some(fault) => SoapError::Fault(fault),
            None => SoapError::Status(self.endpoint.clone(), status, body),
        };
        debug!("soap request to {} failed: {}", self.endpoint, err);
        Err(err)
    }
}
