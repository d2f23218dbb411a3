/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use crate::{error::AuthenticationError, session::SessionId};

pub const VMWARE_SOAP_SESSION_COOKIE: &str = "vmware_soap_session";

/// Find the session id in the `Set-Cookie` headers of a login response.
pub fn extract_session_id(
    set_cookie: &[String],
) -> Result<SessionId, AuthenticationError> {
    set_cookie
        .iter()
        .flat_map(|header| header.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == VMWARE_SOAP_SESSION_COOKIE)
        .map(|(_, value)| SessionId::new(value.trim().trim_matches('"')))
        .filter(|id| !id.as_str().is_empty())
        .ok_or(AuthenticationError::MissingSessionCookie(
            VMWARE_SOAP_SESSION_COOKIE,
        ))
}

/// The `Cookie` header value presenting the session on the vim25 endpoint.
pub fn cookie_header(session: &SessionId) -> String {
    format!("{}=\"{}\"", VMWARE_SOAP_SESSION_COOKIE, session.as_str())
}
