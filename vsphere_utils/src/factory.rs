/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use log::{debug, error, info, warn};
use soap::SessionCookie;
use tap::TapFallible;
use vim25::{VimApi, VimPort, VIM_SOAP_ACTION};

use crate::{
    client::{EsxiClient, VcenterClient, VimClient},
    config::Config,
    cookie::{cookie_header, extract_session_id},
    error::{AuthenticationError, Result},
    session::SessionId,
    transport::{Transport, API_PATH, SDK_PATH},
    vapi::{SecurityContext, Session, StubFactory},
    version::is_803_or_later,
};

/// Creates authenticated vCenter clients.
#[derive(Debug)]
pub struct VcenterClientFactory {
    transport: Transport,
}

/// Creates authenticated ESXi clients.
#[derive(Debug)]
pub struct EsxiClientFactory {
    transport: Transport,
}

impl VcenterClientFactory {
    pub async fn new(config: Config) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config).await?,
        })
    }

    pub fn config(&self) -> &Config {
        self.transport.config()
    }

    /// Log in and negotiate the api session. Fails without leaving a
    /// session behind.
    pub async fn create_client(
        &self,
        username: &str,
        password: &str,
        locale: Option<&str>,
    ) -> Result<VcenterClient> {
        let vim = login(&self.transport, username, password, locale).await?;
        match self.api_session(&vim, username, password).await {
            Ok(api_session) => Ok(VcenterClient::new(vim, api_session)),
            Err(e) => {
                vim.logout().await;
                Err(e)
            }
        }
    }

    async fn api_session(
        &self,
        vim: &VimClient,
        username: &str,
        password: &str,
    ) -> Result<SessionId> {
        let api_version = &vim.service_content().await?.about.api_version;
        debug!(
            "creating vCenter client for {} (server version = {})",
            self.transport.url(SDK_PATH),
            api_version
        );

        if is_803_or_later(api_version)? {
            info!("reusing vim session for the api");
            return Ok(vim.session_id().clone());
        }

        let stub_factory = StubFactory::new(
            self.transport.url(API_PATH),
            self.transport.client().clone(),
        );
        let session: Session =
            stub_factory.create_stub(SecurityContext::UserPassword {
                username: username.to_string(),
                password: password.to_string(),
            });
        let id = session
            .create()
            .await
            .tap_err(|e| error!("failed to create api session: {}", e))
            .map_err(AuthenticationError::ApiSession)?;
        info!("created separate api session");
        Ok(id)
    }
}

impl EsxiClientFactory {
    pub async fn new(config: Config) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config).await?,
        })
    }

    pub fn config(&self) -> &Config {
        self.transport.config()
    }

    pub async fn create_client(
        &self,
        username: &str,
        password: &str,
        locale: Option<&str>,
    ) -> Result<EsxiClient> {
        let vim = login(&self.transport, username, password, locale).await?;
        Ok(EsxiClient::new(vim))
    }
}

/// Log in on the vim25 endpoint and fetch the authenticated service
/// content.
async fn login(
    transport: &Transport,
    username: &str,
    password: &str,
    locale: Option<&str>,
) -> Result<VimClient> {
    let port = VimPort::new(transport.soap(SDK_PATH, VIM_SOAP_ACTION, None));
    let content = port
        .retrieve_service_content()
        .await
        .map_err(AuthenticationError::ServiceContent)?;
    let res = port
        .login(&content.session_manager, username, password, locale)
        .await
        .tap_err(|e| error!("could not authenticate as {}: {}", username, e))
        .map_err(AuthenticationError::Login)?;
    let session = extract_session_id(&res.set_cookie)?;

    let port = VimPort::new(transport.soap(
        SDK_PATH,
        VIM_SOAP_ACTION,
        Some(SessionCookie::Http(cookie_header(&session))),
    ));
    let content = match port.retrieve_service_content().await {
        Ok(content) => content,
        Err(e) => {
            error!("could not retrieve the service content: {}", e);
            if let Err(e) = port.logout(&content.session_manager).await {
                warn!("failed to log out: {}", e);
            }
            return Err(AuthenticationError::ServiceContent(e).into());
        }
    };

    info!(
        "logged in as {} on {}",
        res.session.user_name,
        transport.config().hostname
    );
    Ok(VimClient::new(transport.clone(), session, content))
}
