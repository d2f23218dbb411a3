/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::ops::Deref;

use log::{debug, info, warn};
use soap::SessionCookie;
use tokio::sync::OnceCell;
use vim25::{
    ServiceContent, ServiceInstanceContent, SiblingPort, SiblingService,
    VimApi, VimPort, VIM_SOAP_ACTION,
};

use crate::{
    config::Config,
    cookie::cookie_header,
    error::{Error, Result},
    property_collector::PropertyCollectorHelper,
    session::SessionId,
    transport::{Transport, API_PATH, SDK_PATH},
    vapi::{SecurityContext, Service, Session, StubFactory},
};

/// An authenticated session on the vim25 endpoint.
#[derive(Debug)]
pub struct VimClient {
    transport: Transport,
    session: SessionId,
    content: OnceCell<ServiceContent>,
}

impl VimClient {
    pub(crate) fn new(
        transport: Transport,
        session: SessionId,
        content: ServiceContent,
    ) -> Self {
        Self {
            transport,
            session,
            content: OnceCell::from(content),
        }
    }

    pub fn config(&self) -> &Config {
        self.transport.config()
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    /// A fresh vim25 handle carrying the session cookie.
    pub fn vim_port(&self) -> VimPort {
        VimPort::new(self.transport.soap(
            SDK_PATH,
            VIM_SOAP_ACTION,
            Some(SessionCookie::Http(cookie_header(&self.session))),
        ))
    }

    /// A fresh handle on a sibling service sharing this session.
    pub fn sibling_port(&self, service: SiblingService) -> SiblingPort {
        let cookie = service.session_cookie(
            self.session.as_str(),
            &cookie_header(&self.session),
        );
        SiblingPort::new(
            service,
            self.transport.soap(
                service.path(),
                service.soap_action(),
                Some(cookie),
            ),
        )
    }

    /// The service content, kept for the life of the session.
    pub async fn service_content(&self) -> Result<&ServiceContent> {
        self.content
            .get_or_try_init(|| async {
                self.vim_port()
                    .retrieve_service_content()
                    .await
                    .map_err(Error::Vim)
            })
            .await
    }

    pub async fn property_collector(
        &self,
    ) -> Result<PropertyCollectorHelper<VimPort>> {
        let content = self.service_content().await?.clone();
        Ok(PropertyCollectorHelper::new(self.vim_port(), content))
    }

    /// Log out of the vim25 session. Failures are logged.
    pub async fn logout(&self) {
        let session_manager = match self.service_content().await {
            Ok(content) => content.session_manager.clone(),
            Err(e) => {
                warn!("failed to log out: {}", e);
                return;
            }
        };
        match self.vim_port().logout(&session_manager).await {
            Ok(()) => debug!("logged out of {}", self.transport.url(SDK_PATH)),
            Err(e) => warn!("failed to log out: {}", e),
        }
    }
}

/// A vCenter client: a vim25 session plus an api session, which may be
/// the same credential.
#[derive(Debug)]
pub struct VcenterClient {
    vim: VimClient,
    api_session: SessionId,
    stub_factory: StubFactory,
    pbm_content: OnceCell<ServiceInstanceContent>,
    vslm_content: OnceCell<ServiceInstanceContent>,
}

impl Deref for VcenterClient {
    type Target = VimClient;

    fn deref(&self) -> &Self::Target {
        &self.vim
    }
}

impl VcenterClient {
    pub(crate) fn new(vim: VimClient, api_session: SessionId) -> Self {
        let stub_factory = StubFactory::new(
            vim.transport().url(API_PATH),
            vim.transport().client().clone(),
        );
        Self {
            vim,
            api_session,
            stub_factory,
            pbm_content: OnceCell::new(),
            vslm_content: OnceCell::new(),
        }
    }

    pub fn api_session_id(&self) -> &SessionId {
        &self.api_session
    }

    pub fn stub_factory(&self) -> &StubFactory {
        &self.stub_factory
    }

    /// A stub for an api service, authenticated with the api session.
    pub fn create_stub<S: Service>(&self) -> S {
        self.stub_factory
            .create_stub(SecurityContext::Session(self.api_session.clone()))
    }

    pub fn pbm_port(&self) -> SiblingPort {
        self.sibling_port(SiblingService::Pbm)
    }

    pub fn sms_port(&self) -> SiblingPort {
        self.sibling_port(SiblingService::Sms)
    }

    pub fn vslm_port(&self) -> SiblingPort {
        self.sibling_port(SiblingService::Vslm)
    }

    pub fn vsan_health_port(&self) -> SiblingPort {
        self.sibling_port(SiblingService::VsanHealth)
    }

    pub async fn pbm_service_content(
        &self,
    ) -> Result<&ServiceInstanceContent> {
        self.pbm_content
            .get_or_try_init(|| async {
                self.pbm_port().retrieve_content().await.map_err(Error::Vim)
            })
            .await
    }

    pub async fn vslm_service_content(
        &self,
    ) -> Result<&ServiceInstanceContent> {
        self.vslm_content
            .get_or_try_init(|| async {
                self.vslm_port().retrieve_content().await.map_err(Error::Vim)
            })
            .await
    }

    /// Log out of both sessions. Failures are logged.
    pub async fn close(self) {
        self.vim.logout().await;
        if self.api_session != *self.vim.session_id() {
            let session: Session = self.create_stub();
            match session.delete().await {
                Ok(()) => debug!("deleted api session"),
                Err(e) => warn!("failed to delete api session: {}", e),
            }
        }
        info!("closed vCenter client for {}", self.config().hostname);
    }
}

/// An ESXi client: a single vim25 session.
#[derive(Debug)]
pub struct EsxiClient {
    vim: VimClient,
}

impl Deref for EsxiClient {
    type Target = VimClient;

    fn deref(&self) -> &Self::Target {
        &self.vim
    }
}

impl EsxiClient {
    pub(crate) fn new(vim: VimClient) -> Self {
        Self { vim }
    }

    pub fn vsan_port(&self) -> SiblingPort {
        self.sibling_port(SiblingService::VsanEsx)
    }

    pub async fn close(self) {
        self.vim.logout().await;
        info!("closed ESXi client for {}", self.config().hostname);
    }
}
