/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use async_trait::async_trait;
use log::debug;
use soap::SoapClient;

use crate::{
    error::Result,
    request,
    response::{parse_required, parse_return, Empty},
    service_content::{parse_login, parse_service_content},
    types::{
        ManagedObjectReference, PropertyFilterSpec, RetrieveOptions,
        RetrieveResult, UpdateSet, WaitOptions,
    },
    ServiceContent, UserSession,
};

pub const VIM_NAMESPACE: &str = "urn:vim25";
pub const VIM_SOAP_ACTION: &str = "urn:vim25/7.0.3.0";

/// The vim25 methods used by the property collector helper.
#[async_trait]
pub trait VimApi: Send + Sync {
    async fn retrieve_service_content(&self) -> Result<ServiceContent>;

    async fn create_filter(
        &self,
        collector: &ManagedObjectReference,
        spec: &PropertyFilterSpec,
        partial_updates: bool,
    ) -> Result<ManagedObjectReference>;

    async fn destroy_property_filter(
        &self,
        filter: &ManagedObjectReference,
    ) -> Result<()>;

    /// Returns `None` when no updates arrived within the wait time.
    async fn wait_for_updates_ex(
        &self,
        collector: &ManagedObjectReference,
        version: &str,
        options: &WaitOptions,
    ) -> Result<Option<UpdateSet>>;

    /// Returns `None` when nothing matched.
    async fn retrieve_properties_ex(
        &self,
        collector: &ManagedObjectReference,
        specs: &[PropertyFilterSpec],
        options: &RetrieveOptions,
    ) -> Result<Option<RetrieveResult>>;

    async fn continue_retrieve_properties_ex(
        &self,
        collector: &ManagedObjectReference,
        token: &str,
    ) -> Result<RetrieveResult>;

    async fn cancel_retrieve_properties_ex(
        &self,
        collector: &ManagedObjectReference,
        token: &str,
    ) -> Result<()>;

    async fn create_container_view(
        &self,
        view_manager: &ManagedObjectReference,
        container: &ManagedObjectReference,
        types: &[String],
        recursive: bool,
    ) -> Result<ManagedObjectReference>;

    async fn destroy_view(&self, view: &ManagedObjectReference) -> Result<()>;
}

/// A handle on the vim25 endpoint (`/sdk`).
#[derive(Clone, Debug)]
pub struct VimPort {
    soap: SoapClient,
}

#[derive(Debug)]
pub struct LoginResponse {
    pub session: UserSession,
    /// `Set-Cookie` headers of the login response.
    pub set_cookie: Vec<String>,
}

impl VimPort {
    pub fn new(soap: SoapClient) -> Self {
        Self { soap }
    }

    pub fn soap(&self) -> &SoapClient {
        &self.soap
    }

    pub async fn login(
        &self,
        session_manager: &ManagedObjectReference,
        username: &str,
        password: &str,
        locale: Option<&str>,
    ) -> Result<LoginResponse> {
        debug!("logging in as {} on {}", username, self.soap.endpoint());
        let body = request::login(session_manager, username, password, locale)?;
        let res = self.soap.request(body).await?;
        Ok(LoginResponse {
            session: parse_login(&res.body)?,
            set_cookie: res.set_cookie,
        })
    }

    pub async fn logout(
        &self,
        session_manager: &ManagedObjectReference,
    ) -> Result<()> {
        let body = request::logout(session_manager)?;
        self.soap.request(body).await?;
        Ok(())
    }

    pub async fn power_on_vm_task(
        &self,
        vm: &ManagedObjectReference,
    ) -> Result<ManagedObjectReference> {
        let res = self.soap.request(request::power_on_vm_task(vm)?).await?;
        parse_required("PowerOnVM_Task", &res.body)
    }

    pub async fn power_off_vm_task(
        &self,
        vm: &ManagedObjectReference,
    ) -> Result<ManagedObjectReference> {
        let res = self.soap.request(request::power_off_vm_task(vm)?).await?;
        parse_required("PowerOffVM_Task", &res.body)
    }
}

#[async_trait]
impl VimApi for VimPort {
    async fn retrieve_service_content(&self) -> Result<ServiceContent> {
        let res = self
            .soap
            .request(request::retrieve_service_content())
            .await?;
        parse_service_content(&res.body)
    }

    async fn create_filter(
        &self,
        collector: &ManagedObjectReference,
        spec: &PropertyFilterSpec,
        partial_updates: bool,
    ) -> Result<ManagedObjectReference> {
        let body = request::create_filter(collector, spec, partial_updates)?;
        let res = self.soap.request(body).await?;
        parse_required("CreateFilter", &res.body)
    }

    async fn destroy_property_filter(
        &self,
        filter: &ManagedObjectReference,
    ) -> Result<()> {
        let body = request::destroy_property_filter(filter)?;
        let res = self.soap.request(body).await?;
        parse_return::<Empty>("DestroyPropertyFilter", &res.body)?;
        Ok(())
    }

    async fn wait_for_updates_ex(
        &self,
        collector: &ManagedObjectReference,
        version: &str,
        options: &WaitOptions,
    ) -> Result<Option<UpdateSet>> {
        let body = request::wait_for_updates_ex(collector, version, options)?;
        let res = self.soap.request(body).await?;
        parse_return("WaitForUpdatesEx", &res.body)
    }

    async fn retrieve_properties_ex(
        &self,
        collector: &ManagedObjectReference,
        specs: &[PropertyFilterSpec],
        options: &RetrieveOptions,
    ) -> Result<Option<RetrieveResult>> {
        let body = request::retrieve_properties_ex(collector, specs, options)?;
        let res = self.soap.request(body).await?;
        parse_return("RetrievePropertiesEx", &res.body)
    }

    async fn continue_retrieve_properties_ex(
        &self,
        collector: &ManagedObjectReference,
        token: &str,
    ) -> Result<RetrieveResult> {
        let body = request::continue_retrieve_properties_ex(collector, token)?;
        let res = self.soap.request(body).await?;
        Ok(parse_return("ContinueRetrievePropertiesEx", &res.body)?
            .unwrap_or_default())
    }

    async fn cancel_retrieve_properties_ex(
        &self,
        collector: &ManagedObjectReference,
        token: &str,
    ) -> Result<()> {
        let body = request::cancel_retrieve_properties_ex(collector, token)?;
        let res = self.soap.request(body).await?;
        parse_return::<Empty>("CancelRetrievePropertiesEx", &res.body)?;
        Ok(())
    }

    async fn create_container_view(
        &self,
        view_manager: &ManagedObjectReference,
        container: &ManagedObjectReference,
        types: &[String],
        recursive: bool,
    ) -> Result<ManagedObjectReference> {
        let body = request::create_container_view(
            view_manager,
            container,
            types,
            recursive,
        )?;
        let res = self.soap.request(body).await?;
        parse_required("CreateContainerView", &res.body)
    }

    async fn destroy_view(&self, view: &ManagedObjectReference) -> Result<()> {
        let res = self.soap.request(request::destroy_view(view)?).await?;
        parse_return::<Empty>("DestroyView", &res.body)?;
        Ok(())
    }
}
