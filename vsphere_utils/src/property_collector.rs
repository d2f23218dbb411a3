/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::collections::HashMap;
use std::ops::ControlFlow;

use log::{debug, error, warn};
use vim25::{
    DynamicProperty, ManagedObjectReference, ManagedObjectType, ObjectContent,
    ObjectSpec, PropertyFilterSpec, PropertySpec, RetrieveOptions,
    RetrieveResult, SelectionSpec, ServiceContent, TraversalSpec, Value,
    VimApi,
};

use crate::error::Result;

/// Page size requested from the property collector.
pub const DEFAULT_CHUNK_SIZE: i32 = 100;

/// Property values of one object, by property path.
pub type PropertyMap = HashMap<String, Value>;

/// Retrieval and monitoring through the property collector.
pub struct PropertyCollectorHelper<P> {
    pub(crate) port: P,
    pub(crate) content: ServiceContent,
}

impl<P: VimApi> PropertyCollectorHelper<P> {
    pub fn new(port: P, content: ServiceContent) -> Self {
        Self { port, content }
    }

    /// Build a helper, retrieving the service content through `port`.
    pub async fn from_port(port: P) -> Result<Self> {
        let content = port.retrieve_service_content().await?;
        Ok(Self::new(port, content))
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn service_content(&self) -> &ServiceContent {
        &self.content
    }

    pub(crate) fn collector(&self) -> &ManagedObjectReference {
        &self.content.property_collector
    }

    /// Feed every object of `result` and its continuation pages to `f`.
    /// When `f` breaks while pages remain, the server-side cursor is
    /// cancelled.
    pub async fn iterate_objects<F>(
        &self,
        result: Option<RetrieveResult>,
        mut f: F,
    ) -> Result<()>
    where
        F: FnMut(ObjectContent) -> ControlFlow<()>,
    {
        let mut page = result;
        while let Some(result) = page.take() {
            let stop = result.objects.into_iter().any(|obj| f(obj).is_break());
            let token = match result.token.filter(|t| !t.is_empty()) {
                Some(token) => token,
                None => break,
            };

            if stop {
                if let Err(e) = self
                    .port
                    .cancel_retrieve_properties_ex(self.collector(), &token)
                    .await
                {
                    warn!("error cancelling property retrieval: {}", e);
                }
                break;
            }

            page = Some(
                self.port
                    .continue_retrieve_properties_ex(self.collector(), &token)
                    .await?,
            );
        }
        Ok(())
    }

    /// Retrieve `properties` of every `typ` object in a container view.
    pub async fn retrieve_container_view(
        &self,
        view: &ManagedObjectReference,
        chunk_size: i32,
        typ: &ManagedObjectType,
        properties: &[&str],
    ) -> Result<Option<RetrieveResult>> {
        let specs = create_property_filter_specs_for_container_view(
            view, typ, properties,
        );
        Ok(self
            .port
            .retrieve_properties_ex(
                self.collector(),
                &specs,
                &retrieve_options(chunk_size),
            )
            .await?)
    }

    /// A recursive view on all `typ` objects under `container`. The caller
    /// destroys it.
    pub async fn create_container_view(
        &self,
        container: &ManagedObjectReference,
        typ: &ManagedObjectType,
    ) -> Result<ManagedObjectReference> {
        Ok(self
            .port
            .create_container_view(
                &self.content.view_manager,
                container,
                &[typ.to_string()],
                true,
            )
            .await?)
    }

    pub async fn destroy_view(&self, view: &ManagedObjectReference) {
        if let Err(e) = self.port.destroy_view(view).await {
            error!("error destroying container view {}: {}", view, e);
        }
    }

    /// Create a container view, iterate `properties` of its objects and
    /// destroy the view again, whatever the outcome.
    async fn scan_container<F>(
        &self,
        container: &ManagedObjectReference,
        typ: &ManagedObjectType,
        chunk_size: i32,
        properties: &[&str],
        f: F,
    ) -> Result<()>
    where
        F: FnMut(ObjectContent) -> ControlFlow<()>,
    {
        let view = self.create_container_view(container, typ).await?;
        let res = match self
            .retrieve_container_view(&view, chunk_size, typ, properties)
            .await
        {
            Ok(result) => self.iterate_objects(result, f).await,
            Err(e) => Err(e),
        };
        self.destroy_view(&view).await;
        res
    }

    /// Properties of all `typ` objects under `container`.
    pub async fn get_object_properties(
        &self,
        container: &ManagedObjectReference,
        typ: &ManagedObjectType,
        chunk_size: i32,
        properties: &[&str],
    ) -> Result<HashMap<ManagedObjectReference, PropertyMap>> {
        let mut objects = HashMap::new();
        self.scan_container(container, typ, chunk_size, properties, |oc| {
            objects.insert(oc.obj, property_map(oc.prop_set));
            ControlFlow::Continue(())
        })
        .await?;
        Ok(objects)
    }

    /// All `typ` objects under `container`, by name.
    pub async fn get_objects(
        &self,
        container: &ManagedObjectReference,
        typ: &ManagedObjectType,
        chunk_size: i32,
    ) -> Result<HashMap<String, Vec<ManagedObjectReference>>> {
        let mut objects: HashMap<String, Vec<_>> = HashMap::new();
        self.scan_container(container, typ, chunk_size, &["name"], |oc| {
            let name = oc
                .prop_set
                .first()
                .and_then(|prop| prop.val.as_ref())
                .and_then(Value::as_text)
                .map(String::from);
            if let Some(name) = name {
                objects.entry(name).or_default().push(oc.obj);
            }
            ControlFlow::Continue(())
        })
        .await?;
        Ok(objects)
    }

    /// The first `typ` object named `name`, searching from the root
    /// folder.
    pub async fn get_moref_by_name(
        &self,
        name: &str,
        typ: &ManagedObjectType,
    ) -> Result<Option<ManagedObjectReference>> {
        let root = self.content.root_folder.clone();
        self.get_moref_by_name_in(&root, DEFAULT_CHUNK_SIZE, name, typ)
            .await
    }

    /// The first `typ` object under `container` named exactly `name`.
    /// A miss is `Ok(None)`.
    pub async fn get_moref_by_name_in(
        &self,
        container: &ManagedObjectReference,
        chunk_size: i32,
        name: &str,
        typ: &ManagedObjectType,
    ) -> Result<Option<ManagedObjectReference>> {
        let mut found = None;
        self.scan_container(container, typ, chunk_size, &["name"], |oc| {
            let matches = oc
                .prop_set
                .last()
                .and_then(|prop| prop.val.as_ref())
                .and_then(Value::as_text)
                == Some(name);
            match matches {
                true => {
                    found = Some(oc.obj);
                    ControlFlow::Break(())
                }
                false => ControlFlow::Continue(()),
            }
        })
        .await?;
        debug!(
            "lookup of {} {:?}: {}",
            typ,
            name,
            match &found {
                Some(obj) => obj.to_string(),
                None => "not found".to_string(),
            }
        );
        Ok(found)
    }

    /// Properties of a single object.
    pub async fn fetch_properties(
        &self,
        obj: &ManagedObjectReference,
        properties: &[&str],
    ) -> Result<PropertyMap> {
        let spec =
            create_property_filter_spec(obj, Some(false), None, properties);
        let mut values = PropertyMap::new();
        let result = self.retrieve(&[spec]).await?;
        self.iterate_objects(result, |oc| {
            values.extend(property_map(oc.prop_set));
            ControlFlow::Continue(())
        })
        .await?;
        Ok(values)
    }

    /// Properties of several objects, with one property spec per distinct
    /// object type.
    pub async fn fetch_properties_many(
        &self,
        objs: &[ManagedObjectReference],
        properties: &[&str],
    ) -> Result<HashMap<ManagedObjectReference, PropertyMap>> {
        let mut spec = PropertyFilterSpec::default();
        for obj in objs {
            if !spec.prop_set.iter().any(|p| p.r#type == obj.r#type) {
                spec.prop_set.push(create_property_spec(
                    &obj.r#type,
                    Some(false),
                    properties,
                ));
            }
            spec.object_set.push(ObjectSpec {
                obj: obj.clone(),
                ..ObjectSpec::default()
            });
        }

        let mut objects = HashMap::new();
        let result = self.retrieve(&[spec]).await?;
        self.iterate_objects(result, |oc| {
            objects.insert(oc.obj, property_map(oc.prop_set));
            ControlFlow::Continue(())
        })
        .await?;
        Ok(objects)
    }

    /// A single property of a single object.
    pub async fn fetch(
        &self,
        obj: &ManagedObjectReference,
        property: &str,
    ) -> Result<Option<Value>> {
        let spec =
            create_property_filter_spec(obj, Some(false), None, &[property]);
        let mut value = None;
        let result = self.retrieve(&[spec]).await?;
        self.iterate_objects(result, |oc| {
            value = oc.prop_set.into_iter().next().and_then(|prop| prop.val);
            ControlFlow::Break(())
        })
        .await?;
        Ok(value)
    }

    /// Every object content matched by `specs`, across all pages.
    pub async fn retrieve_all_properties(
        &self,
        specs: &[PropertyFilterSpec],
    ) -> Result<Vec<ObjectContent>> {
        let mut objects = Vec::new();
        let result = self.retrieve(specs).await?;
        self.iterate_objects(result, |oc| {
            objects.push(oc);
            ControlFlow::Continue(())
        })
        .await?;
        Ok(objects)
    }

    async fn retrieve(
        &self,
        specs: &[PropertyFilterSpec],
    ) -> Result<Option<RetrieveResult>> {
        Ok(self
            .port
            .retrieve_properties_ex(
                self.collector(),
                specs,
                &retrieve_options(DEFAULT_CHUNK_SIZE),
            )
            .await?)
    }
}

pub fn create_property_spec(
    typ: &str,
    all: Option<bool>,
    properties: &[&str],
) -> PropertySpec {
    PropertySpec {
        r#type: typ.to_string(),
        all,
        path_set: properties.iter().map(|p| p.to_string()).collect(),
    }
}

/// A filter on `properties` of a single object.
pub fn create_property_filter_spec(
    obj: &ManagedObjectReference,
    all: Option<bool>,
    skip: Option<bool>,
    properties: &[&str],
) -> PropertyFilterSpec {
    PropertyFilterSpec {
        prop_set: vec![create_property_spec(&obj.r#type, all, properties)],
        object_set: vec![ObjectSpec {
            obj: obj.clone(),
            skip,
            select_set: Vec::new(),
        }],
        report_missing_objects_in_results: None,
    }
}

/// A filter on `properties` of every `typ` object in a container view.
/// The view itself is skipped.
pub fn create_property_filter_specs_for_container_view(
    view: &ManagedObjectReference,
    typ: &ManagedObjectType,
    properties: &[&str],
) -> Vec<PropertyFilterSpec> {
    let traversal = TraversalSpec {
        name: Some("view".to_string()),
        r#type: ManagedObjectType::ContainerView.to_string(),
        path: "view".to_string(),
        skip: Some(false),
        select_set: Vec::new(),
    };
    vec![PropertyFilterSpec {
        prop_set: vec![create_property_spec(
            typ.as_str(),
            Some(false),
            properties,
        )],
        object_set: vec![ObjectSpec {
            obj: view.clone(),
            skip: Some(true),
            select_set: vec![SelectionSpec::Traversal(traversal)],
        }],
        report_missing_objects_in_results: None,
    }]
}

fn retrieve_options(chunk_size: i32) -> RetrieveOptions {
    RetrieveOptions {
        max_objects: Some(chunk_size),
    }
}

fn property_map(props: Vec<DynamicProperty>) -> PropertyMap {
    props
        .into_iter()
        .filter_map(|prop| Some((prop.name, prop.val?)))
        .collect()
}
