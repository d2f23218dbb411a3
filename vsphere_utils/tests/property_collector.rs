/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use vim25::{
    DynamicProperty, GenericObject, GenericValue, LocalizedMethodFault,
    ManagedObjectReference, ManagedObjectType, ObjectContent, ObjectUpdate,
    ObjectUpdateKind, PropertyChange, PropertyChangeOp, PropertyFilterSpec,
    PropertyFilterUpdate, RetrieveOptions, RetrieveResult, ServiceContent,
    TaskInfoState, UpdateSet, Value, VimApi, WaitOptions,
};
use vsphere_utils::{
    AwaitOptions, AwaitOutcome, Error, LegacyState, PropertyCollectorHelper,
};

#[derive(Clone, PartialEq, Debug)]
enum Call {
    CreateFilter(PropertyFilterSpec),
    DestroyFilter,
    Wait(String, Option<i32>),
    Retrieve(Option<i32>),
    Continue(String),
    Cancel(String),
    CreateView(Vec<String>),
    DestroyView,
}

/// Replays canned property collector answers and records every call.
#[derive(Default)]
struct MockPort {
    calls: Mutex<Vec<Call>>,
    updates: Mutex<VecDeque<vim25::Result<Option<UpdateSet>>>>,
    pages: Mutex<VecDeque<RetrieveResult>>,
}

impl MockPort {
    fn with_updates(updates: Vec<vim25::Result<Option<UpdateSet>>>) -> Self {
        Self {
            updates: Mutex::new(updates.into()),
            ..Self::default()
        }
    }

    fn with_pages(pages: Vec<RetrieveResult>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| f(c)).count()
    }

    fn next_page(&self) -> RetrieveResult {
        self.pages.lock().unwrap().pop_front().unwrap_or_default()
    }
}

#[async_trait]
impl VimApi for MockPort {
    async fn retrieve_service_content(&self) -> vim25::Result<ServiceContent> {
        Ok(content())
    }

    async fn create_filter(
        &self,
        _collector: &ManagedObjectReference,
        spec: &PropertyFilterSpec,
        _partial_updates: bool,
    ) -> vim25::Result<ManagedObjectReference> {
        self.record(Call::CreateFilter(spec.clone()));
        Ok(ManagedObjectReference::new("PropertyFilter", "session[1]f1"))
    }

    async fn destroy_property_filter(
        &self,
        _filter: &ManagedObjectReference,
    ) -> vim25::Result<()> {
        self.record(Call::DestroyFilter);
        Ok(())
    }

    async fn wait_for_updates_ex(
        &self,
        _collector: &ManagedObjectReference,
        version: &str,
        options: &WaitOptions,
    ) -> vim25::Result<Option<UpdateSet>> {
        self.record(Call::Wait(version.to_string(), options.max_wait_seconds));
        self.updates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(vim25::Error::MissingReturnValue("no more updates")))
    }

    async fn retrieve_properties_ex(
        &self,
        _collector: &ManagedObjectReference,
        _specs: &[PropertyFilterSpec],
        options: &RetrieveOptions,
    ) -> vim25::Result<Option<RetrieveResult>> {
        self.record(Call::Retrieve(options.max_objects));
        Ok(Some(self.next_page()))
    }

    async fn continue_retrieve_properties_ex(
        &self,
        _collector: &ManagedObjectReference,
        token: &str,
    ) -> vim25::Result<RetrieveResult> {
        self.record(Call::Continue(token.to_string()));
        Ok(self.next_page())
    }

    async fn cancel_retrieve_properties_ex(
        &self,
        _collector: &ManagedObjectReference,
        token: &str,
    ) -> vim25::Result<()> {
        self.record(Call::Cancel(token.to_string()));
        Ok(())
    }

    async fn create_container_view(
        &self,
        _view_manager: &ManagedObjectReference,
        _container: &ManagedObjectReference,
        types: &[String],
        _recursive: bool,
    ) -> vim25::Result<ManagedObjectReference> {
        self.record(Call::CreateView(types.to_vec()));
        Ok(ManagedObjectReference::new("ContainerView", "session[1]v1"))
    }

    async fn destroy_view(
        &self,
        _view: &ManagedObjectReference,
    ) -> vim25::Result<()> {
        self.record(Call::DestroyView);
        Ok(())
    }
}

fn content() -> ServiceContent {
    ServiceContent {
        root_folder: ManagedObjectReference::new("Folder", "group-d1"),
        property_collector: ManagedObjectReference::new(
            "PropertyCollector",
            "propertyCollector",
        ),
        view_manager: ManagedObjectReference::new("ViewManager", "ViewManager"),
        session_manager: ManagedObjectReference::new(
            "SessionManager",
            "SessionManager",
        ),
        ..ServiceContent::default()
    }
}

fn helper(port: MockPort) -> PropertyCollectorHelper<MockPort> {
    PropertyCollectorHelper::new(port, content())
}

fn task() -> ManagedObjectReference {
    ManagedObjectReference::new("Task", "task-42")
}

fn change(
    name: &str,
    op: PropertyChangeOp,
    val: Option<Value>,
) -> PropertyChange {
    PropertyChange {
        name: name.to_string(),
        op,
        val,
    }
}

fn update(
    version: &str,
    kind: ObjectUpdateKind,
    changes: Vec<PropertyChange>,
) -> vim25::Result<Option<UpdateSet>> {
    Ok(Some(UpdateSet {
        version: version.to_string(),
        filter_set: vec![PropertyFilterUpdate {
            filter: ManagedObjectReference::new(
                "PropertyFilter",
                "session[1]f1",
            ),
            object_set: vec![ObjectUpdate {
                kind,
                obj: task(),
                change_set: changes,
            }],
        }],
        truncated: None,
    }))
}

fn state(state: TaskInfoState) -> PropertyChange {
    change("info.state", PropertyChangeOp::Assign, Some(Value::from(state)))
}

fn task_update(
    version: &str,
    kind: ObjectUpdateKind,
    task_state: TaskInfoState,
) -> vim25::Result<Option<UpdateSet>> {
    update(version, kind, vec![state(task_state)])
}

fn named(value: &str, name: &str) -> ObjectContent {
    ObjectContent {
        obj: ManagedObjectReference::new("VirtualMachine", value),
        prop_set: vec![DynamicProperty {
            name: "name".to_string(),
            val: Some(Value::String(name.to_string())),
        }],
    }
}

fn page(token: Option<&str>, objects: Vec<ObjectContent>) -> RetrieveResult {
    RetrieveResult {
        token: token.map(String::from),
        objects,
    }
}

#[tokio::test]
async fn task_success_after_two_polls() {
    let helper = helper(MockPort::with_updates(vec![
        task_update("1", ObjectUpdateKind::Modify, TaskInfoState::Running),
        task_update("2", ObjectUpdateKind::Modify, TaskInfoState::Success),
    ]));

    assert!(helper.await_task_completion(&task()).await.unwrap());

    let port = helper.port();
    assert_eq!(port.count(|c| matches!(c, Call::Wait(..))), 2);
    assert_eq!(port.count(|c| matches!(c, Call::CreateFilter(_))), 1);
    assert_eq!(port.count(|c| *c == Call::DestroyFilter), 1);
    match &port.calls()[0] {
        Call::CreateFilter(spec) => {
            assert_eq!(
                spec.prop_set[0].path_set,
                vec!["info.state".to_string(), "info.error".to_string()]
            );
            assert_eq!(spec.object_set[0].obj, task());
            assert_eq!(spec.object_set[0].skip, Some(false));
        }
        call => panic!("unexpected first call: {:?}", call),
    }
}

#[tokio::test]
async fn task_failure_carries_fault_message() {
    let fault = LocalizedMethodFault {
        fault: Some("SystemError".to_string()),
        localized_message: Some("X".to_string()),
    };
    let helper = helper(MockPort::with_updates(vec![
        task_update("1", ObjectUpdateKind::Modify, TaskInfoState::Running),
        update(
            "2",
            ObjectUpdateKind::Modify,
            vec![
                state(TaskInfoState::Error),
                change(
                    "info.error",
                    PropertyChangeOp::Assign,
                    Some(Value::Fault(fault)),
                ),
            ],
        ),
    ]));

    match helper.await_task_completion(&task()).await {
        Err(Error::TaskFailed(msg)) => assert_eq!(msg, "X"),
        res => panic!("unexpected result: {:?}", res),
    }
    assert_eq!(helper.port().count(|c| *c == Call::DestroyFilter), 1);
}

#[tokio::test]
async fn cursor_follows_response_versions() {
    let helper = helper(MockPort::with_updates(vec![
        Ok(None),
        task_update("a", ObjectUpdateKind::Enter, TaskInfoState::Queued),
        Ok(Some(UpdateSet {
            version: "ignored".to_string(),
            ..UpdateSet::default()
        })),
        task_update("b", ObjectUpdateKind::Modify, TaskInfoState::Running),
        task_update("c", ObjectUpdateKind::Leave, TaskInfoState::Success),
    ]));

    assert!(helper.await_task_completion(&task()).await.unwrap());

    let versions = helper
        .port()
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Wait(version, max_wait) => {
                assert_eq!(max_wait, Some(20));
                Some(version)
            }
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(versions, vec!["", "", "a", "a", "b"]);
}

#[tokio::test]
async fn other_update_kinds_are_ignored() {
    let helper = helper(MockPort::with_updates(vec![
        update(
            "1",
            ObjectUpdateKind::Other("unknown".to_string()),
            vec![state(TaskInfoState::Success)],
        ),
        task_update("2", ObjectUpdateKind::Modify, TaskInfoState::Error),
    ]));

    assert!(!helper.await_task_completion(&task()).await.unwrap());
    assert_eq!(helper.port().count(|c| matches!(c, Call::Wait(..))), 2);
}

#[tokio::test]
async fn filter_destroyed_when_wait_fails() {
    let helper = helper(MockPort::with_updates(vec![
        task_update("1", ObjectUpdateKind::Modify, TaskInfoState::Running),
        Err(vim25::Error::MissingReturnValue("WaitForUpdatesEx")),
    ]));

    assert!(matches!(
        helper.await_task_completion(&task()).await,
        Err(Error::Vim(vim25::Error::MissingReturnValue(_)))
    ));
    assert_eq!(helper.port().count(|c| *c == Call::DestroyFilter), 1);
}

#[tokio::test]
async fn removed_property_yields_empty_string() {
    let helper = helper(MockPort::with_updates(vec![update(
        "1",
        ObjectUpdateKind::Modify,
        vec![
            change(
                "config.annotation",
                PropertyChangeOp::Remove,
                Some(Value::String("payload".to_string())),
            ),
            change(
                "runtime.powerState",
                PropertyChangeOp::Assign,
                Some(Value::String("poweredOff".to_string())),
            ),
        ],
    )]));

    let outcome = helper
        .await_managed_object_updates(
            &task(),
            &["config.annotation", "runtime.powerState"],
            &["runtime.powerState"],
            &[vec![Value::String("poweredOff".to_string())]],
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AwaitOutcome::Matched(vec![
            Some(Value::String(String::new())),
            Some(Value::String("poweredOff".to_string())),
        ])
    );
}

#[tokio::test]
async fn structured_state_yields_legacy_sentinel() {
    let structured = Value::Generic(
        String::new(),
        GenericValue::Object(GenericObject(vec![(
            "val".to_string(),
            GenericValue::String("Ready".to_string()),
        )])),
    );
    let helper = helper(MockPort::with_updates(vec![update(
        "1",
        ObjectUpdateKind::Modify,
        vec![change("state", PropertyChangeOp::Assign, Some(structured))],
    )]));

    let outcome = helper
        .await_managed_object_updates(
            &ManagedObjectReference::new("HttpNfcLease", "session[1]l1"),
            &["state"],
            &["state"],
            &[vec![
                Value::from(vim25::HttpNfcLeaseState::Ready),
                Value::from(vim25::HttpNfcLeaseState::Error),
            ]],
        )
        .await
        .unwrap();

    assert_eq!(outcome, AwaitOutcome::State(LegacyState::Ready));
    assert_eq!(helper.port().count(|c| *c == Call::DestroyFilter), 1);
}

#[tokio::test]
async fn deadline_ends_the_wait() {
    let helper = helper(MockPort::with_updates(vec![Ok(None)]));
    let options = AwaitOptions {
        max_wait: Duration::from_secs(20),
        deadline: Some(Instant::now()),
    };

    assert!(matches!(
        helper.await_task_completion_with(&task(), &options).await,
        Err(Error::TimedOut)
    ));
    let port = helper.port();
    assert_eq!(port.count(|c| matches!(c, Call::Wait(..))), 0);
    assert_eq!(port.count(|c| *c == Call::DestroyFilter), 1);
}

#[tokio::test]
async fn lookup_miss_destroys_view() {
    let helper = helper(MockPort::with_pages(vec![page(
        None,
        vec![named("vm-1", "a"), named("vm-2", "b"), named("vm-3", "c")],
    )]));

    let found = helper
        .get_moref_by_name("z", &ManagedObjectType::VirtualMachine)
        .await
        .unwrap();

    assert_eq!(found, None);
    assert_eq!(
        helper.port().calls(),
        vec![
            Call::CreateView(vec!["VirtualMachine".to_string()]),
            Call::Retrieve(Some(100)),
            Call::DestroyView,
        ]
    );
}

#[tokio::test]
async fn early_stop_cancels_once() {
    let helper = helper(MockPort::with_pages(vec![
        page(Some("t1"), vec![named("vm-1", "a"), named("vm-2", "b")]),
        page(Some("t2"), vec![named("vm-3", "c"), named("vm-4", "d")]),
        page(None, vec![named("vm-5", "e")]),
    ]));

    let found = helper
        .get_moref_by_name("c", &ManagedObjectType::VirtualMachine)
        .await
        .unwrap();

    assert_eq!(
        found,
        Some(ManagedObjectReference::new("VirtualMachine", "vm-3"))
    );
    let port = helper.port();
    assert_eq!(port.count(|c| matches!(c, Call::Cancel(_))), 1);
    assert!(port.calls().contains(&Call::Cancel("t2".to_string())));
    assert_eq!(port.count(|c| *c == Call::DestroyView), 1);
}

#[tokio::test]
async fn exhaustion_never_cancels() {
    let helper = helper(MockPort::with_pages(vec![
        page(Some("t1"), vec![named("vm-1", "a")]),
        page(Some("t2"), vec![named("vm-2", "b")]),
        page(None, vec![named("vm-3", "a")]),
    ]));

    let seen = helper
        .retrieve_all_properties(&[PropertyFilterSpec::default()])
        .await
        .unwrap()
        .into_iter()
        .map(|oc| oc.obj.value)
        .collect::<Vec<_>>();

    assert_eq!(seen, vec!["vm-1", "vm-2", "vm-3"]);
    let port = helper.port();
    assert_eq!(port.count(|c| matches!(c, Call::Cancel(_))), 0);
    assert_eq!(port.count(|c| matches!(c, Call::Continue(_))), 2);
}

#[tokio::test]
async fn objects_by_name() {
    let helper = helper(MockPort::with_pages(vec![page(
        None,
        vec![named("vm-1", "a"), named("vm-2", "b"), named("vm-3", "a")],
    )]));

    let objects = helper
        .get_objects(
            &content().root_folder,
            &ManagedObjectType::VirtualMachine,
            10,
        )
        .await
        .unwrap();

    assert_eq!(objects.len(), 2);
    assert_eq!(objects["a"].len(), 2);
    assert!(helper.port().calls().contains(&Call::Retrieve(Some(10))));
}

#[tokio::test]
async fn iterate_stops_on_break_without_token() {
    let helper = helper(MockPort::default());
    let mut count = 0;
    helper
        .iterate_objects(
            Some(page(None, vec![named("vm-1", "a"), named("vm-2", "b")])),
            |_| {
                count += 1;
                ControlFlow::Break(())
            },
        )
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert!(helper.port().calls().is_empty());
}
