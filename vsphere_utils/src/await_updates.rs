/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::time::{Duration, Instant};

use log::{debug, error, trace};
use vim25::{
    GenericValue, ManagedObjectReference, PropertyChange, PropertyChangeOp,
    TaskInfoState, UpdateSet, Value, VimApi, WaitOptions,
};

use crate::{
    error::{Error, Result},
    property_collector::{create_property_filter_spec, PropertyCollectorHelper},
};

/// Per-call long-poll wait when none is given.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(20);

#[derive(Clone, Copy, Debug)]
pub struct AwaitOptions {
    /// Maximum time the server holds a single long-poll.
    pub max_wait: Duration,
    /// Give up once this instant has passed.
    pub deadline: Option<Instant>,
}

impl Default for AwaitOptions {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
            deadline: None,
        }
    }
}

impl AwaitOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
            deadline: Some(Instant::now() + timeout),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum AwaitOutcome {
    /// The latest values of the filter properties, in request order.
    Matched(Vec<Option<Value>>),
    /// The end property arrived as a structured element; its state text,
    /// normalized.
    State(LegacyState),
    /// The deadline passed before an expected value was seen.
    TimedOut,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LegacyState {
    Ready,
    Error,
    Other(String),
}

impl LegacyState {
    fn from_text(text: &str) -> Self {
        if text.eq_ignore_ascii_case("ready") {
            Self::Ready
        } else if text.eq_ignore_ascii_case("error") {
            Self::Error
        } else {
            Self::Other(text.to_string())
        }
    }
}

/// The two encodings in which an enumeration value can be reported.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum StateValue {
    Scalar(String),
    /// The value arrived as an element with children instead of a
    /// scalar; this is the text of its first child.
    Structured(String),
}

pub fn decode_state_value(raw: &Value) -> Option<StateValue> {
    match raw {
        Value::String(s) => Some(StateValue::Scalar(s.clone())),
        Value::Enum(e) => Some(StateValue::Scalar(e.value.clone())),
        Value::Generic(_, GenericValue::String(s)) => {
            Some(StateValue::Scalar(s.clone()))
        }
        Value::Generic(_, GenericValue::Object(obj)) => obj
            .first_text()
            .map(|s| StateValue::Structured(s.trim().to_string())),
        _ => None,
    }
}

/// The comparison that last decided the outcome.
enum Tracked {
    Nothing,
    FilterValues,
    State(String),
}

impl<P: VimApi> PropertyCollectorHelper<P> {
    /// Wait until `info.state` of `task` is `success` or `error`. A task
    /// that failed with a fault yields `Error::TaskFailed`.
    pub async fn await_task_completion(
        &self,
        task: &ManagedObjectReference,
    ) -> Result<bool> {
        self.await_task_completion_with(task, &AwaitOptions::default())
            .await
    }

    pub async fn await_task_completion_with(
        &self,
        task: &ManagedObjectReference,
        options: &AwaitOptions,
    ) -> Result<bool> {
        let outcome = self
            .await_managed_object_updates_with(
                task,
                &["info.state", "info.error"],
                &["state"],
                &[vec![
                    Value::from(TaskInfoState::Success),
                    Value::from(TaskInfoState::Error),
                ]],
                options,
            )
            .await?;

        match outcome {
            AwaitOutcome::Matched(values) => {
                if let Some(Some(Value::Fault(fault))) = values.get(1) {
                    return Err(Error::TaskFailed(fault.message().to_string()));
                }
                Ok(values
                    .first()
                    .and_then(Option::as_ref)
                    .and_then(decode_state_value)
                    .is_some_and(|state| {
                        state == StateValue::Scalar("success".to_string())
                    }))
            }
            AwaitOutcome::State(LegacyState::Other(state)) => {
                Ok(state.eq_ignore_ascii_case("success"))
            }
            AwaitOutcome::State(_) => Ok(false),
            AwaitOutcome::TimedOut => Err(Error::TimedOut),
        }
    }

    /// Watch `filter_props` of `obj` until one of `end_props` takes one of
    /// the values in the matching row of `expected`.
    pub async fn await_managed_object_updates(
        &self,
        obj: &ManagedObjectReference,
        filter_props: &[&str],
        end_props: &[&str],
        expected: &[Vec<Value>],
    ) -> Result<AwaitOutcome> {
        self.await_managed_object_updates_with(
            obj,
            filter_props,
            end_props,
            expected,
            &AwaitOptions::default(),
        )
        .await
    }

    pub async fn await_managed_object_updates_with(
        &self,
        obj: &ManagedObjectReference,
        filter_props: &[&str],
        end_props: &[&str],
        expected: &[Vec<Value>],
        options: &AwaitOptions,
    ) -> Result<AwaitOutcome> {
        debug!("awaiting updates for {}", obj);

        let spec =
            create_property_filter_spec(obj, None, Some(false), filter_props);
        let filter = self
            .port
            .create_filter(self.collector(), &spec, true)
            .await?;

        let res = self
            .poll_updates(filter_props, end_props, expected, options)
            .await;

        if let Err(e) = self.port.destroy_property_filter(&filter).await {
            error!("error destroying property filter {}: {}", filter, e);
        }

        res
    }

    async fn poll_updates(
        &self,
        filter_props: &[&str],
        end_props: &[&str],
        expected: &[Vec<Value>],
        options: &AwaitOptions,
    ) -> Result<AwaitOutcome> {
        let mut version = String::new();
        let mut end_values = vec![None; end_props.len()];
        let mut filter_values = vec![None; filter_props.len()];
        let mut tracked = Tracked::Nothing;

        loop {
            let wait = match options.deadline {
                Some(deadline) => {
                    match deadline.checked_duration_since(Instant::now()) {
                        Some(left) if !left.is_zero() => {
                            options.max_wait.min(left)
                        }
                        _ => return Ok(AwaitOutcome::TimedOut),
                    }
                }
                None => options.max_wait,
            };

            let update = self
                .port
                .wait_for_updates_ex(
                    self.collector(),
                    &version,
                    &wait_options(wait),
                )
                .await?;
            let update = match update {
                Some(update) if !update.filter_set.is_empty() => update,
                _ => {
                    debug!("no updates present, waiting for further updates");
                    continue;
                }
            };

            trace!("received updates up to version {}", update.version);
            version = update.version.clone();
            for change in changes(&update) {
                record_change(end_props, &mut end_values, change);
                record_change(filter_props, &mut filter_values, change);
            }

            if compare(&end_values, expected, &mut tracked) {
                break;
            }
        }

        Ok(match tracked {
            Tracked::FilterValues => AwaitOutcome::Matched(filter_values),
            Tracked::State(text) => {
                AwaitOutcome::State(LegacyState::from_text(&text))
            }
            Tracked::Nothing => AwaitOutcome::State(LegacyState::Error),
        })
    }
}

/// Property changes of modify, enter and leave updates. Other kinds are
/// skipped.
fn changes(update: &UpdateSet) -> impl Iterator<Item = &PropertyChange> {
    update
        .filter_set
        .iter()
        .flat_map(|filter| &filter.object_set)
        .filter(|obj| {
            matches!(
                obj.kind,
                vim25::ObjectUpdateKind::Modify
                    | vim25::ObjectUpdateKind::Enter
                    | vim25::ObjectUpdateKind::Leave
            )
        })
        .flat_map(|obj| &obj.change_set)
}

/// Record `change` for every property whose path occurs in its name.
fn record_change(
    props: &[&str],
    values: &mut [Option<Value>],
    change: &PropertyChange,
) {
    for (prop, value) in props.iter().zip(values.iter_mut()) {
        if change.name.contains(prop) {
            *value = match change.op {
                PropertyChangeOp::Remove => Some(Value::String(String::new())),
                _ => change.val.clone(),
            };
        }
    }
}

/// Whether any end value reached an expected value. `tracked` follows the
/// last comparison made.
fn compare(
    end_values: &[Option<Value>],
    expected: &[Vec<Value>],
    tracked: &mut Tracked,
) -> bool {
    let mut reached = false;
    for (value, expected) in end_values.iter().zip(expected) {
        let value = match value {
            Some(value) => value,
            None => continue,
        };
        for candidate in expected {
            if reached {
                return true;
            }
            match value {
                Value::Generic(_, GenericValue::Object(_)) => {
                    // An element without a text child is not comparable.
                    if let Some(StateValue::Structured(text)) =
                        decode_state_value(value)
                    {
                        reached =
                            candidate.to_string().eq_ignore_ascii_case(&text);
                        *tracked = Tracked::State(text);
                    }
                }
                _ => {
                    reached = candidate == value;
                    *tracked = Tracked::FilterValues;
                }
            }
        }
    }
    reached
}

fn wait_options(wait: Duration) -> WaitOptions {
    let secs = wait.as_millis().div_ceil(1000);
    WaitOptions {
        max_wait_seconds: Some(i32::try_from(secs).unwrap_or(i32::MAX)),
        max_object_updates: None,
    }
}
