//! One-shot method instrumentation.
//!
//! Wraps a callable stored on an object so every call is reported to an
//! observer, with a double idempotency guard: the owning object is
//! tracked in the [`PatchRegistry`] and the wrapper itself carries the
//! instrumented marker. There is no unpatch.

use std::sync::Arc;

use fiberprobe_core::{CallOutcome, Callable, ObjectRef, Value};
use futures::FutureExt;
use tracing::{debug, info};

use crate::registry::PatchRegistry;

/// What an observer sees for one call through an instrumented method.
#[derive(Debug, Clone)]
pub struct Observation {
    pub method: String,
    pub args: Vec<Value>,
    /// Present for synchronous returns and resolved deferred outcomes.
    pub value: Option<Value>,
    /// Present when a deferred outcome was rejected.
    pub error: Option<String>,
}

pub type Observer = Arc<dyn Fn(Observation) + Send + Sync>;

/// Replaces `owner[method]` with an observing wrapper, exactly once.
///
/// Returns true when the wrapper was installed. Skips (and logs at info)
/// when the owner is already registered, the stored callable already
/// carries the marker, or the slot does not hold a callable.
pub fn instrument_once(
    registry: &PatchRegistry,
    owner: &ObjectRef,
    method: &str,
    observer: Observer,
) -> bool {
    if registry.contains(owner) {
        info!(method, "owner already instrumented, skipping");
        return false;
    }

    let Some(Value::Function(original)) = owner.probe(method) else {
        info!(method, "no callable found at slot, skipping");
        return false;
    };

    if original.is_instrumented() {
        info!(method, "callable already instrumented, skipping");
        return false;
    }

    let method_name = method.to_string();
    let wrapper = Callable::instrumented(move |args: &[Value]| {
        debug!(method = %method_name, argc = args.len(), "instrumented call");
        match original.invoke(args) {
            CallOutcome::Ready(value) => {
                observer(Observation {
                    method: method_name.clone(),
                    args: args.to_vec(),
                    value: Some(value.clone()),
                    error: None,
                });
                CallOutcome::Ready(value)
            }
            CallOutcome::Deferred(future) => {
                let observer = observer.clone();
                let method_name = method_name.clone();
                let args = args.to_vec();
                CallOutcome::Deferred(
                    async move {
                        match future.await {
                            Ok(value) => {
                                observer(Observation {
                                    method: method_name,
                                    args,
                                    value: Some(value.clone()),
                                    error: None,
                                });
                                Ok(value)
                            }
                            Err(err) => {
                                observer(Observation {
                                    method: method_name,
                                    args,
                                    value: None,
                                    error: Some(err.to_string()),
                                });
                                Err(err)
                            }
                        }
                    }
                    .boxed(),
                )
            }
        }
    });

    owner.insert(method, Value::Function(wrapper));
    registry.mark(owner);
    info!(method, "method instrumented");
    true
}
