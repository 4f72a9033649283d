use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};

use batchgate_result::{create_error, Result};
use tokio::{
    sync::oneshot,
    time::{sleep_until, Instant},
};

use crate::{normalize_endpoint, BatchRequest, CoalescerConfig, Item, ItemsResponse, Transport};

/// A caller waiting on its group's dispatch
struct EnrolledRequest {
    request: BatchRequest,
    sender: oneshot::Sender<Result<ItemsResponse>>,
}

/// Requests collected for one endpoint key that have not been dispatched yet
struct PendingGroup {
    requests: Vec<EnrolledRequest>,
    /// Moved forward on every enrollment, the group's timer fires once it passes
    deadline: Instant,
}

struct Inner<T> {
    config: CoalescerConfig,
    transport: T,
    groups: Mutex<HashMap<String, PendingGroup>>,
}

/// Merges calls to the same endpoint made within one debounce window into a
/// single outbound request and fans the response back out to every caller.
pub struct Coalescer<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for Coalescer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport> Coalescer<T> {
    pub fn new(transport: T, config: CoalescerConfig) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Inner {
                config: config.validate()?,
                transport,
                groups: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Whether calls to `target` are merged or sent straight away
    pub fn is_coalesced(&self, target: &str) -> bool {
        let key = normalize_endpoint(target);
        self.inner.config.endpoints.iter().any(|endpoint| *endpoint == key)
    }

    fn groups(&self) -> MutexGuard<'_, HashMap<String, PendingGroup>> {
        self.inner
            .groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a request to the pending group for `endpoint` and push the
    /// group's deadline back by one window.
    ///
    /// Nothing is sent here. The returned [`Enrollment`] settles once the
    /// group has been dispatched. Must be called from within a tokio runtime.
    pub fn enroll(&self, endpoint: &str, request: BatchRequest) -> Enrollment {
        let key = normalize_endpoint(endpoint);
        let (sender, receiver) = oneshot::channel();
        let enrolled = EnrolledRequest { request, sender };

        let new_group = {
            let mut groups = self.groups();
            // Read under the lock so concurrent enrollments never pull the deadline back
            let deadline = Instant::now() + self.inner.config.window;

            match groups.entry(key) {
                Entry::Occupied(mut entry) => {
                    let group = entry.get_mut();
                    group.requests.push(enrolled);
                    group.deadline = group.deadline.max(deadline);

                    tracing::debug!(
                        endpoint = %entry.key(),
                        pending = entry.get().requests.len(),
                        "joined pending group"
                    );

                    None
                }
                Entry::Vacant(entry) => {
                    let key = entry.key().clone();
                    entry.insert(PendingGroup {
                        requests: vec![enrolled],
                        deadline,
                    });

                    tracing::debug!(endpoint = %key, "opened pending group");
                    Some(key)
                }
            }
        };

        // The group and its timer are created together and retired together
        if let Some(key) = new_group {
            tokio::spawn(self.clone().run_timer(key));
        }

        Enrollment { receiver }
    }

    /// Sleep until the group's deadline stops moving, then detach and dispatch it
    async fn run_timer(self, key: String) {
        let requests = loop {
            let deadline = match self.groups().get(&key) {
                Some(group) => group.deadline,
                None => return,
            };

            sleep_until(deadline).await;

            let mut groups = self.groups();
            let due = match groups.get(&key) {
                Some(group) => group.deadline <= Instant::now(),
                None => return,
            };

            if due {
                match groups.remove(&key) {
                    Some(group) => break group.requests,
                    None => return,
                }
            }
        };

        self.dispatch(&key, requests).await;
    }

    async fn dispatch(&self, key: &str, requests: Vec<EnrolledRequest>) {
        let Some(merged) = merge(&requests) else {
            return;
        };

        tracing::info!(
            endpoint = %key,
            callers = requests.len(),
            ids = merged.ids.len(),
            "dispatching coalesced request"
        );

        match self.inner.transport.send(&merged).await {
            Ok(response) => {
                let lookup = index_items(&response.items);

                for EnrolledRequest { request, sender } in requests {
                    sender.send(project(&lookup, &request.ids)).ok();
                }
            }
            Err(error) => {
                tracing::warn!(endpoint = %key, callers = requests.len(), "{error}");

                for EnrolledRequest { sender, .. } in requests {
                    sender.send(Err(error.clone())).ok();
                }
            }
        }
    }

    /// Number of endpoint keys currently collecting requests
    pub fn pending_groups(&self) -> usize {
        self.groups().len()
    }

    /// Number of requests waiting in the undispatched group for `endpoint`
    pub fn pending_requests(&self, endpoint: &str) -> usize {
        self.groups()
            .get(&normalize_endpoint(endpoint))
            .map(|group| group.requests.len())
            .unwrap_or_default()
    }
}

/// Copy the first request and replace its key-set with the union of every
/// key-set in the group, keeping first-seen order.
fn merge(requests: &[EnrolledRequest]) -> Option<BatchRequest> {
    let mut merged = requests.first()?.request.clone();
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for id in requests.iter().flat_map(|enrolled| &enrolled.request.ids) {
        if seen.insert(id) {
            ids.push(id.clone());
        }
    }

    merged.ids = ids;
    Some(merged)
}

fn index_items(items: &[Item]) -> HashMap<&str, &Item> {
    items.iter().map(|item| (item.id.as_str(), item)).collect()
}

/// All or nothing: one missing identifier fails the whole request
fn project(lookup: &HashMap<&str, &Item>, ids: &[String]) -> Result<ItemsResponse> {
    ids.iter()
        .map(|id| {
            lookup
                .get(id.as_str())
                .map(|item| (*item).clone())
                .ok_or_else(|| create_error!(KeyNotFound { id: id.clone() }))
        })
        .collect::<Result<Vec<_>>>()
        .map(|items| ItemsResponse { items })
}

/// Pending result of [`Coalescer::enroll`]
#[derive(Debug)]
pub struct Enrollment {
    receiver: oneshot::Receiver<Result<ItemsResponse>>,
}

impl Future for Enrollment {
    type Output = Result<ItemsResponse>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| Err(create_error!(InternalError))))
    }
}
