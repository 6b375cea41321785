//! Request context handed to a strategy by the routing layer.

use std::fmt;
use std::sync::Arc;

use rtcache_domain::{Request, RouteParams};
use url::Url;
use uuid::Uuid;

use crate::lifecycle::{BackgroundTask, LifetimeExtender};

/// Kind of host event a request arrived with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Fetch,
    Install,
    Activate,
    Message,
    Sync,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Message => "message",
            Self::Sync => "sync",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Originating-event handle. Lets work scheduled during `handle` outlive it
/// while staying tracked by the host.
#[derive(Clone)]
pub struct ExtendableEvent {
    id: Uuid,
    kind: EventKind,
    lifetime: Arc<dyn LifetimeExtender>,
}

impl ExtendableEvent {
    pub fn new(kind: EventKind, lifetime: Arc<dyn LifetimeExtender>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            lifetime,
        }
    }

    pub fn fetch(lifetime: Arc<dyn LifetimeExtender>) -> Self {
        Self::new(EventKind::Fetch, lifetime)
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Hand `task` to the host so it runs to completion after we return.
    pub fn wait_until(&self, task: BackgroundTask) {
        self.lifetime.wait_until(task);
    }
}

impl fmt::Debug for ExtendableEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendableEvent")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Everything one strategy invocation reads. Immutable for its duration.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request: Request,
    pub event: ExtendableEvent,
    pub params: RouteParams,
}

impl RequestContext {
    pub fn new(request: Request, event: ExtendableEvent) -> Self {
        Self {
            request,
            event,
            params: RouteParams::new(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = params;
        self
    }

    pub const fn url(&self) -> &Url {
        &self.request.url
    }
}
