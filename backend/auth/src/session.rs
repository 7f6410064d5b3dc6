use tokio::sync::watch;

use crate::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionContext {
    /// A single user driving the client, e.g. a browser tab.
    Interactive,
    /// Request-scoped, e.g. one HTTP call on the backend.
    Server,
}

/// One actor's view of who is signed in.
///
/// Changes are published on a watch channel so callers can wait on the
/// current state without polling.
pub struct Session {
    context: SessionContext,
    state: watch::Sender<Option<Identity>>,
}

impl Session {
    pub fn new(context: SessionContext) -> Self {
        let (state, _) = watch::channel(None);

        Self { context, state }
    }

    pub fn interactive() -> Self {
        Self::new(SessionContext::Interactive)
    }

    pub fn server() -> Self {
        Self::new(SessionContext::Server)
    }

    pub fn context(&self) -> SessionContext {
        self.context
    }

    pub fn current(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }

    pub(crate) fn establish(&self, identity: Identity) {
        self.state.send_replace(Some(identity));
    }

    pub(crate) fn clear(&self) {
        self.state.send_replace(None);
    }
}
