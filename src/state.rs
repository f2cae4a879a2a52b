use crate::{mail::Mailer, store::Store};

/// Shared per-process state, built once in `main` and injected into every
/// handler. Collaborators are explicit constructor arguments; nothing here
/// is reachable through a module-level global.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub mailer: Mailer,
}
