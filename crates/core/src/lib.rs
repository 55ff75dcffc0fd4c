//! Layout configuration engine for the ColdWatch monitoring dashboard.
//!
//! Everything a dashboard needs to manage per-user widget layouts:
//! the static widget catalog, capability-based compatibility matching,
//! validation and total repair of layout configs, local TTL-bounded
//! drafts, debounced autosave with undo, and the lifecycle of the
//! Default layout plus up to three custom slots.
//!
//! Collaborators (persistence, draft storage, capability mapping,
//! entity defaults) are injected lookup tables and traits; this crate
//! has no ambient singletons and no database or HTTP dependency.

pub mod autosave;
pub mod capability;
pub mod compat;
pub mod defaults;
pub mod draft;
pub mod error;
pub mod layout;
pub mod registry;
pub mod sanitize;
pub mod session;
pub mod slots;
pub mod types;
pub mod validate;
