//! Transport session: the single owner of decoded audio
//!
//! ```text
//! Controller ──load/play/seek──> TransportSession ──> AudioBackend (platform)
//!     ^                                                   │
//!     └──────── TransportEvent (crossbeam channel) <──────┘
//! ```
//!
//! Every event is tagged with the [`LoadToken`] of the handle it concerns so
//! the controller can drop completions of superseded loads.

mod backend;
mod event;
mod memory;
mod session;
mod ticker;

pub use backend::{AudioBackend, EventSink};
pub use event::{LoadToken, TransportEvent, TransportEventKind};
pub use memory::{BackendCall, InMemoryBackend, InMemoryControl};
pub use session::TransportSession;
pub use ticker::TickScheduler;
