//! guestbook-core — state behind the guest book
//!
//! - [`GuestTable`]: the process-wide entry table, shared by every session
//! - [`is_valid`]: the submission validator
//! - [`GuestBookView`]: the standalone page (visitor counter, 20 most recent entries)
//! - [`EmbeddedGuestBook`]: the host-configured component (theme, origin host, 15 entries)
//!
//! Both views implement [`LiveView`], the seam a per-session actor drives:
//! events in, `DomNode` snapshots out. Nothing in this crate performs I/O.

pub mod component;
pub mod entry;
pub mod event;
pub mod live;
pub mod random;
mod render;
pub mod store;
pub mod view;

pub use component::{EmbeddedGuestBook, Theme, EMBED_ENTRY_LIMIT};
pub use entry::{is_valid, EntryForm, GuestEntry};
pub use event::{EventError, HostConfig, ViewEvent};
pub use live::LiveView;
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use store::{EntryStore, GuestTable};
pub use view::{ConnectionState, GuestBookView, STANDALONE_ENTRY_LIMIT, TICK_INTERVAL};
