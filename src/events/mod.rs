//! # Events Module
//!
//! Event-driven progress reporting for any presentation layer.
//!
//! ## Design
//! Every operation emits `Started`, one `Progress` per completed item, and a
//! terminal `Completed`, `Cancelled` or `Error`. Events are informational;
//! nothing in the core reads them back.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//! let cancel = CancellationToken::new();
//!
//! let worker = std::thread::spawn(move || service.backup_with_events(&sender, &cancel));
//!
//! for event in receiver.iter() {
//!     if let Event::Item(ItemEvent::Progress(p)) = event {
//!         println!("{}/{} {}", p.index, p.total, p.name);
//!     }
//! }
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
