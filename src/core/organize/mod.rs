//! Archive organization module.
//!
//! Files bucket folders by capture year, flattens them back, and moves the
//! whole archive between roots. Every move goes through the collision-safe
//! naming rule, so no file is ever overwritten.

mod executor;
mod mover;
mod naming;
mod relocate;
mod scanner;
mod types;

pub use executor::Reorganizer;
pub use mover::{discard, ensure_dir, move_file};
pub use naming::{numbered_name, unique_destination};
pub use relocate::{relocate_archive, same_location};
pub use scanner::{ArchiveLayout, ArchiveScanner};
pub use types::*;
