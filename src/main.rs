//! # dcim-archiver CLI
//!
//! Command-line interface for the phone archiver.
//!
//! ## Usage
//! ```bash
//! dcim-archiver backup
//! dcim-archiver organize
//! dcim-archiver prune
//! dcim-archiver status
//! ```

mod cli;

use dcim_archiver::Result;

fn main() -> Result<()> {
    dcim_archiver::init_tracing();
    cli::run()
}
