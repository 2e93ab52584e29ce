//! # photo-archive CLI
//!
//! Command-line interface for the photo archiver.
//!
//! ## Usage
//! ```bash
//! photo-archive evaluate raw --archive processed
//! photo-archive process --archive processed
//! ```

mod cli;

use photo_archiver::Result;

fn main() -> Result<()> {
    cli::run()
}
