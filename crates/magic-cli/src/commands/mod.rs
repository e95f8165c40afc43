//! CLI command implementations

mod dispatch;
mod magician;

pub use dispatch::*;
pub use magician::*;

/// Print the release version
pub fn version() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}
