//! docgate: Quality-gate, label and route knowledge files
//!
//! Thin binary over the library; see `docgate --help`.

use anyhow::Result;

fn main() -> Result<()> {
    docgate::cli::run()
}
