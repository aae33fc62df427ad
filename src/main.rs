//! lineflux CLI entry point.

use lineflux_lib::cli::{self, Cli};
use lineflux_lib::core::Result;

fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Execute the command
    cli::execute(cli)
}
