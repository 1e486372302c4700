//! Binary entrypoint that launches the styling assistant server.

use std::process::ExitCode;

use styling_agent::start_styling_agent;

fn main() -> ExitCode {
    start_styling_agent::run()
}
