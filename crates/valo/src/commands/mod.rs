//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod bulbs;
pub mod config_cmd;
pub mod groups;
pub mod switch;

use valo_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Groups(args) => groups::handle(controller, args, global).await,
        Command::Bulbs(args) => bulbs::handle(controller, args, global).await,
        Command::SwitchAll { state } => switch::handle(controller, state, global).await,
        // Config and Completions are handled before a controller exists
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
