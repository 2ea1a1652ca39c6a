//! `switch-all` handler.

use valo_core::Controller;

use crate::cli::{GlobalOpts, PowerState};
use crate::error::CliError;
use crate::output;

use super::groups;

pub async fn handle(
    controller: &Controller,
    state: PowerState,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let groups = output::checked(global, controller.switch_all(state.is_on()).await)?;
    groups::print_groups(global, groups)
}
