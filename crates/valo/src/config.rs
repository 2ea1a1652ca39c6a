//! CLI-specific configuration: `valo_config` loading plus `GlobalOpts`
//! overrides, and controller construction.

use std::sync::Arc;

use valo_config::Config;
use valo_core::Controller;
use valo_gateway::SimulatedGateway;

use crate::cli::GlobalOpts;
use crate::error::CliError;

const SIMULATED: &str = "simulated";

/// Load the config file + environment, then apply CLI flag overrides.
pub fn load_effective(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = match &global.config {
        Some(path) => valo_config::load_config_from(path)?,
        None => valo_config::load_config()?,
    };
    if let Some(address) = &global.gateway {
        cfg.gateway_address = Some(address.clone());
    }
    if let Some(code) = &global.security_code {
        cfg.gateway_security_code = Some(code.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.command_timeout_secs = timeout;
    }
    Ok(cfg)
}

/// Build a `Controller` for the effective configuration.
///
/// `--simulate` wires in the in-memory gateway and fills in a placeholder
/// address and code when none are configured.
pub fn build_controller(global: &GlobalOpts) -> Result<Controller, CliError> {
    let mut cfg = load_effective(global)?;

    if global.simulate {
        cfg.gateway_address.get_or_insert_with(|| SIMULATED.into());
        cfg.gateway_security_code
            .get_or_insert_with(|| SIMULATED.into());
        let gateway = cfg.resolve()?;
        tracing::debug!(address = %gateway.address, "using simulated gateway");
        let transport =
            SimulatedGateway::with_demo_topology().with_address(gateway.address.clone());
        return Ok(Controller::new(gateway, Arc::new(transport)));
    }

    let gateway = cfg.resolve()?;
    Err(CliError::NoTransport {
        address: gateway.address,
    })
}
