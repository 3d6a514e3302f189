//! pad2key - game controller to keyboard/mouse/gamepad mapper
//!
//! Sends REAL input events through uinput. Quit with the configured hotkey
//! combo (default: back+start).

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use pad2key::backend::OutputEmitter;
use pad2key::input::GilrsSource;
use pad2key::mapping::EventTranslator;
use pad2key::process::CommandTerminator;
use pad2key::startup::{Args, StartupConfig};
use pad2key::SessionManager;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let startup = StartupConfig::from_args(Args::parse());

    let config = startup.load_config().context("Failed to load configuration")?;
    let tick = Duration::from_millis(config.settings.tick_ms);
    let stack = startup.build_stack(config).context("Invalid configuration")?;

    if startup.dump {
        println!("{}", stack.registry().dump()?);
        return Ok(());
    }

    let options = startup.translator_options(&stack);
    let device = open_device(&startup)?;
    let source = GilrsSource::new()?;

    info!("Output device: {}", startup.device);
    if let Some(ref target) = startup.target {
        info!("Quit terminates: {} ({:?})", target, startup.kill_method);
    }

    let translator = EventTranslator::new(
        stack,
        OutputEmitter::new(device),
        Box::new(CommandTerminator::new(startup.kill_method)),
        options,
    );
    SessionManager::new(source, translator, tick).run()?;

    Ok(())
}

#[cfg(target_os = "linux")]
fn open_device(startup: &StartupConfig) -> Result<pad2key::backend::UinputDevice> {
    pad2key::backend::UinputDevice::create(startup.device)
        .context("Failed to create virtual device (is /dev/uinput writable?)")
}

#[cfg(not(target_os = "linux"))]
fn open_device(_startup: &StartupConfig) -> Result<pad2key::backend::MockDevice> {
    Err(pad2key::backend::BackendError::PlatformNotSupported.into())
}
