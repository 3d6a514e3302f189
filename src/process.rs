//! Termination of the target process on quit

use log::{debug, info};
use std::io;
use std::process::{Command, Stdio};

/// Ends the program the user was controlling
pub trait ProcessTerminator {
    /// Request termination of every process called `name`.
    ///
    /// `Ok(false)` means no such process was found.
    fn terminate(&mut self, name: &str) -> io::Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KillMethod {
    /// `pkill <name>` (SIGTERM)
    #[default]
    Pkill,
    /// `killall -9 <name>` (SIGKILL)
    Killall,
}

/// Runs `pkill` or `killall`
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandTerminator {
    method: KillMethod,
}

impl CommandTerminator {
    pub fn new(method: KillMethod) -> Self {
        Self { method }
    }

    fn command(&self, name: &str) -> Command {
        let mut command = match self.method {
            KillMethod::Pkill => Command::new("pkill"),
            KillMethod::Killall => {
                let mut command = Command::new("killall");
                command.arg("-9");
                command
            }
        };
        command.arg(name).stdout(Stdio::null()).stderr(Stdio::null());
        command
    }
}

impl ProcessTerminator for CommandTerminator {
    fn terminate(&mut self, name: &str) -> io::Result<bool> {
        debug!("Terminating '{}' with {:?}", name, self.method);
        let status = self.command(name).status()?;
        info!("Terminate '{}': {}", name, status);
        Ok(status.success())
    }
}
