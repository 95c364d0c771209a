//! On/off state machine shared by motor-driven equipment.
//!
//! The start command is what the controller asks for; the status is what the
//! equipment reports. [`OnOffDevice::update`] aligns the two and tells the
//! owner which edge (if any) just happened.

use tracing::info;

/// Edge produced by [`OnOffDevice::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnOffDevice {
    name: String,
    start_command: bool,
    status: bool,
}

impl OnOffDevice {
    pub fn new(name: impl Into<String>, start_command: bool) -> Self {
        Self {
            name: name.into(),
            start_command,
            status: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn start(&mut self) {
        self.start_command = true;
    }

    pub fn stop(&mut self) {
        self.start_command = false;
    }

    pub fn set_start_command(&mut self, on: bool) {
        self.start_command = on;
    }

    pub fn start_command(&self) -> bool {
        self.start_command
    }

    /// Running state as of the last [`update`](Self::update).
    pub fn status(&self) -> bool {
        self.status
    }

    /// Follow the start command. Returns the edge if the status changed.
    pub fn update(&mut self) -> Option<Transition> {
        if self.start_command == self.status {
            return None;
        }
        self.status = self.start_command;
        let transition = if self.status {
            Transition::Started
        } else {
            Transition::Stopped
        };
        info!(equipment = %self.name, ?transition, "status changed");
        Some(transition)
    }
}
