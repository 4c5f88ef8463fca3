//! Administrative `activate` / `remove` commands.
//!
//! Parsing belongs to the host; the engine receives an already-parsed
//! [`SpecialCommand`] and answers with an in-band [`CommandResponse`].
//! Activation goes through the same scope, stage and requirement checks as
//! a regular trigger.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

use super::host::ProgressionHost;
use super::trigger::{TriggerEngine, TriggerOutcome};

/// A parsed specials command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialCommand {
    /// Grant a special to the target.
    Activate(String),
    /// Take a special away from the target.
    Remove(String),
}

impl SpecialCommand {
    /// Id of the special the command names.
    #[must_use]
    pub fn special_id(&self) -> &str {
        match self {
            Self::Activate(id) | Self::Remove(id) => id,
        }
    }
}

/// Who runs a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandIssuer {
    /// The server console. Holds every permission.
    Console,
    Player(PlayerId),
}

/// User-facing result of a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl<H: ProgressionHost> TriggerEngine<H> {
    /// Run a command for `target`.
    pub fn execute_command(
        &mut self,
        issuer: CommandIssuer,
        target: PlayerId,
        command: &SpecialCommand,
    ) -> CommandResponse {
        let permission = match command {
            SpecialCommand::Activate(_) => &self.settings.activate_permission,
            SpecialCommand::Remove(_) => &self.settings.remove_permission,
        };
        if let CommandIssuer::Player(player) = issuer {
            if !self.host.has_permission(player, permission) {
                return CommandResponse::fail("You do not have permission to use this command.");
            }
        }

        match command {
            SpecialCommand::Activate(id) => self.activate(target, id),
            SpecialCommand::Remove(id) => self.remove(target, id),
        }
    }

    fn activate(&mut self, target: PlayerId, id: &str) -> CommandResponse {
        let catalog = self.catalog();
        let Some(def) = catalog.get(id) else {
            return CommandResponse::fail(format!("Unknown special: {id}"));
        };
        if !def.trigger.allows_command() {
            return CommandResponse::fail(format!("Special {id} cannot be activated by command."));
        }

        let swept = self.sweep(target, None);
        let name = self.host.player_name(target);
        if swept.iter().any(|granted| granted == id) {
            return CommandResponse::ok(format!("Activated special {id} for {name}."));
        }
        match self.trigger(def, target, None) {
            TriggerOutcome::Applied => {
                CommandResponse::ok(format!("Activated special {id} for {name}."))
            }
            TriggerOutcome::ServerLocked => CommandResponse::fail(format!(
                "Special {id} has already been claimed on this server."
            )),
            TriggerOutcome::AlreadyApplied | TriggerOutcome::Repeated => {
                CommandResponse::fail(format!("{name} already has special {id}."))
            }
            TriggerOutcome::Deferred { reason } => CommandResponse::fail(format!(
                "Special {id} recorded for {name} but not applied: {reason}"
            )),
            TriggerOutcome::AwaitingEffect => CommandResponse::fail(format!(
                "Special {id} recorded for {name} but not applied: status effect requirement not met"
            )),
        }
    }

    fn remove(&mut self, target: PlayerId, id: &str) -> CommandResponse {
        let name = self.host.player_name(target);
        let Some(record) = self.records.get_mut(&target) else {
            return CommandResponse::fail(format!("{name} does not have special {id}."));
        };
        // A completed but unapplied special would be granted again by the
        // next sweep, so completion goes too.
        if !record.remove_special(id, true) {
            return CommandResponse::fail(format!("{name} does not have special {id}."));
        }

        let reason = format!("{}: remove {id}", self.settings.reason_prefix);
        self.speed.publish(target, record, &reason);

        if self.settings.release_server_lock_on_remove && self.locks.release(id) {
            debug!("Released server lock of {id}");
        }
        debug!("Special {id} removed from {target}");
        CommandResponse::ok(format!("Removed special {id} from {name}."))
    }
}
