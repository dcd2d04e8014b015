//! Module host.
//!
//! A module contributes modes, commands and hook callbacks through a
//! [`ModuleHost`]. Loading is all-or-nothing: when any registration fails,
//! everything the module registered so far is rolled back. Unloading removes
//! every component the module owns.

mod ban;
mod commands;
mod invisible;
mod invite;
mod key;
mod limit;
mod list;
mod moderated;
mod no_external;
mod oper;
mod secret;
mod time;
mod topic_lock;
mod userhost;

use crate::error::ModuleError;
use crate::handlers::Handler;
use crate::hooks::Hook;
use crate::state::modes::ModeDefinition;
use crate::state::{Channel, Matrix};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

pub trait Module: Send + Sync {
    /// Unique id; owns every component the module registers.
    fn name(&self) -> &'static str;

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError>;
}

/// Registration surface handed to [`Module::load`].
pub struct ModuleHost<'a> {
    matrix: &'a Matrix,
    id: &'static str,
    modes: Vec<Arc<ModeDefinition>>,
    commands: Vec<String>,
}

impl<'a> ModuleHost<'a> {
    fn new(matrix: &'a Matrix, id: &'static str) -> Self {
        Self {
            matrix,
            id,
            modes: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn matrix(&self) -> &Matrix {
        self.matrix
    }

    pub fn add_mode(&mut self, def: ModeDefinition) -> Result<Arc<ModeDefinition>, ModuleError> {
        let def = self.matrix.modes.register(def)?;
        self.modes.push(Arc::clone(&def));
        Ok(def)
    }

    pub fn add_command<H: Handler + 'static>(&mut self, verb: &str, handler: H) -> Result<(), ModuleError> {
        if !self.matrix.commands.register(self.id, verb, Arc::new(handler)) {
            return Err(ModuleError::DuplicateCommand(verb.to_ascii_uppercase()));
        }
        self.commands.push(verb.to_ascii_uppercase());
        Ok(())
    }

    pub fn add_hook(&mut self, hook: Hook) {
        self.matrix.hooks.add(self.id, hook);
    }

    fn rollback(self) {
        release(self.matrix, self.id, &self.modes);
    }
}

fn release(matrix: &Matrix, id: &str, modes: &[Arc<ModeDefinition>]) {
    for def in modes {
        matrix.modes.unregister(def);
    }
    matrix.commands.unregister_owner(id);
    matrix.hooks.remove_module(id);
}

struct ModuleRecord {
    modes: Vec<Arc<ModeDefinition>>,
    commands: Vec<String>,
}

/// Loaded modules of one server instance.
#[derive(Default)]
pub struct ModuleTable {
    loaded: Mutex<HashMap<&'static str, ModuleRecord>>,
}

impl Matrix {
    pub fn load_module(&self, module: &dyn Module) -> Result<(), ModuleError> {
        let id = module.name();
        let mut loaded = self.modules.loaded.lock();
        if loaded.contains_key(id) {
            return Err(ModuleError::AlreadyLoaded(id.to_string()));
        }

        let mut host = ModuleHost::new(self, id);
        if let Err(e) = module.load(&mut host) {
            error!(module = %id, error = %e, "Module load failed");
            host.rollback();
            return Err(e);
        }
        info!(module = %id, modes = host.modes.len(), commands = host.commands.len(), "Module loaded");
        loaded.insert(
            id,
            ModuleRecord {
                modes: host.modes,
                commands: host.commands,
            },
        );
        Ok(())
    }

    /// Remove a module and everything it registered.
    pub fn unload_module(&self, id: &str) -> bool {
        let Some(record) = self.modules.loaded.lock().remove(id) else {
            return false;
        };
        release(self, id, &record.modes);
        info!(module = %id, commands = ?record.commands, "Module unloaded");
        true
    }

    pub fn is_module_loaded(&self, id: &str) -> bool {
        self.modules.loaded.lock().contains_key(id)
    }
}

/// Load the core command set and the core mode modules.
pub fn load_core_modules(matrix: &Matrix) -> Result<(), ModuleError> {
    let modules: [&dyn Module; 14] = [
        &commands::CoreCommands,
        &key::ChannelKey,
        &limit::ChannelLimit,
        &ban::ChannelBan,
        &invite::InviteOnly,
        &moderated::Moderated,
        &no_external::NoExternalMessages,
        &topic_lock::TopicLock,
        &secret::Secret,
        &invisible::Invisible,
        &oper::Oper,
        &list::List,
        &time::Time,
        &userhost::UserHost,
    ];
    for module in modules {
        matrix.load_module(module)?;
    }
    Ok(())
}

/// Whether `uid` reaches `level` on `channel`.
///
/// An unknown level name is a configuration bug; it is logged and treated
/// as not reached.
pub(crate) fn member_at_least(matrix: &Matrix, channel: &Channel, uid: &str, level: &str) -> bool {
    match channel.is_user_at_least(&matrix.hierarchy, uid, level) {
        Ok(reached) => reached,
        Err(e) => {
            error!(channel = %channel.name, %level, error = %e, "Access check failed");
            false
        }
    }
}
