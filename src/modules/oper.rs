//! IRC operators: the `o`/`O` user modes, OPER and KILL.
//!
//! Operator modes can only be granted by OPER. Users may drop them with
//! MODE but never set them.

use super::{Module, ModuleHost};
use crate::error::{HandlerError, HandlerResult, ModeError, ModuleError};
use crate::handlers::{Context, Handler};
use crate::proto::{Message, ModeChange, Response};
use crate::state::UserModeSource;
use crate::state::modes::{ModeCheck, ModeDefinition};
use async_trait::async_trait;
use tracing::{info, warn};

pub struct Oper;

fn drop_only(_: &ModeDefinition, check: &ModeCheck<'_>) -> Result<bool, ModeError> {
    Ok(!check.action.is_add())
}

impl Module for Oper {
    fn name(&self) -> &'static str {
        "oper"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_mode(ModeDefinition::user_flag("oper", 'o').with_access_check(drop_only))?;
        host.add_mode(ModeDefinition::user_flag("localOper", 'O').with_access_check(drop_only))?;
        host.add_command("OPER", OperHandler)?;
        host.add_command("KILL", KillHandler)?;
        Ok(())
    }
}

/// `OPER <name> <password>`
struct OperHandler;

#[async_trait]
impl Handler for OperHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let (Some(name), Some(password)) = (msg.arg(0), msg.arg(1)) else {
            return Err(HandlerError::NeedMoreParams);
        };
        let matrix = ctx.matrix;
        let block = matrix
            .config
            .opers
            .iter()
            .find(|o| o.name == name && o.verify_password(password));
        let Some(block) = block else {
            warn!(uid = %ctx.uid, oper = %name, "Failed OPER attempt");
            ctx.out.numeric(Response::ERR_NOOPERHOST, &["No O-lines for your host"]);
            return Ok(());
        };

        let letter = if block.global { 'o' } else { 'O' };
        matrix.apply_user_modes(
            ctx.uid,
            &[ModeChange::add(letter, None)],
            UserModeSource::Internal,
            ctx.out,
        )?;
        ctx.out
            .numeric(Response::RPL_YOUREOPER, &["You are now an IRC operator"]);
        info!(uid = %ctx.uid, oper = %name, global = block.global, "Operator authenticated");
        Ok(())
    }

    fn min_params(&self) -> usize {
        2
    }
}

/// `KILL <nick> [reason]`
struct KillHandler;

#[async_trait]
impl Handler for KillHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Some(target_nick) = msg.arg(0) else {
            return Err(HandlerError::NeedMoreParams);
        };
        let killer = ctx
            .user_snapshot()
            .ok_or_else(|| HandlerError::Internal("killer vanished".into()))?;
        if !killer.has_mode('o') && !killer.has_mode('O') {
            ctx.out.numeric(
                Response::ERR_NOPRIVILEGES,
                &["Permission Denied- You're not an IRC operator"],
            );
            return Ok(());
        }

        let matrix = ctx.matrix;
        let target_uid = matrix
            .find_uid(target_nick)
            .ok_or_else(|| HandlerError::NoSuchNick(target_nick.to_string()))?;
        let reason = msg.arg(1).unwrap_or("No reason given");
        let quit_reason = format!("Killed ({} ({}))", killer.nick, reason);

        matrix.send_to(
            &target_uid,
            Message::new("ERROR", [format!("Closing Link: {} ({})", matrix.server_name(), quit_reason)]),
        );
        matrix.disconnect(&target_uid);
        info!(killer = %killer.nick, target = %target_nick, %reason, "User killed");
        matrix.destroy_connection(&target_uid, &quit_reason);
        Ok(())
    }

    fn min_params(&self) -> usize {
        1
    }
}
