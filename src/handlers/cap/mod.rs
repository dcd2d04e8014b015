//! CAP command handler for IRCv3 capability negotiation.
//!
//! Implements the LS, LIST, REQ and END subcommands. LS and REQ before
//! registration hold it until END.
//! Reference: <https://ircv3.net/specs/extensions/capability-negotiation>

mod helpers;
mod subcommands;

use crate::error::HandlerResult;
use crate::handlers::{Context, Handler, HandlerPhase};
use crate::proto::{Message, Response};
use async_trait::async_trait;
use subcommands::{handle_end, handle_list, handle_ls, handle_req};

/// Handler for CAP command.
pub struct CapHandler;

#[async_trait]
impl Handler for CapHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let subcommand = msg.arg(0).unwrap_or("").to_ascii_uppercase();
        let target = ctx.nick();

        match subcommand.as_str() {
            "LS" => handle_ls(ctx, &target, msg.arg(1)),
            "LIST" => handle_list(ctx, &target),
            "REQ" => handle_req(ctx, &target, msg.arg(1).unwrap_or("")),
            "END" => handle_end(ctx),
            _ => {
                let raw = msg.arg(0).unwrap_or("");
                ctx.out
                    .numeric(Response::ERR_INVALIDCAPCMD, &[raw, "Invalid CAP command"]);
            }
        }
        Ok(())
    }

    fn phase(&self) -> HandlerPhase {
        HandlerPhase::Any
    }

    fn min_params(&self) -> usize {
        1
    }
}
