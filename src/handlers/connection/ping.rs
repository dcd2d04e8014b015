//! PING, PONG and QUIT handlers.

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, Handler, HandlerPhase};
use crate::proto::Message;
use async_trait::async_trait;
use tracing::info;

/// Handler for PING command.
pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        // PING <token>
        let token = msg.arg(0).unwrap_or("");
        let server = ctx.server_name().to_string();
        let pong = Message::new("PONG", [server.as_str(), token]).with_prefix(ctx.out.server_prefix());
        ctx.out.send(pong);
        Ok(())
    }

    fn phase(&self) -> HandlerPhase {
        HandlerPhase::Any
    }

    fn min_params(&self) -> usize {
        1
    }
}

/// Handler for PONG command. Nothing to answer.
pub struct PongHandler;

#[async_trait]
impl Handler for PongHandler {
    async fn handle(&self, _ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        Ok(())
    }

    fn phase(&self) -> HandlerPhase {
        HandlerPhase::Any
    }
}

/// Handler for QUIT command.
pub struct QuitHandler;

#[async_trait]
impl Handler for QuitHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let reason = msg.arg(0).map(str::to_string);
        info!(uid = %ctx.uid, nick = %ctx.nick(), reason = ?reason, "Client quit");
        Err(HandlerError::Quit(reason))
    }

    fn phase(&self) -> HandlerPhase {
        HandlerPhase::Any
    }
}
