//! NAMES command handler.
//!
//! Only the first channel of a list is answered. A missing or secret channel
//! gets just the 366 terminator.

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, Handler};
use crate::proto::{Message, Response};
use async_trait::async_trait;

pub struct NamesHandler;

#[async_trait]
impl Handler for NamesHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let name = msg
            .arg(0)
            .and_then(|list| list.split(',').next())
            .filter(|n| !n.is_empty());
        let matrix = ctx.matrix;

        if let Some(name) = name
            && let Some(handle) = matrix.channel(name)
        {
            let viewer = ctx
                .user_snapshot()
                .ok_or_else(|| HandlerError::Internal("viewer vanished".into()))?;
            let channel = handle.read();
            if !matrix.is_secret_for(&channel, &viewer) {
                matrix.names_reply(&channel, &viewer, ctx.out);
                return Ok(());
            }
        }

        ctx.out
            .numeric(Response::RPL_ENDOFNAMES, &[name.unwrap_or("*"), "End of /NAMES list"]);
        Ok(())
    }
}
