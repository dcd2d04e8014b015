//! AWAY command handler.

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, Handler};
use crate::proto::{Message, Response};
use async_trait::async_trait;
use tracing::debug;

pub struct AwayHandler;

#[async_trait]
impl Handler for AwayHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let message = msg.arg(0).filter(|m| !m.is_empty());
        let user = ctx
            .user()
            .ok_or_else(|| HandlerError::Internal("user vanished".into()))?;
        user.write().away = message.map(str::to_string);
        debug!(uid = %ctx.uid, away = message.is_some(), "Away status changed");

        match message {
            Some(_) => ctx
                .out
                .numeric(Response::RPL_NOWAWAY, &["You have been marked as being away"]),
            None => ctx
                .out
                .numeric(Response::RPL_UNAWAY, &["You are no longer marked as being away"]),
        }
        Ok(())
    }
}
