//! TOPIC command handler.
//!
//! `TOPIC <channel>` queries (331, or 332 and 333); `TOPIC <channel> :<text>`
//! sets it, and an empty text clears it.

use crate::error::{ChannelError, HandlerError, HandlerResult};
use crate::handlers::{Context, Handler};
use crate::proto::{Message, Response};
use async_trait::async_trait;

pub struct TopicHandler;

#[async_trait]
impl Handler for TopicHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let name = msg.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let matrix = ctx.matrix;

        if let Some(text) = msg.arg(1) {
            return matrix.set_topic(ctx.uid, name, text, ctx.out);
        }

        let handle = matrix
            .channel(name)
            .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
        let viewer = ctx
            .user_snapshot()
            .ok_or_else(|| HandlerError::Internal("viewer vanished".into()))?;
        let channel = handle.read();
        if matrix.is_secret_for(&channel, &viewer) {
            ChannelError::NotOnChannel.emit(ctx.out, &channel.name);
            return Ok(());
        }
        match &channel.topic {
            Some(topic) => matrix.topic_reply(&channel, topic, ctx.out),
            None => ctx
                .out
                .numeric(Response::RPL_NOTOPIC, &[&channel.name, "No topic is set"]),
        }
        Ok(())
    }

    fn min_params(&self) -> usize {
        1
    }

    fn channel_param(&self) -> Option<usize> {
        Some(0)
    }
}
