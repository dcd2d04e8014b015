//! Messaging handlers: PRIVMSG, NOTICE and TAGMSG.
//!
//! All three share one delivery path. NOTICE never produces error replies;
//! TAGMSG carries no text and only reaches recipients that negotiated
//! message-tags.

mod routing;

use crate::error::HandlerResult;
use crate::handlers::{Context, Handler};
use crate::hooks::MessageKind;
use crate::proto::Message;
use async_trait::async_trait;

pub struct PrivmsgHandler;

#[async_trait]
impl Handler for PrivmsgHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        routing::deliver(ctx, msg, MessageKind::Privmsg)
    }
}

pub struct NoticeHandler;

#[async_trait]
impl Handler for NoticeHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        routing::deliver(ctx, msg, MessageKind::Notice)
    }
}

pub struct TagmsgHandler;

#[async_trait]
impl Handler for TagmsgHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        routing::deliver(ctx, msg, MessageKind::Tagmsg)
    }
}
