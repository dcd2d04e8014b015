//! Target resolution and delivery.

use crate::caps::MESSAGE_TAGS;
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, report, split_targets};
use crate::hooks::MessageKind;
use crate::proto::{Message, Responder, Response, Tag, is_channel_name};
use tracing::trace;

/// Client-only tags (`+key`) are the only ones relayed.
fn client_tags(msg: &Message) -> Vec<Tag> {
    msg.tags.iter().filter(|t| t.0.starts_with('+')).cloned().collect()
}

pub(super) fn deliver(ctx: &mut Context<'_>, msg: &Message, kind: MessageKind) -> HandlerResult {
    let quiet = kind == MessageKind::Notice;
    let verb = kind.command();

    let Some(targets) = msg.arg(0).filter(|t| !t.is_empty()) else {
        if !quiet {
            ctx.out.numeric(
                Response::ERR_NORECIPIENT,
                &[&format!("No recipient given ({})", verb)],
            );
        }
        return Ok(());
    };
    let text = match kind {
        MessageKind::Tagmsg => "",
        _ => match msg.arg(1).filter(|t| !t.is_empty()) {
            Some(text) => text,
            None if quiet => return Ok(()),
            None => return Err(HandlerError::NoTextToSend),
        },
    };
    let tags = client_tags(msg);

    // Hook denials for NOTICE are swallowed along with every other error.
    let mut scratch = Responder::new(ctx.server_name(), ctx.out.me());
    for target in split_targets(targets) {
        let out: &mut Responder = if quiet { &mut scratch } else { &mut *ctx.out };
        let result = if is_channel_name(target) {
            ctx.matrix
                .channel_message(ctx.uid, target, kind, text, &tags, out)
        } else {
            to_user(ctx.matrix, ctx.uid, target, kind, text, &tags, out)
        };
        if let Err(e) = result {
            report(out, verb, &e);
        }
    }
    trace!(uid = %ctx.uid, command = verb, dropped = scratch.len(), "Message routed");
    Ok(())
}

fn to_user(
    matrix: &crate::state::Matrix,
    uid: &str,
    target: &str,
    kind: MessageKind,
    text: &str,
    tags: &[Tag],
    out: &mut Responder,
) -> HandlerResult {
    let target_uid = matrix
        .find_uid(target)
        .ok_or_else(|| HandlerError::NoSuchNick(target.to_string()))?;
    let (Some(sender), Some(recipient)) = (matrix.user_snapshot(uid), matrix.user_snapshot(&target_uid))
    else {
        return Err(HandlerError::NoSuchNick(target.to_string()));
    };

    let wants_tags = recipient.has_cap(MESSAGE_TAGS);
    if kind == MessageKind::Tagmsg && !wants_tags {
        return Ok(());
    }
    let params: Vec<&str> = match kind {
        MessageKind::Tagmsg => vec![recipient.nick.as_str()],
        _ => vec![recipient.nick.as_str(), text],
    };
    let mut relay = Message::new(kind.command(), params).with_prefix(sender.prefix());
    if wants_tags {
        relay.tags = tags.to_vec();
    }
    matrix.send_to(&target_uid, relay);

    if kind == MessageKind::Privmsg
        && let Some(away) = &recipient.away
    {
        out.numeric(Response::RPL_AWAY, &[&recipient.nick, away]);
    }
    Ok(())
}
