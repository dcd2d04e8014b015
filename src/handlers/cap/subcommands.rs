use super::helpers::{list_budget, ls_budget};
use crate::handlers::{Context, complete_registration, join_chunks};
use crate::proto::Message;
use tracing::debug;

fn cap_reply(ctx: &mut Context<'_>, target: &str, subcommand: &str, more: bool, caps: String) {
    let mut params = vec![target.to_string(), subcommand.to_string()];
    if more {
        params.push("*".to_string());
    }
    params.push(caps);
    let reply = Message::new("CAP", params).with_prefix(ctx.out.server_prefix());
    ctx.out.send(reply);
}

/// `CAP LS [version]`
pub fn handle_ls(ctx: &mut Context<'_>, target: &str, version_arg: Option<&str>) {
    let version = version_arg.and_then(|v| v.parse().ok()).unwrap_or(301);
    ctx.session.cap_version = version;
    ctx.session.gate.begin_negotiation();

    let names = ctx.matrix.capabilities.names();
    let limit = ls_budget(version, ctx.server_name(), target);
    let lines = join_chunks(&names, limit);
    let last = lines.len().saturating_sub(1);
    for (i, line) in lines.into_iter().enumerate() {
        cap_reply(ctx, target, "LS", version >= 302 && i < last, line);
    }
    debug!(uid = %ctx.uid, version, "CAP LS sent");
}

/// `CAP LIST`
pub fn handle_list(ctx: &mut Context<'_>, target: &str) {
    let mut enabled: Vec<String> = ctx.session.caps.iter().cloned().collect();
    enabled.sort();
    let version = ctx.session.cap_version;
    let limit = list_budget(version, ctx.server_name(), target);
    let lines = join_chunks(&enabled, limit);
    let last = lines.len().saturating_sub(1);
    for (i, line) in lines.into_iter().enumerate() {
        cap_reply(ctx, target, "LIST", version >= 302 && i < last, line);
    }
}

/// `CAP REQ :<caps>`: all or nothing, answered with the exact request.
pub fn handle_req(ctx: &mut Context<'_>, target: &str, requested: &str) {
    ctx.session.gate.begin_negotiation();

    let ops: Vec<(bool, &str)> = requested
        .split_whitespace()
        .map(|token| match token.strip_prefix('-') {
            Some(name) => (false, name),
            None => (true, token),
        })
        .collect();
    let known = !ops.is_empty() && ops.iter().all(|(_, name)| ctx.matrix.capabilities.contains(name));
    if !known {
        debug!(uid = %ctx.uid, %requested, "CAP REQ NAK");
        cap_reply(ctx, target, "NAK", false, requested.to_string());
        return;
    }

    for (add, name) in ops {
        if add {
            ctx.session.caps.insert(name.to_string());
        } else {
            ctx.session.caps.remove(name);
        }
    }
    if let Some(user) = ctx.user() {
        user.write().caps = ctx.session.caps.clone();
    }
    debug!(uid = %ctx.uid, %requested, "CAP REQ ACK");
    cap_reply(ctx, target, "ACK", false, requested.to_string());
}

/// `CAP END`: lifts the negotiation hold on registration.
pub fn handle_end(ctx: &mut Context<'_>) {
    let progress = ctx.session.gate.end_negotiation();
    complete_registration(ctx, progress);
}
