use crate::error::{HandlerError, HandlerResult};
use crate::handlers::Context;
use crate::proto::{Response, parse_mode_changes};
use crate::state::modes::ModeType;
use tracing::debug;

pub(super) fn handle(ctx: &mut Context<'_>, name: &str, args: &[String]) -> HandlerResult {
    let matrix = ctx.matrix;
    let handle = matrix
        .channel(name)
        .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;

    if args.is_empty() {
        let channel = handle.read();
        let modes = channel.modes_as_string();
        let mut params = vec![channel.name.as_str()];
        params.extend(modes.split(' '));
        ctx.out.numeric(Response::RPL_CHANNELMODEIS, &params);
        let created = channel.created_at.to_string();
        ctx.out
            .numeric(Response::RPL_CREATIONTIME, &[&channel.name, &created]);
        return Ok(());
    }

    let changes = parse_mode_changes(args, |letter, action| {
        if matrix.hierarchy.is_prefix_mode(letter) {
            return true;
        }
        matrix
            .modes
            .find_by_letter(letter, ModeType::Channel)
            .is_some_and(|def| def.is_list() || def.takes_param(action))
    });
    let applied = matrix.apply_channel_modes(ctx.uid, name, &changes, ctx.out)?;
    debug!(uid = %ctx.uid, channel = %name, requested = changes.len(), applied = applied.len(), "Channel modes processed");
    Ok(())
}
