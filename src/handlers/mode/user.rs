use crate::error::{HandlerError, HandlerResult};
use crate::handlers::Context;
use crate::proto::{Response, irc_eq, parse_mode_changes};
use crate::state::UserModeSource;

pub(super) fn handle(ctx: &mut Context<'_>, target: &str, args: &[String]) -> HandlerResult {
    let matrix = ctx.matrix;
    if !matrix.nick_exists(target) {
        return Err(HandlerError::NoSuchNick(target.to_string()));
    }
    let me = ctx
        .user_snapshot()
        .ok_or_else(|| HandlerError::Internal("user vanished".into()))?;
    if !irc_eq(&me.nick, target) {
        let verb = if args.is_empty() { "view" } else { "change" };
        ctx.out.numeric(
            Response::ERR_USERSDONTMATCH,
            &[&format!("Can't {} modes for other users", verb)],
        );
        return Ok(());
    }

    if args.is_empty() {
        ctx.out.numeric(Response::RPL_UMODEIS, &[&me.modes_as_string()]);
        return Ok(());
    }

    let changes = parse_mode_changes(args, |_, _| false);
    matrix.apply_user_modes(ctx.uid, &changes, UserModeSource::Client, ctx.out)?;
    Ok(())
}
