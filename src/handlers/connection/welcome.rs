//! Registration completion and the welcome burst.

use crate::handlers::Context;
use crate::proto::{Responder, Response};
use crate::state::{Credentials, Matrix, NickProblem, Progress};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Finish registration when the gate reports [`Progress::Ready`].
///
/// Claims the nick atomically. On a collision the client gets 433 and the
/// gate waits for another NICK. On success the connection's outbound queue
/// is handed to the Matrix and the welcome burst is queued.
pub fn complete_registration(ctx: &mut Context<'_>, progress: Progress) {
    let Progress::Ready(creds) = progress else {
        return;
    };
    let matrix = ctx.matrix;
    match matrix.register_user(ctx.uid, &creds, &ctx.session.caps, ctx.out) {
        Ok(()) => {}
        Err(NickProblem::InUse | NickProblem::Erroneous) => {
            debug!(uid = %ctx.uid, nick = %creds.nick, "Nick taken at registration");
            ctx.out.numeric(
                Response::ERR_NICKNAMEINUSE,
                &[&creds.nick, "Nickname is already in use"],
            );
            ctx.session.gate.reject_nick();
            return;
        }
    }

    ctx.session.gate.mark_registered();
    if let Some(sender) = ctx.session.outbound.take() {
        matrix.attach_sender(ctx.uid, sender);
    }
    ctx.out.set_me(&creds.nick);
    let modes = matrix
        .user_snapshot(ctx.uid)
        .map(|u| u.modes_as_string())
        .unwrap_or_default();
    send_welcome_burst(matrix, &creds, &modes, ctx.out);
}

/// `ISUPPORT` tokens advertised in 005.
pub fn isupport_tokens(matrix: &Matrix) -> Vec<String> {
    let limits = &matrix.config.limits;
    vec![
        "CHANTYPES=#".to_string(),
        format!("CHANLIMIT=#:{}", limits.max_channels),
        format!("CHANNELLEN={}", limits.channel_len),
        format!("NICKLEN={}", limits.nick_len),
        "CASEMAPPING=rfc1459".to_string(),
        format!("NETWORK={}", matrix.server_info.network),
        format!("CHANMODES={}", matrix.modes.chanmodes_token()),
        format!("PREFIX={}", matrix.hierarchy.prefix_token()),
    ]
}

fn send_welcome_burst(matrix: &Matrix, creds: &Credentials, modes: &str, out: &mut Responder) {
    let info = &matrix.server_info;
    let welcome = format!(
        "Welcome to the {} Internet Relay Chat Network {}!{}@{}",
        info.network, creds.nick, creds.user, creds.host
    );
    out.numeric(Response::RPL_WELCOME, &[&welcome]);
    let your_host = format!("Your host is {}, running version {}", info.name, info.version);
    out.numeric(Response::RPL_YOURHOST, &[&your_host]);
    let created = DateTime::<Utc>::from_timestamp(info.created, 0)
        .map(|t| t.format("%a %b %d %Y at %H:%M:%S UTC").to_string())
        .unwrap_or_default();
    out.numeric(
        Response::RPL_CREATED,
        &[&format!("This server was created {}", created)],
    );
    out.numeric(
        Response::RPL_MYINFO,
        &[
            &info.name,
            &info.version,
            &matrix.user_mode_letters(),
            &matrix.channel_mode_letters(),
        ],
    );

    let mut isupport = isupport_tokens(matrix);
    isupport.push("are supported by this server".to_string());
    let params: Vec<&str> = isupport.iter().map(String::as_str).collect();
    out.numeric(Response::RPL_ISUPPORT, &params);

    if modes.len() > 1 {
        out.numeric(Response::RPL_UMODEIS, &[modes]);
    }
    send_motd(matrix, out);
}

/// MOTD (375/372/376), or 422 when none is configured.
pub fn send_motd(matrix: &Matrix, out: &mut Responder) {
    let lines = &matrix.config.motd;
    if lines.is_empty() {
        out.numeric(Response::ERR_NOMOTD, &["MOTD File is missing"]);
        return;
    }
    let start = format!("- {} Message of the day - ", matrix.server_name());
    out.numeric(Response::RPL_MOTDSTART, &[&start]);
    for line in lines {
        out.numeric(Response::RPL_MOTD, &[&format!("- {}", line)]);
    }
    out.numeric(Response::RPL_ENDOFMOTD, &["End of /MOTD command."]);
}
