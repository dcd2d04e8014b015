//! USERHOST command.

use super::{Module, ModuleHost};
use crate::error::{HandlerResult, ModuleError};
use crate::handlers::{Context, Handler};
use crate::proto::{Message, Response};
use async_trait::async_trait;

pub struct UserHost;

impl Module for UserHost {
    fn name(&self) -> &'static str {
        "userhost"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_command("USERHOST", UserHostHandler)
    }
}

/// `USERHOST <nick>{ <nick>}`, at most five answered.
struct UserHostHandler;

#[async_trait]
impl Handler for UserHostHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let matrix = ctx.matrix;
        let replies: Vec<String> = msg
            .params
            .iter()
            .take(5)
            .filter_map(|nick| {
                let user = matrix.find_user(nick)?;
                let user = user.read();
                let oper = if user.has_mode('o') || user.has_mode('O') { "*" } else { "" };
                let away = if user.away.is_some() { '-' } else { '+' };
                Some(format!("{}{}={}{}@{}", user.nick, oper, away, user.user, user.host))
            })
            .collect();
        ctx.out.numeric(Response::RPL_USERHOST, &[&replies.join(" ")]);
        Ok(())
    }

    fn min_params(&self) -> usize {
        1
    }
}
