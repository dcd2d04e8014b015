//! TIME command.

use super::{Module, ModuleHost};
use crate::error::{HandlerResult, ModuleError};
use crate::handlers::{Context, Handler};
use crate::proto::{Message, Response};
use async_trait::async_trait;
use chrono::Local;

pub struct Time;

impl Module for Time {
    fn name(&self) -> &'static str {
        "time"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_command("TIME", TimeHandler)
    }
}

struct TimeHandler;

#[async_trait]
impl Handler for TimeHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        let now = Local::now().format("%A %B %d %Y -- %H:%M:%S %z").to_string();
        let server = ctx.server_name().to_string();
        ctx.out.numeric(Response::RPL_TIME, &[&server, &now]);
        Ok(())
    }
}
