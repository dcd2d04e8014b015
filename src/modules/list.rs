//! LIST command.

use super::{Module, ModuleHost};
use crate::error::{HandlerError, HandlerResult, ModuleError};
use crate::handlers::{Context, Handler};
use crate::proto::{Message, Response};
use crate::state::Channel;
use async_trait::async_trait;

pub struct List;

impl Module for List {
    fn name(&self) -> &'static str {
        "list"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_command("LIST", ListHandler)
    }
}

/// `LIST [<channel>{,<channel>}]`
struct ListHandler;

fn list_entry(channel: &Channel) -> (String, String, String) {
    let topic = channel.topic.as_ref().map(|t| t.text.clone()).unwrap_or_default();
    (channel.name.clone(), channel.member_count().to_string(), topic)
}

#[async_trait]
impl Handler for ListHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let viewer = ctx
            .user_snapshot()
            .ok_or_else(|| HandlerError::Internal("viewer vanished".into()))?;
        let matrix = ctx.matrix;
        let handles: Vec<_> = match msg.arg(0).filter(|a| !a.is_empty()) {
            Some(names) => names.split(',').filter_map(|n| matrix.channel(n)).collect(),
            None => matrix.all_channels(),
        };

        let mut rows = Vec::with_capacity(handles.len());
        for handle in handles {
            let channel = handle.read();
            if !matrix.is_secret_for(&channel, &viewer) {
                rows.push(list_entry(&channel));
            }
        }
        rows.sort();

        ctx.out.numeric(Response::RPL_LISTSTART, &["Channel", "Users  Name"]);
        for (name, count, topic) in &rows {
            ctx.out.numeric(Response::RPL_LIST, &[name, count, topic]);
        }
        ctx.out.numeric(Response::RPL_LISTEND, &["End of /LIST"]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::proto::ModeChange;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_list_hides_secret_channels() {
        let matrix = Arc::new(matrix());
        let _a = register(&matrix, "1", "alice");
        let _b = register(&matrix, "2", "bob");
        let mut out = responder(&matrix, "alice");
        matrix.join_channel("1", "#open", None, &mut out).expect("join");
        matrix.set_topic("1", "#open", "hello", &mut out).expect("topic");
        matrix.join_channel("1", "#hidden", None, &mut out).expect("join");
        matrix
            .apply_channel_modes("1", "#hidden", &[ModeChange::add('s', None)], &mut out)
            .expect("mode");

        let replies = run(&matrix, "2", "LIST").await;
        let lines: Vec<String> = replies.iter().map(|m| m.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                ":irc.test 321 bob Channel :Users  Name",
                ":irc.test 322 bob #open 1 hello",
                ":irc.test 323 bob :End of /LIST",
            ]
        );

        let replies = run(&matrix, "1", "LIST #hidden,#missing").await;
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[1].params[1], "#hidden");
    }
}
