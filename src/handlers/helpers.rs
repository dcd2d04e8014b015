//! Small helpers shared by handlers.

use crate::error::HandlerError;
use crate::proto::Responder;

/// Queue the numeric for a per-target failure and keep going.
///
/// Commands taking target lists (JOIN, PART, PRIVMSG) report each failing
/// target without aborting the remaining ones.
pub(crate) fn report(out: &mut Responder, verb: &str, error: &HandlerError) {
    let server = out.server_prefix().to_string();
    if let Some(reply) = error.to_irc_reply(&server, out.me(), verb) {
        out.send(reply);
    }
}

/// Split a comma-separated target list, skipping empty entries.
pub(crate) fn split_targets(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').filter(|t| !t.is_empty())
}

/// Join tokens with spaces into lines no longer than `limit`.
///
/// A single token longer than `limit` gets a line of its own. An empty
/// token list still yields one (empty) line.
pub(crate) fn join_chunks<S: AsRef<str>>(tokens: &[S], limit: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for token in tokens {
        let token = token.as_ref();
        if !current.is_empty() && current.len() + 1 + token.len() > limit {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(token);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_chunks() {
        assert_eq!(join_chunks(&["a", "bb", "cc"], 5), vec!["a bb", "cc"]);
        assert_eq!(join_chunks(&["toolong", "x"], 3), vec!["toolong", "x"]);
        assert_eq!(join_chunks::<&str>(&[], 10), vec![String::new()]);
    }

    #[test]
    fn test_split_targets_skips_empty() {
        assert_eq!(split_targets("#a,,#b,").collect::<Vec<_>>(), vec!["#a", "#b"]);
    }

    #[test]
    fn test_report_uses_responder_identity() {
        let mut out = Responder::new("irc.test", "alice");
        report(&mut out, "JOIN", &HandlerError::NoSuchChannel("x".into()));
        report(&mut out, "JOIN", &HandlerError::Internal("ignored".into()));
        assert_eq!(out.len(), 1);
        assert_eq!(out.replies()[0].to_string(), ":irc.test 403 alice x :No such channel");
    }
}
