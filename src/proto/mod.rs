//! Protocol surface: structured messages, numerics, case-folding and the
//! MODE argument grammar.

pub mod casemap;
mod message;
pub mod mode;
mod reply;
mod response;
pub mod wildcard;

pub use casemap::{irc_eq, irc_to_lower};
pub use message::{Message, MessageParseError, Prefix, Tag};
pub use mode::{Action, ModeChange, ModeString, parse_mode_changes};
pub use reply::Responder;
pub use response::Response;

/// Whether a target is a well-formed channel name: `#` followed by at least
/// one character, none of them a space, comma or control character.
pub fn is_channel_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix('#') else {
        return false;
    };
    !rest.is_empty() && !rest.chars().any(|c| c == ' ' || c == ',' || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert!(is_channel_name("#rust"));
        assert!(is_channel_name("##"));
        assert!(!is_channel_name("#"));
        assert!(!is_channel_name("rust"));
        assert!(!is_channel_name("#a\x07b"));
        assert!(!is_channel_name("#a\0"));
        assert!(!is_channel_name("#a b"));
        assert!(!is_channel_name("#a,b"));
    }
}
