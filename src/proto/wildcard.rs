//! Glob-style mask matching (`*` and `?`).

use super::casemap::irc_lower_char;

/// Match `value` against `mask`, case-insensitively under `rfc1459`.
///
/// Iterative with single-star backtracking, so pathological masks stay
/// linear in the common case and never recurse.
pub fn matches_mask(value: &str, mask: &str) -> bool {
    if mask == "*" {
        return true;
    }

    let v: Vec<char> = value.chars().map(irc_lower_char).collect();
    let m: Vec<char> = mask.chars().map(irc_lower_char).collect();

    let (mut vi, mut mi) = (0, 0);
    let mut star = None;
    let mut resume = 0;

    while vi < v.len() {
        if mi < m.len() && (m[mi] == '?' || m[mi] == v[vi]) {
            vi += 1;
            mi += 1;
        } else if mi < m.len() && m[mi] == '*' {
            star = Some(mi);
            mi += 1;
            resume = vi;
        } else if let Some(star_idx) = star {
            mi = star_idx + 1;
            resume += 1;
            vi = resume;
        } else {
            return false;
        }
    }

    while mi < m.len() && m[mi] == '*' {
        mi += 1;
    }
    mi == m.len()
}

/// Match a `nick!user@host` mask part by part.
///
/// Missing parts of the mask default to `*`, so `bob` matches any
/// `bob!*@*`.
pub fn matches_hostmask(nick: &str, user: &str, host: &str, mask: &str) -> bool {
    let (mask_nick, rest) = mask.split_once('!').unwrap_or((mask, "*@*"));
    let (mask_user, mask_host) = rest.split_once('@').unwrap_or((rest, "*"));
    matches_mask(nick, mask_nick) && matches_mask(user, mask_user) && matches_mask(host, mask_host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_and_question() {
        assert!(matches_mask("alice", "a*"));
        assert!(matches_mask("alice", "a?ice"));
        assert!(matches_mask("alice", "*"));
        assert!(!matches_mask("alice", "b*"));
        assert!(matches_mask("aXbXc", "a*b*c"));
        assert!(!matches_mask("abc", "a*d"));
    }

    #[test]
    fn test_case_folded() {
        assert!(matches_mask("Nick[1]", "nick{1}"));
    }

    #[test]
    fn test_hostmask_parts() {
        assert!(matches_hostmask("bob", "~b", "host.example", "bob!*@*"));
        assert!(matches_hostmask("bob", "~b", "host.example", "*!*@*.example"));
        assert!(!matches_hostmask("bob", "~b", "host.example", "*!*@other"));
        assert!(matches_hostmask("bob", "x", "y", "bob"));
    }
}
