//! CAP reply pagination budgets.

/// Characters available for the capability list of one `CAP LS` line.
///
/// A line holds 510 characters before CRLF. The fixed framing of
/// `:<server> CAP <target> LS * :<tokens>` takes 10 of them (8 without the
/// continuation marker, which is only sent from version 302 on).
pub fn ls_budget(version: u32, server: &str, target: &str) -> usize {
    let base: usize = if version >= 302 { 500 } else { 502 };
    base.saturating_sub("CAP".len() + server.len() + target.len())
}

/// Same as [`ls_budget`] for `CAP LIST`, whose subcommand is two characters longer.
pub fn list_budget(version: u32, server: &str, target: &str) -> usize {
    let base: usize = if version >= 302 { 498 } else { 500 };
    base.saturating_sub("CAP".len() + server.len() + target.len())
}
