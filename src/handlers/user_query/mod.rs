//! User queries: WHO and WHOIS.

mod who;
mod whois;

pub use who::WhoHandler;
pub use whois::WhoisHandler;

use crate::state::User;

fn is_oper(user: &User) -> bool {
    user.has_mode_named("oper") || user.has_mode_named("localOper")
}
