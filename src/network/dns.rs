//! Reverse DNS for client hostnames.

use hickory_resolver::TokioResolver;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use std::net::IpAddr;
use tracing::{debug, warn};

/// Longest hostname accepted from a PTR record.
const MAX_HOST_LEN: usize = 63;

pub struct ReverseResolver {
    resolver: TokioResolver,
}

impl ReverseResolver {
    /// Use the system resolver configuration, or the defaults when it
    /// can't be read.
    pub fn new() -> Self {
        let resolver = TokioResolver::builder_tokio()
            .map(|b| b.build())
            .unwrap_or_else(|e| {
                warn!(error = %e, "System resolver config unavailable, using defaults");
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
                .build()
            });
        Self { resolver }
    }

    /// Resolve `ip` to a forward-confirmed hostname.
    ///
    /// `None` means the lookup finished without a usable name: no PTR record
    /// (silently), a resolver failure (logged), a name not fit for a
    /// hostmask, or a name whose forward lookup does not lead back to `ip`.
    pub async fn lookup(&self, ip: IpAddr) -> Option<String> {
        let candidates: Vec<String> = match self.resolver.reverse_lookup(ip).await {
            Ok(names) => names
                .iter()
                .map(|ptr| ptr.to_string().trim_end_matches('.').to_string())
                .filter(|h| is_valid_hostname(h))
                .collect(),
            Err(e) if e.is_no_records_found() || e.is_nx_domain() => return None,
            Err(e) => {
                warn!(%ip, error = %e, "Reverse lookup failed");
                return None;
            }
        };

        for host in candidates {
            if self.forward_confirms(&host, ip).await {
                debug!(%ip, %host, "Reverse lookup finished");
                return Some(host);
            }
            debug!(%ip, %host, "PTR name does not resolve back to client address");
        }
        None
    }

    async fn forward_confirms(&self, host: &str, ip: IpAddr) -> bool {
        match self.resolver.lookup_ip(host).await {
            Ok(addrs) => contains_address(addrs.iter(), ip),
            Err(e) if e.is_no_records_found() || e.is_nx_domain() => false,
            Err(e) => {
                warn!(%host, error = %e, "Forward lookup failed");
                false
            }
        }
    }
}

fn contains_address(mut addrs: impl Iterator<Item = IpAddr>, ip: IpAddr) -> bool {
    let ip = ip.to_canonical();
    addrs.any(|a| a.to_canonical() == ip)
}

impl Default for ReverseResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= MAX_HOST_LEN
        && host.contains('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}
