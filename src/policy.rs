//! Authorization checked before a query touches the network.

use crate::protocol::{Protocol, RecordType};

/// Decides whether the caller may issue a query.
pub trait QueryPolicy: Send + Sync {
    fn authorize(&self, host: &str, qtype: RecordType, protocol: Protocol) -> bool;
}

/// Permits every query.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl QueryPolicy for AllowAll {
    fn authorize(&self, _host: &str, _qtype: RecordType, _protocol: Protocol) -> bool {
        true
    }
}

/// Refuses every query.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

impl QueryPolicy for DenyAll {
    fn authorize(&self, _host: &str, _qtype: RecordType, _protocol: Protocol) -> bool {
        false
    }
}

/// Permits hosts equal to, or below, one of the listed domains.
/// Matching ignores ASCII case and a trailing dot.
#[derive(Debug, Default, Clone)]
pub struct SuffixAllowList {
    suffixes: Vec<String>,
}

impl SuffixAllowList {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| normalize(s.as_ref()))
                .collect(),
        }
    }
}

impl QueryPolicy for SuffixAllowList {
    fn authorize(&self, host: &str, _qtype: RecordType, _protocol: Protocol) -> bool {
        let host = normalize(host);
        self.suffixes.iter().any(|suffix| {
            // the root covers everything
            suffix.is_empty()
                || host == *suffix
                || host
                    .strip_suffix(suffix.as_str())
                    .is_some_and(|head| head.ends_with('.'))
        })
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

impl<F> QueryPolicy for F
where
    F: Fn(&str, RecordType, Protocol) -> bool + Send + Sync,
{
    fn authorize(&self, host: &str, qtype: RecordType, protocol: Protocol) -> bool {
        self(host, qtype, protocol)
    }
}
