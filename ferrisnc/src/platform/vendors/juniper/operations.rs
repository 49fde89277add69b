//! Operational RPCs with typed arguments.

use crate::rpc::{Element, RpcArg};

/// Optional arguments for `<ping>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PingOptions {
    pub source: Option<String>,
    pub ttl: Option<u32>,
    pub size: Option<u32>,
    pub count: Option<u32>,
    /// Seconds to wait for each response.
    pub wait: Option<u32>,
    pub routing_instance: Option<String>,
}

impl PingOptions {
    /// The `<ping>` RPC for `host`.
    pub fn to_rpc(&self, host: &str) -> Element {
        let mut args: Vec<(&str, RpcArg)> = vec![("host", host.into())];
        push(&mut args, "source", self.source.as_deref());
        push(&mut args, "ttl", self.ttl);
        push(&mut args, "size", self.size);
        push(&mut args, "count", self.count);
        push(&mut args, "wait", self.wait);
        push(&mut args, "routing_instance", self.routing_instance.as_deref());
        Element::rpc("ping", args)
    }
}

/// Optional arguments for `<traceroute>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracerouteOptions {
    pub source: Option<String>,
    pub ttl: Option<u32>,
    pub wait: Option<u32>,
    pub routing_instance: Option<String>,
    /// Skip reverse lookups of hop addresses.
    pub no_resolve: bool,
}

impl Default for TracerouteOptions {
    fn default() -> Self {
        Self {
            source: None,
            ttl: None,
            wait: None,
            routing_instance: None,
            no_resolve: true,
        }
    }
}

impl TracerouteOptions {
    /// The `<traceroute>` RPC for `host`.
    pub fn to_rpc(&self, host: &str) -> Element {
        let mut args: Vec<(&str, RpcArg)> = vec![("host", host.into())];
        push(&mut args, "source", self.source.as_deref());
        push(&mut args, "ttl", self.ttl);
        push(&mut args, "wait", self.wait);
        push(&mut args, "routing_instance", self.routing_instance.as_deref());
        args.push(("no_resolve", self.no_resolve.into()));
        Element::rpc("traceroute", args)
    }
}

fn push<'a, T: Into<RpcArg>>(args: &mut Vec<(&'a str, RpcArg)>, name: &'a str, value: Option<T>) {
    if let Some(value) = value {
        args.push((name, value.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_minimal() {
        assert_eq!(
            PingOptions::default().to_rpc("192.0.2.1").to_xml(),
            "<ping><host>192.0.2.1</host></ping>"
        );
    }

    #[test]
    fn test_ping_all_options() {
        let options = PingOptions {
            source: Some("10.0.0.1".to_string()),
            ttl: Some(64),
            size: Some(1400),
            count: Some(5),
            wait: Some(2),
            routing_instance: Some("mgmt_junos".to_string()),
        };
        assert_eq!(
            options.to_rpc("192.0.2.1").to_xml(),
            "<ping><host>192.0.2.1</host><source>10.0.0.1</source><ttl>64</ttl>\
             <size>1400</size><count>5</count><wait>2</wait>\
             <routing-instance>mgmt_junos</routing-instance></ping>"
        );
    }

    #[test]
    fn test_traceroute_resolves_nothing_by_default() {
        let rpc = TracerouteOptions::default().to_rpc("192.0.2.1");
        assert!(rpc.find("no-resolve").is_some());

        let rpc = TracerouteOptions {
            no_resolve: false,
            ttl: Some(16),
            ..Default::default()
        }
        .to_rpc("192.0.2.1");
        assert!(rpc.find("no-resolve").is_none());
        assert_eq!(rpc.find_text("ttl"), Some("16"));
    }
}
