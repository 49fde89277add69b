//! Scripted gateway and connector for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{Element, RpcGateway, RpcReply};
use crate::error::{Result, RpcError, TransportError};
use crate::transport::{ConnectionConfig, Connector};

/// Shared log of every RPC a [`ScriptedGateway`] received.
pub(crate) type CallLog = Arc<Mutex<Vec<Element>>>;

/// Canned behaviour for one RPC.
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Reply(RpcReply),
    Fault(String),
    Hang,
}

impl Scripted {
    pub(crate) fn reply(el: Element) -> Self {
        Scripted::Reply(RpcReply::Element(el))
    }

    pub(crate) fn fault(message: &str) -> Self {
        Scripted::Fault(message.to_string())
    }
}

/// Gateway that replays scripted replies.
///
/// RPCs are keyed by the command text for `<command>` RPCs and by tag for
/// everything else. Several scripts for the same key are consumed in order,
/// the last one repeating. Unscripted RPCs are acknowledged.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    scripts: HashMap<String, VecDeque<Scripted>>,
    calls: CallLog,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, key: &str, script: Scripted) -> Self {
        self.scripts
            .entry(key.to_string())
            .or_default()
            .push_back(script);
        self
    }

    pub(crate) fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    fn next_script(&mut self, key: &str) -> Option<Scripted> {
        let queue = self.scripts.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

pub(crate) fn key_of(rpc: &Element) -> String {
    if rpc.tag == "command" {
        rpc.text.clone().unwrap_or_default()
    } else {
        rpc.tag.clone()
    }
}

/// Keys of every recorded call, in order.
pub(crate) fn call_keys(calls: &CallLog) -> Vec<String> {
    calls.lock().unwrap().iter().map(key_of).collect()
}

#[async_trait]
impl RpcGateway for ScriptedGateway {
    async fn execute(&mut self, rpc: &Element) -> Result<RpcReply> {
        self.calls.lock().unwrap().push(rpc.clone());
        match self.next_script(&key_of(rpc)) {
            None => Ok(RpcReply::Ack),
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fault(message)) => Err(RpcError::Fault { message }.into()),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(RpcError::Closed.into())
            }
        }
    }
}

/// How a [`ScriptedConnector`] behaves on connect.
pub(crate) enum ConnectMode {
    Succeed,
    Refuse,
    Hang,
}

/// Connector handing out a single pre-built [`ScriptedGateway`].
pub(crate) struct ScriptedConnector {
    gateway: Mutex<Option<ScriptedGateway>>,
    mode: ConnectMode,
}

impl ScriptedConnector {
    pub(crate) fn new(gateway: ScriptedGateway) -> Self {
        Self {
            gateway: Mutex::new(Some(gateway)),
            mode: ConnectMode::Succeed,
        }
    }

    pub(crate) fn with_mode(mut self, mode: ConnectMode) -> Self {
        self.mode = mode;
        self
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn RpcGateway>> {
        match self.mode {
            ConnectMode::Succeed => {}
            ConnectMode::Refuse => {
                return Err(TransportError::AuthenticationFailed {
                    user: config.username.clone(),
                }
                .into());
            }
            ConnectMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
        let gateway = self
            .gateway
            .lock()
            .unwrap()
            .take()
            .ok_or(TransportError::Disconnected)?;
        Ok(Box::new(gateway))
    }
}
