//! Junos configuration database over the RPC gateway.
//!
//! Maps each [`ConfigDatabase`] step onto the Junos XML API:
//!
//! | step     | RPC                                                        |
//! |----------|------------------------------------------------------------|
//! | acquire  | `<lock-configuration/>` or `<open-configuration><MODE/>`    |
//! | load     | `<load-configuration action=.. format=..>`                 |
//! | diff     | `<get-configuration compare="rollback" rollback="0">`      |
//! | validate | `<commit-configuration><check/>`                           |
//! | commit   | `<commit-configuration><confirmed/><confirm-timeout>..`    |
//! | rollback | `<load-configuration compare="rollback" rollback="0"/>`    |
//! | release  | `<unlock-configuration/>` or `<close-configuration/>`      |
//!
//! # Example
//!
//! ```rust
//! use ferrisnc::driver::config_session::{ConfigSource, LockMode};
//! use ferrisnc::driver::transaction::{compare, CompareRequest};
//! use ferrisnc::platform::vendors::juniper::JunosConfig;
//! use ferrisnc::rpc::RpcGateway;
//!
//! # async fn example(gateway: &mut dyn RpcGateway) {
//! let mut db = JunosConfig::new(gateway);
//! let request = CompareRequest::new(ConfigSource::statements(["set system host-name r1"]))
//!     .check(true);
//! let outcome = compare(&mut db, &request).await;
//! println!("{}", outcome.diff);
//! # }
//! ```

use log::debug;

use crate::driver::config_session::{
    CommitOptions, ConfigDatabase, ConfigFormat, ConfigSource, LockMode,
};
use crate::error::{ConfigError, Error, Result, RpcError};
use crate::rpc::{Element, RpcGateway, first_fault};

/// A Junos configuration database reached through `gateway`.
pub struct JunosConfig<'a, G: RpcGateway + ?Sized> {
    gateway: &'a mut G,
    mode: Option<LockMode>,
    ignore_warning: bool,
}

impl<'a, G: RpcGateway + ?Sized> JunosConfig<'a, G> {
    /// Wrap a gateway. Load warnings fail the load.
    pub fn new(gateway: &'a mut G) -> Self {
        Self {
            gateway,
            mode: None,
            ignore_warning: false,
        }
    }

    /// Treat load warnings as informational.
    pub fn ignore_warning(mut self, ignore: bool) -> Self {
        self.ignore_warning = ignore;
        self
    }

    /// Run `rpc`, turning device faults into `wrap(message)`.
    ///
    /// Embedded warnings only fault when `strict` is set.
    async fn call(
        &mut self,
        rpc: &Element,
        strict: bool,
        wrap: fn(String) -> ConfigError,
    ) -> Result<Option<Element>> {
        let reply = match self.gateway.execute(rpc).await {
            Ok(reply) => reply,
            Err(Error::Rpc(RpcError::Fault { message })) => return Err(wrap(message).into()),
            Err(e) => return Err(e),
        };
        let Some(element) = reply.element() else {
            return Ok(None);
        };
        if let Some(message) = first_fault(element, !strict) {
            return Err(wrap(message).into());
        }
        Ok(Some(reply.into_element()))
    }

    async fn load_body(
        &self,
        source: &ConfigSource,
        format: ConfigFormat,
        merge: bool,
    ) -> Result<Element> {
        let action = match (format, merge) {
            (ConfigFormat::Set, _) => "set",
            (_, true) => "merge",
            (_, false) => "replace",
        };
        let wire_format = match format {
            ConfigFormat::Xml => "xml",
            ConfigFormat::Set | ConfigFormat::Text => "text",
        };
        let rpc = Element::new("load-configuration")
            .with_attr("action", action)
            .with_attr("format", wire_format);

        let content = match source {
            ConfigSource::Url(url) => return Ok(rpc.with_attr("url", url.as_str())),
            ConfigSource::Statements(lines) => lines.join("\n"),
            ConfigSource::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ConfigError::Source {
                        path: path.clone(),
                        source,
                    })?
            }
        };

        Ok(match format {
            ConfigFormat::Set => rpc.with_param("configuration-set", content),
            ConfigFormat::Text => rpc.with_param("configuration-text", content),
            ConfigFormat::Xml => {
                let parsed = Element::parse(&content).map_err(|e| ConfigError::Load {
                    message: e.to_string(),
                })?;
                let configuration = if parsed.tag == "configuration" {
                    parsed
                } else {
                    Element::new("configuration").with_child(parsed)
                };
                rpc.with_child(configuration)
            }
        })
    }
}

impl<G: RpcGateway + ?Sized> ConfigDatabase for JunosConfig<'_, G> {
    async fn acquire(&mut self, mode: LockMode) -> Result<()> {
        let rpc = match mode {
            LockMode::Exclusive => Element::new("lock-configuration"),
            other => Element::new("open-configuration").with_flag(other.as_str()),
        };
        self.call(&rpc, false, |message| ConfigError::Lock { message })
            .await?;
        debug!("configuration database acquired ({})", mode);
        self.mode = Some(mode);
        Ok(())
    }

    async fn load(
        &mut self,
        source: &ConfigSource,
        format: ConfigFormat,
        merge: bool,
    ) -> Result<()> {
        let rpc = self.load_body(source, format, merge).await?;
        let strict = !self.ignore_warning;
        self.call(&rpc, strict, |message| ConfigError::Load { message })
            .await?;
        Ok(())
    }

    async fn diff(&mut self) -> Result<String> {
        let rpc = Element::new("get-configuration")
            .with_attr("compare", "rollback")
            .with_attr("rollback", "0")
            .with_attr("format", "text");
        let reply = self
            .call(&rpc, false, |message| ConfigError::Diff { message })
            .await?;

        let output = reply
            .as_ref()
            .and_then(|el| {
                if el.tag == "configuration-output" {
                    Some(el.text_content())
                } else {
                    el.select("//configuration-output")
                        .first()
                        .map(|out| out.text_content())
                }
            })
            .unwrap_or_default();

        if output.trim().is_empty() {
            Ok(String::new())
        } else {
            Ok(output)
        }
    }

    async fn validate(&mut self) -> Result<bool> {
        let rpc = Element::new("commit-configuration").with_flag("check");
        match self
            .call(&rpc, false, |message| ConfigError::Validation { message })
            .await
        {
            Ok(_) => Ok(true),
            Err(Error::Config(ConfigError::Validation { message })) => {
                debug!("commit check rejected: {}", message);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn commit(&mut self, options: &CommitOptions) -> Result<bool> {
        let mut rpc = Element::new("commit-configuration");
        if let Some(minutes) = options.confirm_minutes()? {
            rpc = rpc
                .with_flag("confirmed")
                .with_param("confirm-timeout", minutes.to_string());
        }
        if let Some(comment) = &options.comment {
            rpc = rpc.with_param("log", comment.as_str());
        }
        self.call(&rpc, false, |message| ConfigError::Commit { message })
            .await?;
        Ok(true)
    }

    async fn rollback(&mut self) -> Result<()> {
        let rpc = Element::new("load-configuration")
            .with_attr("compare", "rollback")
            .with_attr("rollback", "0");
        self.call(&rpc, false, |message| ConfigError::Rollback { message })
            .await?;
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        let rpc = match self.mode.take() {
            Some(LockMode::Exclusive) | None => Element::new("unlock-configuration"),
            Some(_) => Element::new("close-configuration"),
        };
        self.call(&rpc, false, |message| ConfigError::Unlock { message })
            .await?;
        Ok(())
    }
}
