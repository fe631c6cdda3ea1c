//! Role selection and the immutable run configuration.

use serde::Deserialize;

use crate::endpoint::validate_interface_name;
use crate::error::{CanError, CanResult};

/// Loopback query-side interface when none is configured.
pub const DEFAULT_QUERY_INTERFACE: &str = "can0";

/// Loopback ECU-side interface when none is configured.
pub const DEFAULT_ECU_INTERFACE: &str = "can1";

/// Which side(s) of the exchange this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Query an ECU once and print its answer.
    Query,
    /// Emulate an ECU and answer queries until the transport fails.
    Ecu,
    /// Both sides on two cross-wired interfaces, once.
    Loopback,
}

impl Role {
    pub fn has_query_side(self) -> bool {
        matches!(self, Self::Query | Self::Loopback)
    }

    pub fn has_ecu_side(self) -> bool {
        matches!(self, Self::Ecu | Self::Loopback)
    }

    /// Query and loopback runs end after one cycle.
    pub fn is_one_shot(self) -> bool {
        self != Self::Ecu
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Ecu => "ecu",
            Self::Loopback => "loopback",
        })
    }
}

/// Interfaces used when running in loopback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoopbackInterfaces {
    #[serde(default = "default_query_interface")]
    pub query_interface: String,
    #[serde(default = "default_ecu_interface")]
    pub ecu_interface: String,
}

fn default_query_interface() -> String {
    DEFAULT_QUERY_INTERFACE.to_string()
}

fn default_ecu_interface() -> String {
    DEFAULT_ECU_INTERFACE.to_string()
}

impl Default for LoopbackInterfaces {
    fn default() -> Self {
        Self {
            query_interface: default_query_interface(),
            ecu_interface: default_ecu_interface(),
        }
    }
}

/// Everything the exchange needs to know, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    role: Role,
    query_interface: Option<String>,
    ecu_interface: Option<String>,
}

impl RunConfig {
    /// Build the configuration from the role flags and interface option.
    ///
    /// `--ecu` and `--query` are mutually exclusive and each needs an
    /// interface. With neither, the loopback interfaces are used and any
    /// given interface is ignored.
    pub fn from_selection(
        ecu: bool,
        query: bool,
        iface: Option<&str>,
        loopback: &LoopbackInterfaces,
    ) -> CanResult<Self> {
        let config = match (ecu, query, iface) {
            (true, true, _) => {
                return Err(CanError::Config(
                    "may only specify one of --ecu or --query".into(),
                ));
            }
            (true, false, None) | (false, true, None) => {
                return Err(CanError::Config(
                    "--iface must be specified with --ecu or --query".into(),
                ));
            }
            (true, false, Some(name)) => Self {
                role: Role::Ecu,
                query_interface: None,
                ecu_interface: Some(name.to_string()),
            },
            (false, true, Some(name)) => Self {
                role: Role::Query,
                query_interface: Some(name.to_string()),
                ecu_interface: None,
            },
            (false, false, ignored) => {
                if let Some(name) = ignored {
                    tracing::warn!(iface = name, "--iface has no effect in loopback mode");
                }
                Self {
                    role: Role::Loopback,
                    query_interface: Some(loopback.query_interface.clone()),
                    ecu_interface: Some(loopback.ecu_interface.clone()),
                }
            }
        };

        for name in [&config.query_interface, &config.ecu_interface]
            .into_iter()
            .flatten()
        {
            validate_interface_name(name)?;
        }
        Ok(config)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Interface of the querying side, if the role has one.
    pub fn query_interface(&self) -> Option<&str> {
        self.query_interface.as_deref()
    }

    /// Interface of the emulated ECU, if the role has one.
    pub fn ecu_interface(&self) -> Option<&str> {
        self.ecu_interface.as_deref()
    }
}
