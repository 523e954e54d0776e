//! Target runtime environments and their static profiles.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Module that provides `URL` outside the embedded runtime.
const URL_MODULE: &str = "url";

/// Scalar type names rewritten in every environment.
const SUBSTITUTIONS: &[(&str, &str)] = &[("Date", "string")];

/// Typed byte arrays become Node buffers outside the embedded runtime.
const BUFFER_SUBSTITUTION: (&str, &str) = ("Uint8Array", "Buffer");

/// Runtime the generated code is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    /// Sandboxed user application on the embedded runtime.
    #[default]
    DenoUserland,
    /// User application on Node.
    NodeUserland,
    /// The host process itself.
    Host,
}

impl Environment {
    /// Every environment, in documentation order.
    pub const ALL: [Self; 3] = [Self::DenoUserland, Self::NodeUserland, Self::Host];

    /// Name accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DenoUserland => "deno-userland",
            Self::NodeUserland => "node-userland",
            Self::Host => "host",
        }
    }

    /// Emission tables for this environment.
    pub fn profile(self) -> &'static EnvironmentProfile {
        match self {
            Self::DenoUserland => &DENO_USERLAND,
            Self::NodeUserland => &NODE_USERLAND,
            Self::Host => &HOST,
        }
    }
}

impl FromStr for Environment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownEnvironment(s.to_string()))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static data the emitter needs for one environment.
#[derive(Debug, PartialEq, Eq)]
pub struct EnvironmentProfile {
    /// Whether this is the embedded runtime, where buffers stay typed arrays.
    pub embedded: bool,
    /// Module exporting the RPC and record base types.
    pub rpc_module: &'static str,
    /// Base class of generated clients.
    pub rpc_client: &'static str,
    /// Base class of generated servers.
    pub rpc_server: &'static str,
    /// Handler map type taken by servers.
    pub rpc_handlers: &'static str,
    /// Base class of generated record tables.
    pub record_client: &'static str,
    /// Client type used by `subscribe` results.
    pub api_client: &'static str,
    /// `(name, module)` imports emitted ahead of the base-type import.
    pub extra_imports: &'static [(&'static str, &'static str)],
}

impl EnvironmentProfile {
    /// Replacement for a named type in emitted declarations, if any.
    pub fn substitute(&self, name: &str) -> Option<&'static str> {
        let (buffer, replacement) = BUFFER_SUBSTITUTION;
        if !self.embedded && name == buffer {
            return Some(replacement);
        }
        SUBSTITUTIONS
            .iter()
            .find(|(from, _)| *from == name)
            .map(|(_, to)| *to)
    }
}

static DENO_USERLAND: EnvironmentProfile = EnvironmentProfile {
    embedded: true,
    rpc_module: "https://atek.cloud/x/rpc@latest/mod.ts",
    rpc_client: "AtekRpcClient",
    rpc_server: "AtekRpcServer",
    rpc_handlers: "AtekRpcServerHandlers",
    record_client: "AtekDbRecordClient",
    api_client: "AtekDbApiClient",
    extra_imports: &[],
};

static NODE_USERLAND: EnvironmentProfile = EnvironmentProfile {
    embedded: false,
    rpc_module: "@atek-cloud/node-rpc",
    rpc_client: "AtekRpcClient",
    rpc_server: "AtekRpcServer",
    rpc_handlers: "AtekRpcServerHandlers",
    record_client: "AtekDbRecordClient",
    api_client: "AtekDbApiClient",
    extra_imports: &[("URL", URL_MODULE)],
};

static HOST: EnvironmentProfile = EnvironmentProfile {
    embedded: false,
    rpc_module: "@atek-cloud/api-broker",
    rpc_client: "ApiBrokerClient",
    rpc_server: "ApiBrokerServer",
    rpc_handlers: "ApiBrokerServerHandlers",
    record_client: "AtekDbRecordClient",
    api_client: "AtekDbApiClient",
    extra_imports: &[("URL", URL_MODULE)],
};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for env in Environment::ALL {
            assert_eq!(env.as_str().parse::<Environment>().unwrap(), env);
        }
        assert_eq!(Environment::default(), Environment::DenoUserland);
    }

    #[test]
    fn test_unknown_environment() {
        let err = "browser".parse::<Environment>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownEnvironment(ref name) if name == "browser"));
    }

    #[test]
    fn test_buffer_substitution_only_outside_embedded() {
        let deno = Environment::DenoUserland.profile();
        assert!(deno.embedded);
        assert_eq!(deno.substitute("Uint8Array"), None);
        assert_eq!(deno.substitute("Date"), Some("string"));

        for env in [Environment::NodeUserland, Environment::Host] {
            let profile = env.profile();
            assert!(!profile.embedded);
            assert_eq!(profile.substitute("Uint8Array"), Some("Buffer"));
            assert_eq!(profile.substitute("Date"), Some("string"));
            assert_eq!(profile.substitute("Int8Array"), None);
            assert_eq!(profile.extra_imports, &[("URL", "url")]);
        }
    }

    #[test]
    fn test_host_uses_broker_types() {
        let host = Environment::Host.profile();
        assert_eq!(host.rpc_client, "ApiBrokerClient");
        assert_eq!(host.rpc_handlers, "ApiBrokerServerHandlers");
        assert_eq!(host.record_client, "AtekDbRecordClient");
    }
}
