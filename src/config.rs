//! Server configuration from the process environment, overridable by CLI flags.
//!
//! | setting        | env                         | flag            | default      |
//! |----------------|-----------------------------|-----------------|--------------|
//! | signing secret | `JWT_SECRET`                | -               | required     |
//! | port           | `PORT`                      | `--port`        | 5000         |
//! | bind address   | `REDRESS_BIND`              | `--bind`        | 0.0.0.0      |
//! | role policy    | `REDRESS_ROLE_POLICY`       | `--role-policy` | restricted   |
//! | bootstrap admin| `REDRESS_ADMIN_EMAIL` + `REDRESS_ADMIN_PASSWORD` | - | none |

use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use crate::identity::RolePolicy;

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin").field("email", &self.email).finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub bind: IpAddr,
    pub port: u16,
    pub role_policy: RolePolicy,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("role_policy", &self.role_policy)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

fn parse_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].as_str());
        }
        i += 1;
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

pub const USAGE: &str = "redress server\n\nUSAGE:\n  redress_server [--port N] [--bind ADDR] [--role-policy restricted|open]\n\nOPTIONS:\n  --port N             HTTP port (env: PORT, default 5000)\n  --bind ADDR          Listen address (env: REDRESS_BIND, default 0.0.0.0)\n  --role-policy P      Who may register as admin (env: REDRESS_ROLE_POLICY, default restricted)\n\nENVIRONMENT:\n  JWT_SECRET           Token signing secret (required)\n  REDRESS_ADMIN_EMAIL, REDRESS_ADMIN_PASSWORD\n                       Create this admin account at startup\n";

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr { SocketAddr::new(self.bind, self.port) }

    /// Read from the real process environment and the given argv.
    pub fn from_env_and_args(args: &[String]) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_sources(&env, args)
    }

    /// CLI arguments override environment values.
    pub fn from_sources(env: &HashMap<String, String>, args: &[String]) -> Result<Self> {
        let get = |k: &str| env.get(k).map(|s| s.trim()).filter(|s| !s.is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET must be set"))?.to_string();

        let port = match parse_arg(args, "--port").or_else(|| get("PORT")) {
            Some(p) => p.parse::<u16>().with_context(|| format!("invalid port '{}'", p))?,
            None => DEFAULT_PORT,
        };
        let bind = match parse_arg(args, "--bind").or_else(|| get("REDRESS_BIND")) {
            Some(b) => b.parse::<IpAddr>().with_context(|| format!("invalid bind address '{}'", b))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let role_policy = match parse_arg(args, "--role-policy").or_else(|| get("REDRESS_ROLE_POLICY")) {
            Some(p) => p.parse::<RolePolicy>().map_err(|e| anyhow!(e))?,
            None => RolePolicy::default(),
        };
        let bootstrap_admin = match (get("REDRESS_ADMIN_EMAIL"), get("REDRESS_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email: email.to_string(), password: password.to_string() }),
            (None, None) => None,
            _ => bail!("REDRESS_ADMIN_EMAIL and REDRESS_ADMIN_PASSWORD must be set together"),
        };

        Ok(Self { jwt_secret, bind, port, role_policy, bootstrap_admin })
    }
}
