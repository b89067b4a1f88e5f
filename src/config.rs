use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use crate::error::{AppErr, AppResult};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::state::DEFAULT_OUTBOX_CAPACITY;

/* ------------ runtime settings (env / .env) ------------ */
#[derive(Debug, Clone)]
pub struct Config {
    pub bind:          IpAddr,
    pub port:          u16,
    pub static_dir:    PathBuf,
    pub history_limit: usize,
    pub heartbeat:     Duration,
    pub outbox_capacity: usize,   // per-session queue of undelivered events
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind:          IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port:          4000,
            static_dir:    PathBuf::from("public"),
            history_limit: DEFAULT_HISTORY_LIMIT,
            heartbeat:     Duration::from_secs(30),
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

impl Config {
    /// Call `dotenvy::dotenv()` first if a `.env` file should count.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let d = Self::default();
        Ok(Self {
            bind:          parse(&get, "BIND_ADDR", d.bind)?,
            port:          parse(&get, "PORT", d.port)?,
            static_dir:    get("STATIC_DIR").map(PathBuf::from).unwrap_or(d.static_dir),
            history_limit: parse(&get, "HISTORY_LIMIT", d.history_limit)?,
            heartbeat:     Duration::from_secs(parse(&get, "HEARTBEAT_SECS", d.heartbeat.as_secs())?.max(1)),
            outbox_capacity: parse(&get, "OUTBOX_CAPACITY", d.outbox_capacity)?.max(1),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> AppResult<T> {
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| AppErr::Config { key, value: raw }),
    }
}
