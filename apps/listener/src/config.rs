use std::str::FromStr;
use std::time::Duration;

use canvas_studio_core::SchedulerConfig;

use crate::error::{ListenerError, ListenerResult};

/// Console log output of the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("text") {
            Ok(LogFormat::Text)
        } else if value.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(())
        }
    }
}

pub struct Config {
    /// Database root, e.g. `https://{name}.firebaseio.com`.
    pub firebase_url: String,
    pub firebase_secret: Option<String>,
    pub gateway_addr: String,
    /// Per-request timeout for status writes. The change feed has none.
    pub request_timeout: Duration,
    pub feed_backoff: Duration,
    pub scheduler: SchedulerConfig,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> ListenerResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ListenerResult<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let firebase_url = match get("STUDIO_FIREBASE_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let name = get("STUDIO_FIREBASE_NAME")
                    .ok_or(ListenerError::MissingSetting("STUDIO_FIREBASE_NAME"))?;
                format!("https://{}.firebaseio.com", name.trim())
            }
        };
        let firebase_secret = get("STUDIO_FIREBASE_SECRET");
        let gateway_addr = get("STUDIO_GATEWAY_ADDR").unwrap_or_else(|| "127.0.0.1:9000".into());
        let log_format = parse::<LogFormat>("STUDIO_LOG_FORMAT", get("STUDIO_LOG_FORMAT"))?
            .unwrap_or(LogFormat::Text);

        let millis = |name: &'static str| -> ListenerResult<Option<Duration>> {
            parse::<u64>(name, get(name)).map(|v| v.map(Duration::from_millis))
        };

        let defaults = SchedulerConfig::default();
        let heartbeat = millis("STUDIO_HEARTBEAT_MS")?.unwrap_or(defaults.heartbeat_interval);
        let fast_heartbeat =
            millis("STUDIO_FAST_HEARTBEAT_MS")?.unwrap_or(defaults.fast_heartbeat_interval);
        let fast_cycles = parse::<u32>(
            "STUDIO_FAST_HEARTBEAT_CYCLES",
            get("STUDIO_FAST_HEARTBEAT_CYCLES"),
        )?
        .unwrap_or(defaults.fast_heartbeat_cycles);

        let scheduler = SchedulerConfig::default()
            .with_quiet_period(millis("STUDIO_QUIET_MS")?.unwrap_or(defaults.quiet_period))
            .with_tick(millis("STUDIO_TICK_MS")?.unwrap_or(defaults.tick))
            .with_heartbeat(heartbeat, fast_heartbeat, fast_cycles)
            .with_reply_timeout(millis("STUDIO_REPLY_TIMEOUT_MS")?);
        scheduler.validate()?;

        Ok(Self {
            firebase_url,
            firebase_secret,
            gateway_addr,
            request_timeout: millis("STUDIO_REQUEST_TIMEOUT_MS")?
                .unwrap_or(Duration::from_millis(10_000)),
            feed_backoff: millis("STUDIO_FEED_BACKOFF_MS")?
                .unwrap_or(Duration::from_millis(5_000)),
            scheduler,
            log_format,
        })
    }
}

fn parse<T: FromStr>(name: &'static str, raw: Option<String>) -> ListenerResult<Option<T>> {
    raw.map(|value| {
        value
            .trim()
            .parse()
            .map_err(|_| ListenerError::InvalidSetting { name, value })
    })
    .transpose()
}
