use anyhow::{Context, Result};
use chrono_tz::Tz;
use clap::Args;
use miet_core::time::parse_timezone;
use miet_core::{Denylist, WeekSettings};
use miet_ingest::{UpstreamConfig, DEFAULT_CACHE_TTL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::state::{config_path, ensure_miet_home};

pub const DEFAULT_GROUP: &str = "ИТД-11М";

/// Contents of `~/.miet/config.toml`. Every section is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleSection,
    pub week: WeekSettings,
    /// Week override applied per group when no explicit override is set.
    pub group_overrides: BTreeMap<String, String>,
    pub denylist: Denylist,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub group: String,
    pub timezone: String,
    pub cache_ttl_secs: u64,
    pub timeout_secs: u64,
    pub data_url: String,
    pub page_url: String,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        let upstream = UpstreamConfig::default();
        Self {
            group: DEFAULT_GROUP.to_string(),
            timezone: "Europe/Moscow".to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            timeout_secs: upstream.timeout.as_secs(),
            data_url: upstream.data_url,
            page_url: upstream.page_url,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: ScheduleSection::default(),
            week: WeekSettings::default(),
            group_overrides: BTreeMap::from([(DEFAULT_GROUP.to_string(), "1 числитель".to_string())]),
            denylist: Denylist::default(),
        }
    }
}

/// Flags shared by every command; each falls back to its env var, then to
/// the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Student group, e.g. ИТД-11М
    #[arg(long, short, global = true, env = "MIET_GROUP")]
    pub group: Option<String>,

    /// IANA timezone of the institution
    #[arg(long, global = true, env = "MIET_TZ")]
    pub tz: Option<String>,

    /// Cache lifetime in seconds
    #[arg(long, global = true, env = "MIET_CACHE_TTL")]
    pub cache_ttl: Option<u64>,

    /// HTTP timeout in seconds
    #[arg(long, global = true, env = "MIET_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Linear shift added to the resolved week index
    #[arg(long, global = true, env = "MIET_WEEK_SHIFT", allow_hyphen_values = true)]
    pub week_shift: Option<i64>,

    /// Force the current week ("2 знаменатель", "числитель", "3")
    #[arg(long, global = true, env = "MIET_WEEK_OVERRIDE")]
    pub week_override: Option<String>,

    /// Term start, YYYY-MM-DD; empty disables the calendar rule
    #[arg(long, global = true, env = "MIET_WEEK_START")]
    pub week_start: Option<String>,
}

/// Fully layered runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub group: String,
    pub tz: Tz,
    pub cache_ttl: Duration,
    pub upstream: UpstreamConfig,
    pub week: WeekSettings,
    pub group_overrides: BTreeMap<String, String>,
    pub denylist: Denylist,
}

impl Settings {
    pub fn resolve(config: Config, flags: Overrides) -> Result<Self> {
        let Config { schedule, mut week, group_overrides, denylist } = config;

        let tz_name = flags.tz.unwrap_or(schedule.timezone);
        let tz = parse_timezone(&tz_name)?;

        if let Some(shift) = flags.week_shift {
            week.shift = shift;
        }
        if let Some(label) = flags.week_override {
            week.override_label = Some(label);
        }
        if let Some(start) = flags.week_start {
            week.term_start = Some(start);
        }
        week.override_label = week.override_label.filter(|s| !s.trim().is_empty());
        week.term_start = week.term_start.filter(|s| !s.trim().is_empty());

        Ok(Self {
            group: flags.group.unwrap_or(schedule.group).trim().to_string(),
            tz,
            cache_ttl: Duration::from_secs(flags.cache_ttl.unwrap_or(schedule.cache_ttl_secs)),
            upstream: UpstreamConfig {
                data_url: schedule.data_url,
                page_url: schedule.page_url,
                timeout: Duration::from_secs(flags.timeout.unwrap_or(schedule.timeout_secs)),
            },
            week,
            group_overrides,
            denylist,
        })
    }

    /// Week settings for `group`: the group default override only applies
    /// when no explicit override was given.
    pub fn week_settings(&self, group: &str) -> WeekSettings {
        let mut week = self.week.clone();
        if week.override_label.is_none() {
            week.override_label = self.group_overrides.get(group.trim()).cloned();
        }
        week
    }
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    read_config(&p)
}

pub fn read_config(path: &Path) -> Result<Config> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    ensure_miet_home()?;
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use miet_core::DenyRule;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [schedule]
            group = "МП-21"

            [week]
            shift = 1
            "#,
        )
        .unwrap();
        assert_eq!(cfg.schedule.group, "МП-21");
        assert_eq!(cfg.schedule.timezone, "Europe/Moscow");
        assert_eq!(cfg.week.shift, 1);
        assert_eq!(cfg.week.term_start.as_deref(), Some("2026-02-02"));
        assert_eq!(cfg.denylist, Denylist::default());
    }

    #[test]
    fn denylist_from_file() {
        let cfg: Config = toml::from_str(
            r#"
            [[denylist]]
            rule = "subject_in_room"
            subject = "Физкультура"
            room = "Спортзал"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.denylist.rules(),
            &[DenyRule::SubjectInRoom {
                subject: "Физкультура".to_string(),
                room: "Спортзал".to_string(),
            }]
        );
    }

    #[test]
    fn default_config_round_trips() {
        let cfg = Config::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn flags_override_file() {
        let flags = Overrides {
            group: Some(" ИТД-11М ".to_string()),
            tz: Some("Asia/Yekaterinburg".to_string()),
            week_shift: Some(-1),
            week_start: Some(String::new()),
            ..Overrides::default()
        };
        let settings = Settings::resolve(Config::default(), flags).unwrap();
        assert_eq!(settings.group, "ИТД-11М");
        assert_eq!(settings.tz, chrono_tz::Asia::Yekaterinburg);
        assert_eq!(settings.week.shift, -1);
        assert_eq!(settings.week.term_start, None);
    }

    #[test]
    fn bad_timezone_is_an_error() {
        let flags = Overrides { tz: Some("Mars/Olympus".to_string()), ..Overrides::default() };
        assert!(Settings::resolve(Config::default(), flags).is_err());
    }

    #[test]
    fn group_default_override_yields_to_explicit() {
        let settings = Settings::resolve(Config::default(), Overrides::default()).unwrap();
        assert_eq!(settings.group, "ИТД-11М");
        assert_eq!(
            settings.week_settings(&settings.group).override_label.as_deref(),
            Some("1 числитель")
        );
        assert_eq!(settings.week_settings("МП-21").override_label, None);

        let flags = Overrides { week_override: Some("знаменатель".to_string()), ..Overrides::default() };
        let settings = Settings::resolve(Config::default(), flags).unwrap();
        assert_eq!(
            settings.week_settings("ИТД-11М").override_label.as_deref(),
            Some("знаменатель")
        );
    }
}
