use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::calendar::DateRange;
use crate::content::TaskContent;
use crate::controller::CalendarSettings;
use crate::locale::{
  CalendarLocale,
  DEFAULT_LOCALE,
  FirstDayOfWeek
};
use crate::time::{
  Clock,
  LocalZone,
  TimeMode
};

const CONFIG_ENV_VAR: &str =
  "ADVENT_CONFIG";
const TIMEZONE_ENV_VAR: &str =
  "ADVENT_TIMEZONE";
const CONFIG_FILE_NAME: &str =
  "advent.json";

/// The calendar configuration record,
/// as read from a JSON or TOML file.
#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConfig {
  pub start_date:        String,
  pub end_date:          String,
  #[serde(default)]
  pub time_mode:         TimeMode,
  #[serde(default)]
  pub first_day_of_week: FirstDayOfWeek,
  #[serde(default = "default_locale")]
  pub locale:            String,
  #[serde(default)]
  pub timezone:          Option<String>,
  #[serde(default)]
  pub test_date:         Option<String>,
  #[serde(default)]
  pub tasks:             Vec<TaskContent>,
  #[serde(skip)]
  pub loaded_from:       Option<PathBuf>
}

fn default_locale() -> String {
  DEFAULT_LOCALE.to_string()
}

/// Command line and environment
/// overrides applied on top of the
/// file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
  pub time_mode: Option<TimeMode>,
  pub test_date: Option<String>,
  pub timezone:  Option<String>
}

impl CalendarConfig {
  #[tracing::instrument(skip(
    override_path
  ))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let path = resolve_config_path(
      override_path
    )?
    .ok_or_else(|| {
      anyhow!(
        "no calendar configuration \
         found; pass --config or set \
         {CONFIG_ENV_VAR}"
      )
    })?;
    info!(config = %path.display(), "loading calendar config");
    let mut cfg =
      Self::load_file(&path)?;

    cfg.apply_env_timezone(
      std::env::var(TIMEZONE_ENV_VAR).ok()
    );

    Ok(cfg)
  }

  fn apply_env_timezone(
    &mut self,
    raw: Option<String>
  ) {
    if let Some(raw) = raw
      && !raw.trim().is_empty()
    {
      debug!(timezone = %raw, "timezone taken from environment");
      self.timezone = Some(raw);
    }
  }

  #[tracing::instrument]
  pub fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text =
      fs::read_to_string(path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    let mut cfg = match path
      .extension()
      .and_then(|ext| ext.to_str())
    {
      | Some("toml") => {
        Self::from_toml(&text)
      }
      | _ => Self::from_json(&text)
    }
    .with_context(|| {
      format!(
        "failed to parse {}",
        path.display()
      )
    })?;

    cfg.loaded_from =
      Some(path.to_path_buf());
    Ok(cfg)
  }

  pub fn from_json(
    text: &str
  ) -> anyhow::Result<Self> {
    serde_json::from_str(text)
      .context("invalid JSON config")
  }

  pub fn from_toml(
    text: &str
  ) -> anyhow::Result<Self> {
    toml::from_str(text)
      .context("invalid TOML config")
  }

  #[tracing::instrument(skip(self))]
  pub fn apply_overrides(
    &mut self,
    overrides: ConfigOverrides
  ) {
    if let Some(mode) =
      overrides.time_mode
    {
      debug!(?mode, "overriding time mode");
      self.time_mode = mode;
    }
    if let Some(test_date) =
      overrides.test_date
    {
      debug!(%test_date, "overriding current moment");
      self.test_date = Some(test_date);
    }
    if let Some(timezone) =
      overrides.timezone
    {
      debug!(%timezone, "overriding timezone");
      self.timezone = Some(timezone);
    }
  }

  /// Validates the record and turns
  /// it into typed calendar settings.
  #[tracing::instrument(skip(self))]
  pub fn settings(
    &self
  ) -> anyhow::Result<CalendarSettings>
  {
    let range = DateRange::parse(
      &self.start_date,
      &self.end_date
    )
    .with_context(|| {
      format!(
        "invalid date range \
         startDate={} endDate={}",
        self.start_date, self.end_date
      )
    })?;

    let zone = match &self.timezone {
      | Some(raw) => {
        LocalZone::Named(
          parse_timezone(raw)?
        )
      }
      | None => LocalZone::System
    };
    if self.time_mode == TimeMode::Utc
      && self.timezone.is_some()
    {
      warn!(
        "timezone is ignored in utc \
         mode"
      );
    }

    let locale =
      CalendarLocale::parse(&self.locale);

    let clock = match &self.test_date {
      | Some(raw) => {
        let clock =
          Clock::parse_override(raw)
            .with_context(|| {
              format!(
                "invalid testDate {raw:?}"
              )
            })?;
        info!(?clock, "using fixed current moment");
        clock
      }
      | None => Clock::System
    };

    Ok(CalendarSettings {
      range,
      mode: self.time_mode,
      zone,
      clock,
      locale,
      first_day_of_week: self
        .first_day_of_week
    })
  }
}

fn parse_timezone(
  raw: &str
) -> anyhow::Result<Tz> {
  let trimmed = raw.trim();
  trimmed.parse::<Tz>().map_err(|err| {
    anyhow!(
      "unknown timezone {trimmed:?}: \
       {err}"
    )
  })
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  let cwd = std::env::current_dir()
    .context(
      "cannot determine current \
       directory"
    )?;
  Ok(find_config_path(
    override_path,
    std::env::var(CONFIG_ENV_VAR).ok(),
    &cwd,
    dirs::config_dir()
  ))
}

/// `--config`, then `ADVENT_CONFIG`,
/// then `./advent.json`, then the
/// user config dir.
fn find_config_path(
  override_path: Option<&Path>,
  env_path: Option<String>,
  cwd: &Path,
  config_dir: Option<PathBuf>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Some(raw) = env_path {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  let local = cwd.join(CONFIG_FILE_NAME);
  if local.exists() {
    return Some(local);
  }

  config_dir
    .map(|dir| {
      dir
        .join("advent")
        .join("config.json")
    })
    .filter(|candidate| {
      candidate.exists()
    })
}
