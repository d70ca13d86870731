use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Error};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use teddy::{path_loader, Environment, UndefinedBehavior};
use tracing::level_filters::LevelFilter;

/// Holds in-memory config state for the execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    format: String,
    template_root: Option<PathBuf>,
    max_passes: u32,
    hide_undefined: bool,
    newline: bool,
    verbosity: u8,
    defines: BTreeMap<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: "auto".to_string(),
            template_root: None,
            max_passes: 1000,
            hide_undefined: false,
            newline: true,
            verbosity: 1,
            defines: Default::default(),
        }
    }
}

impl Config {
    /// Builds the effective config.
    ///
    /// Later sources win: defaults, the config file, `TEDDY_*` environment
    /// variables and finally the command line.
    pub fn load(matches: &ArgMatches) -> Result<Config, Error> {
        let mut config = Config::default();
        #[cfg(feature = "toml")]
        {
            if let Some(path) = config_file_path(matches) {
                config = Config::load_from_toml(&path)
                    .with_context(|| format!("unable to load config file '{}'", path.display()))?;
            }
        }
        config.update_from_env()?;
        config.update_from_matches(matches)?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn load_from_toml(p: &Path) -> Result<Config, Error> {
        let contents = std::fs::read_to_string(p)?;
        let cfg: Config = toml::from_str(&contents)?;
        Ok(cfg)
    }

    pub fn update_from_env(&mut self) -> Result<(), Error> {
        if let Ok(format) = env::var("TEDDY_FORMAT") {
            self.format = format;
        }
        if let Ok(root) = env::var("TEDDY_TEMPLATE_ROOT") {
            self.template_root = Some(PathBuf::from(root));
        }
        if let Ok(max_passes) = env::var("TEDDY_MAX_PASSES") {
            self.max_passes = max_passes
                .parse()
                .with_context(|| format!("invalid value for TEDDY_MAX_PASSES: {max_passes}"))?;
        }
        if let Ok(hide) = env::var("TEDDY_HIDE_UNDEFINED") {
            self.hide_undefined = parse_env_bool(&hide, "TEDDY_HIDE_UNDEFINED")?;
        }
        if let Ok(newline) = env::var("TEDDY_NEWLINE") {
            self.newline = parse_env_bool(&newline, "TEDDY_NEWLINE")?;
        }
        if let Ok(verbosity) = env::var("TEDDY_VERBOSITY") {
            self.verbosity = verbosity
                .parse()
                .with_context(|| format!("invalid value for TEDDY_VERBOSITY: {verbosity}"))?;
        }
        Ok(())
    }

    pub fn update_from_matches(&mut self, matches: &ArgMatches) -> Result<(), Error> {
        if let Some(format) = matches.get_one::<String>("format") {
            self.format = format.clone();
        }
        if let Some(root) = matches.get_one::<PathBuf>("template-root") {
            self.template_root = Some(root.clone());
        }
        if let Some(max_passes) = matches.get_one::<u32>("max-passes") {
            self.max_passes = *max_passes;
        }
        if matches.get_flag("hide-undefined") {
            self.hide_undefined = true;
        }
        if matches.get_flag("no-newline") {
            self.newline = false;
        }
        if matches.get_flag("quiet") {
            self.verbosity = 0;
        }
        self.verbosity = self.verbosity.saturating_add(matches.get_count("verbose"));
        self.add_defines_from_matches(matches)
    }

    fn add_defines_from_matches(&mut self, matches: &ArgMatches) -> Result<(), Error> {
        if let Some(items) = matches.get_many::<String>("define") {
            for item in items {
                if let Some((key, raw_value)) = item.split_once(":=") {
                    self.defines
                        .insert(key.to_string(), interpret_raw_value(raw_value)?);
                } else if let Some((key, string_value)) = item.split_once('=') {
                    self.defines
                        .insert(key.to_string(), serde_json::Value::from(string_value));
                } else {
                    self.defines
                        .insert(item.to_string(), serde_json::Value::Bool(true));
                }
            }
        }
        Ok(())
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn newline(&self) -> bool {
        self.newline
    }

    pub fn defines(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.defines
    }

    pub fn template_root(&self) -> Option<&Path> {
        self.template_root.as_deref()
    }

    /// The most detailed diagnostics that should be printed.
    pub fn level_filter(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::OFF,
            1 => LevelFilter::WARN,
            2 => LevelFilter::INFO,
            _ => LevelFilter::DEBUG,
        }
    }

    pub fn apply_to_env(&self, env: &mut Environment, default_root: &Path) {
        env.set_max_passes(self.max_passes);
        env.set_verbosity(self.verbosity);
        env.set_undefined_behavior(if self.hide_undefined {
            UndefinedBehavior::Hide
        } else {
            UndefinedBehavior::Display
        });
        let root = self.template_root.as_deref().unwrap_or(default_root);
        env.set_loader(path_loader(root));
    }
}

#[cfg(feature = "toml")]
fn config_file_path(matches: &ArgMatches) -> Option<PathBuf> {
    if let Some(path) = matches.get_one::<PathBuf>("config-file") {
        return Some(path.clone());
    }
    if let Some(path) = env::var_os("TEDDY_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }
    home::home_dir()
        .map(|home| home.join(".teddy.toml"))
        .filter(|path| path.is_file())
}

pub fn interpret_raw_value(s: &str) -> Result<serde_json::Value, Error> {
    #[cfg(not(feature = "yaml"))]
    mod imp {
        pub use serde_json::from_str;
        pub const FMT: &str = "JSON";
    }
    #[cfg(feature = "yaml")]
    mod imp {
        pub use serde_yaml::from_str;
        pub const FMT: &str = "JSON/YAML";
    }
    imp::from_str::<serde_json::Value>(s)
        .with_context(|| format!("invalid raw value '{}' (not valid {})", s, imp::FMT))
}

fn parse_env_bool(s: &str, var_name: &str) -> Result<bool, Error> {
    match s.to_lowercase().as_str() {
        "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => bail!("Invalid boolean value for {}: {}", var_name, s),
    }
}
