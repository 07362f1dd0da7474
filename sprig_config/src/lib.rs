#![forbid(unsafe_code)]

//! Configuration for a sprig application.
//!
//! Options can be built in code with [`SprigOptions::builder`], read from the
//! `[sprig]` table of a TOML file, or read from `SPRIG_*` environment
//! variables. Environment variables override file values.

pub mod errors;

use crate::errors::SprigConfigError;
use config::{Case, Config, Environment, File, FileFormat, Source};
use serde::{Deserialize, Serialize};
use std::{env::VarError, fs, str::FromStr};
use typed_builder::TypedBuilder;

/// Options shared by the router and the app shell.
#[derive(TypedBuilder, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct SprigOptions {
    /// CSS selector of the element the app renders into.
    /// Defaults to `#app`.
    #[builder(setter(into), default = default_root_selector())]
    #[serde(default = "default_root_selector")]
    pub root_selector: String,
    /// Prefix stripped from browser paths before matching and added back when
    /// writing history. When unset, the router reads `<base href>`.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub base_path: Option<String>,
    /// Layout identifier applied when a route does not name one.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub default_layout: Option<String>,
    /// Render view templates into a shadow root instead of light DOM.
    #[builder(default)]
    #[serde(default)]
    pub shadow_dom: bool,
    /// Re-render through the binder whenever view state changes.
    #[builder(default = true)]
    #[serde(default = "default_true")]
    pub auto_update: bool,
    /// Class name handed to binders for animated updates.
    #[builder(setter(into), default = default_transition_class())]
    #[serde(default = "default_transition_class")]
    pub transition_class: String,
    /// Transition hint used when a route's metadata has none.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub default_effect: Option<String>,
    /// How many guard redirects a single navigation may follow.
    #[builder(default = default_max_redirects())]
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Selector of the element inside a layout that hosts nested views.
    #[builder(setter(into), default = default_outlet_selector())]
    #[serde(default = "default_outlet_selector")]
    pub outlet_selector: String,
    /// How many views a view stack keeps for going back, the shown one
    /// included.
    #[builder(default = default_max_stack_depth())]
    #[serde(default = "default_max_stack_depth")]
    pub max_stack_depth: usize,
}

impl Default for SprigOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SprigOptions {
    /// Reads every option from `SPRIG_*` environment variables, falling back
    /// to defaults for the ones that are unset.
    pub fn try_from_env() -> Result<Self, SprigConfigError> {
        Ok(SprigOptions {
            root_selector: env_w_default(
                "SPRIG_ROOT_SELECTOR",
                &default_root_selector(),
            )?,
            base_path: env_wo_default("SPRIG_BASE_PATH")?,
            default_layout: env_wo_default("SPRIG_DEFAULT_LAYOUT")?,
            shadow_dom: env_parse_w_default("SPRIG_SHADOW_DOM", false)?,
            auto_update: env_parse_w_default("SPRIG_AUTO_UPDATE", true)?,
            transition_class: env_w_default(
                "SPRIG_TRANSITION_CLASS",
                &default_transition_class(),
            )?,
            default_effect: env_wo_default("SPRIG_DEFAULT_EFFECT")?,
            max_redirects: env_parse_w_default(
                "SPRIG_MAX_REDIRECTS",
                default_max_redirects(),
            )?,
            outlet_selector: env_w_default(
                "SPRIG_OUTLET_SELECTOR",
                &default_outlet_selector(),
            )?,
            max_stack_depth: env_parse_w_default(
                "SPRIG_MAX_STACK_DEPTH",
                default_max_stack_depth(),
            )?,
        })
    }
}

fn default_root_selector() -> String {
    "#app".into()
}

fn default_true() -> bool {
    true
}

fn default_transition_class() -> String {
    "sprig-transition".into()
}

fn default_max_redirects() -> usize {
    16
}

fn default_outlet_selector() -> String {
    "[data-outlet]".into()
}

fn default_max_stack_depth() -> usize {
    10
}

fn env_wo_default(key: &str) -> Result<Option<String>, SprigConfigError> {
    match std::env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(SprigConfigError::EnvError {
            name: key.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn env_w_default(key: &str, default: &str) -> Result<String, SprigConfigError> {
    Ok(env_wo_default(key)?.unwrap_or_else(|| default.to_string()))
}

fn env_parse_w_default<T>(key: &str, default: T) -> Result<T, SprigConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_wo_default(key)? {
        Some(val) => {
            val.trim()
                .parse()
                .map_err(|e: T::Err| SprigConfigError::EnvError {
                    name: key.to_string(),
                    reason: e.to_string(),
                })
        }
        None => Ok(default),
    }
}

/// Parses options from the `[sprig]` table of a TOML document. `SPRIG_*`
/// environment variables take precedence over values in the document.
pub fn get_config_from_str(text: &str) -> Result<SprigOptions, SprigConfigError> {
    let file = Config::builder()
        .add_source(File::from_str(text, FileFormat::Toml))
        .build()?;
    file.get_table("sprig")
        .map_err(|_| SprigConfigError::ConfigSectionNotFound)?;

    let env = Environment::with_prefix("SPRIG")
        .convert_case(Case::Kebab)
        .collect()?;
    let mut builder = Config::builder().add_source(file);
    for (key, value) in env {
        builder = builder.set_override(format!("sprig.{key}"), value)?;
    }
    builder
        .build()?
        .get("sprig")
        .map_err(|e| SprigConfigError::ConfigError(e.to_string()))
}

/// Reads options from a TOML file on disk.
pub fn get_config_from_file(
    path: impl AsRef<std::path::Path>,
) -> Result<SprigOptions, SprigConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|_| {
        SprigConfigError::ConfigNotFound(path.display().to_string())
    })?;
    get_config_from_str(&text)
}

/// Loads options from `path` when given, otherwise from the environment.
pub fn get_configuration(
    path: Option<&str>,
) -> Result<SprigOptions, SprigConfigError> {
    match path {
        Some(path) => get_config_from_file(path),
        None => SprigOptions::try_from_env(),
    }
}

#[cfg(test)]
mod tests;
