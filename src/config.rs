use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use expanduser::expanduser;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
pub struct Profile {
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    profiles: HashMap<String, Profile>,
}

/// Where the client gets its credentials and region from.
#[derive(Debug, Default)]
pub struct Settings {
    pub profile: Option<Profile>,
    pub region: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::profiles_file()?;
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read profiles file {}", path.display()))?;

        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(raw).context("failed to parse profiles file")?;

        Ok(config)
    }

    pub fn take_profile(mut self, name: &str) -> Result<Profile> {
        self.profiles
            .remove(name)
            .ok_or_else(|| anyhow!("unknown profile {}", name))
    }

    pub fn app_dir() -> Result<PathBuf> {
        let dir = expanduser("~/.abort-incomplete-multipart")
            .context("failed to resolve home directory")?;

        Ok(dir)
    }

    pub fn profiles_file() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("profiles.yml"))
    }
}

impl Settings {
    /// The profiles file is only consulted when a profile is named.
    pub fn resolve(profile: Option<&str>, region: Option<&str>) -> Result<Self> {
        let profile = match profile {
            Some(name) => Some(Config::load()?.take_profile(name)?),
            None => None,
        };

        Ok(Self::merge(profile, region))
    }

    fn merge(profile: Option<Profile>, region: Option<&str>) -> Self {
        let region = region
            .map(str::to_string)
            .or_else(|| profile.as_ref().and_then(|p| p.region.clone()));

        Settings { profile, region }
    }
}
