//! Environment passed to the shell

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Builds the exact environment handed to the shell
///
/// The launcher clears the child environment and applies only the map this
/// produces, so every variable the session sees is accounted for here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvPolicy {
    /// Start from the calling process's environment
    #[serde(default = "default_inherit")]
    pub inherit: bool,

    /// Inherited variables to drop
    #[serde(default)]
    pub remove: Vec<String>,

    /// Variables to set (override inherited values)
    #[serde(default)]
    pub set: BTreeMap<String, String>,
}

fn default_inherit() -> bool {
    true
}

impl Default for EnvPolicy {
    fn default() -> Self {
        Self {
            inherit: default_inherit(),
            remove: Vec::new(),
            set: BTreeMap::new(),
        }
    }
}

impl EnvPolicy {
    /// A policy that passes nothing but what is set explicitly
    pub fn isolated() -> Self {
        Self {
            inherit: false,
            ..Self::default()
        }
    }

    /// Build the environment for one session
    ///
    /// Precedence, lowest first: inherited, `set`, `TERM`, `extra`.
    /// Inherited variables are forwarded byte for byte, including values that
    /// are not valid UTF-8.
    pub fn build(
        &self,
        term: &str,
        extra: &BTreeMap<String, String>,
    ) -> BTreeMap<OsString, OsString> {
        let mut env: BTreeMap<OsString, OsString> = BTreeMap::new();

        if self.inherit {
            env.extend(std::env::vars_os());
            for key in &self.remove {
                env.remove(OsStr::new(key));
            }
        }

        for (key, value) in &self.set {
            env.insert(key.into(), value.into());
        }

        env.insert("TERM".into(), term.into());

        for (key, value) in extra {
            env.insert(key.into(), value.into());
        }

        env
    }
}
