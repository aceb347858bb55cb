// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Nesting limit for `{{template}}` and `include` unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// What a field lookup does when a map has no entry for the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKey {
    /// Stop execution with `map has no entry for key "k"`.
    #[default]
    Error,
    /// Yield `Null` and keep going.
    Zero,
}

impl FromStr for MissingKey {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "error" => Ok(MissingKey::Error),
            // Go's "default"/"invalid" print "<no value>"; without typed
            // zero values they collapse onto Zero.
            "zero" | "default" | "invalid" => Ok(MissingKey::Zero),
            other => Err(Error::parse(
                format!("unrecognized missingkey value {other:?}"),
                None,
            )),
        }
    }
}

/// Per-set execution options, the counterpart of Go's `Template.Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub missing_key: MissingKey,
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            missing_key: MissingKey::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Options {
    /// Applies a Go-style option string such as `missingkey=zero`.
    pub fn apply(&mut self, option: &str) -> Result<(), Error> {
        match option.split_once('=') {
            Some(("missingkey", value)) => {
                self.missing_key = value.parse()?;
                Ok(())
            }
            _ => Err(Error::parse(format!("unrecognized option {option:?}"), None)),
        }
    }

    pub fn with_missing_key(mut self, missing_key: MissingKey) -> Self {
        self.missing_key = missing_key;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
