//! Factory seam between the registry and concrete environment backends.
//!
//! The registry constructs environments only through [`EnvFactory`], keyed
//! by a version string plus a family-specific option map, so the backend is
//! swappable and mockable in tests.

use serde_json::{Map, Value};

use crate::env::Environment;
use crate::spaces::ActionSpace;
use crate::{EnvError, Result};

/// Family-specific construction options, as received in the `make` request
/// body (grid map name, slipperiness, episode cap, gravity, number of
/// vectorized copies, ...).
#[derive(Clone, Debug, Default)]
pub struct MakeOptions(Map<String, Value>);

impl MakeOptions {
    pub fn new(options: Map<String, Value>) -> Self {
        Self(options)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String option with a default
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(bad_option(key, "a string", other)),
        }
    }

    /// Boolean option with a default
    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(bad_option(key, "a boolean", other)),
        }
    }

    /// Non-negative integer option with a default
    pub fn u64_or(&self, key: &str, default: u64) -> Result<u64> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value
                .as_u64()
                .ok_or_else(|| bad_option(key, "a non-negative integer", value)),
        }
    }

    /// Float option with a default
    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| bad_option(key, "a number", value)),
        }
    }
}

impl From<Map<String, Value>> for MakeOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn bad_option(key: &str, expected: &str, got: &Value) -> EnvError {
    EnvError::Construction(format!("Option '{key}' must be {expected}, got {got}"))
}

/// Constructs environments for one family.
///
/// Implementations live next to their environment in `rlenvs-envs`; the
/// registry and the HTTP layer only ever hold a `Box<dyn EnvFactory>`.
pub trait EnvFactory: Send + Sync {
    type Env: Environment;

    /// Version used when the request omits one (`v1` for most families)
    fn default_version(&self) -> &'static str {
        "v1"
    }

    /// The family's declared action space, used for validation and the
    /// `action-space` discovery route. Identical for every instance the
    /// factory produces.
    fn action_space(&self) -> ActionSpace;

    /// Construct a new environment instance.
    ///
    /// An unknown version or an invalid option combination is a
    /// [`EnvError::Construction`] error; its message travels to the client
    /// verbatim.
    fn make(&self, version: &str, options: &MakeOptions) -> Result<Self::Env>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> MakeOptions {
        match value {
            Value::Object(map) => MakeOptions::new(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_defaults_apply_when_missing() {
        let opts = options(json!({}));
        assert_eq!(opts.str_or("map_name", "4x4").unwrap(), "4x4");
        assert!(opts.bool_or("is_slippery", true).unwrap());
        assert_eq!(opts.u64_or("max_episode_steps", 500).unwrap(), 500);
        assert_eq!(opts.f64_or("g", 10.0).unwrap(), 10.0);
    }

    #[test]
    fn test_values_override_defaults() {
        let opts = options(json!({
            "map_name": "8x8",
            "is_slippery": false,
            "max_episode_steps": 100,
            "g": 9.81,
        }));
        assert_eq!(opts.str_or("map_name", "4x4").unwrap(), "8x8");
        assert!(!opts.bool_or("is_slippery", true).unwrap());
        assert_eq!(opts.u64_or("max_episode_steps", 500).unwrap(), 100);
        assert_eq!(opts.f64_or("g", 10.0).unwrap(), 9.81);
    }

    #[test]
    fn test_type_mismatch_is_a_construction_error() {
        let opts = options(json!({"max_episode_steps": "soon"}));
        let err = opts.u64_or("max_episode_steps", 500).unwrap_err();
        assert!(matches!(err, EnvError::Construction(_)));
    }
}
