use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A device as described by a configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigPort {
    /// The port name, e.g. `COM1` or `/dev/ttyACM0`.
    pub name: String,

    /// Whether the device can actually be acquired.
    /// An unavailable device still shows up in the port list but fails
    /// to open, like a port held busy by another program.
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl ConfigPort {
    /// An available device with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            available: true,
        }
    }

    /// A device which will fail to open.
    pub fn busy(name: &str) -> Self {
        Self {
            name: name.into(),
            available: false,
        }
    }
}

/// The devices the backend enumerates when starting.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// The devices, in enumeration order.
    pub ports: Vec<ConfigPort>,
}

impl Config {
    fn ron() -> ron::Options {
        ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .with_default_extension(ron::extensions::Extensions::UNWRAP_NEWTYPES)
    }

    /// Deserialize a .ron file's contents.
    pub fn deserialize(input: &str) -> Result<Self, Error> {
        Self::ron()
            .from_str::<Config>(input)
            .map_err(|problem| Error::BadConfig(format!("Not valid .ron: {problem}")))
    }

    /// Serialize into a .ron string.
    pub fn serialize_pretty(&self) -> String {
        Self::ron()
            .to_string_pretty(self, ron::ser::PrettyConfig::default())
            .unwrap()
    }

    /// Read a configuration from the given path.
    pub fn new_from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(&path).map_err(|problem| {
            Error::BadConfig(format!(
                "Could not read config file {:?}: {problem}",
                path.as_ref()
            ))
        })?;

        Self::deserialize(&contents)
    }

    /// A configuration with a handful of available devices.
    pub fn example() -> Self {
        Self {
            ports: vec![
                ConfigPort::new("COM1"),
                ConfigPort::new("COM2"),
                ConfigPort::new("COM3"),
                ConfigPort::busy("COM4"),
            ],
        }
    }

    /// Check invariants: port names must be unique.
    pub fn validate(&self) -> Result<(), Error> {
        let duplicates = self
            .ports
            .iter()
            .map(|port| &port.name)
            .duplicates()
            .join(", ");

        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(Error::BadConfig(format!(
                "Duplicate port names: [ {duplicates} ]"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serialize_deserialize_roundtrip() {
        let config = Config::example();
        let serialized = config.serialize_pretty();

        assert_eq!(Config::deserialize(&serialized).unwrap(), config);
    }

    #[test]
    fn can_deserialize_example_input() {
        let input = r#"
(
    ports: [
        (
            name: "COM1",
        ),
        (
            name: "COM2",
            available: false,
        ),
    ],
)
"#;
        let config = Config::deserialize(input).unwrap();

        assert_eq!(config.ports.len(), 2);
        assert!(config.ports[0].available);
        assert!(!config.ports[1].available);
    }

    #[test]
    fn malformed_input_is_a_bad_config() {
        let err = Config::deserialize("( ports: [ ( nam")
            .unwrap_err()
            .try_into_bad_config()
            .unwrap();

        assert!(err.contains(".ron"));
    }

    #[test]
    fn an_unreadable_path_is_a_bad_config() {
        let result = Config::new_from_path("/definitely/not/here.ron");

        assert!(result.unwrap_err().try_into_bad_config().is_ok());
    }

    #[test]
    fn bad_config_duplicates() {
        let config = Config {
            ports: vec![
                ConfigPort::new("COM1"),
                ConfigPort::new("COM2"),
                ConfigPort::new("COM1"),
            ],
        };

        let err = config.validate().unwrap_err().try_into_bad_config().unwrap();

        assert!(err.contains("COM1"));
        assert!(!err.contains("COM2"));
    }
}
