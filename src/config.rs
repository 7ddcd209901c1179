extern crate serde;
extern crate serde_yaml;

use crate::result;
use crate::result::BusLightError;

pub const DEFAULT_CONFIG_PATH: &str = "./trimet.yaml";
pub const DEFAULT_ARRIVALS_ENDPOINT: &str = "https://developer.trimet.org/ws/v2/arrivals";

#[derive(Debug, Clone)]
pub struct Config {
    pub trimet: TrimetConfig,
    pub hue: Option<HueConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrimetConfig {
    pub api_key: String,
    pub stops: Vec<String>,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HueConfig {
    pub bridge: String,
    pub username: String,
    pub lights: Vec<u32>,
}

#[derive(Deserialize)]
struct RawConfig {
    trimet: RawTrimetConfig,
    #[serde(default)]
    hue: Option<HueConfig>,
}

#[derive(Deserialize)]
struct RawTrimetConfig {
    api_key: String,
    stops: Vec<RawStopId>,
    #[serde(default)]
    endpoint: Option<String>,
}

// Stop ids are usually written as bare numbers in YAML.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawStopId {
    Number(u64),
    Text(String),
}

impl RawStopId {
    fn into_string(self) -> String {
        match self {
            RawStopId::Number(n) => n.to_string(),
            RawStopId::Text(s) => s.trim().to_string(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> result::BusLightResult<Config> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BusLightError::Config(format!("Unable to load configuration '{}': {}", path.display(), e))
        })?;
        return Config::parse(&contents);
    }

    pub fn parse(contents: &str) -> result::BusLightResult<Config> {
        let raw: RawConfig = serde_yaml::from_str(contents)?;

        let api_key = raw.trimet.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(BusLightError::Config("trimet.api_key is empty".to_string()));
        }

        let mut stops: Vec<String> = vec![];
        for stop in raw.trimet.stops.into_iter().map(RawStopId::into_string) {
            if stop.is_empty() {
                return Err(BusLightError::Config("trimet.stops contains an empty stop id".to_string()));
            }
            if !stops.contains(&stop) {
                stops.push(stop);
            }
        }
        if stops.is_empty() {
            return Err(BusLightError::Config("trimet.stops must list at least one stop".to_string()));
        }

        if let Some(ref hue) = raw.hue {
            if hue.lights.is_empty() {
                return Err(BusLightError::Config("hue.lights must list at least one light".to_string()));
            }
            if hue.bridge.trim().is_empty() || hue.username.trim().is_empty() {
                return Err(BusLightError::Config("hue.bridge and hue.username are required".to_string()));
            }
        }

        return Ok(Config {
            trimet: TrimetConfig {
                api_key: api_key,
                stops: stops,
                endpoint: raw.trimet.endpoint.unwrap_or(DEFAULT_ARRIVALS_ENDPOINT.to_string()),
            },
            hue: raw.hue,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::result::BusLightError;

    fn assert_config_error(result: crate::result::BusLightResult<Config>) {
        match result {
            Err(BusLightError::Config(_)) => {},
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn load_from_file() {
        let config = Config::load("testdata/trimet.yaml").expect("load trimet.yaml");

        assert_eq!("0123456789ABCDEF", config.trimet.api_key);
        assert_eq!(vec!["7787".to_string(), "7788".to_string()], config.trimet.stops);
        assert_eq!(super::DEFAULT_ARRIVALS_ENDPOINT, config.trimet.endpoint);

        let hue = config.hue.expect("hue section");
        assert_eq!("192.168.1.20", hue.bridge);
        assert_eq!(vec![1, 3], hue.lights);
    }

    #[test]
    fn missing_file_is_config_error() {
        assert_config_error(Config::load("testdata/does-not-exist.yaml"));
    }

    #[test]
    fn stops_are_deduplicated_in_order() {
        let config = Config::parse(
            "trimet:\n  api_key: key\n  stops: [\"2\", 1, 2, \"1\", 3]\n").expect("parse");
        assert_eq!(vec!["2", "1", "3"], config.trimet.stops);
        assert!(config.hue.is_none());
    }

    #[test]
    fn endpoint_can_be_overridden() {
        let config = Config::parse(
            "trimet:\n  api_key: key\n  stops: [1]\n  endpoint: http://localhost:8080/arrivals\n").expect("parse");
        assert_eq!("http://localhost:8080/arrivals", config.trimet.endpoint);
    }

    #[test]
    fn rejects_invalid_configs() {
        assert_config_error(Config::parse("trimet:\n  api_key: \"\"\n  stops: [1]\n"));
        assert_config_error(Config::parse("trimet:\n  api_key: key\n  stops: []\n"));
        assert_config_error(Config::parse("trimet:\n  stops: [1]\n"));
        assert_config_error(Config::parse("not: [valid"));
        assert_config_error(Config::parse(
            "trimet:\n  api_key: key\n  stops: [1]\nhue:\n  bridge: 10.0.0.2\n  username: u\n  lights: []\n"));
    }
}
