extern crate reqwest;
extern crate serde_json;
extern crate serde_yaml;
extern crate std;

pub type BusLightResult<T> = std::result::Result<T, BusLightError>;

#[derive(Debug)]
pub enum BusLightError {
    Config(String),
    Network { url: String, message: String },
    MalformedResponse(String),
    NoArrivalData,
    NoTimeAvailable,
    LightController(String),
    StaleArrival { remaining_millis: i64 },
    Other(String),
}

pub fn make_error(msg: &str) -> BusLightError {
    return BusLightError::Other(msg.to_string());
}

impl std::fmt::Display for BusLightError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            BusLightError::Config(ref msg) => {
                return write!(f, "Config Error: {}", msg);
            },
            BusLightError::Network { ref url, ref message } => {
                return write!(f, "Network Error: unable to request '{}': {}", url, message);
            },
            BusLightError::MalformedResponse(ref msg) => {
                return write!(f, "Malformed Response: {}", msg);
            },
            BusLightError::NoArrivalData => {
                return write!(f, "No Arrival Data: response had no arrivals");
            },
            BusLightError::NoTimeAvailable => {
                return write!(f, "No Time Available: arrival has neither scheduled nor estimated time");
            },
            BusLightError::LightController(ref msg) => {
                return write!(f, "Light Controller Error: {}", msg);
            },
            BusLightError::StaleArrival { remaining_millis } => {
                return write!(f, "Stale Arrival: arrival was {}ms ago", remaining_millis.unsigned_abs());
            },
            BusLightError::Other(ref msg) => {
                return write!(f, "Error: {}", msg);
            },
        }
    }
}

impl std::error::Error for BusLightError {}

impl From<reqwest::Error> for BusLightError {
    fn from(err: reqwest::Error) -> BusLightError {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        return BusLightError::Network { url: url, message: err.to_string() };
    }
}

impl From<serde_json::Error> for BusLightError {
    fn from(err: serde_json::Error) -> BusLightError {
        return BusLightError::MalformedResponse(err.to_string());
    }
}

impl From<serde_yaml::Error> for BusLightError {
    fn from(err: serde_yaml::Error) -> BusLightError {
        return BusLightError::Config(err.to_string());
    }
}
