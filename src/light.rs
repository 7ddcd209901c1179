extern crate reqwest;
extern crate serde_json;

use crate::config;
use crate::result;
use crate::result::BusLightError;
use crate::state::DisplayState;

pub trait Light {
    fn apply(&mut self, state: DisplayState) -> result::BusLightResult<()>;
}

impl<L: Light + ?Sized> Light for Box<L> {
    fn apply(&mut self, state: DisplayState) -> result::BusLightResult<()> {
        return (**self).apply(state);
    }
}

/// Logs the state instead of driving a device.
pub struct ConsoleLight;

impl Light for ConsoleLight {
    fn apply(&mut self, state: DisplayState) -> result::BusLightResult<()> {
        if !state.is_on() {
            info!("Light off: {}", state);
            return Ok(());
        }
        match state.color() {
            Some(color) => info!("Light on: {} (hue={} sat={} bri={})", state, color.hue, color.sat, color.bri),
            None => info!("Light on: {}", state),
        }
        return Ok(());
    }
}

/// Philips Hue lights behind a bridge, driven over the bridge's REST API.
pub struct HueLight {
    client: reqwest::blocking::Client,
    bridge: String,
    username: String,
    lights: Vec<u32>,
}

impl HueLight {
    pub fn new(config: &config::HueConfig) -> HueLight {
        return HueLight {
            client: reqwest::blocking::Client::new(),
            bridge: config.bridge.clone(),
            username: config.username.clone(),
            lights: config.lights.clone(),
        };
    }

    fn state_url(&self, light: u32) -> String {
        return format!("http://{}/api/{}/lights/{}/state", self.bridge, self.username, light);
    }

    fn put_state(&self, light: u32, body: &str) -> result::BusLightResult<()> {
        let url = self.state_url(light);
        let light_error = move |e: reqwest::Error| {
            BusLightError::LightController(format!("light {}: {}", light, e))
        };

        let response = self.client.put(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .map_err(light_error)?;
        let status = response.status();
        let reply = response.text().map_err(light_error)?;

        if !status.is_success() {
            return Err(BusLightError::LightController(
                format!("light {}: bridge answered {}: {}", light, status, reply)));
        }

        return check_bridge_reply(&reply)
            .map_err(|e| BusLightError::LightController(format!("light {}: {}", light, e)));
    }
}

impl Light for HueLight {
    fn apply(&mut self, state: DisplayState) -> result::BusLightResult<()> {
        let body = state_body(state).to_string();
        for light in &self.lights {
            debug!("PUT light {} state {}", light, body);
            self.put_state(*light, &body)?;
        }
        return Ok(());
    }
}

pub fn state_body(state: DisplayState) -> serde_json::Value {
    let mut body = serde_json::json!({ "on": state.is_on() });
    if !state.is_on() {
        return body;
    }
    if let Some(color) = state.color() {
        body["hue"] = serde_json::json!(color.hue);
        body["sat"] = serde_json::json!(color.sat);
        body["bri"] = serde_json::json!(color.bri);
    }
    return body;
}

// The bridge answers 200 even on failure, with a list of
// {"success": ...} / {"error": {"description": ...}} entries.
fn check_bridge_reply(reply: &str) -> result::BusLightResult<()> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(reply)
        .map_err(|e| result::make_error(&format!("unexpected bridge reply '{}': {}", reply, e)))?;

    let errors: Vec<String> = entries.iter()
        .filter_map(|entry| entry.get("error"))
        .map(|err| err.get("description")
             .and_then(|d| d.as_str())
             .unwrap_or("unknown bridge error")
             .to_string())
        .collect();

    if errors.is_empty() {
        return Ok(());
    }
    return Err(result::make_error(&errors.join("; ")));
}

#[cfg(test)]
mod tests {
    use super::{check_bridge_reply, state_body, ConsoleLight, HueLight, Light};
    use crate::config::HueConfig;
    use crate::state::DisplayState;

    #[test]
    fn off_body() {
        assert_eq!(serde_json::json!({"on": false}), state_body(DisplayState::Off));
    }

    #[test]
    fn on_body() {
        assert_eq!(serde_json::json!({"on": true, "hue": 0, "sat": 254, "bri": 254}),
                   state_body(DisplayState::Red));
    }

    #[test]
    fn every_lit_state_sends_its_color() {
        for state in &[DisplayState::Yellow, DisplayState::Gold, DisplayState::Goldenrod,
                       DisplayState::DarkOrange, DisplayState::Orange,
                       DisplayState::OrangeRed, DisplayState::Red] {
            let body = state_body(*state);
            let color = state.color().unwrap();
            assert_eq!(serde_json::json!(true), body["on"]);
            assert_eq!(serde_json::json!(color.hue), body["hue"]);
            assert_eq!(serde_json::json!(color.sat), body["sat"]);
            assert_eq!(serde_json::json!(color.bri), body["bri"]);
        }
    }

    #[test]
    fn bridge_replies() {
        check_bridge_reply(r#"[{"success":{"/lights/1/state/on":true}}]"#).expect("success reply");

        let err = check_bridge_reply(
            r#"[{"success":{"/lights/1/state/on":true}},{"error":{"type":3,"address":"/lights/7/state","description":"resource, /lights/7/state, not available"}}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("/lights/7/state, not available"));

        assert!(check_bridge_reply("<html>").is_err());
    }

    #[test]
    fn state_url() {
        let light = HueLight::new(&HueConfig {
            bridge: "192.168.1.20".to_string(),
            username: "user".to_string(),
            lights: vec![3],
        });
        assert_eq!("http://192.168.1.20/api/user/lights/3/state", light.state_url(3));
    }

    #[test]
    fn console_light_never_fails() {
        let mut light: Box<dyn Light> = Box::new(ConsoleLight);
        light.apply(DisplayState::Off).expect("off");
        light.apply(DisplayState::Gold).expect("gold");
    }
}
