extern crate chrono;
extern crate reqwest;
extern crate serde;
extern crate serde_json;

use crate::config;
use crate::resolve;
use crate::result;
use crate::result::BusLightError;

/// One entry of the TriMet `resultSet.arrival` list. Times are epoch millis.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalRecord {
    #[serde(default)]
    pub scheduled: Option<i64>,
    #[serde(default)]
    pub estimated: Option<i64>,
    #[serde(default)]
    pub route: Option<i64>,
    #[serde(default)]
    pub locid: Option<i64>,
    #[serde(default)]
    pub short_sign: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct TrimetResponse {
    #[serde(rename = "resultSet")]
    result_set: TrimetResultSet,
}

#[derive(Serialize, Deserialize, Debug)]
struct TrimetResultSet {
    #[serde(default)]
    arrival: Vec<ArrivalRecord>,
    #[serde(default)]
    error: Option<TrimetError>,
}

#[derive(Serialize, Deserialize, Debug)]
struct TrimetError {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBody {
    pub status: u16,
    pub body: String,
}

pub type FetchFn = fn(&str) -> result::BusLightResult<FetchedBody>;

pub struct ArrivalClient {
    api_key: String,
    stops: Vec<String>,
    endpoint: String,
    fetch_fn: FetchFn,
}

impl ArrivalClient {
    pub fn new(config: &config::TrimetConfig) -> ArrivalClient {
        return ArrivalClient::with_fetch_fn(config, real_fetch);
    }

    pub fn with_fetch_fn(config: &config::TrimetConfig, fetch_fn: FetchFn) -> ArrivalClient {
        return ArrivalClient {
            api_key: config.api_key.clone(),
            stops: config.stops.clone(),
            endpoint: config.endpoint.clone(),
            fetch_fn: fetch_fn,
        };
    }

    fn url_with_key(&self, api_key: &str) -> String {
        return format!("{}?json=true&appID={}&locIDs={}",
                       self.endpoint, api_key, self.stops.join(","));
    }

    pub fn url(&self) -> String {
        return self.url_with_key(&self.api_key);
    }

    /// Fetches arrivals for every configured stop and returns the next one
    /// due at or after `now`.
    ///
    /// A non-2xx status is logged but the body is still parsed, since TriMet
    /// reports most problems inside a JSON error envelope.
    pub fn fetch_next_arrival(&self, now: &chrono::DateTime<chrono::Utc>) -> result::BusLightResult<ArrivalRecord> {
        debug!("Fetching {}", self.url_with_key("<redacted>"));
        let fetched = (self.fetch_fn)(&self.url())?;

        if fetched.status / 100 != 2 {
            warn!("{} response: \"{}\"", fetched.status, fetched.body);
        }

        let arrivals = parse_response(&fetched.body)?;
        let next = soonest_arrival(arrivals, now.timestamp_millis())?;

        debug!("Next arrival: route {:?} at stop {:?} ({}), status {:?}",
               next.route,
               next.locid,
               next.short_sign.as_ref().map(String::as_str).unwrap_or("no sign"),
               next.status);

        return Ok(next);
    }
}

pub fn parse_response(response_body: &str) -> result::BusLightResult<Vec<ArrivalRecord>> {
    let response: TrimetResponse = serde_json::from_str(response_body)?;

    if response.result_set.arrival.is_empty() {
        if let Some(err) = response.result_set.error {
            return Err(BusLightError::MalformedResponse(
                format!("TriMet returned an error: {}", err.content)));
        }
    }

    return Ok(response.result_set.arrival);
}

// Upcoming arrivals win over ones already departed, so a bus that just left
// one stop does not hide the next bus at another. When everything has left,
// the latest departure comes back and the cycle treats it as stale. Entries
// without any usable time cannot be ranked; if nothing can be ranked the first
// entry is returned so the resolver reports the missing time.
fn soonest_arrival(arrivals: Vec<ArrivalRecord>, now_millis: i64) -> result::BusLightResult<ArrivalRecord> {
    let timed: Vec<(i64, &ArrivalRecord)> = arrivals.iter()
        .filter_map(|a| resolve::resolve_soonest(a).ok().map(|t| (t, a)))
        .collect();

    let upcoming = timed.iter()
        .filter(|&&(t, _)| t >= now_millis)
        .min_by_key(|&&(t, _)| t);
    let ranked = upcoming
        .or_else(|| timed.iter().max_by_key(|&&(t, _)| t))
        .map(|&(_, a)| a.clone());

    match ranked {
        Some(arrival) => return Ok(arrival),
        None => return arrivals.into_iter().nth(0).ok_or(BusLightError::NoArrivalData),
    }
}

fn real_fetch(url: &str) -> result::BusLightResult<FetchedBody> {
    let client = reqwest::blocking::Client::new();
    let response = client.get(url)
        .header(reqwest::header::USER_AGENT, "buslight")
        .send()?;
    let status = response.status().as_u16();
    let body = response.text()?;
    return Ok(FetchedBody {
        status: status,
        body: body,
    });
}
