//! Shoutcast admin pages
//!
//! v1 servers publish a one-line CSV status at `/7.html`; v2 servers have a
//! per-stream stats endpoint that can answer in JSON.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::network::BROWSER_USER_AGENT;
use crate::error::{RadioError, Result};
use crate::stream::metadata::fix_track_title;
use crate::stream::types::{FetchSource, StationInfo};

use super::http::HttpClient;
use super::{json_u32, server_url, Lookup, StationHandler};

/// Shoutcast v1 `/7.html` scraper
pub struct ShoutcastV1 {
    client: HttpClient,
}

impl ShoutcastV1 {
    /// v1 servers hand the audio stream to anything that doesn't look like
    /// a browser, so this client pretends to be one.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: HttpClient::with_user_agent(BROWSER_USER_AGENT)?,
        })
    }

    pub fn status_url(url: &Url) -> Url {
        server_url(url, "/7.html")
    }
}

impl StationHandler for ShoutcastV1 {
    fn source(&self) -> FetchSource {
        FetchSource::ShoutcastV1
    }

    fn resolve(&self, url: &str) -> Result<Lookup> {
        let status_url = Self::status_url(&Url::parse(url)?);
        debug!(url = %status_url, "Shoutcast v1 lookup");

        let body = match self.client.get_text(status_url.as_str()) {
            Ok(body) => body,
            Err(e) => return Ok(Lookup::Failed(e)),
        };
        Ok(parse_v1_status(&body).into())
    }
}

/// Parse the `/7.html` body.
///
/// The body holds `current,status,peak,max,unique,bitrate,song title`; the
/// title itself may contain commas.
pub fn parse_v1_status(html: &str) -> Result<Option<StationInfo>> {
    static BODY: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = BODY
        .get_or_init(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").ok())
        .as_ref()
    else {
        return Ok(None);
    };

    let Some(csv) = re.captures(html).and_then(|c| c.get(1)) else {
        return Ok(None);
    };
    let fields: Vec<&str> = csv.as_str().split(',').collect();
    if fields.len() < 7 {
        return Ok(None);
    }

    let title = fix_track_title(&fields[6..].join(","));
    if title.is_empty() {
        return Err(RadioError::Stream(
            "Unable to determine current station information".to_string(),
        ));
    }

    let mut info = StationInfo::new(title, FetchSource::ShoutcastV1);
    info.listeners = fields[0].trim().parse().ok();
    info.bitrate = fields[5].trim().parse().ok();
    Ok(Some(info))
}

/// Shoutcast v2 `/stats?sid=1&json=1` client
pub struct ShoutcastV2 {
    client: HttpClient,
}

impl ShoutcastV2 {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
        })
    }

    pub fn stats_url(url: &Url) -> Url {
        let mut stats = server_url(url, "/stats");
        stats.set_query(Some("sid=1&json=1"));
        stats
    }
}

impl StationHandler for ShoutcastV2 {
    fn source(&self) -> FetchSource {
        FetchSource::ShoutcastV2
    }

    fn resolve(&self, url: &str) -> Result<Lookup> {
        let stats_url = Self::stats_url(&Url::parse(url)?);
        debug!(url = %stats_url, "Shoutcast v2 lookup");

        let stats = match self.client.get_json::<Value>(stats_url.as_str()) {
            Ok(stats) => stats,
            Err(e) => return Ok(Lookup::Failed(e)),
        };
        Ok(parse_v2_stats(&stats).map_or(Lookup::Empty, Lookup::Found))
    }
}

/// Pick the now-playing fields out of a v2 stats document
pub fn parse_v2_stats(stats: &Value) -> Option<StationInfo> {
    let title = fix_track_title(stats.get("songtitle")?.as_str()?);
    if title.is_empty() {
        return None;
    }

    let mut info = StationInfo::new(title, FetchSource::ShoutcastV2);
    info.listeners = stats.get("currentlisteners").and_then(json_u32);
    info.bitrate = stats.get("bitrate").and_then(json_u32);
    Some(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one HTTP response, returning the base URL and the request line
    fn serve_http(body: String) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let n = conn.read(&mut buf).unwrap();
            let resp = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = conn.write_all(resp.as_bytes());
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://127.0.0.1:{port}/;stream.mp3"), handle)
    }

    // --- v1 parsing ---

    #[test]
    fn v1_status_parsed() {
        let html = "<html><meta http-equiv=\"Pragma\" content=\"no-cache\"></head><body>12,1,40,100,10,128,Daft Punk - Around the World</body></html>";
        let info = parse_v1_status(html).unwrap().unwrap();
        assert_eq!(info.title, "Daft Punk - Around the World");
        assert_eq!(info.fetchsource, FetchSource::ShoutcastV1);
        assert_eq!(info.listeners, Some(12));
        assert_eq!(info.bitrate, Some(128));
        assert!(info.headers.is_empty());
    }

    #[test]
    fn v1_title_with_commas() {
        let html = "<body>1,1,1,1,1,64,Crosby, Stills, Nash &amp; Young - Ohio</body>";
        let info = parse_v1_status(html).unwrap().unwrap();
        assert_eq!(info.title, "Crosby, Stills, Nash & Young - Ohio");
    }

    #[test]
    fn v1_short_csv_is_empty() {
        assert!(parse_v1_status("<body>1,1,1</body>").unwrap().is_none());
    }

    #[test]
    fn v1_without_body_is_empty() {
        assert!(parse_v1_status("ICY 200 OK\r\n\r\n").unwrap().is_none());
    }

    #[test]
    fn v1_blank_title_is_an_error() {
        assert!(parse_v1_status("<body>1,1,1,1,1,64,  </body>").is_err());
    }

    #[test]
    fn v1_status_url() {
        let url = Url::parse("http://radio.example:8000/;stream.nsv?type=mp3").unwrap();
        assert_eq!(
            ShoutcastV1::status_url(&url).as_str(),
            "http://radio.example:8000/7.html"
        );
    }

    // --- v2 parsing ---

    #[test]
    fn v2_stats_parsed() {
        let stats = json!({
            "currentlisteners": 42,
            "bitrate": "192",
            "songtitle": "Massive Attack - Teardrop",
            "servertitle": "Test FM"
        });
        let info = parse_v2_stats(&stats).unwrap();
        assert_eq!(info.title, "Massive Attack - Teardrop");
        assert_eq!(info.fetchsource, FetchSource::ShoutcastV2);
        assert_eq!(info.listeners, Some(42));
        assert_eq!(info.bitrate, Some(192));
    }

    #[test]
    fn v2_missing_title_is_empty() {
        assert!(parse_v2_stats(&json!({"currentlisteners": 1})).is_none());
        assert!(parse_v2_stats(&json!({"songtitle": "   "})).is_none());
    }

    #[test]
    fn v2_stats_url() {
        let url = Url::parse("http://radio.example:8000/stream").unwrap();
        assert_eq!(
            ShoutcastV2::stats_url(&url).as_str(),
            "http://radio.example:8000/stats?sid=1&json=1"
        );
    }

    // --- handlers ---

    #[test]
    fn v1_handler_against_local_server() {
        let (url, server) = serve_http("<body>3,1,5,50,3,96,Air - La Femme d'Argent</body>".to_string());
        let handler = ShoutcastV1::new().unwrap();
        let lookup = handler.resolve(&url).unwrap();
        match lookup {
            Lookup::Found(info) => assert_eq!(info.title, "Air - La Femme d'Argent"),
            other => panic!("expected station, got {other:?}"),
        }
        assert_eq!(server.join().unwrap(), "GET /7.html HTTP/1.1");
    }

    #[test]
    fn v2_handler_reports_bad_json_as_failure() {
        let (url, server) = serve_http("<html>not json</html>".to_string());
        let handler = ShoutcastV2::new().unwrap();
        assert!(matches!(handler.resolve(&url).unwrap(), Lookup::Failed(_)));
        assert_eq!(server.join().unwrap(), "GET /stats?sid=1&json=1 HTTP/1.1");
    }

    #[test]
    fn unparseable_url_is_a_fault() {
        let handler = ShoutcastV1::new().unwrap();
        assert!(matches!(handler.resolve("no scheme here"), Err(RadioError::InvalidUrl(_))));
    }
}
