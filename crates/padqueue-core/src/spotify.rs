//! Spotify Web API implementation of `PlaybackService`
//!
//! Uses a blocking `ureq` agent with a bearer token obtained elsewhere.
//! Token refresh is not handled: an expired token shows up as HTTP 401.

use crate::service::{PlaybackService, PlaybackStatus, RemoteDevice, ServiceError};
use crate::types::{QueueSnapshot, Track};
use serde::Deserialize;
use std::time::Duration;

/// Public Spotify Web API root
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Largest `limit` the playlist items endpoint accepts
const PLAYLIST_PAGE_LIMIT: usize = 50;

/// Spotify player API client
pub struct SpotifyService {
    agent: ureq::Agent,
    api_base: String,
    token: String,
}

impl SpotifyService {
    pub fn new(api_base: &str, token: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(10))
            .timeout_write(Duration::from_secs(10))
            .build();
        Self {
            agent,
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}{}", self.api_base, path))
            .set("Authorization", &format!("Bearer {}", self.token))
    }

    /// Send a request without a body, returning the response on 2xx
    fn send_empty(
        &self,
        operation: &'static str,
        request: ureq::Request,
    ) -> Result<ureq::Response, ServiceError> {
        // Explicit empty body so the player endpoints get a Content-Length
        request
            .send_string("")
            .map_err(|e| map_ureq_error(operation, e))
    }

    fn get_body(&self, operation: &'static str, request: ureq::Request) -> Result<(u16, String), ServiceError> {
        let response = request.call().map_err(|e| map_ureq_error(operation, e))?;
        let status = response.status();
        let body = response.into_string().map_err(|e| ServiceError::Decode {
            operation,
            message: e.to_string(),
        })?;
        Ok((status, body))
    }
}

fn map_ureq_error(operation: &'static str, error: ureq::Error) -> ServiceError {
    match error {
        ureq::Error::Status(status, response) => ServiceError::Status {
            operation,
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => ServiceError::Transport {
            operation,
            message: transport.to_string(),
        },
    }
}

fn decode<'a, T: Deserialize<'a>>(operation: &'static str, body: &'a str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|e| ServiceError::Decode {
        operation,
        message: e.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    id: Option<String>,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    #[serde(default)]
    queue: Vec<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    #[serde(default)]
    is_playing: bool,
    item: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct DeviceObject {
    id: Option<String>,
    name: String,
    #[serde(default)]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<DeviceObject>,
}

/// One page of playlist items
struct PlaylistPage {
    tracks: Vec<Track>,
    /// Items on the page, including the ones dropped from `tracks`
    item_count: usize,
}

/// Playlist items → tracks; local files and removed tracks (no id) are dropped
fn parse_playlist_items(body: &str) -> Result<PlaylistPage, ServiceError> {
    let response: PlaylistItemsResponse = decode("fetch_window", body)?;
    let item_count = response.items.len();
    let tracks = response
        .items
        .into_iter()
        .filter_map(|item| item.track)
        .filter_map(|track| track.id.map(|id| Track::new(id, track.name)))
        .collect();
    Ok(PlaylistPage { tracks, item_count })
}

fn parse_queue(body: &str) -> Result<QueueSnapshot, ServiceError> {
    let response: QueueResponse = decode("queue_snapshot", body)?;
    Ok(response.queue.into_iter().filter_map(|t| t.id).collect())
}

/// `GET /me/player` answers 204 with no body when nothing is active
fn parse_player(status: u16, body: &str) -> Result<PlaybackStatus, ServiceError> {
    if status == 204 || body.trim().is_empty() {
        return Ok(PlaybackStatus::default());
    }
    let response: PlayerResponse = decode("playback_status", body)?;
    Ok(PlaybackStatus {
        is_playing: response.is_playing,
        current_track_id: response.item.and_then(|item| item.id),
    })
}

fn parse_devices(body: &str) -> Result<Vec<RemoteDevice>, ServiceError> {
    let response: DevicesResponse = decode("list_devices", body)?;
    Ok(response
        .devices
        .into_iter()
        .filter_map(|d| {
            d.id.map(|id| RemoteDevice {
                id,
                name: d.name,
                is_active: d.is_active,
            })
        })
        .collect())
}

impl PlaybackService for SpotifyService {
    fn fetch_window(
        &self,
        playlist_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Track>, ServiceError> {
        let path = format!("/playlists/{}/tracks", urlencoding::encode(playlist_id));
        let mut tracks = Vec::with_capacity(limit);
        let mut page_offset = offset;

        // The endpoint caps `limit`, so larger windows take several pages
        while tracks.len() < limit {
            let page_limit = (limit - tracks.len()).min(PLAYLIST_PAGE_LIMIT);
            let request = self
                .request("GET", &path)
                .query("limit", &page_limit.to_string())
                .query("offset", &page_offset.to_string());
            let (_, body) = self.get_body("fetch_window", request)?;
            let page = parse_playlist_items(&body)?;
            log::trace!(
                "Spotify: Page at offset {} held {} item(s)",
                page_offset,
                page.item_count
            );

            tracks.extend(page.tracks);
            page_offset += page.item_count;
            if page.item_count < page_limit {
                break;
            }
        }

        tracks.truncate(limit);
        log::debug!("Spotify: Fetched {} track(s) from playlist {}", tracks.len(), playlist_id);
        Ok(tracks)
    }

    fn enqueue(&self, track_id: &str, device_id: Option<&str>) -> Result<(), ServiceError> {
        log::debug!("Spotify: Queueing track {} on {:?}", track_id, device_id);
        let mut request = self
            .request("POST", "/me/player/queue")
            .query("uri", &format!("spotify:track:{}", track_id));
        if let Some(device_id) = device_id {
            request = request.query("device_id", device_id);
        }
        let response = self.send_empty("enqueue", request)?;
        log::debug!("Spotify: Queue request status {}", response.status());
        Ok(())
    }

    fn queue_snapshot(&self) -> Result<QueueSnapshot, ServiceError> {
        let (_, body) = self.get_body("queue_snapshot", self.request("GET", "/me/player/queue"))?;
        parse_queue(&body)
    }

    fn skip(&self) -> Result<(), ServiceError> {
        self.send_empty("skip", self.request("POST", "/me/player/next"))?;
        Ok(())
    }

    fn transfer_playback(&self, device_id: &str) -> Result<(), ServiceError> {
        log::info!("Spotify: Transferring playback to device {}", device_id);
        self.request("PUT", "/me/player")
            .send_json(serde_json::json!({ "device_ids": [device_id] }))
            .map_err(|e| map_ureq_error("transfer_playback", e))?;
        Ok(())
    }

    fn pause(&self) -> Result<(), ServiceError> {
        log::debug!("Spotify: Requesting pause");
        self.send_empty("pause", self.request("PUT", "/me/player/pause"))?;
        Ok(())
    }

    fn resume(&self) -> Result<(), ServiceError> {
        log::debug!("Spotify: Requesting resume");
        self.send_empty("resume", self.request("PUT", "/me/player/play"))?;
        Ok(())
    }

    fn playback_status(&self) -> Result<PlaybackStatus, ServiceError> {
        let (status, body) = self.get_body("playback_status", self.request("GET", "/me/player"))?;
        let playback = parse_player(status, &body)?;
        log::debug!("Spotify: is_playing={}", playback.is_playing);
        Ok(playback)
    }

    fn list_devices(&self) -> Result<Vec<RemoteDevice>, ServiceError> {
        let (_, body) = self.get_body("list_devices", self.request("GET", "/me/player/devices"))?;
        let devices = parse_devices(&body)?;
        log::info!("Spotify: Found {} device(s)", devices.len());
        Ok(devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WINDOW_CAPACITY;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    #[test]
    fn test_parse_playlist_items_skips_missing_tracks() {
        let body = r#"{
            "items": [
                {"track": {"id": "4uLU6hMCjMI75M1A2tKUQC", "name": "Never Gonna Give You Up"}},
                {"track": null},
                {"track": {"id": null, "name": "local file.mp3"}},
                {"track": {"id": "7GhIk7Il098yCjg4BQjzvb", "name": "Take On Me"}}
            ],
            "total": 4
        }"#;
        let page = parse_playlist_items(body).unwrap();
        assert_eq!(page.item_count, 4);
        let tracks = page.tracks;
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(tracks[1].name, "Take On Me");
    }

    #[test]
    fn test_parse_queue() {
        let body = r#"{
            "currently_playing": {"id": "cur", "name": "Now"},
            "queue": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}]
        }"#;
        let snapshot = parse_queue(body).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.position_of("b"), Some(1));
        assert_eq!(snapshot.position_of("cur"), None);
    }

    #[test]
    fn test_parse_player() {
        let body = r#"{"is_playing": true, "item": {"id": "abc", "name": "Song"}}"#;
        let status = parse_player(200, body).unwrap();
        assert!(status.is_playing);
        assert_eq!(status.current_track_id.as_deref(), Some("abc"));

        assert_eq!(parse_player(204, "").unwrap(), PlaybackStatus::default());
    }

    #[test]
    fn test_parse_devices() {
        let body = r#"{"devices": [
            {"id": "d1", "name": "Spotifyd@raspberrypi", "is_active": false, "type": "Speaker"},
            {"id": null, "name": "Restricted", "is_active": false},
            {"id": "d2", "name": "Laptop", "is_active": true}
        ]}"#;
        let devices = parse_devices(body).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name, "Spotifyd@raspberrypi");
        assert!(devices[1].is_active);
    }

    #[test]
    fn test_decode_error() {
        let err = parse_queue("not json").unwrap_err();
        assert!(matches!(err, ServiceError::Decode { operation: "queue_snapshot", .. }));
    }

    #[test]
    fn test_api_base_trimmed() {
        let service = SpotifyService::new("https://api.spotify.com/v1/ ", "token");
        assert_eq!(service.api_base, "https://api.spotify.com/v1");
    }

    /// Request as received by the stub server
    #[derive(Debug)]
    struct Recorded {
        /// e.g. "GET /me/player HTTP/1.1", query decoded
        line: String,
        authorization: Option<String>,
        body: String,
    }

    /// Local HTTP server answering one connection per canned response
    fn stub_server(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<Recorded>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = std::thread::spawn(move || {
            let mut recorded = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);

                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let mut content_length = 0;
                let mut authorization = None;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    let header = header.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap();
                        } else if name.eq_ignore_ascii_case("authorization") {
                            authorization = Some(value.trim().to_string());
                        }
                    }
                }
                let mut request_body = vec![0; content_length];
                reader.read_exact(&mut request_body).unwrap();

                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                reader.get_mut().write_all(response.as_bytes()).unwrap();

                recorded.push(Recorded {
                    line: urlencoding::decode(line.trim_end()).unwrap().into_owned(),
                    authorization,
                    body: String::from_utf8(request_body).unwrap(),
                });
            }
            recorded
        });
        (base, handle)
    }

    fn items_page(range: std::ops::Range<usize>) -> String {
        let items: Vec<String> = range
            .map(|i| format!(r#"{{"track": {{"id": "t{}", "name": "Track {}"}}}}"#, i, i))
            .collect();
        format!(r#"{{"items": [{}]}}"#, items.join(","))
    }

    #[test]
    fn test_fetch_window_pages_within_endpoint_limit() {
        let (base, server) = stub_server(vec![(200, items_page(0..50)), (200, items_page(50..64))]);
        let service = SpotifyService::new(&base, "secret");

        let tracks = service.fetch_window("pl", WINDOW_CAPACITY, 0).unwrap();
        assert_eq!(tracks.len(), 64);
        assert_eq!(tracks[50].id, "t50");
        assert_eq!(tracks[63].id, "t63");

        let requests = server.join().unwrap();
        assert_eq!(requests[0].line, "GET /playlists/pl/tracks?limit=50&offset=0 HTTP/1.1");
        assert_eq!(requests[1].line, "GET /playlists/pl/tracks?limit=14&offset=50 HTTP/1.1");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer secret"));
    }

    #[test]
    fn test_fetch_window_stops_on_short_page() {
        // Only one response: a second request would be refused
        let (base, server) = stub_server(vec![(200, items_page(10..13))]);
        let service = SpotifyService::new(&base, "secret");

        let tracks = service.fetch_window("my list/1", 64, 10).unwrap();
        assert_eq!(tracks.len(), 3);

        let requests = server.join().unwrap();
        assert_eq!(requests.len(), 1);
        // Path segment is escaped, so the decoded line shows the raw id
        assert_eq!(
            requests[0].line,
            "GET /playlists/my list/1/tracks?limit=50&offset=10 HTTP/1.1"
        );
    }

    #[test]
    fn test_player_command_requests() {
        let (base, server) = stub_server(vec![
            (204, String::new()),
            (204, String::new()),
            (204, String::new()),
        ]);
        let service = SpotifyService::new(&base, "secret");

        service.pause().unwrap();
        service.resume().unwrap();
        service.skip().unwrap();

        let lines: Vec<String> = server.join().unwrap().into_iter().map(|r| r.line).collect();
        assert_eq!(
            lines,
            vec![
                "PUT /me/player/pause HTTP/1.1",
                "PUT /me/player/play HTTP/1.1",
                "POST /me/player/next HTTP/1.1",
            ]
        );
    }

    #[test]
    fn test_enqueue_request() {
        let (base, server) = stub_server(vec![(204, String::new()), (204, String::new())]);
        let service = SpotifyService::new(&base, "secret");

        service.enqueue("abc", Some("dev1")).unwrap();
        service.enqueue("abc", None).unwrap();

        let requests = server.join().unwrap();
        assert_eq!(
            requests[0].line,
            "POST /me/player/queue?uri=spotify:track:abc&device_id=dev1 HTTP/1.1"
        );
        assert_eq!(requests[1].line, "POST /me/player/queue?uri=spotify:track:abc HTTP/1.1");
    }

    #[test]
    fn test_transfer_playback_body() {
        let (base, server) = stub_server(vec![(204, String::new())]);
        let service = SpotifyService::new(&base, "secret");

        service.transfer_playback("dev1").unwrap();

        let requests = server.join().unwrap();
        assert_eq!(requests[0].line, "PUT /me/player HTTP/1.1");
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body, serde_json::json!({ "device_ids": ["dev1"] }));
    }

    #[test]
    fn test_playback_status_and_errors() {
        let (base, server) = stub_server(vec![
            (204, String::new()),
            (401, r#"{"error": {"status": 401}}"#.to_string()),
        ]);
        let service = SpotifyService::new(&base, "expired");

        assert_eq!(service.playback_status().unwrap(), PlaybackStatus::default());
        let err = service.queue_snapshot().unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Status { operation: "queue_snapshot", status: 401, .. }
        ));

        let requests = server.join().unwrap();
        assert_eq!(requests[0].line, "GET /me/player HTTP/1.1");
        assert_eq!(requests[1].line, "GET /me/player/queue HTTP/1.1");
    }
}
