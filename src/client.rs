use crate::config::Config;
use crate::oauth::Credentials;
use anyhow::{bail, Context, Error};
use log::*;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

const USER_AGENT: &str = concat!("ytmusic_client/", env!("CARGO_PKG_VERSION"));

const PAGE_SIZE: &str = "50";

const TOPIC_SUFFIX: &str = " - Topic";

/// A liked track as returned by the music service. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamTrack {
    pub video_id: Option<String>,
    pub duration_seconds: Option<u64>,
    pub title: Option<String>,
    pub artists: Option<Vec<Artist>>,
    /// Ordered smallest to largest.
    pub thumbnails: Option<Vec<Thumbnail>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artist {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thumbnail {
    pub url: Option<String>,
}

/// The three upstream calls the commands need.
#[allow(async_fn_in_trait)]
pub trait MusicClient {
    /// Returns every liked song.
    async fn liked_songs(&self) -> Result<Vec<UpstreamTrack>, Error>;

    /// Creates an empty playlist and returns its id.
    async fn create_playlist(&self, title: &str, description: &str) -> Result<String, Error>;

    async fn add_playlist_items(&self, playlist_id: &str, video_ids: &[String])
        -> Result<(), Error>;
}

/// [`MusicClient`] backed by the YouTube Data API v3.
pub struct YtMusicClient {
    http: HttpClient,
    api_base: String,
    authorization: String,
}

impl YtMusicClient {
    /// Builds a client from the credentials file at `oauth_file`.
    pub fn connect(oauth_file: &str, config: &Config) -> Result<YtMusicClient, Error> {
        let creds = Credentials::load(oauth_file)?;
        if creds.is_expired() {
            warn!("oauth token expired at {}", creds.expiry_string());
        }
        YtMusicClient::new(&creds, config)
    }

    pub fn new(creds: &Credentials, config: &Config) -> Result<YtMusicClient, Error> {
        let http = HttpClient::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("build http client")?;
        Ok(YtMusicClient {
            http,
            api_base: config.api_base.clone(),
            authorization: creds.authorization(),
        })
    }

    fn get(&self, resource: &str) -> RequestBuilder {
        self.http
            .get(format!("{}/{}", self.api_base, resource))
            .header("authorization", &self.authorization)
    }

    fn post(&self, resource: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/{}", self.api_base, resource))
            .header("authorization", &self.authorization)
    }
}

impl MusicClient for YtMusicClient {
    async fn liked_songs(&self) -> Result<Vec<UpstreamTrack>, Error> {
        let mut tracks = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self.get("videos").query(&[
                ("part", "snippet,contentDetails"),
                ("myRating", "like"),
                ("maxResults", PAGE_SIZE),
            ]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }

            let rsp = req.send().await.context("execute request")?;
            let page: VideoListResponse = check_status(rsp)
                .await?
                .json()
                .await
                .context("json deserialize")?;
            debug!("fetched {} liked videos", page.items.len());
            tracks.extend(page.items.into_iter().map(UpstreamTrack::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(tracks)
    }

    async fn create_playlist(&self, title: &str, description: &str) -> Result<String, Error> {
        let body = json!({
            "snippet": { "title": title, "description": description },
            "status": { "privacyStatus": "private" },
        });
        let rsp = self
            .post("playlists")
            .query(&[("part", "snippet,status")])
            .json(&body)
            .send()
            .await
            .context("execute request")?;
        let created: Resource = check_status(rsp)
            .await?
            .json()
            .await
            .context("json deserialize")?;
        Ok(created.id)
    }

    async fn add_playlist_items(
        &self,
        playlist_id: &str,
        video_ids: &[String],
    ) -> Result<(), Error> {
        for video_id in video_ids {
            let body = json!({
                "snippet": {
                    "playlistId": playlist_id,
                    "resourceId": { "kind": "youtube#video", "videoId": video_id },
                },
            });
            let rsp = self
                .post("playlistItems")
                .query(&[("part", "snippet")])
                .json(&body)
                .send()
                .await
                .with_context(|| format!("add {} to {}", video_id, playlist_id))?;
            check_status(rsp)
                .await
                .with_context(|| format!("add {} to {}", video_id, playlist_id))?;
            debug!("added {} to {}", video_id, playlist_id);
        }
        Ok(())
    }
}

async fn check_status(rsp: Response) -> Result<Response, Error> {
    let status = rsp.status();
    if status.is_success() {
        return Ok(rsp);
    }
    let body = rsp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(e) if !e.error.message.is_empty() => {
            bail!("bad status code: {}: {}", status, e.error.message)
        }
        _ => bail!("bad status code: {}", status),
    }
}

/// Parses an ISO-8601 duration such as `PT4M13S`. Fractional values are
/// rejected, as are durations too long to express in milliseconds.
pub fn parse_duration(s: &str) -> Option<u64> {
    let rest = s.strip_prefix('P')?;
    let (date, time) = rest.split_once('T').unwrap_or((rest, ""));
    let date = sum_units(date, &[('W', 7 * 86400), ('D', 86400)])?;
    let time = sum_units(time, &[('H', 3600), ('M', 60), ('S', 1)])?;
    let secs = date.checked_add(time)?;
    secs.checked_mul(1000).map(|_| secs)
}

fn sum_units(s: &str, units: &[(char, u64)]) -> Option<u64> {
    let mut total = 0u64;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let (_, secs) = units.iter().find(|(u, _)| *u == c)?;
        let n: u64 = digits.parse().ok()?;
        total = total.checked_add(n.checked_mul(*secs)?)?;
        digits.clear();
    }
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Resource {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<Video>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Video {
    id: Option<String>,
    snippet: Option<VideoSnippet>,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: Option<String>,
    channel_id: Option<String>,
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<ThumbnailResource>,
    medium: Option<ThumbnailResource>,
    high: Option<ThumbnailResource>,
    standard: Option<ThumbnailResource>,
    maxres: Option<ThumbnailResource>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailResource {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

impl From<Video> for UpstreamTrack {
    fn from(v: Video) -> UpstreamTrack {
        let duration_seconds = v
            .content_details
            .and_then(|d| d.duration)
            .and_then(|d| parse_duration(&d));

        let mut track = UpstreamTrack {
            video_id: v.id,
            duration_seconds,
            ..Default::default()
        };

        if let Some(s) = v.snippet {
            track.title = s.title;
            if s.channel_id.is_some() || s.channel_title.is_some() {
                let name = s
                    .channel_title
                    .map(|t| t.strip_suffix(TOPIC_SUFFIX).map(String::from).unwrap_or(t));
                track.artists = Some(vec![Artist {
                    id: s.channel_id,
                    name,
                }]);
            }
            let t = s.thumbnails;
            let thumbnails: Vec<Thumbnail> = [t.default, t.medium, t.high, t.standard, t.maxres]
                .into_iter()
                .flatten()
                .map(|r| Thumbnail { url: r.url })
                .collect();
            if !thumbnails.is_empty() {
                track.thumbnails = Some(thumbnails);
            }
        }

        track
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> YtMusicClient {
        let creds = Credentials {
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at: None,
            token_type: "Bearer".to_string(),
            scope: None,
        };
        let config = Config::default().with_api_base(&server.url());
        YtMusicClient::new(&creds, &config).unwrap()
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("PT3M25S"), Some(205));
        assert_eq!(parse_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_duration("P1DT1S"), Some(86401));
        assert_eq!(parse_duration("P0D"), Some(0));
        assert_eq!(parse_duration("PT1.5S"), None);
        assert_eq!(parse_duration("PT5"), None);
        assert_eq!(parse_duration("garbage"), None);
        assert_eq!(parse_duration("PT18446744073709552S"), None);
        assert_eq!(parse_duration("PT18446744073709551S"), Some(18446744073709551));
        assert_eq!(parse_duration("P99999999999999999999D"), None);
    }

    #[test]
    fn video_without_snippet() {
        let v: Video = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        let t = UpstreamTrack::from(v);
        assert_eq!(t.video_id.as_deref(), Some("abc"));
        assert_eq!(t.artists, None);
        assert_eq!(t.thumbnails, None);
        assert_eq!(t.duration_seconds, None);
    }

    #[tokio::test]
    async fn liked_songs_follows_pages() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/videos")
            .match_query(Matcher::Regex("maxResults=50$".to_string()))
            .match_header("authorization", "Bearer tok")
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items": [{"id": "v1",
                     "snippet": {"title": "One", "channelId": "UC1", "channelTitle": "Band - Topic",
                                 "thumbnails": {"default": {"url": "s"}, "high": {"url": "l"}}},
                     "contentDetails": {"duration": "PT3M25S"}}],
                    "nextPageToken": "p2"}"#,
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/videos")
            .match_query(Matcher::UrlEncoded("pageToken".into(), "p2".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"items": [{"id": "v2", "snippet": {"title": "Two"}}]}"#)
            .create_async()
            .await;

        let tracks = client(&server).liked_songs().await.unwrap();
        first.assert_async().await;
        second.assert_async().await;

        assert_eq!(tracks.len(), 2);
        assert_eq!(
            tracks[0],
            UpstreamTrack {
                video_id: Some("v1".into()),
                duration_seconds: Some(205),
                title: Some("One".into()),
                artists: Some(vec![Artist {
                    id: Some("UC1".into()),
                    name: Some("Band".into()),
                }]),
                thumbnails: Some(vec![
                    Thumbnail { url: Some("s".into()) },
                    Thumbnail { url: Some("l".into()) },
                ]),
            }
        );
        assert_eq!(tracks[1].video_id.as_deref(), Some("v2"));
        assert_eq!(tracks[1].artists, None);
    }

    #[tokio::test]
    async fn liked_songs_reports_google_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/videos")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": 401, "message": "Invalid Credentials"}}"#)
            .create_async()
            .await;

        let err = client(&server).liked_songs().await.unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "bad status code: 401 Unauthorized: Invalid Credentials"
        );
    }

    #[tokio::test]
    async fn create_playlist_returns_id() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/playlists")
            .match_query(Matcher::UrlEncoded("part".into(), "snippet,status".into()))
            .match_body(Matcher::PartialJson(json!({
                "snippet": { "title": "Focus", "description": "30 minutes" },
                "status": { "privacyStatus": "private" },
            })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"kind": "youtube#playlist", "id": "PL123"}"#)
            .create_async()
            .await;

        let id = client(&server)
            .create_playlist("Focus", "30 minutes")
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(id, "PL123");
    }

    #[tokio::test]
    async fn add_items_stops_at_first_failure() {
        let mut server = mockito::Server::new_async().await;
        let item = |id: &str| {
            Matcher::PartialJson(json!({
                "snippet": { "playlistId": "PL1", "resourceId": { "videoId": id } },
            }))
        };
        let a = server
            .mock("POST", "/playlistItems")
            .match_query(Matcher::Any)
            .match_body(item("a"))
            .with_body(r#"{"id": "i1"}"#)
            .expect(1)
            .create_async()
            .await;
        let b = server
            .mock("POST", "/playlistItems")
            .match_query(Matcher::Any)
            .match_body(item("b"))
            .with_status(404)
            .with_body(r#"{"error": {"message": "Video not found."}}"#)
            .expect(1)
            .create_async()
            .await;
        let c = server
            .mock("POST", "/playlistItems")
            .match_query(Matcher::Any)
            .match_body(item("c"))
            .expect(0)
            .create_async()
            .await;

        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let err = client(&server)
            .add_playlist_items("PL1", &ids)
            .await
            .unwrap_err();
        a.assert_async().await;
        b.assert_async().await;
        c.assert_async().await;
        assert_eq!(
            format!("{:#}", err),
            "add b to PL1: bad status code: 404 Not Found: Video not found."
        );
    }
}
