//! The two commands exposed to the host and the dispatcher that routes
//! process arguments to them.
//!
//! Each command catches every failure at its own boundary and reports it in
//! the JSON envelope; only usage errors change the exit code.

use crate::client::MusicClient;
use crate::track::Track;
use anyhow::{Context, Error};
use getopts::{Options, ParsingStyle};
use log::*;
use serde::Serialize;

pub const USAGE: &str = "Usage: ytmusic_client <command> <oauth_file> [args...]";

pub const CREATE_PLAYLIST_USAGE: &str =
    "Usage: ytmusic_client create_playlist <oauth_file> <title> <description> [video_ids_json]";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LikedSongsResponse {
    Tracks { tracks: Vec<Track>, count: usize },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlaylistResponse {
    Created { playlist_id: String, success: bool },
    Failed { error: String, success: bool },
}

#[derive(Debug, Serialize)]
struct UsageError {
    error: String,
}

/// What the process should print and exit with.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub json: String,
    pub exit_code: i32,
}

impl Outcome {
    fn ok<T: Serialize>(rsp: &T) -> Result<Outcome, Error> {
        Ok(Outcome {
            json: serde_json::to_string(rsp).context("json serialize")?,
            exit_code: 0,
        })
    }

    pub fn usage(msg: String) -> Result<Outcome, Error> {
        Ok(Outcome {
            json: serde_json::to_string(&UsageError { error: msg }).context("json serialize")?,
            exit_code: 1,
        })
    }
}

/// Fetches all liked songs through a client built by `connect`.
pub async fn get_liked_songs<C, F>(connect: F, oauth_file: &str) -> LikedSongsResponse
where
    C: MusicClient,
    F: FnOnce(&str) -> Result<C, Error>,
{
    match fetch_liked_songs(connect, oauth_file).await {
        Ok(tracks) => {
            info!("retrieved {} liked songs", tracks.len());
            LikedSongsResponse::Tracks {
                count: tracks.len(),
                tracks,
            }
        }
        Err(e) => {
            error!("get liked songs: {:#}", e);
            LikedSongsResponse::Error {
                error: format!("{:#}", e),
            }
        }
    }
}

async fn fetch_liked_songs<C, F>(connect: F, oauth_file: &str) -> Result<Vec<Track>, Error>
where
    C: MusicClient,
    F: FnOnce(&str) -> Result<C, Error>,
{
    let client = connect(oauth_file)?;
    let songs = client.liked_songs().await?;
    Ok(songs.iter().map(Track::from).collect())
}

/// Creates a playlist and, when `video_ids` is non-empty, appends them in order.
///
/// The two upstream calls are not atomic. If appending fails the playlist
/// already exists; its id is only logged, the envelope reports the failure.
pub async fn create_playlist<C, F>(
    connect: F,
    oauth_file: &str,
    title: &str,
    description: &str,
    video_ids: &[String],
) -> PlaylistResponse
where
    C: MusicClient,
    F: FnOnce(&str) -> Result<C, Error>,
{
    match build_playlist(connect, oauth_file, title, description, video_ids).await {
        Ok(playlist_id) => PlaylistResponse::Created {
            playlist_id,
            success: true,
        },
        Err(e) => {
            error!("create playlist: {:#}", e);
            PlaylistResponse::Failed {
                error: format!("{:#}", e),
                success: false,
            }
        }
    }
}

async fn build_playlist<C, F>(
    connect: F,
    oauth_file: &str,
    title: &str,
    description: &str,
    video_ids: &[String],
) -> Result<String, Error>
where
    C: MusicClient,
    F: FnOnce(&str) -> Result<C, Error>,
{
    let client = connect(oauth_file)?;
    let playlist_id = client.create_playlist(title, description).await?;
    info!("created playlist {}", playlist_id);

    if !video_ids.is_empty() {
        if let Err(e) = client.add_playlist_items(&playlist_id, video_ids).await {
            warn!(
                "playlist {} was created but adding {} items failed",
                playlist_id,
                video_ids.len()
            );
            return Err(e);
        }
        info!("added {} items to {}", video_ids.len(), playlist_id);
    }

    Ok(playlist_id)
}

/// Process arguments after option parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub verbose: bool,
    pub free: Vec<String>,
}

/// Parses leading options from `args` (without the program name). Anything
/// from the command onwards is kept verbatim, so titles may start with `-`.
/// An unknown option yields a usage outcome.
pub fn parse_options(args: &[String]) -> Result<Invocation, Outcome> {
    let mut opts = Options::new();
    opts.parsing_style(ParsingStyle::StopAtFirstFree);
    opts.optflag("v", "verbose", "log at debug level");

    match opts.parse(args) {
        Ok(m) => Ok(Invocation {
            verbose: m.opt_present("v"),
            free: m.free,
        }),
        Err(e) => Err(Outcome {
            json: serde_json::json!({ "error": e.to_string() }).to_string(),
            exit_code: 1,
        }),
    }
}

/// Routes `args` (the free arguments after the program name) to a command.
///
/// Returns `Err` only when the optional video id list is not valid JSON;
/// the caller is expected to treat that as a crash.
pub async fn dispatch<C, F>(args: &[String], connect: F) -> Result<Outcome, Error>
where
    C: MusicClient,
    F: FnOnce(&str) -> Result<C, Error>,
{
    if args.len() < 2 {
        return Outcome::usage(USAGE.to_string());
    }
    let command = args[0].as_str();
    let oauth_file = args[1].as_str();

    match command {
        "get_liked_songs" => Outcome::ok(&get_liked_songs(connect, oauth_file).await),
        "create_playlist" => {
            if args.len() < 4 {
                return Outcome::usage(CREATE_PLAYLIST_USAGE.to_string());
            }
            let video_ids = match args.get(4) {
                Some(raw) => parse_video_ids(raw)?,
                None => Vec::new(),
            };
            let rsp = create_playlist(connect, oauth_file, &args[2], &args[3], &video_ids).await;
            Outcome::ok(&rsp)
        }
        _ => Outcome::usage(format!("Unknown command: {}", command)),
    }
}

/// `null` is accepted as an empty list.
fn parse_video_ids(raw: &str) -> Result<Vec<String>, Error> {
    let ids: Option<Vec<String>> = serde_json::from_str(raw).context("parse video ids")?;
    Ok(ids.unwrap_or_default())
}
