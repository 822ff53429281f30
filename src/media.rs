use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result, Stage};

const FALLBACK_VIDEO_QUERY: &str = "abstract technology";
const JAMENDO_TAGS: &str = "electronic,ambient,tech,corporate,future";

#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub credit: String,
}

#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch_video(&self, query: &str) -> Result<MediaAsset>;
    async fn fetch_music(&self, query: &str) -> Result<MediaAsset>;
}

/// Pexels for footage, Jamendo for music with a local folder as fallback.
pub struct StockMediaSource {
    client: reqwest::Client,
    pexels_key: Option<String>,
    jamendo_client_id: Option<String>,
    cache_dir: PathBuf,
    audio_dir: PathBuf,
}

impl StockMediaSource {
    pub fn from_env(cache_dir: PathBuf, audio_dir: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            pexels_key: non_empty_env("PEXELS_API_KEY"),
            jamendo_client_id: non_empty_env("JAMENDO_CLIENT_ID"),
            cache_dir,
            audio_dir,
        }
    }

    async fn search_pexels(&self, key: &str, query: &str) -> Result<Vec<PexelsVideo>> {
        let response = self
            .client
            .get("https://api.pexels.com/videos/search")
            .header(AUTHORIZATION, key)
            .query(&[("query", query), ("per_page", "15"), ("orientation", "portrait")])
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| EngineError::unavailable(Stage::Media, format!("Pexels request failed: {}", err)))?;
        let body: PexelsSearch = response
            .json()
            .await
            .map_err(|err| EngineError::unavailable(Stage::Media, format!("Pexels response parse failed: {}", err)))?;
        Ok(body.videos)
    }

    async fn jamendo_music(&self, client_id: &str) -> Result<MediaAsset> {
        info!("Fetching music from Jamendo");
        let response = self
            .client
            .get("https://api.jamendo.com/v3.0/tracks/")
            .query(&[
                ("client_id", client_id),
                ("format", "json"),
                ("limit", "50"),
                ("tags", JAMENDO_TAGS),
                ("order", "popularity_month"),
            ])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| EngineError::unavailable(Stage::Media, format!("Jamendo request failed: {}", err)))?;
        let body: JamendoResponse = response
            .json()
            .await
            .map_err(|err| EngineError::unavailable(Stage::Media, format!("Jamendo response parse failed: {}", err)))?;

        let tracks: Vec<JamendoTrack> = body
            .results
            .into_iter()
            .filter(|track| !track.audio.is_empty())
            .collect();
        let track = tracks
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| EngineError::unavailable(Stage::Media, "Jamendo returned no tracks"))?;

        let file_name = format!("jamendo_{}.mp3", track.id);
        let path = self.download(&track.audio, &file_name).await?;
        Ok(MediaAsset {
            path,
            credit: track
                .artist_name
                .unwrap_or_else(|| "Jamendo Artist".to_string()),
        })
    }

    async fn download(&self, url: &str, file_name: &str) -> Result<PathBuf> {
        let path = self.cache_dir.join(file_name);
        if path.exists() {
            debug!("Using cached media: {}", file_name);
            return Ok(path);
        }
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let mut response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| EngineError::unavailable(Stage::Media, format!("download of {} failed: {}", url, err)))?;

        let tmp_path = path.with_extension("part");
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| EngineError::unavailable(Stage::Media, format!("download of {} failed: {}", url, err)))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, &path).await?;
        info!("Downloaded media: {}", file_name);
        Ok(path)
    }
}

#[async_trait]
impl MediaSource for StockMediaSource {
    async fn fetch_video(&self, query: &str) -> Result<MediaAsset> {
        let key = self
            .pexels_key
            .as_deref()
            .ok_or_else(|| EngineError::unavailable(Stage::Media, "PEXELS_API_KEY is not set"))?;

        let mut videos = self.search_pexels(key, query).await?;
        if videos.is_empty() && query != FALLBACK_VIDEO_QUERY {
            info!("No videos found for '{}', trying '{}'", query, FALLBACK_VIDEO_QUERY);
            videos = self.search_pexels(key, FALLBACK_VIDEO_QUERY).await?;
        }

        let picked = {
            let mut rng = rand::thread_rng();
            videos.choose(&mut rng).and_then(|video| {
                video
                    .video_files
                    .choose(&mut rng)
                    .map(|file| (video.id, file.link.clone(), video.user.name.clone()))
            })
        };
        let (id, link, credit) =
            picked.ok_or_else(|| EngineError::unavailable(Stage::Media, "no videos found"))?;

        let path = self.download(&link, &format!("pexels_{}.mp4", id)).await?;
        Ok(MediaAsset { path, credit })
    }

    /// The query is not used by either music backend.
    async fn fetch_music(&self, _query: &str) -> Result<MediaAsset> {
        if let Some(client_id) = self.jamendo_client_id.as_deref() {
            match self.jamendo_music(client_id).await {
                Ok(asset) => return Ok(asset),
                Err(err) => warn!("Jamendo failed, falling back to local music: {}", err),
            }
        }
        local_music(&self.audio_dir)
    }
}

/// Random `.mp3`/`.wav` from `dir`; the credit is the file stem.
pub fn local_music(dir: &Path) -> Result<MediaAsset> {
    let entries = std::fs::read_dir(dir).map_err(|err| {
        EngineError::unavailable(Stage::Media, format!("cannot read {}: {}", dir.display(), err))
    })?;
    let mut tracks: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "mp3" | "wav"))
                .unwrap_or(false)
        })
        .collect();
    tracks.sort();

    let track = tracks
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| {
            EngineError::unavailable(Stage::Media, format!("no music files in {}", dir.display()))
        })?;
    let credit = track
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!("Selected local music: {}", track.display());
    Ok(MediaAsset { path: track, credit })
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Deserialize)]
struct PexelsSearch {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Deserialize)]
struct PexelsVideo {
    id: u64,
    user: PexelsUser,
    video_files: Vec<PexelsFile>,
}

#[derive(Deserialize)]
struct PexelsUser {
    name: String,
}

#[derive(Deserialize)]
struct PexelsFile {
    link: String,
}

#[derive(Deserialize)]
struct JamendoResponse {
    #[serde(default)]
    results: Vec<JamendoTrack>,
}

#[derive(Deserialize, Clone)]
struct JamendoTrack {
    id: String,
    #[serde(default)]
    audio: String,
    artist_name: Option<String>,
}
