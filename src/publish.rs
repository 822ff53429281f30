use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    pub video_url: String,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, video: &Path, post_id: &str, caption: &str) -> Result<PublishReceipt>;
}

/// Logs an upload and a post without touching any network.
pub struct SimulatedPublisher;

impl SimulatedPublisher {
    fn upload_video(&self, video: &Path, public_id: &str) -> String {
        info!("Simulating upload of {} with public_id {}", video.display(), public_id);
        format!("http://fake.cloudinary.com/{}.mp4", public_id)
    }

    fn post_reel(&self, video_url: &str, caption: &str) {
        let preview: String = caption.chars().take(100).collect();
        info!("Simulating reel post - url={}, caption='{}...'", video_url, preview);
    }
}

#[async_trait]
impl Publisher for SimulatedPublisher {
    async fn publish(&self, video: &Path, post_id: &str, caption: &str) -> Result<PublishReceipt> {
        let video_url = self.upload_video(video, post_id);
        self.post_reel(&video_url, caption);
        Ok(PublishReceipt { video_url })
    }
}
