// yt-dlp subprocess backend - subtitle download and audio URL resolution

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::transcript::diagnostics::analyze_error;
use crate::transcript::errors::ProviderError;
use crate::transcript::models::{LanguagePreference, VideoRef};
use crate::transcript::providers::subtitles::AUTO_MARKER;
use crate::transcript::traits::{MediaUrlResolver, SubtitleDownloader};
use crate::transcript::utils::run_output_with_timeout;

#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
    proxy: Option<String>,
    cookies_path: Option<String>,
    socket_timeout_secs: u64,
    timeout: Duration,
}

/// Which subtitle flavour a download pass asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubtitlePass {
    Manual,
    Auto,
}

/// Which languages a download pass asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LanguageScope {
    Requested,
    /// Every uploaded track, or only the original-language generated track
    Any,
}

/// Generated captions are offered in every translation; `-orig` is the source track
const ANY_MANUAL_LANGS: &str = "all,-live_chat";
const ANY_AUTO_LANGS: &str = ".*-orig";

impl YtDlp {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            proxy: None,
            cookies_path: None,
            socket_timeout_secs: 15,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies(mut self, cookies_path: Option<String>) -> Self {
        self.cookies_path = cookies_path;
        self
    }

    pub fn with_socket_timeout(mut self, secs: u64) -> Self {
        self.socket_timeout_secs = secs;
        self
    }

    /// Wall-clock limit for one yt-dlp invocation
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--no-update".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout_secs.to_string(),
        ];

        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        if let Some(path) = &self.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.clone());
        }

        args
    }

    fn subtitle_args(
        &self,
        video: &VideoRef,
        prefs: &LanguagePreference,
        dir: &Path,
        pass: SubtitlePass,
        scope: LanguageScope,
    ) -> Vec<String> {
        let langs = match (scope, pass) {
            (LanguageScope::Requested, _) => prefs.tags().join(","),
            (LanguageScope::Any, SubtitlePass::Manual) => ANY_MANUAL_LANGS.to_string(),
            (LanguageScope::Any, SubtitlePass::Auto) => ANY_AUTO_LANGS.to_string(),
        };
        let (flag, template) = match pass {
            SubtitlePass::Manual => ("--write-subs", "%(id)s.%(ext)s".to_string()),
            SubtitlePass::Auto => (
                "--write-auto-subs",
                format!("%(id)s{}%(ext)s", AUTO_MARKER),
            ),
        };

        let mut args = self.common_args();
        args.extend([
            "--skip-download".to_string(),
            flag.to_string(),
            "--sub-format".to_string(),
            "vtt".to_string(),
            "--sub-langs".to_string(),
            langs,
            "-o".to_string(),
            dir.join(template).to_string_lossy().to_string(),
            video.watch_url(),
        ]);
        args
    }

    async fn run(&self, args: &[String]) -> Result<std::process::Output, ProviderError> {
        let output = run_output_with_timeout(&self.binary, args, self.timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostics = analyze_error(&stderr);
            warn!(
                reason = ?diagnostics.reason,
                context = ?diagnostics.context,
                "yt-dlp exited with {}",
                output.status
            );
            return Err(ProviderError::from(stderr.to_string()));
        }

        Ok(output)
    }

    async fn download_pass(
        &self,
        video: &VideoRef,
        prefs: &LanguagePreference,
        dir: &Path,
        pass: SubtitlePass,
        scope: LanguageScope,
    ) -> Result<Vec<PathBuf>, ProviderError> {
        let args = self.subtitle_args(video, prefs, dir, pass, scope);
        debug!(?pass, ?scope, video = %video.canonical_id(), "Running yt-dlp subtitle pass");
        self.run(&args).await?;
        list_vtt_files(dir, pass == SubtitlePass::Auto).await
    }
}

/// `.vtt` files in `dir`, filtered on whether they carry the auto marker
async fn list_vtt_files(dir: &Path, auto: bool) -> Result<Vec<PathBuf>, ProviderError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ProviderError::Internal(format!("Failed to list {}: {}", dir.display(), e)))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ProviderError::Internal(format!("Failed to list {}: {}", dir.display(), e)))?
    {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".vtt") && name.contains(AUTO_MARKER) == auto {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl SubtitleDownloader for YtDlp {
    async fn download(
        &self,
        video: &VideoRef,
        prefs: &LanguagePreference,
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ProviderError> {
        for scope in [LanguageScope::Requested, LanguageScope::Any] {
            let manual = self
                .download_pass(video, prefs, dir, SubtitlePass::Manual, scope)
                .await?;
            if !manual.is_empty() {
                info!(count = manual.len(), ?scope, "yt-dlp wrote manual subtitles");
                return Ok(manual);
            }

            let auto = self
                .download_pass(video, prefs, dir, SubtitlePass::Auto, scope)
                .await?;
            if !auto.is_empty() {
                info!(count = auto.len(), ?scope, "yt-dlp wrote generated subtitles");
                return Ok(auto);
            }
        }

        info!(video = %video.canonical_id(), "yt-dlp wrote no subtitles in any language");
        Ok(Vec::new())
    }
}

#[async_trait]
impl MediaUrlResolver for YtDlp {
    async fn resolve_audio_url(&self, video: &VideoRef) -> Result<String, ProviderError> {
        let mut args = self.common_args();
        args.extend([
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "-g".to_string(),
            video.watch_url(),
        ]);

        let output = self.run(&args).await?;
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with("http"))
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Unavailable("yt-dlp returned no audio URL".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::video_id::normalize;

    fn video() -> VideoRef {
        normalize("dQw4w9WgXcQ", true).unwrap()
    }

    #[test]
    fn test_subtitle_args_mark_auto_pass() {
        let ytdlp = YtDlp::new("yt-dlp")
            .with_proxy(Some("socks5h://127.0.0.1:1080".to_string()))
            .with_cookies(Some("/tmp/cookies.txt".to_string()));
        let prefs = LanguagePreference::new(&["de", "en"], &[]);
        let dir = Path::new("/tmp/scratch");

        let manual = ytdlp.subtitle_args(&video(), &prefs, dir, SubtitlePass::Manual, LanguageScope::Requested);
        assert!(manual.contains(&"--write-subs".to_string()));
        assert!(manual.contains(&"de,en".to_string()));
        assert!(manual.contains(&"/tmp/scratch/%(id)s.%(ext)s".to_string()));
        assert!(manual.contains(&"--proxy".to_string()));
        assert!(manual.contains(&"/tmp/cookies.txt".to_string()));
        assert_eq!(manual.last().unwrap(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");

        let auto = ytdlp.subtitle_args(&video(), &prefs, dir, SubtitlePass::Auto, LanguageScope::Requested);
        assert!(auto.contains(&"--write-auto-subs".to_string()));
        assert!(auto.contains(&"/tmp/scratch/%(id)s.auto.%(ext)s".to_string()));
    }

    #[test]
    fn test_any_language_scope_widens_sub_langs() {
        let ytdlp = YtDlp::new("yt-dlp");
        let prefs = LanguagePreference::new(&["de"], &[]);
        let dir = Path::new("/tmp/scratch");

        let manual = ytdlp.subtitle_args(&video(), &prefs, dir, SubtitlePass::Manual, LanguageScope::Any);
        assert!(manual.contains(&"all,-live_chat".to_string()));
        assert!(!manual.contains(&"de".to_string()));

        let auto = ytdlp.subtitle_args(&video(), &prefs, dir, SubtitlePass::Auto, LanguageScope::Any);
        assert!(auto.contains(&".*-orig".to_string()));
    }

    #[tokio::test]
    async fn test_list_vtt_files_splits_on_marker() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["dQw4w9WgXcQ.en.vtt", "dQw4w9WgXcQ.auto.en.vtt", "dQw4w9WgXcQ.info.json"] {
            std::fs::write(dir.path().join(name), "WEBVTT\n").unwrap();
        }

        let manual = list_vtt_files(dir.path(), false).await.unwrap();
        let auto = list_vtt_files(dir.path(), true).await.unwrap();

        assert_eq!(manual.len(), 1);
        assert!(manual[0].ends_with("dQw4w9WgXcQ.en.vtt"));
        assert_eq!(auto.len(), 1);
        assert!(auto[0].ends_with("dQw4w9WgXcQ.auto.en.vtt"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_internal() {
        let ytdlp = YtDlp::new("definitely-not-a-real-binary-xyz");
        let err = ytdlp.resolve_audio_url(&video()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Internal(_)));
    }
}
