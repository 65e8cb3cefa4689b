use url::Url;

/// Output format of a single task, as reported by the server's `mode` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskMode {
    /// Subtitle file only. The server defaults to this mode.
    #[default]
    Srt,
    /// Video with burned-in subtitles.
    Video,
}

impl TaskMode {
    /// Anything other than `srt` is served from the video download route.
    pub fn from_wire(mode: Option<&str>) -> Self {
        match mode.map(str::trim) {
            None | Some("srt") => TaskMode::Srt,
            Some(_) => TaskMode::Video,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadLabel {
    File,
    FilePendingCleanup,
    AllFiles,
}

impl DownloadLabel {
    pub fn text(self) -> &'static str {
        match self {
            DownloadLabel::File => "Download file",
            DownloadLabel::FilePendingCleanup => "Download file (pending cleanup)",
            DownloadLabel::AllFiles => "Download all files",
        }
    }
}

/// A download anchor rendered on terminal success. The tracker never fetches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: String,
    pub label: DownloadLabel,
}

impl DownloadLink {
    pub fn for_task(mode: TaskMode, filename: &str, label: DownloadLabel) -> Self {
        let route = match mode {
            TaskMode::Srt => "srt",
            TaskMode::Video => "video",
        };
        Self {
            href: format!("/api/download/{route}/{filename}"),
            label,
        }
    }

    pub fn for_batch(batch_id: &str) -> Self {
        Self {
            href: format!("/api/batch/download/{batch_id}"),
            label: DownloadLabel::AllFiles,
        }
    }

    /// Resolves the server-relative `href` against the API base URL.
    pub fn resolve(&self, base: &Url) -> Result<Url, url::ParseError> {
        base.join(&self.href)
    }
}
