//! CAPTCHA images.
//!
//! The backend sends the challenge as a `data:` URI. A terminal cannot show
//! it inline, so each challenge is written to a file in the CAPTCHA directory
//! (replacing the previous one) and can be opened with an external viewer.

use crate::config::{expand_home, CaptchaConfig};
use crate::portal::types::Captcha;
use crate::session::SessionRef;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;

const FILE_STEM: &str = "captcha";

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("CAPTCHA image is not a data URI")]
    NotDataUri,
    #[error("CAPTCHA image has no payload")]
    MissingPayload,
    #[error("CAPTCHA image is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("CAPTCHA image is empty")]
    Empty,
}

/// A decoded `data:` URI.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn parse(input: &str) -> Result<Self, CaptchaError> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or(CaptchaError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(CaptchaError::MissingPayload)?;

        let mut params = header.split(';');
        let mime = params
            .next()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("text/plain")
            .to_ascii_lowercase();
        let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        let bytes = if is_base64 {
            let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD.decode(cleaned)?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };

        if bytes.is_empty() {
            return Err(CaptchaError::Empty);
        }
        Ok(Self { mime, bytes })
    }

    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "img",
        }
    }
}

impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUri")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What the login screen shows for a CAPTCHA.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptchaView {
    pub session: SessionRef,
    /// `None` if there was no image or it could not be written.
    pub path: Option<PathBuf>,
    pub mime: String,
    pub size: usize,
}

/// Writes CAPTCHA images to disk and launches the viewer.
#[derive(Debug, Clone)]
pub struct CaptchaStore {
    dir: PathBuf,
    open_with: Option<String>,
    auto_open: bool,
}

impl CaptchaStore {
    pub fn new(config: &CaptchaConfig) -> Self {
        Self {
            dir: expand_home(&config.dir),
            open_with: config.open_with.clone().filter(|cmd| !cmd.trim().is_empty()),
            auto_open: config.auto_open,
        }
    }

    /// Write the challenge image and describe it for the login screen.
    ///
    /// Failures are logged and leave `path` empty so the screen falls back
    /// to its placeholder; the session reference is kept either way.
    pub fn show(&self, captcha: Captcha) -> CaptchaView {
        let Some(image) = captcha.image else {
            return CaptchaView {
                session: captcha.session,
                path: None,
                mime: String::new(),
                size: 0,
            };
        };

        let path = match self.write(&image) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), size = image.bytes.len(), "captcha written");
                if self.auto_open {
                    if let Err(e) = self.open(&path) {
                        tracing::warn!(error = %e, "failed to open captcha viewer");
                    }
                }
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, dir = %self.dir.display(), "failed to write captcha image");
                None
            }
        };

        CaptchaView {
            session: captcha.session,
            path,
            mime: image.mime,
            size: image.bytes.len(),
        }
    }

    fn write(&self, image: &DataUri) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        self.remove_stale()?;
        let path = self.dir.join(format!("{}.{}", FILE_STEM, image.extension()));
        fs::write(&path, &image.bytes)?;
        Ok(path)
    }

    // A new challenge may come with a different format than the last one.
    fn remove_stale(&self) -> std::io::Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(FILE_STEM) {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Launch the configured viewer on `path` without waiting for it.
    pub fn open(&self, path: &Path) -> std::io::Result<()> {
        let Some(ref command) = self.open_with else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no CAPTCHA viewer configured (captcha.open_with)",
            ));
        };
        let mut parts = command.split_whitespace();
        let program = parts.next().unwrap_or_default();
        tokio::process::Command::new(program)
            .args(parts)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // 1x1 transparent PNG
    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    fn store_in(dir: &Path) -> CaptchaStore {
        CaptchaStore::new(&CaptchaConfig {
            dir: dir.display().to_string(),
            open_with: None,
            auto_open: false,
        })
    }

    #[test]
    fn test_parse_base64_png() {
        let uri = DataUri::parse(PNG_URI).unwrap();
        assert_eq!(uri.mime, "image/png");
        assert_eq!(&uri.bytes[1..4], b"PNG");
        assert_eq!(uri.extension(), "png");
    }

    #[test]
    fn test_parse_percent_encoded_svg() {
        let uri = DataUri::parse("data:image/svg+xml,%3Csvg%3E%3C%2Fsvg%3E").unwrap();
        assert_eq!(uri.mime, "image/svg+xml");
        assert_eq!(uri.bytes, b"<svg></svg>");
        assert_eq!(uri.extension(), "svg");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(DataUri::parse("http://x/captcha.png"), Err(CaptchaError::NotDataUri)));
        assert!(matches!(DataUri::parse("data:image/png;base64"), Err(CaptchaError::MissingPayload)));
        assert!(matches!(DataUri::parse("data:image/png;base64,@@@"), Err(CaptchaError::Base64(_))));
        assert!(matches!(DataUri::parse("data:image/png;base64,"), Err(CaptchaError::Empty)));
        assert!(matches!(DataUri::parse(""), Err(CaptchaError::NotDataUri)));
    }

    #[test]
    fn test_show_writes_and_replaces_image() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let first = store.show(Captcha {
            session: SessionRef::new("s1"),
            image: Some(DataUri::parse(PNG_URI).unwrap()),
        });
        let first_path = first.path.clone().unwrap();
        assert!(first_path.ends_with("captcha.png"));
        assert_eq!(first.session, SessionRef::new("s1"));

        let second = store.show(Captcha {
            session: SessionRef::new("s2"),
            image: Some(DataUri {
                mime: "image/jpeg".into(),
                bytes: vec![0xff, 0xd8, 0xff],
            }),
        });
        let second_path = second.path.unwrap();
        assert!(second_path.ends_with("captcha.jpg"));
        assert!(!first_path.exists());
        assert_eq!(fs::read(second_path).unwrap(), vec![0xff, 0xd8, 0xff]);
    }

    #[test]
    fn test_show_without_image_keeps_session() {
        let dir = tempdir().unwrap();
        let view = store_in(dir.path()).show(Captcha {
            session: SessionRef::new("s3"),
            image: None,
        });
        assert_eq!(view.session, SessionRef::new("s3"));
        assert!(view.path.is_none());
    }

    #[test]
    fn test_open_without_viewer_fails() {
        let dir = tempdir().unwrap();
        let err = store_in(dir.path()).open(&dir.path().join("captcha.png")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
