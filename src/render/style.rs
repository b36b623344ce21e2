use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const REGULAR_FONT_FILE: &str = "DejaVuSans.ttf";
pub const BOLD_FONT_FILE: &str = "DejaVuSans-Bold.ttf";
pub const LOGO_FILE: &str = "logo.png";

#[derive(Clone)]
pub enum FontSource {
    /// TrueType regular + bold faces embedded into the document.
    Embedded { regular: Vec<u8>, bold: Vec<u8> },
    /// Helvetica from the PDF base-14 set.
    Builtin,
}

/// Fonts and logo resolved once before rendering starts.
///
/// Rendering never touches the filesystem for assets; whatever the probe
/// found (or did not find) is what every page uses.
#[derive(Clone)]
pub struct StyleProfile {
    pub fonts: FontSource,
    pub logo: Option<Vec<u8>>,
}

impl StyleProfile {
    /// Looks for fonts and logo under `assets_dir`. Missing files are not errors.
    pub fn probe(assets_dir: &Path) -> Self {
        let regular = read_asset(&assets_dir.join(REGULAR_FONT_FILE));
        let bold = read_asset(&assets_dir.join(BOLD_FONT_FILE));

        let fonts = match (regular, bold) {
            (Some(regular), Some(bold)) => FontSource::Embedded { regular, bold },
            _ => {
                warn!(
                    assets = %assets_dir.display(),
                    "Unicode fonts not found, falling back to Helvetica"
                );
                FontSource::Builtin
            }
        };

        let logo = read_asset(&assets_dir.join(LOGO_FILE));
        if logo.is_none() {
            debug!(assets = %assets_dir.display(), "No logo found, header band without image");
        }

        Self { fonts, logo }
    }

    pub fn builtin() -> Self {
        Self {
            fonts: FontSource::Builtin,
            logo: None,
        }
    }

    pub fn has_embedded_fonts(&self) -> bool {
        matches!(self.fonts, FontSource::Embedded { .. })
    }
}

impl fmt::Debug for StyleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleProfile")
            .field("embedded_fonts", &self.has_embedded_fonts())
            .field("logo_bytes", &self.logo.as_ref().map(Vec::len))
            .finish()
    }
}

fn read_asset(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => {
            warn!(path = %path.display(), "Asset is empty, ignoring");
            None
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Asset unreadable, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_assets_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let style = StyleProfile::probe(&dir.path().join("does-not-exist"));
        assert!(!style.has_embedded_fonts());
        assert!(style.logo.is_none());
    }

    #[test]
    fn half_a_font_family_is_not_enough() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(REGULAR_FONT_FILE), b"ttf").unwrap();
        let style = StyleProfile::probe(dir.path());
        assert!(!style.has_embedded_fonts());
    }

    #[test]
    fn finds_logo_and_fonts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(REGULAR_FONT_FILE), b"regular").unwrap();
        fs::write(dir.path().join(BOLD_FONT_FILE), b"bold").unwrap();
        fs::write(dir.path().join(LOGO_FILE), b"png").unwrap();

        let style = StyleProfile::probe(dir.path());
        assert!(style.has_embedded_fonts());
        assert_eq!(style.logo.as_deref(), Some(&b"png"[..]));
    }
}
