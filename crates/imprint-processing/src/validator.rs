use image::ImageFormat;
use imprint_core::is_heic;
use std::path::Path;

/// What the batch driver should do with a file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// HEIC/HEIF photographs, which the decoder cannot read yet
    Heic,
    /// A raster image the decoder supports
    Supported { mime: String },
    /// Anything else
    Unsupported { mime: String },
}

/// Source file filter
///
/// Classifies directory entries by name and by sniffed content, so a mislabelled
/// extension never decides whether a file is processed.
pub struct SourceFilter;

impl SourceFilter {
    /// Dot-files such as `.DS_Store`, which are never read.
    pub fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
    }

    pub fn classify(path: &Path, data: &[u8]) -> SourceKind {
        let Some(kind) = infer::get(data) else {
            return SourceKind::Unsupported {
                mime: "application/octet-stream".to_string(),
            };
        };

        let mime = kind.mime_type();
        if is_heic(mime) {
            return SourceKind::Heic;
        }

        let decodable = kind.matcher_type() == infer::MatcherType::Image
            && ImageFormat::from_mime_type(mime)
                .map(|format| format.reading_enabled())
                .unwrap_or(false);

        if decodable {
            SourceKind::Supported {
                mime: mime.to_string(),
            }
        } else {
            tracing::debug!(
                file = %path.display(),
                mime = mime,
                "Content type not supported by decoder"
            );
            SourceKind::Unsupported {
                mime: mime.to_string(),
            }
        }
    }
}
