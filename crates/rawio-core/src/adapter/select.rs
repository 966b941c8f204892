//! Choosing between the full-resolution image and the embedded thumbnail.

use serde::{Deserialize, Serialize};

use super::Size;

/// Which decoder output to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelector {
    FullResolution,
    Thumbnail,
}

/// How a request exactly matching the thumbnail in an axis is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThumbnailTieBreak {
    /// Thumbnail only when the request is strictly smaller in both axes.
    #[default]
    FullResolution,
    /// Thumbnail when the request is smaller than or equal to it in both axes.
    Thumbnail,
}

/// Pick the cheapest source that still covers `requested`.
///
/// Without a request or without a thumbnail the full-resolution image is used.
pub fn select_source(
    _native: Size,
    thumbnail: Option<Size>,
    requested: Option<Size>,
    tie_break: ThumbnailTieBreak,
) -> SourceSelector {
    let (Some(thumb), Some(req)) = (thumbnail, requested) else {
        return SourceSelector::FullResolution;
    };

    let fits = match tie_break {
        ThumbnailTieBreak::FullResolution => req.width < thumb.width && req.height < thumb.height,
        ThumbnailTieBreak::Thumbnail => req.width <= thumb.width && req.height <= thumb.height,
    };

    if fits {
        SourceSelector::Thumbnail
    } else {
        SourceSelector::FullResolution
    }
}
