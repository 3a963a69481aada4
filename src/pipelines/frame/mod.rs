// SPDX-License-Identifier: GPL-3.0-only

//! Frame composer
//!
//! Arranges up to four photos into a styled frame. Composition is pure: it
//! only decides what goes where, the [`render`] module turns the result into
//! pixels.
//!
//! ```text
//! [CapturedImage; 0..=4] + FrameStyle + Layout
//!         │ compose()
//!         ▼
//!     FrameTree (4 slots, geometry, colors)
//!         │ render(scale)
//!         ▼
//!     RgbaImage
//! ```

mod glyphs;
pub mod layout;
pub mod render;
pub mod style;

pub use layout::{FrameGeometry, Layout, Rect};
pub use render::render;
pub use style::{
    ContrastStyle, CustomStyle, FrameStyle, PresetId, ResolvedColors, Rgb, Tone, contrast_style,
};

use crate::constants::SLOT_COUNT;
use crate::pipelines::photo::CapturedImage;

/// Content of one cell of the frame
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Photo(CapturedImage),
    /// Empty cell showing its 1-based position
    Placeholder { number: usize },
}

impl Slot {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Slot::Placeholder { .. })
    }
}

/// A fully arranged frame, ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTree {
    pub layout: Layout,
    pub style: FrameStyle,
    pub colors: ResolvedColors,
    pub geometry: FrameGeometry,
    pub slots: Vec<Slot>,
    pub caption: Option<String>,
}

impl FrameTree {
    /// Attach a footer caption
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        let caption = caption.into();
        self.caption = if caption.trim().is_empty() {
            None
        } else {
            Some(caption)
        };
        self
    }

    /// Number of real photos in the frame
    pub fn photo_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_placeholder()).count()
    }
}

/// Arrange photos into a four-slot frame
///
/// Always yields exactly four slots. Missing photos become numbered
/// placeholders; photos beyond the fourth are ignored.
pub fn compose(images: &[CapturedImage], style: &FrameStyle, layout: Layout) -> FrameTree {
    let slots = (0..SLOT_COUNT)
        .map(|i| match images.get(i) {
            Some(image) => Slot::Photo(image.clone()),
            None => Slot::Placeholder { number: i + 1 },
        })
        .collect();

    FrameTree {
        layout,
        style: *style,
        colors: style.colors(),
        geometry: layout.geometry(),
        slots,
        caption: None,
    }
}

/// Move the element at `from` to `to`, shifting the ones in between
///
/// Returns the input unchanged when either index is out of range or both are
/// equal.
pub fn reorder<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut result = items.to_vec();
    if from == to || from >= items.len() || to >= items.len() {
        return result;
    }
    let item = result.remove(from);
    result.insert(to, item);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn photo(shade: u8) -> CapturedImage {
        CapturedImage::from_pixels(RgbaImage::from_pixel(2, 2, image::Rgba([shade, 0, 0, 255])))
            .unwrap()
    }

    #[test]
    fn test_compose_always_four_slots() {
        let photos: Vec<CapturedImage> = (0..4).map(|i| photo(i * 50)).collect();
        for count in 0..=4 {
            let tree = compose(&photos[..count], &FrameStyle::default(), Layout::Grid2x2);
            assert_eq!(tree.slots.len(), SLOT_COUNT);
            assert_eq!(tree.photo_count(), count);
            for (i, slot) in tree.slots.iter().enumerate().skip(count) {
                assert_eq!(*slot, Slot::Placeholder { number: i + 1 });
            }
        }
    }

    #[test]
    fn test_compose_keeps_order() {
        let photos = vec![photo(10), photo(20)];
        let tree = compose(&photos, &FrameStyle::default(), Layout::Strip1x4);
        assert_eq!(tree.slots[0], Slot::Photo(photos[0].clone()));
        assert_eq!(tree.slots[1], Slot::Photo(photos[1].clone()));
    }

    #[test]
    fn test_compose_geometry_follows_layout_only() {
        let custom = FrameStyle::custom(Rgb::BLACK);
        let a = compose(&[], &FrameStyle::default(), Layout::Strip1x4);
        let b = compose(&[], &custom, Layout::Strip1x4);
        assert_eq!(a.geometry, b.geometry);
        assert_ne!(a.colors, b.colors);
    }

    #[test]
    fn test_caption_blank_is_dropped() {
        let tree = compose(&[], &FrameStyle::default(), Layout::Grid2x2).with_caption("   ");
        assert!(tree.caption.is_none());
    }

    #[test]
    fn test_reorder_moves_and_shifts() {
        assert_eq!(reorder(&[1, 2, 3, 4], 0, 2), vec![2, 3, 1, 4]);
        assert_eq!(reorder(&[1, 2, 3, 4], 3, 1), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_reorder_invalid_is_identity() {
        assert_eq!(reorder(&[1, 2, 3], 1, 1), vec![1, 2, 3]);
        assert_eq!(reorder(&[1, 2, 3], 5, 0), vec![1, 2, 3]);
        assert_eq!(reorder(&[1, 2, 3], 0, 3), vec![1, 2, 3]);
        assert!(reorder::<u8>(&[], 0, 1).is_empty());
    }

    #[test]
    fn test_reorder_inverse_restores_input() {
        let items = vec!["a", "b", "c", "d"];
        for i in 0..items.len() {
            for j in 0..items.len() {
                if i == j {
                    continue;
                }
                assert_eq!(reorder(&reorder(&items, i, j), j, i), items, "i={} j={}", i, j);
            }
        }
    }
}
