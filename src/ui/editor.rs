/// Editor panel shown on top of the viewer
use std::sync::Arc;

use iced::widget::{button, column, container, image, pick_list, row, slider, text, Space};
use iced::{Alignment, Color, ContentFit, Element, Length};
use ::image::DynamicImage;

use crate::gallery::item::ItemId;
use crate::state::edit::{CropPreset, EditOps, Encoding, Filter, SaveFormat, DEFAULT_QUALITY, QUALITY_RANGE};
use crate::Message;

/// Longest side of the preview image
const PREVIEW_SIZE: u32 = 1600;

#[derive(Debug, Clone)]
pub struct EditorState {
    pub item: ItemId,
    /// Full resolution source, used for crop geometry
    source: Option<Arc<DynamicImage>>,
    /// Downscaled copy the preview is rendered from
    preview_base: Option<Arc<DynamicImage>>,
    pub ops: EditOps,
    pub crop: CropPreset,
    preview: Option<image::Handle>,
    revision: u64,
    pub saving: bool,
    /// "Save as" output
    pub format: SaveFormat,
    pub quality: u8,
}

impl EditorState {
    pub fn new(item: ItemId) -> Self {
        Self {
            item,
            source: None,
            preview_base: None,
            ops: EditOps::new(),
            crop: CropPreset::Original,
            preview: None,
            revision: 0,
            saving: false,
            format: SaveFormat::default(),
            quality: DEFAULT_QUALITY,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.source.is_some()
    }

    pub fn set_source(&mut self, source: Arc<DynamicImage>) {
        let base = if source.width() > PREVIEW_SIZE || source.height() > PREVIEW_SIZE {
            Arc::new(source.thumbnail(PREVIEW_SIZE, PREVIEW_SIZE))
        } else {
            source.clone()
        };
        self.preview_base = Some(base);
        self.source = Some(source);
    }

    /// Edits with the crop preset resolved against an image of the given size
    pub fn ops_for(&self, width: u32, height: u32) -> EditOps {
        EditOps {
            crop: self.crop.rect_for(width, height),
            ..self.ops
        }
    }

    /// Edits to apply to the full resolution file
    pub fn full_ops(&self) -> Option<EditOps> {
        self.source.as_ref().map(|s| self.ops_for(s.width(), s.height()))
    }

    pub fn save_as_encoding(&self) -> Encoding {
        Encoding::Chosen {
            format: self.format,
            quality: self.quality,
        }
    }

    pub fn is_unedited(&self) -> bool {
        self.ops.is_unedited() && self.crop == CropPreset::Original
    }

    pub fn reset(&mut self) {
        self.ops.reset();
        self.crop = CropPreset::Original;
    }

    /// Start a new preview render; returns what it needs and its revision
    pub fn next_preview(&mut self) -> Option<(Arc<DynamicImage>, EditOps, u64)> {
        let base = self.preview_base.clone()?;
        self.revision += 1;
        let ops = self.ops_for(base.width(), base.height());
        Some((base, ops, self.revision))
    }

    /// Store a finished preview unless a newer one was requested meanwhile
    pub fn set_preview(&mut self, revision: u64, handle: image::Handle) -> bool {
        if revision != self.revision {
            return false;
        }
        self.preview = Some(handle);
        true
    }
}

/// Render the preview pixels; CPU heavy, call from `spawn_blocking`
pub fn render_preview(base: &DynamicImage, ops: &EditOps) -> image::Handle {
    let edited = ops.apply(base).to_rgba8();
    let (width, height) = edited.dimensions();
    image::Handle::from_rgba(width, height, edited.into_raw())
}

pub fn view(editor: &EditorState) -> Element<'_, Message> {
    let stage: Element<'_, Message> = match &editor.preview {
        Some(handle) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .content_fit(ContentFit::Contain)
            .into(),
        None => container(text("Preparing editor…").size(16))
            .center(Length::Fill)
            .into(),
    };

    let ready = editor.is_ready() && !editor.saving;
    let tools = row![
        button("⟲").on_press_maybe(ready.then_some(Message::RotateLeft)),
        button("⟳").on_press_maybe(ready.then_some(Message::RotateRight)),
        button("⇋").on_press_maybe(ready.then_some(Message::FlipHorizontal)),
        button("⇵").on_press_maybe(ready.then_some(Message::FlipVertical)),
        pick_list(Filter::PRESETS, Some(editor.ops.filter), Message::FilterSelected),
        pick_list(CropPreset::ALL, Some(editor.crop), Message::CropSelected),
        button("Reset").on_press_maybe((ready && !editor.is_unedited()).then_some(Message::ResetEdits)),
        Space::with_width(Length::Fill),
        button(if editor.saving { "Saving…" } else { "Overwrite original" })
            .on_press_maybe((ready && !editor.is_unedited()).then_some(Message::SaveOverwrite)),
        button("Cancel").on_press(Message::CloseEditor),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let mut output = row![
        text("Save as").size(13),
        pick_list(SaveFormat::ALL, Some(editor.format), Message::FormatSelected),
    ]
    .spacing(8)
    .align_y(Alignment::Center);
    if editor.format.uses_quality() {
        output = output.push(text(format!("Quality {}", editor.quality)).size(13)).push(
            slider(QUALITY_RANGE, editor.quality, Message::QualityChanged).width(Length::Fixed(160.0)),
        );
    }
    output = output.push(button("Save as…").on_press_maybe(ready.then_some(Message::SaveAs)));

    container(column![tools, output, stage].spacing(10).padding(16))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|_| container::Style {
            background: Some(Color::from_rgb(0.08, 0.08, 0.09).into()),
            ..container::Style::default()
        })
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::item::Item;
    use crate::gallery::testing::discovered;
    use crate::state::edit::Rotation;

    fn editor_with(width: u32, height: u32) -> EditorState {
        let mut editor = EditorState::new(Item::new(discovered("e.png")).id());
        editor.set_source(Arc::new(DynamicImage::new_rgba8(width, height)));
        editor
    }

    #[test]
    fn test_crop_resolves_per_image_size() {
        let mut editor = editor_with(4000, 2000);
        editor.crop = CropPreset::Square;

        let full = editor.full_ops().unwrap();
        assert_eq!(full.crop.unwrap().width, 2000);

        let (base, ops, _) = editor.next_preview().unwrap();
        assert_eq!(base.width(), PREVIEW_SIZE);
        assert_eq!(ops.crop.unwrap().width, PREVIEW_SIZE / 2);
    }

    #[test]
    fn test_stale_preview_is_dropped() {
        let mut editor = editor_with(10, 10);
        let (base, ops, first) = editor.next_preview().unwrap();
        editor.ops.rotation = Rotation::Cw90;
        let (_, _, second) = editor.next_preview().unwrap();

        let handle = render_preview(&base, &ops);
        assert!(!editor.set_preview(first, handle.clone()));
        assert!(editor.set_preview(second, handle));
    }

    #[test]
    fn test_save_as_defaults_to_jpeg() {
        let mut editor = editor_with(10, 10);
        assert_eq!(
            editor.save_as_encoding(),
            Encoding::Chosen {
                format: SaveFormat::Jpeg,
                quality: DEFAULT_QUALITY,
            }
        );
        editor.format = SaveFormat::Png;
        editor.quality = 50;
        assert!(matches!(
            editor.save_as_encoding(),
            Encoding::Chosen {
                format: SaveFormat::Png,
                quality: 50
            }
        ));
    }

    #[test]
    fn test_unedited_includes_crop() {
        let mut editor = editor_with(10, 10);
        assert!(editor.is_unedited());
        editor.crop = CropPreset::Portrait;
        assert!(!editor.is_unedited());
        editor.reset();
        assert!(editor.is_unedited());
    }
}
