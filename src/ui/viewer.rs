/// Full-window image viewer
///
/// Pan and zoom are handled by iced's image viewer widget; this module only
/// tracks which item is open and how the info line is worded.
use iced::widget::{button, column, container, image, row, text, Space};
use iced::{Alignment, Color, Element, Length};

use crate::gallery::item::ItemId;
use crate::gallery::{Gallery, ItemSummary};
use crate::Message;

/// Zoom limits for the viewer
pub const MIN_SCALE: f32 = 1.0;
pub const MAX_SCALE: f32 = 8.0;

#[derive(Debug, Clone, Default)]
pub struct ViewerState {
    current: Option<usize>,
    item: Option<ItemId>,
}

impl ViewerState {
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn item(&self) -> Option<ItemId> {
        self.item
    }

    pub fn open(&mut self, index: usize, item: ItemId) {
        self.current = Some(index);
        self.item = Some(item);
    }

    pub fn close(&mut self) {
        self.current = None;
        self.item = None;
    }

    pub fn has_prev(&self) -> bool {
        self.current.is_some_and(|i| i > 0)
    }

    pub fn has_next(&self, len: usize) -> bool {
        self.current.is_some_and(|i| i + 1 < len)
    }

    /// Index to show after stepping back, if any
    pub fn prev_index(&self) -> Option<usize> {
        self.current.filter(|_| self.has_prev()).map(|i| i - 1)
    }

    pub fn next_index(&self, len: usize) -> Option<usize> {
        self.current.filter(|_| self.has_next(len)).map(|i| i + 1)
    }

    /// Neighbours worth preloading around the open image
    pub fn neighbours(&self, len: usize) -> Vec<usize> {
        self.prev_index().into_iter().chain(self.next_index(len)).collect()
    }

    /// Keep the open index valid after the collection shrank
    ///
    /// Returns the index that should be shown now, or `None` if the viewer closed.
    pub fn after_removal(&mut self, removed: usize, remaining: usize) -> Option<usize> {
        let current = self.current?;
        if remaining == 0 {
            self.close();
            return None;
        }

        let next = if removed < current {
            current - 1
        } else {
            current.min(remaining - 1)
        };
        self.current = Some(next);
        Some(next)
    }
}

/// Human readable byte count
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let digits = if unit == 0 {
        0
    } else if value >= 100.0 {
        0
    } else if value >= 10.0 {
        1
    } else {
        2
    };
    format!("{:.*} {}", digits, value, UNITS[unit])
}

pub fn format_megapixels(width: u32, height: u32) -> String {
    let mp = width as f64 * height as f64 / 1_000_000.0;
    if mp <= 0.0 {
        String::new()
    } else if mp >= 10.0 {
        format!("{:.1}MP", mp)
    } else {
        format!("{:.2}MP", mp)
    }
}

/// "path · n/total"
pub fn primary_text(summary: &ItemSummary, total: usize) -> String {
    format!("{} · {}/{}", summary.display_path, summary.index + 1, total)
}

/// Resolution, size and type, whichever are known
pub fn details_text(summary: &ItemSummary) -> String {
    let mut parts = Vec::new();
    if let Some(dims) = summary.dimensions {
        let mp = format_megapixels(dims.width, dims.height);
        if mp.is_empty() {
            parts.push(format!("{}×{}", dims.width, dims.height));
        } else {
            parts.push(format!("{}×{} ({})", dims.width, dims.height, mp));
        }
    }
    if let Some(size) = summary.file_size {
        parts.push(format_bytes(size));
    }
    if let Some(mime) = &summary.mime {
        parts.push(mime.clone());
    }
    parts.join(" · ")
}

pub fn view<'a>(gallery: &'a Gallery, viewer: &'a ViewerState, fullscreen: bool) -> Element<'a, Message> {
    let Some(summary) = viewer.current().and_then(|i| gallery.summary(i)) else {
        return Space::new(Length::Fill, Length::Fill).into();
    };
    let total = gallery.len();

    let stage: Element<'a, Message> = match summary.handle.and_then(|h| gallery.registry().get(h)) {
        Some(handle) => image::Viewer::new(handle)
            .min_scale(MIN_SCALE)
            .max_scale(MAX_SCALE)
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => container(text("Loading…").size(16))
            .center(Length::Fill)
            .into(),
    };

    let nav = row![
        button("◀").on_press_maybe(viewer.has_prev().then_some(Message::ViewerPrev)),
        button("▶").on_press_maybe(viewer.has_next(total).then_some(Message::ViewerNext)),
        Space::with_width(Length::Fill),
        button(if fullscreen { "Exit fullscreen" } else { "Fullscreen" }).on_press(Message::ToggleFullscreen),
        button("Export…").on_press(Message::ExportCurrent),
        button("Edit").on_press(Message::OpenEditor),
        button("Delete").on_press(Message::DeleteCurrent),
        button("Close").on_press(Message::CloseViewer),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let info = column![
        text(primary_text(&summary, total)).size(16),
        text(details_text(&summary)).size(13),
    ]
    .spacing(4);

    container(column![nav, stage, info].spacing(10).padding(16))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|_| container::Style {
            background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.95).into()),
            ..container::Style::default()
        })
        .into()
}
