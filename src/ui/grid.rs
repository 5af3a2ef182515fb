/// Gallery grid
///
/// Renders the surface as-is: in column mode a row of column containers, in
/// row mode a column of justified rows. Tile sizes come straight from the
/// last layout pass so the widget tree reproduces the computed rects.
use iced::widget::{column, container, image, mouse_area, row, Space};
use iced::{Color, ContentFit, Element, Length};

use crate::gallery::handles::HandleRegistry;
use crate::gallery::layout::LayoutMode;
use crate::gallery::surface::{Placeholder, Source};
use crate::gallery::Gallery;
use crate::Message;

/// Blank tile colour while pixels are loading
const PLACEHOLDER_COLOR: Color = Color::from_rgb(0.16, 0.16, 0.18);

pub fn view(gallery: &Gallery) -> Element<'_, Message> {
    let surface = gallery.surface();
    let registry = gallery.registry();
    let gutter = gallery.params().gutter;

    let lanes = surface.lanes().into_iter().map(|lane| -> Element<'static, Message> {
        let tiles = lane.into_iter().map(|placeholder| tile(placeholder, registry));
        match surface.mode() {
            Some(LayoutMode::Horizontal) => row(tiles).spacing(gutter).into(),
            _ => column(tiles).spacing(gutter).into(),
        }
    });

    let grid: Element<'_, Message> = match surface.mode() {
        Some(LayoutMode::Vertical) => row(lanes).spacing(gutter).into(),
        Some(LayoutMode::Horizontal) => column(lanes).spacing(gutter).into(),
        None => Space::new(Length::Fill, Length::Shrink).into(),
    };

    container(grid)
        .width(Length::Fill)
        .height(Length::Fixed(surface.content_height().ceil()))
        .into()
}

fn tile<'a>(placeholder: &Placeholder, registry: &HandleRegistry) -> Element<'a, Message> {
    let width = placeholder.rect.width.max(0.0);
    let height = placeholder.rect.height.max(0.0);

    let loaded = match placeholder.source {
        Source::Loaded(handle) => registry.get(handle),
        Source::Blank => None,
    };

    let content: Element<'a, Message> = match loaded {
        Some(handle) => image(handle)
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .content_fit(ContentFit::Cover)
            .into(),
        None => container(Space::new(Length::Fixed(width), Length::Fixed(height)))
            .style(|_| container::Style {
                background: Some(PLACEHOLDER_COLOR.into()),
                ..container::Style::default()
            })
            .into(),
    };

    mouse_area(content)
        .on_press(Message::OpenViewer(placeholder.index))
        .into()
}
