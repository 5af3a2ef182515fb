use iced::widget::{button, column, container, row, scrollable, slider, stack, text, Space};
use iced::{event, keyboard, window, Alignment, Element, Length, Size, Subscription, Task, Theme};
use flexi_logger::{Logger, LoggerHandle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod error;
mod gallery;
mod loader;
mod state;
mod ui;

use error::GalleryError;
use gallery::handles::ResourceHandle;
use gallery::item::{Dimensions, DiscoveredImage, ItemId};
use gallery::layout::{LayoutMode, Rect};
use gallery::scan::scan_directory;
use gallery::visibility::{LoadJob, VisibilityMode};
use gallery::{Gallery, PendingDelete};
use loader::{FileAccessor, LocalFs};
use state::edit::{CropPreset, EditOps, Encoding, Filter, SaveFormat};
use state::preferences::{Preferences, MIN_COL_WIDTH_RANGE, ROW_HEIGHT_RANGE};
use state::writeback::{self, SavedImage};
use ui::editor::EditorState;
use ui::viewer::ViewerState;

/// Padding around the grid inside the scroll area
const GRID_PADDING: f32 = 12.0;
/// Room left for the vertical scrollbar
const SCROLLBAR_ALLOWANCE: f32 = 12.0;
/// Approximate toolbar height, used until the first scroll event reports real bounds
const TOOLBAR_HEIGHT: f32 = 52.0;

fn grid_scroll_id() -> scrollable::Id {
    scrollable::Id::new("gallery-grid")
}

/// Main application state
struct GalleryApp {
    /// The gallery core: items, layout and resources
    gallery: Gallery,
    preferences: Preferences,
    /// Where preferences are persisted (None if no config dir exists)
    preferences_path: Option<PathBuf>,
    viewer: ViewerState,
    editor: Option<EditorState>,
    window_size: Size,
    scroll_y: f32,
    viewport_height: f32,
    /// Scan in progress
    loading: bool,
    fullscreen: bool,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the "Open Folder" button
    OpenFolder,
    FolderPicked(Option<PathBuf>),
    /// Background scan completed
    Scanned(PathBuf, Result<Vec<DiscoveredImage>, GalleryError>),
    WindowResized(Size),
    Scrolled(scrollable::Viewport),
    /// Animation frame while a layout pass is pending
    Frame,
    MetadataLoaded(LoadJob, Result<Dimensions, GalleryError>),
    ResourceLoaded(LoadJob, Result<ResourceHandle, GalleryError>),
    ToggleLayout,
    MinColWidthChanged(u32),
    RowHeightChanged(u32),
    OpenViewer(usize),
    CloseViewer,
    ViewerPrev,
    ViewerNext,
    Escape,
    ToggleFullscreen,
    ExportCurrent,
    /// Ok(None) when the user cancelled
    Exported(Result<Option<PathBuf>, GalleryError>),
    DeleteCurrent,
    /// Ok(false) when the user cancelled
    Deleted(ItemId, Result<bool, GalleryError>),
    OpenEditor,
    EditorSourceLoaded(ItemId, Result<Arc<image::DynamicImage>, GalleryError>),
    RotateLeft,
    RotateRight,
    FlipHorizontal,
    FlipVertical,
    FilterSelected(Filter),
    CropSelected(CropPreset),
    ResetEdits,
    PreviewRendered(u64, iced::widget::image::Handle),
    CloseEditor,
    FormatSelected(SaveFormat),
    QualityChanged(u8),
    SaveOverwrite,
    SaveAs,
    /// Ok(None) when the user cancelled
    Saved(ItemId, Result<Option<SavedImage>, GalleryError>),
}

impl GalleryApp {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let preferences_path = Preferences::default_path();
        let preferences = preferences_path
            .as_deref()
            .map(Preferences::load_from)
            .unwrap_or_default();

        let mut gallery = Gallery::new(Arc::new(LocalFs), VisibilityMode::default());
        gallery.set_mode(preferences.layout_mode);
        gallery.set_params(preferences.layout_params());

        log::info!(
            "🎨 Image gallery started (layout {:?}, min column {}px, row {}px)",
            preferences.layout_mode,
            preferences.min_col_width,
            preferences.row_height
        );

        let app = GalleryApp {
            gallery,
            preferences,
            preferences_path,
            viewer: ViewerState::default(),
            editor: None,
            window_size: Size::ZERO,
            scroll_y: 0.0,
            viewport_height: 0.0,
            loading: false,
            fullscreen: false,
            status: String::new(),
        };

        // The first resize event may never come, ask for the size directly
        let size = window::get_latest()
            .and_then(window::get_size)
            .map(Message::WindowResized);

        (app, size)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenFolder => Task::perform(pick_folder(), Message::FolderPicked),
            Message::FolderPicked(None) => Task::none(),
            Message::FolderPicked(Some(root)) => {
                self.viewer.close();
                self.editor = None;
                self.loading = true;
                self.status = format!("Scanning {}...", root.display());

                let accessor = self.gallery.resources().accessor().clone();
                Task::perform(
                    async move {
                        let result = scan_directory(accessor.as_ref(), &root).await;
                        (root, result)
                    },
                    |(root, result)| Message::Scanned(root, result),
                )
            }
            Message::Scanned(root, Ok(found)) => {
                self.loading = false;
                self.status.clear();
                self.scroll_y = 0.0;

                let jobs = self.gallery.replace_all(root, found);
                let viewport = self.viewport();
                let jobs = jobs.into_iter().chain(self.gallery.set_viewport(viewport)).collect();

                Task::batch([
                    self.load(jobs),
                    scrollable::scroll_to(grid_scroll_id(), scrollable::AbsoluteOffset { x: 0.0, y: 0.0 }),
                ])
            }
            Message::Scanned(root, Err(e)) => {
                self.loading = false;
                log::error!("❌ Could not scan {}: {}", root.display(), e);
                self.status = format!("❌ {}", e);
                Task::none()
            }
            Message::WindowResized(size) => {
                self.window_size = size;
                self.viewport_height = (size.height - TOOLBAR_HEIGHT).max(0.0);
                let width = size.width - GRID_PADDING * 2.0 - SCROLLBAR_ALLOWANCE;
                self.gallery.set_container_width(width.max(0.0));
                self.refresh_viewport()
            }
            Message::Scrolled(viewport) => {
                self.scroll_y = viewport.absolute_offset().y;
                self.viewport_height = viewport.bounds().height;
                self.refresh_viewport()
            }
            Message::Frame => {
                let jobs = self.gallery.on_frame();
                self.load(jobs)
            }
            Message::MetadataLoaded(job, result) => {
                if let Err(e) = &result {
                    if !e.is_stale() && self.viewer.item() == Some(job.item) {
                        self.status = format!("⚠️  {}", e);
                    }
                }
                match self.gallery.on_metadata(job, &result) {
                    Some(job) => self.load_resource(job),
                    None => Task::none(),
                }
            }
            Message::ResourceLoaded(job, result) => {
                self.gallery.on_resource(job, &result);
                Task::none()
            }
            Message::ToggleLayout => {
                self.preferences.layout_mode = self.preferences.layout_mode.toggled();
                self.gallery.set_mode(self.preferences.layout_mode);
                self.save_preferences();
                Task::none()
            }
            Message::MinColWidthChanged(value) => {
                self.preferences.min_col_width = value;
                self.gallery.set_params(self.preferences.layout_params());
                self.save_preferences();
                Task::none()
            }
            Message::RowHeightChanged(value) => {
                self.preferences.row_height = value;
                self.gallery.set_params(self.preferences.layout_params());
                self.save_preferences();
                Task::none()
            }
            Message::OpenViewer(index) => self.open_viewer(index),
            Message::CloseViewer => {
                self.viewer.close();
                self.editor = None;
                self.set_fullscreen(false)
            }
            Message::ViewerPrev => match self.viewer.prev_index().filter(|_| self.editor.is_none()) {
                Some(index) => self.open_viewer(index),
                None => Task::none(),
            },
            Message::ViewerNext => {
                let len = self.gallery.len();
                match self.viewer.next_index(len).filter(|_| self.editor.is_none()) {
                    Some(index) => self.open_viewer(index),
                    None => Task::none(),
                }
            }
            Message::Escape => {
                if self.editor.is_some() {
                    self.editor = None;
                    Task::none()
                } else if self.fullscreen {
                    self.set_fullscreen(false)
                } else {
                    self.viewer.close();
                    Task::none()
                }
            }
            Message::ToggleFullscreen => {
                if !self.viewer.is_open() && !self.fullscreen {
                    return Task::none();
                }
                self.set_fullscreen(!self.fullscreen)
            }
            Message::ExportCurrent => {
                let Some(id) = self.viewer.item() else {
                    return Task::none();
                };
                let (Some(path), Some(summary)) = (
                    self.gallery.source_path(id),
                    self.viewer.current().and_then(|i| self.gallery.summary(i)),
                ) else {
                    return Task::none();
                };
                let accessor = self.gallery.resources().accessor().clone();
                Task::perform(export_file(accessor, path, summary.name), Message::Exported)
            }
            Message::Exported(Ok(None)) => Task::none(),
            Message::Exported(Ok(Some(target))) => {
                self.status = format!("📤 Exported to {}", target.display());
                Task::none()
            }
            Message::Exported(Err(e)) => {
                log::warn!("⚠️  Export failed: {}", e);
                self.status = format!("❌ Export failed: {}", e);
                Task::none()
            }
            Message::DeleteCurrent => {
                if self.editor.is_some() {
                    return Task::none();
                }
                let Some(pending) = self.viewer.current().and_then(|i| self.gallery.pending_delete(i)) else {
                    return Task::none();
                };
                let id = pending.id;
                let accessor = self.gallery.resources().accessor().clone();
                Task::perform(delete_file(accessor, pending), move |result| Message::Deleted(id, result))
            }
            Message::Deleted(_, Ok(false)) => Task::none(),
            Message::Deleted(id, Ok(true)) => {
                let Some(removal) = self.gallery.remove_item(id) else {
                    return Task::none();
                };
                self.status = format!("🗑️  Deleted, {} images left", removal.remaining);
                match self.viewer.after_removal(removal.index, removal.remaining) {
                    Some(index) => self.open_viewer(index),
                    None => Task::none(),
                }
            }
            Message::Deleted(_, Err(e)) => {
                log::warn!("⚠️  Delete failed: {}", e);
                self.status = format!("❌ Delete failed: {}", e);
                Task::none()
            }
            Message::OpenEditor => {
                let Some(id) = self.viewer.item() else {
                    return Task::none();
                };
                let Some(path) = self.gallery.source_path(id) else {
                    return Task::none();
                };
                self.editor = Some(EditorState::new(id));
                let accessor = self.gallery.resources().accessor().clone();
                Task::perform(load_edit_source(accessor, path), move |result| {
                    Message::EditorSourceLoaded(id, result)
                })
            }
            Message::EditorSourceLoaded(id, result) => {
                let Some(editor) = self.editor.as_mut().filter(|e| e.item == id) else {
                    return Task::none();
                };
                match result {
                    Ok(source) => {
                        editor.set_source(source);
                        self.render_preview()
                    }
                    Err(e) => {
                        self.status = format!("❌ Cannot edit: {}", e);
                        self.editor = None;
                        Task::none()
                    }
                }
            }
            Message::RotateLeft => self.edit(|ops| ops.rotation = ops.rotation.counter_clockwise()),
            Message::RotateRight => self.edit(|ops| ops.rotation = ops.rotation.clockwise()),
            Message::FlipHorizontal => self.edit(|ops| ops.flip_horizontal = !ops.flip_horizontal),
            Message::FlipVertical => self.edit(|ops| ops.flip_vertical = !ops.flip_vertical),
            Message::FilterSelected(filter) => self.edit(|ops| ops.filter = filter),
            Message::CropSelected(preset) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.crop = preset;
                }
                self.render_preview()
            }
            Message::ResetEdits => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.reset();
                }
                self.render_preview()
            }
            Message::PreviewRendered(revision, handle) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.set_preview(revision, handle);
                }
                Task::none()
            }
            Message::CloseEditor => {
                self.editor = None;
                Task::none()
            }
            Message::FormatSelected(format) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.format = format;
                }
                Task::none()
            }
            Message::QualityChanged(quality) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.quality = quality;
                }
                Task::none()
            }
            Message::SaveOverwrite => self.save(overwrite_original),
            Message::SaveAs => {
                let encoding = match &self.editor {
                    Some(editor) => editor.save_as_encoding(),
                    None => return Task::none(),
                };
                self.save(move |accessor, path, ops| save_copy(accessor, path, ops, encoding))
            }
            Message::Saved(id, result) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.saving = false;
                }
                match result.and_then(|saved| match saved {
                    Some(saved) => {
                        let path = saved.path.clone();
                        writeback::commit_save(&mut self.gallery, id, saved).map(|handle| Some((path, handle)))
                    }
                    None => Ok(None),
                }) {
                    Ok(None) => {}
                    Ok(Some((path, replaced))) => {
                        self.status = match replaced {
                            Some(_) => "💾 Saved".to_string(),
                            None => format!("💾 Saved as {}", path.display()),
                        };
                        self.editor = None;
                    }
                    // Deleted while saving, the file on disk is already written
                    Err(e) if e.is_stale() => log::warn!("⚠️  Saved image is no longer in the gallery"),
                    Err(e) => {
                        log::warn!("⚠️  Save failed: {}", e);
                        self.status = format!("❌ Save failed: {}", e);
                    }
                }
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let layout_label = match self.preferences.layout_mode {
            LayoutMode::Vertical => "Layout: Columns",
            LayoutMode::Horizontal => "Layout: Rows",
        };

        let summary = if self.status.is_empty() {
            format!("{} images", self.gallery.len())
        } else {
            self.status.clone()
        };

        let toolbar = row![
            button("📁 Open Folder").on_press(Message::OpenFolder).padding(8),
            button(layout_label).on_press(Message::ToggleLayout).padding(8),
            text("Column width").size(13),
            slider(MIN_COL_WIDTH_RANGE, self.preferences.min_col_width, Message::MinColWidthChanged)
                .step(10u32)
                .width(Length::Fixed(140.0)),
            text("Row height").size(13),
            slider(ROW_HEIGHT_RANGE, self.preferences.row_height, Message::RowHeightChanged)
                .step(10u32)
                .width(Length::Fixed(140.0)),
            Space::with_width(Length::Fill),
            text(summary).size(14),
        ]
        .spacing(10)
        .padding(10)
        .align_y(Alignment::Center);

        let body: Element<Message> = if self.loading {
            container(text("Scanning for images...").size(18))
                .center(Length::Fill)
                .into()
        } else if self.gallery.is_empty() {
            let message = match self.gallery.root() {
                Some(_) => "No supported images in this folder. Try another one.",
                None => "Open a folder to browse its images.",
            };
            container(text(message).size(18)).center(Length::Fill).into()
        } else {
            scrollable(container(ui::grid::view(&self.gallery)).padding(GRID_PADDING))
                .id(grid_scroll_id())
                .on_scroll(Message::Scrolled)
                .width(Length::Fill)
                .height(Length::Fill)
                .into()
        };

        let main = column![toolbar, body];

        if !self.viewer.is_open() {
            return main.into();
        }

        let overlay = match &self.editor {
            Some(editor) => ui::editor::view(editor),
            None => ui::viewer::view(&self.gallery, &self.viewer, self.fullscreen),
        };
        stack![main, overlay].into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let resize = event::listen_with(|event, _status, _window| match event {
            iced::Event::Window(window::Event::Resized(size)) => Some(Message::WindowResized(size)),
            _ => None,
        });

        let keys = keyboard::on_key_press(|key, _modifiers| match key.as_ref() {
            keyboard::Key::Named(keyboard::key::Named::ArrowLeft) => Some(Message::ViewerPrev),
            keyboard::Key::Named(keyboard::key::Named::ArrowRight) => Some(Message::ViewerNext),
            keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::Escape),
            keyboard::Key::Named(keyboard::key::Named::Delete) => Some(Message::DeleteCurrent),
            keyboard::Key::Named(keyboard::key::Named::F11) => Some(Message::ToggleFullscreen),
            _ => None,
        });

        let mut subscriptions = vec![resize, keys];
        // Only tick while a layout pass is waiting
        if self.gallery.layout_pending() {
            subscriptions.push(window::frames().map(|_| Message::Frame));
        }
        Subscription::batch(subscriptions)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Visible part of the grid in content coordinates
    fn viewport(&self) -> Rect {
        Rect::new(
            0.0,
            self.scroll_y - GRID_PADDING,
            self.window_size.width,
            self.viewport_height,
        )
    }

    fn refresh_viewport(&mut self) -> Task<Message> {
        let viewport = self.viewport();
        let jobs = self.gallery.set_viewport(viewport);
        self.load(jobs)
    }

    fn open_viewer(&mut self, index: usize) -> Task<Message> {
        let Some(id) = self.gallery.item_id(index) else {
            return Task::none();
        };
        self.viewer.open(index, id);
        self.status.clear();

        // The open image first, then its neighbours
        let jobs = std::iter::once(index)
            .chain(self.viewer.neighbours(self.gallery.len()))
            .filter_map(|i| self.gallery.job_for(i))
            .collect();
        self.load(jobs)
    }

    /// Start metadata probes; each continues with its resource load on success
    fn load(&self, jobs: Vec<LoadJob>) -> Task<Message> {
        Task::batch(jobs.into_iter().map(|job| {
            let resources = self.gallery.resources().clone();
            Task::perform(
                async move { resources.ensure_metadata(job.item).await },
                move |result| Message::MetadataLoaded(job, result),
            )
        }))
    }

    fn load_resource(&self, job: LoadJob) -> Task<Message> {
        let resources = self.gallery.resources().clone();
        Task::perform(
            async move { resources.ensure_resource(job.item).await },
            move |result| Message::ResourceLoaded(job, result),
        )
    }

    fn edit(&mut self, change: impl FnOnce(&mut EditOps)) -> Task<Message> {
        match self.editor.as_mut().filter(|e| e.is_ready() && !e.saving) {
            Some(editor) => {
                change(&mut editor.ops);
                self.render_preview()
            }
            None => Task::none(),
        }
    }

    fn render_preview(&mut self) -> Task<Message> {
        let Some((base, ops, revision)) = self.editor.as_mut().and_then(EditorState::next_preview) else {
            return Task::none();
        };
        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || ui::editor::render_preview(&base, &ops)).await
            },
            move |result| match result {
                Ok(handle) => Message::PreviewRendered(revision, handle),
                Err(e) => {
                    log::error!("❌ Preview render failed: {}", e);
                    Message::CloseEditor
                }
            },
        )
    }

    /// Start a save of the open edit through `run`
    fn save<F, Fut>(&mut self, run: F) -> Task<Message>
    where
        F: FnOnce(Arc<dyn FileAccessor>, PathBuf, EditOps) -> Fut,
        Fut: std::future::Future<Output = Result<Option<SavedImage>, GalleryError>> + Send + 'static,
    {
        let Some(editor) = self.editor.as_mut().filter(|e| !e.saving) else {
            return Task::none();
        };
        let (Some(ops), Some(path)) = (editor.full_ops(), self.gallery.source_path(editor.item)) else {
            return Task::none();
        };
        editor.saving = true;
        let id = editor.item;
        let accessor = self.gallery.resources().accessor().clone();
        Task::perform(run(accessor, path, ops), move |result| Message::Saved(id, result))
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Task<Message> {
        if fullscreen == self.fullscreen {
            return Task::none();
        }
        self.fullscreen = fullscreen;
        let mode = if fullscreen {
            window::Mode::Fullscreen
        } else {
            window::Mode::Windowed
        };
        window::get_latest().and_then(move |id| window::change_mode(id, mode))
    }

    fn save_preferences(&self) {
        let Some(path) = &self.preferences_path else {
            return;
        };
        if let Err(e) = self.preferences.save_to(path) {
            log::warn!("⚠️  {}", e);
        }
    }
}

fn init_logging() -> Option<LoggerHandle> {
    match Logger::try_with_env_or_str("info, iced=error, wgpu_hal=error, wgpu_core=error, naga=error")
        .and_then(|logger| logger.start())
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Failed to start logger: {}", e);
            None
        }
    }
}

fn main() -> iced::Result {
    let _logger = init_logging();

    iced::application("Image Gallery", GalleryApp::update, GalleryApp::view)
        .subscription(GalleryApp::subscription)
        .theme(GalleryApp::theme)
        .window_size(Size::new(1280.0, 860.0))
        .centered()
        .run_with(GalleryApp::new)
}

async fn pick_folder() -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title("Select a folder of images")
        .pick_folder()
        .await
        .map(|handle| handle.path().to_path_buf())
}

async fn confirm(title: &str, description: String) -> bool {
    let answer = rfd::AsyncMessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title(title)
        .set_description(description)
        .set_buttons(rfd::MessageButtons::YesNo)
        .show()
        .await;
    answer == rfd::MessageDialogResult::Yes
}

/// Ask, then delete the file through the accessor
async fn delete_file(accessor: Arc<dyn FileAccessor>, pending: PendingDelete) -> Result<bool, GalleryError> {
    if !confirm("Delete image", format!("Delete {}? This cannot be undone.", pending.name)).await {
        return Ok(false);
    }
    writeback::delete_source(accessor.as_ref(), &pending).await?;
    Ok(true)
}

async fn load_edit_source(
    accessor: Arc<dyn FileAccessor>,
    path: PathBuf,
) -> Result<Arc<image::DynamicImage>, GalleryError> {
    writeback::load_source(accessor.as_ref(), &path).await
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Ask, then render the edits from the file on disk and write them back
async fn overwrite_original(
    accessor: Arc<dyn FileAccessor>,
    path: PathBuf,
    ops: EditOps,
) -> Result<Option<SavedImage>, GalleryError> {
    let name = file_name(&path);
    if !confirm("Overwrite original", format!("Overwrite {}? This cannot be undone.", name)).await {
        return Ok(None);
    }
    writeback::save_edit(accessor.as_ref(), &path, &path, ops, Encoding::MatchPath)
        .await
        .map(Some)
}

/// Pick a target, then render the edits into a new file
async fn save_copy(
    accessor: Arc<dyn FileAccessor>,
    path: PathBuf,
    ops: EditOps,
    encoding: Encoding,
) -> Result<Option<SavedImage>, GalleryError> {
    let Encoding::Chosen { format, .. } = encoding else {
        return Ok(None);
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    let mut dialog = rfd::AsyncFileDialog::new()
        .set_title("Save edited image as")
        .set_file_name(format!("{}-edited.{}", stem, format.extension()))
        .add_filter(format.to_string(), &[format.extension()]);
    if let Some(dir) = path.parent() {
        dialog = dialog.set_directory(dir);
    }
    let Some(handle) = dialog.save_file().await else {
        return Ok(None);
    };

    let target = writeback::with_format_extension(handle.path(), format);
    writeback::save_edit(accessor.as_ref(), &path, &target, ops, encoding)
        .await
        .map(Some)
}

/// Pick a target, then copy the original file there unchanged
async fn export_file(
    accessor: Arc<dyn FileAccessor>,
    path: PathBuf,
    name: String,
) -> Result<Option<PathBuf>, GalleryError> {
    let Some(handle) = rfd::AsyncFileDialog::new()
        .set_title("Export image")
        .set_file_name(name)
        .save_file()
        .await
    else {
        return Ok(None);
    };
    let target = handle.path().to_path_buf();
    writeback::export_copy(accessor.as_ref(), &path, &target).await?;
    Ok(Some(target))
}
