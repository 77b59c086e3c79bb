use eframe::egui;
use std::time::Instant;

use crate::config::Deck;
use crate::controller::{Controller, Mode, PEN_COLOR_NAMES};
use crate::doc::{OVERSAMPLE, PageRenderer, PdfRenderer};
use crate::input::{self, Action};
use crate::scale;
use crate::video::SystemOpener;

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(0x10, 0x10, 0x10);

struct Toast {
    message: String,
    start: Instant,
}

impl Toast {
    fn new(message: String) -> Self {
        Self {
            message,
            start: Instant::now(),
        }
    }

    fn opacity(&self) -> f32 {
        let elapsed = self.start.elapsed().as_secs_f32();
        let duration = 1.5;
        let fade_start = 1.0;
        if elapsed < fade_start {
            1.0
        } else if elapsed < duration {
            1.0 - (elapsed - fade_start) / (duration - fade_start)
        } else {
            0.0
        }
    }

    fn is_expired(&self) -> bool {
        self.start.elapsed().as_secs_f32() >= 1.5
    }
}

struct PresenterApp {
    controller: Controller,
    renderer: Box<dyn PageRenderer>,
    /// Page texture cached per page number; re-rendered only on page change.
    page_texture: Option<(u32, egui::TextureHandle)>,
    /// Video texture tagged with the decode counter it was uploaded for.
    video_texture: Option<(u64, egui::TextureHandle)>,
    /// Slide index seen last frame; a change invalidates the video texture
    /// (decode counters restart per playback, so the tag alone is ambiguous).
    last_index: usize,
    toast: Option<Toast>,
}

impl PresenterApp {
    fn new(controller: Controller, renderer: Box<dyn PageRenderer>) -> Self {
        let last_index = controller.current_index();
        Self {
            controller,
            renderer,
            page_texture: None,
            video_texture: None,
            last_index,
            toast: None,
        }
    }

    fn toast_for(&mut self, action: Action) {
        let message = match action {
            Action::PenGrow | Action::PenShrink => {
                format!("Pen size: {}", self.controller.pen_size())
            }
            Action::DrawMode => "Draw mode".to_string(),
            Action::EraseMode => "Erase mode".to_string(),
            Action::NormalMode => "Normal mode".to_string(),
            Action::CyclePenColor => {
                format!("Pen color: {}", PEN_COLOR_NAMES[self.controller.pen_color_index()])
            }
            Action::ClearInk => "Annotations cleared".to_string(),
            _ => return,
        };
        self.toast = Some(Toast::new(message));
    }

    /// Texture for the active slide's current content: the latest decoded
    /// video frame when a clip is playing, the rasterized page otherwise.
    fn slide_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureId> {
        if let Some(frame) = self.controller.video_frame() {
            let decoded = self.controller.video_frames_decoded();
            let stale = self
                .video_texture
                .as_ref()
                .is_none_or(|(uploaded, _)| *uploaded != decoded);
            if stale {
                let size = [frame.width as usize, frame.height as usize];
                let color_image = egui::ColorImage::from_rgb(size, &frame.rgb);
                let texture = ctx.load_texture("video_frame", color_image, egui::TextureOptions::LINEAR);
                self.video_texture = Some((decoded, texture));
            }
            return self.video_texture.as_ref().map(|(_, t)| t.id());
        }

        let page = self.controller.current_page();
        let cached = self
            .page_texture
            .as_ref()
            .is_some_and(|(cached_page, _)| *cached_page == page);
        if !cached {
            match self.renderer.render(page, OVERSAMPLE) {
                Ok(bitmap) => {
                    let size = [bitmap.width() as usize, bitmap.height() as usize];
                    let color_image = egui::ColorImage::from_rgb(size, bitmap.as_raw());
                    let texture =
                        ctx.load_texture("page", color_image, egui::TextureOptions::LINEAR);
                    self.page_texture = Some((page, texture));
                }
                Err(e) => {
                    // Keep whatever was on screen; never corrupt the display
                    // over a bad page request.
                    log::error!("{e}");
                    self.toast = Some(Toast::new(format!("{e}")));
                }
            }
        }
        self.page_texture.as_ref().map(|(_, t)| t.id())
    }

    /// Pixel size of whatever `slide_texture` is currently showing.
    fn current_bitmap_size(&self) -> (f32, f32) {
        if let Some(frame) = self.controller.video_frame() {
            (frame.width as f32, frame.height as f32)
        } else if let Some((_, texture)) = &self.page_texture {
            let size = texture.size_vec2();
            (size.x, size.y)
        } else {
            (scale::MIN_VIEWPORT.0, scale::MIN_VIEWPORT.1)
        }
    }

    fn draw_slide_counter(&self, ui: &egui::Ui, rect: egui::Rect) {
        let counter_text = format!(
            "{} / {}",
            self.controller.current_index() + 1,
            self.controller.slide_count()
        );
        let color = egui::Color32::from_gray(120);
        let galley =
            ui.painter()
                .layout_no_wrap(counter_text, egui::FontId::monospace(14.0), color);
        let pos = egui::pos2(
            rect.right() - galley.rect.width() - 16.0,
            rect.bottom() - 30.0,
        );
        ui.painter().galley(pos, galley, color);
    }

    fn draw_toast(&self, ui: &egui::Ui, ctx: &egui::Context, rect: egui::Rect) {
        let Some(ref toast) = self.toast else { return };
        let opacity = toast.opacity();
        if opacity <= 0.0 {
            return;
        }
        let text_color =
            egui::Color32::from_rgba_unmultiplied(0xEE, 0xEE, 0xEE, (opacity * 230.0) as u8);
        let bg = egui::Color32::from_rgba_unmultiplied(0x20, 0x20, 0x20, (opacity * 230.0) as u8);
        let galley = ui.painter().layout_no_wrap(
            toast.message.clone(),
            egui::FontId::proportional(18.0),
            text_color,
        );
        let padding = 12.0;
        let toast_rect = egui::Rect::from_min_size(
            egui::pos2(
                rect.center().x - galley.rect.width() / 2.0 - padding,
                rect.bottom() - 70.0,
            ),
            egui::vec2(
                galley.rect.width() + padding * 2.0,
                galley.rect.height() + padding * 2.0,
            ),
        );
        ui.painter().rect_filled(toast_rect, 6.0, bg);
        ui.painter().galley(
            egui::pos2(toast_rect.left() + padding, toast_rect.top() + padding),
            galley,
            text_color,
        );
        ctx.request_repaint();
    }
}

impl eframe::App for PresenterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // Collect viewport commands to send AFTER the input closure
        // (sending inside ctx.input() causes RwLock deadlock)
        let mut viewport_cmds: Vec<egui::ViewportCommand> = Vec::new();

        let actions: Vec<Action> = ctx.input(|i| {
            let mut actions = Vec::new();
            for event in &i.events {
                if let egui::Event::Key {
                    key, pressed: true, ..
                } = event
                {
                    if let Some(action) = input::action_for(*key) {
                        match action {
                            Action::Quit => {
                                viewport_cmds.push(egui::ViewportCommand::Close);
                            }
                            Action::ToggleFullscreen => {
                                viewport_cmds.push(egui::ViewportCommand::Fullscreen(
                                    !i.viewport().fullscreen.unwrap_or(false),
                                ));
                            }
                            _ => actions.push(action),
                        }
                    }
                }
            }
            actions
        });

        for cmd in viewport_cmds {
            ctx.send_viewport_cmd(cmd);
        }

        for action in actions {
            self.controller.apply(action, now);
            self.toast_for(action);
        }

        // Pointer protocol: press seeds the gesture (and erases in erase
        // mode), drags extend it, release breaks the chain.
        let (pressed, down, released, pointer_pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.hover_pos(),
            )
        });
        if let Some(pos) = pointer_pos {
            if pressed {
                self.controller.pointer_pressed(pos);
            } else if down {
                self.controller.pointer_dragged(pos);
            }
        }
        if released {
            self.controller.pointer_released();
        }

        self.controller.tick(now);

        if self.controller.current_index() != self.last_index {
            self.last_index = self.controller.current_index();
            self.video_texture = None;
        }

        ctx.set_cursor_icon(match self.controller.mode() {
            Mode::Draw => egui::CursorIcon::Crosshair,
            Mode::Erase => egui::CursorIcon::Cell,
            Mode::Normal => egui::CursorIcon::Default,
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(BACKGROUND).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                ui.painter().rect_filled(rect, 0.0, BACKGROUND);

                if let Some(texture_id) = self.slide_texture(ctx) {
                    let (src_w, src_h) = self.current_bitmap_size();
                    let placement = scale::fit(src_w, src_h, rect.width(), rect.height());
                    let image_rect = egui::Rect::from_min_size(
                        rect.min + egui::vec2(placement.offset_x, placement.offset_y),
                        egui::vec2(placement.width, placement.height),
                    );
                    ui.painter().image(
                        texture_id,
                        image_rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }

                // Ink rides on top of static pages only; clips play clean.
                if !self.controller.video_active() {
                    let page = self.controller.current_page();
                    for stroke in self.controller.ink().strokes(page) {
                        ui.painter().line_segment(
                            [stroke.from, stroke.to],
                            egui::Stroke::new(stroke.width, stroke.color),
                        );
                    }
                }

                // Eraser ring under the cursor while scrubbing.
                if self.controller.mode() == Mode::Erase && self.controller.is_drawing() {
                    if let Some(pos) = pointer_pos {
                        let radius = self.controller.pen_size() as f32;
                        ui.painter().circle_filled(pos, radius, egui::Color32::WHITE);
                        ui.painter().circle_stroke(
                            pos,
                            radius,
                            egui::Stroke::new(1.0, egui::Color32::from_gray(140)),
                        );
                    }
                }

                self.draw_slide_counter(ui, rect);
                self.draw_toast(ui, ctx, rect);
            });

        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }

        if let Some(delay) = self.controller.next_wakeup(now) {
            ctx.request_repaint_after(delay);
        }
    }
}

pub fn run(deck: Deck, fullscreen: bool, start_slide: Option<usize>) -> anyhow::Result<()> {
    let renderer = PdfRenderer::open(&deck.pdf)?;

    // Every configured page must exist in the document, so page-range
    // failures can't surface mid-presentation.
    let page_count = renderer.page_count();
    for &page in &deck.slides {
        if page > page_count {
            anyhow::bail!(
                "slide page {page} is out of range: {} has {page_count} pages",
                deck.pdf.display()
            );
        }
    }

    let title = format!(
        "pdeck \u{2014} {}",
        deck.pdf.file_name().unwrap_or_default().to_string_lossy()
    );

    let viewport = if fullscreen {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_inner_size([scale::MIN_VIEWPORT.0, scale::MIN_VIEWPORT.1])
            .with_title(&title)
    };

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let slide_count = deck.slide_count();
    let initial_slide = start_slide
        .map(|s| s.saturating_sub(1))
        .unwrap_or(0)
        .min(slide_count.saturating_sub(1));

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| {
            let now = Instant::now();
            let mut controller = Controller::new(deck, Box::new(SystemOpener), now);
            controller.jump_to(initial_slide, now);
            Ok(Box::new(PresenterApp::new(controller, Box::new(renderer))))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
