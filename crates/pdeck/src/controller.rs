//! Presentation state machine.
//!
//! The controller owns everything that changes while presenting: the slide
//! index, pen mode and size, per-slide ink, the armed auto-advance deadline,
//! and the playback state of an active video slide. It never touches the
//! display. The app shell feeds it input and clock ticks and reads back
//! what to show, which keeps the whole state machine testable headless.

use crate::config::Deck;
use crate::ink::{InkStore, Stroke};
use crate::input::Action;
use crate::video::{FrameSource, MediaOpener, VideoFrame};
use eframe::egui::{Color32, Pos2};
use std::time::{Duration, Instant};

pub const PEN_SIZE_MIN: u8 = 1;
pub const PEN_SIZE_MAX: u8 = 10;

/// Pen colors cycled with the color action. Black first, matching the
/// classic default.
pub const PEN_PALETTE: [Color32; 5] = [
    Color32::BLACK,
    Color32::from_rgb(0x1A, 0x6B, 0xB5),
    Color32::from_rgb(0xC7, 0x3E, 0x1D),
    Color32::from_rgb(0x1E, 0x8A, 0x5A),
    Color32::from_rgb(0xB8, 0x7B, 0x0A),
];

pub const PEN_COLOR_NAMES: [&str; 5] = ["black", "blue", "red", "green", "amber"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Draw,
    Erase,
}

/// One-shot auto-advance deadline. The generation is captured when the
/// timer is armed; a deadline from a superseded activation never fires.
struct ArmedAdvance {
    deadline: Instant,
    generation: u64,
}

/// Playback state of the active video slide. Owned exclusively by the
/// controller and dropped (releasing the decoder) when the presenter leaves
/// the slide.
struct Playback {
    source: Box<dyn FrameSource>,
    frame_interval: Duration,
    next_frame_due: Instant,
    decoded_frames: u64,
    current: Option<VideoFrame>,
    halted: bool,
}

pub struct Controller {
    deck: Deck,
    opener: Box<dyn MediaOpener>,
    current_index: usize,
    mode: Mode,
    pen_size: u8,
    pen_color_index: usize,
    drawing: bool,
    prev_point: Option<Pos2>,
    ink: InkStore,
    advance: Option<ArmedAdvance>,
    generation: u64,
    playback: Option<Playback>,
}

impl Controller {
    pub fn new(deck: Deck, opener: Box<dyn MediaOpener>, now: Instant) -> Self {
        let mut controller = Self {
            deck,
            opener,
            current_index: 0,
            mode: Mode::Normal,
            pen_size: 2,
            pen_color_index: 0,
            drawing: false,
            prev_point: None,
            ink: InkStore::new(),
            advance: None,
            generation: 0,
            playback: None,
        };
        controller.activate(now);
        controller
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Stable page number of the active slide, the key for ink and the
    /// duration/video maps.
    pub fn current_page(&self) -> u32 {
        self.deck.page_at(self.current_index)
    }

    pub fn slide_count(&self) -> usize {
        self.deck.slide_count()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn pen_size(&self) -> u8 {
        self.pen_size
    }

    pub fn pen_color(&self) -> Color32 {
        PEN_PALETTE[self.pen_color_index]
    }

    pub fn pen_color_index(&self) -> usize {
        self.pen_color_index
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn ink(&self) -> &InkStore {
        &self.ink
    }

    /// Whether the active slide is playing a video.
    pub fn video_active(&self) -> bool {
        self.playback.is_some()
    }

    /// The most recently decoded frame of the active video, if any.
    pub fn video_frame(&self) -> Option<&VideoFrame> {
        self.playback.as_ref().and_then(|p| p.current.as_ref())
    }

    /// Number of frames decoded for the active video; the app uses this to
    /// tell when the displayed frame texture is stale.
    pub fn video_frames_decoded(&self) -> u64 {
        self.playback.as_ref().map(|p| p.decoded_frames).unwrap_or(0)
    }

    pub fn next(&mut self, now: Instant) {
        if self.current_index + 1 < self.deck.slide_count() {
            self.current_index += 1;
            self.slide_changed(now);
        }
    }

    pub fn prev(&mut self, now: Instant) {
        if self.current_index > 0 {
            self.current_index -= 1;
            self.slide_changed(now);
        }
    }

    pub fn jump_to(&mut self, index: usize, now: Instant) {
        let clamped = index.min(self.deck.slide_count() - 1);
        if clamped != self.current_index {
            self.current_index = clamped;
            self.slide_changed(now);
        }
    }

    fn slide_changed(&mut self, now: Instant) {
        self.prev_point = None;
        // Release the previous slide's decoder before anything new opens.
        self.playback = None;
        self.activate(now);
    }

    /// Arm the new slide: fresh generation, fresh auto-advance deadline if
    /// the slide has one, and video playback if the slide maps to a clip.
    fn activate(&mut self, now: Instant) {
        self.generation += 1;
        let page = self.current_page();

        self.advance = self.deck.duration_for(page).map(|delay| ArmedAdvance {
            deadline: now + delay,
            generation: self.generation,
        });

        if let Some(video) = self.deck.video_for(page) {
            match self.opener.open(video) {
                Ok(source) => {
                    let fps = video.fps.max(1);
                    log::debug!(
                        "page {page}: playing {} ({} frames, {:.1} fps native) at {fps} fps",
                        video.path.display(),
                        source.frame_count(),
                        source.fps()
                    );
                    self.playback = Some(Playback {
                        source,
                        frame_interval: Duration::from_millis(1000 / fps as u64),
                        next_frame_due: now,
                        decoded_frames: 0,
                        current: None,
                        halted: false,
                    });
                }
                Err(e) => {
                    log::error!("video for slide {page} unavailable: {e}");
                }
            }
        }
    }

    /// Advance the clock: fire a due auto-advance (at most once per
    /// activation, and only if it was armed for the current activation) and
    /// decode at most one due video frame. Returns true when the display
    /// changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if let Some(armed) = self.advance.take() {
            if armed.generation != self.generation {
                // Superseded activation; the deadline is stale and dies here.
            } else if now >= armed.deadline {
                self.next(now);
                changed = true;
            } else {
                self.advance = Some(armed);
            }
        }

        if let Some(playback) = &mut self.playback {
            if !playback.halted && now >= playback.next_frame_due {
                match playback.source.next_frame() {
                    Ok(Some(frame)) => {
                        playback.decoded_frames += 1;
                        playback.current = Some(frame);
                        playback.next_frame_due += playback.frame_interval;
                        changed = true;
                    }
                    Ok(None) => {
                        log::info!(
                            "video playback finished after {} frames",
                            playback.decoded_frames
                        );
                        playback.halted = true;
                    }
                    Err(e) => {
                        log::warn!("video playback halted: {e}");
                        playback.halted = true;
                    }
                }
            }
        }

        changed
    }

    /// Earliest pending deadline, for scheduling the next repaint. None when
    /// nothing is due.
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        let advance = self
            .advance
            .as_ref()
            .filter(|a| a.generation == self.generation)
            .map(|a| a.deadline.saturating_duration_since(now));
        let frame = self
            .playback
            .as_ref()
            .filter(|p| !p.halted)
            .map(|p| p.next_frame_due.saturating_duration_since(now));
        match (advance, frame) {
            (Some(a), Some(f)) => Some(a.min(f)),
            (a, f) => a.or(f),
        }
    }

    pub fn apply(&mut self, action: Action, now: Instant) {
        match action {
            Action::NextSlide => self.next(now),
            Action::PrevSlide => self.prev(now),
            Action::PenGrow => {
                if self.pen_size < PEN_SIZE_MAX {
                    self.pen_size += 1;
                }
                self.mode = Mode::Draw;
            }
            Action::PenShrink => {
                if self.pen_size > PEN_SIZE_MIN {
                    self.pen_size -= 1;
                }
                self.mode = Mode::Draw;
            }
            Action::ClearInk => {
                let page = self.current_page();
                self.ink.clear(page);
            }
            Action::DrawMode => self.mode = Mode::Draw,
            Action::EraseMode => self.mode = Mode::Erase,
            Action::NormalMode => self.mode = Mode::Normal,
            Action::CyclePenColor => {
                self.pen_color_index = (self.pen_color_index + 1) % PEN_PALETTE.len();
            }
            // Window-level actions are handled by the shell.
            Action::ToggleFullscreen | Action::Quit => {}
        }
    }

    pub fn pointer_pressed(&mut self, pos: Pos2) {
        self.drawing = true;
        if self.mode == Mode::Erase {
            let page = self.current_page();
            let removed = self
                .ink
                .erase_within(page, pos, 2.0 * self.pen_size as f32);
            if removed > 0 {
                log::debug!("erased {removed} strokes on page {page}");
            }
        }
        self.prev_point = Some(pos);
    }

    pub fn pointer_dragged(&mut self, pos: Pos2) {
        if !self.drawing {
            return;
        }
        match self.mode {
            Mode::Draw => {
                if let Some(prev) = self.prev_point {
                    self.ink.append(
                        self.current_page(),
                        Stroke {
                            from: prev,
                            to: pos,
                            width: self.pen_size as f32,
                            color: self.pen_color(),
                        },
                    );
                }
                self.prev_point = Some(pos);
            }
            Mode::Erase => {
                self.prev_point = Some(pos);
            }
            Mode::Normal => {}
        }
    }

    pub fn pointer_released(&mut self) {
        self.drawing = false;
        self.prev_point = None;
    }
}
