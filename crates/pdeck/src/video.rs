//! Sequential video frame decoding.
//!
//! Playback consumes frames strictly in order; nothing here seeks. The
//! FFmpeg backend sits behind the `video-ffmpeg` feature so plain builds
//! need no native libraries; without it, opening a clip reports
//! `MediaError::Disabled` and the slide falls back to its static page.

use crate::config::VideoRef;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to open video {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("failed to decode video frame: {0}")]
    Decode(String),
    #[error("built without video support (enable the 'video-ffmpeg' feature)")]
    Disabled,
}

/// One decoded frame, channel order normalized to RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// A sequentially decodable video stream.
pub trait FrameSource {
    fn frame_count(&self) -> u64;
    fn fps(&self) -> f64;

    /// Decode the next frame. `Ok(None)` marks the end of the stream.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, MediaError>;
}

/// Opens frame sources for the controller. Injected so tests can hand the
/// controller synthetic streams instead of real files.
pub trait MediaOpener {
    fn open(&self, video: &VideoRef) -> Result<Box<dyn FrameSource>, MediaError>;
}

/// Opener used by the running application.
pub struct SystemOpener;

impl MediaOpener for SystemOpener {
    fn open(&self, video: &VideoRef) -> Result<Box<dyn FrameSource>, MediaError> {
        open_video(video)
    }
}

#[cfg(feature = "video-ffmpeg")]
pub fn open_video(video: &VideoRef) -> Result<Box<dyn FrameSource>, MediaError> {
    Ok(Box::new(ffmpeg_source::FfmpegSource::open(&video.path)?))
}

#[cfg(not(feature = "video-ffmpeg"))]
pub fn open_video(_video: &VideoRef) -> Result<Box<dyn FrameSource>, MediaError> {
    Err(MediaError::Disabled)
}

#[cfg(feature = "video-ffmpeg")]
mod ffmpeg_source {
    use super::{FrameSource, MediaError, VideoFrame};
    use ffmpeg_next as ffmpeg;
    use ffmpeg::format;
    use ffmpeg::media::Type;
    use ffmpeg::software::scaling;
    use ffmpeg::util::frame::video::Video as FfmpegFrame;
    use std::path::Path;

    pub struct FfmpegSource {
        input: format::context::Input,
        stream_index: usize,
        decoder: ffmpeg::codec::decoder::Video,
        scaler: scaling::Context,
        width: u32,
        height: u32,
        frame_count: u64,
        fps: f64,
        ended: bool,
    }

    impl FfmpegSource {
        pub fn open(path: &Path) -> Result<Self, MediaError> {
            let open_err = |message: String| MediaError::Open {
                path: path.to_path_buf(),
                message,
            };

            ffmpeg::init().map_err(|e| open_err(format!("ffmpeg init: {e}")))?;

            let input = format::input(path).map_err(|e| open_err(e.to_string()))?;
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| open_err("no video stream".to_string()))?;
            let stream_index = stream.index();

            let rate = stream.avg_frame_rate();
            let fps = if rate.1 != 0 {
                rate.0 as f64 / rate.1 as f64
            } else {
                30.0
            };
            let container_frames = stream.frames();

            let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| open_err(e.to_string()))?
                .decoder()
                .video()
                .map_err(|e| open_err(e.to_string()))?;

            let width = decoder.width();
            let height = decoder.height();
            let scaler = scaling::Context::get(
                decoder.format(),
                width,
                height,
                ffmpeg::format::Pixel::RGB24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )
            .map_err(|e| open_err(e.to_string()))?;

            // Containers that don't record a frame count get an estimate
            // from duration and rate.
            let frame_count = if container_frames > 0 {
                container_frames as u64
            } else {
                let duration = input.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
                (duration.max(0.0) * fps) as u64
            };

            Ok(Self {
                input,
                stream_index,
                decoder,
                scaler,
                width,
                height,
                frame_count,
                fps,
                ended: false,
            })
        }

        /// Pull one decoded frame out of the decoder, converted to tightly
        /// packed RGB. `Ok(None)` means the decoder wants more packets.
        fn receive_rgb(&mut self) -> Result<Option<VideoFrame>, MediaError> {
            let mut decoded = FfmpegFrame::empty();
            if self.decoder.receive_frame(&mut decoded).is_err() {
                return Ok(None);
            }

            let mut rgb = FfmpegFrame::empty();
            self.scaler
                .run(&decoded, &mut rgb)
                .map_err(|e| MediaError::Decode(e.to_string()))?;

            let stride = rgb.stride(0);
            let row_bytes = self.width as usize * 3;
            let src = rgb.data(0);
            let mut data = Vec::with_capacity(row_bytes * self.height as usize);
            for y in 0..self.height as usize {
                let start = y * stride;
                data.extend_from_slice(&src[start..start + row_bytes]);
            }

            Ok(Some(VideoFrame {
                width: self.width,
                height: self.height,
                rgb: data,
            }))
        }
    }

    impl FrameSource for FfmpegSource {
        fn frame_count(&self) -> u64 {
            self.frame_count
        }

        fn fps(&self) -> f64 {
            self.fps
        }

        fn next_frame(&mut self) -> Result<Option<VideoFrame>, MediaError> {
            if self.ended {
                return Ok(None);
            }
            loop {
                if let Some(frame) = self.receive_rgb()? {
                    return Ok(Some(frame));
                }
                match self.input.packets().next() {
                    Some((stream, packet)) => {
                        if stream.index() == self.stream_index {
                            self.decoder
                                .send_packet(&packet)
                                .map_err(|e| MediaError::Decode(e.to_string()))?;
                        }
                    }
                    None => {
                        // Out of packets: flush the decoder and drain any
                        // buffered frames one call at a time.
                        self.decoder.send_eof().ok();
                        let tail = self.receive_rgb()?;
                        if tail.is_none() {
                            self.ended = true;
                        }
                        return Ok(tail);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed-length synthetic stream of solid frames.
    struct RampSource {
        produced: u64,
        total: u64,
    }

    impl FrameSource for RampSource {
        fn frame_count(&self) -> u64 {
            self.total
        }

        fn fps(&self) -> f64 {
            25.0
        }

        fn next_frame(&mut self) -> Result<Option<VideoFrame>, MediaError> {
            if self.produced >= self.total {
                return Ok(None);
            }
            let shade = self.produced as u8;
            self.produced += 1;
            Ok(Some(VideoFrame {
                width: 2,
                height: 2,
                rgb: vec![shade; 2 * 2 * 3],
            }))
        }
    }

    #[test]
    fn test_source_is_sequential_then_ends() {
        let mut source: Box<dyn FrameSource> = Box::new(RampSource {
            produced: 0,
            total: 3,
        });
        assert_eq!(source.frame_count(), 3);
        for expected in 0u8..3 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.rgb[0], expected);
            assert_eq!(frame.rgb.len(), 12);
        }
        assert!(source.next_frame().unwrap().is_none());
        // Stays ended.
        assert!(source.next_frame().unwrap().is_none());
    }

    #[cfg(not(feature = "video-ffmpeg"))]
    #[test]
    fn test_open_without_backend_is_disabled() {
        let video = VideoRef {
            path: "clip.mp4".into(),
            fps: 25,
        };
        assert!(matches!(open_video(&video), Err(MediaError::Disabled)));
    }
}
