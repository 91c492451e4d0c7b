//! Byte-level Sixel state machine.
//!
//! The parser classifies each payload byte, accumulates numeric parameters
//! and dispatches commands through the [`SixelResponder`] seam. It keeps no
//! reference to its responder; every call takes one by `&mut`, so a builder
//! and the parser can live side by side and tests can substitute a recorder.
//!
//! Ingestion never fails. Unknown bytes are skipped, numeric parameters
//! saturate, and anything out of range is clamped downstream, which is the
//! permissive behavior expected of a terminal.

use std::mem;

/// Receiver for the commands the parser extracts from a Sixel stream.
///
/// [`SixelImageBuilder`](crate::SixelImageBuilder) is the production
/// implementation.
pub trait SixelResponder {
    /// Raster attributes: aspect ratio numerator/denominator and the declared
    /// image dimensions. A width or height of 0 leaves that dimension as is.
    fn set_raster(&mut self, pan: u16, pad: u16, width: u16, height: u16);

    /// Selects the palette slot used by subsequent renders.
    fn use_color(&mut self, index: u16);

    /// Defines palette slot `index` from hue (0..=360), lightness and
    /// saturation (percent).
    fn define_hls_color(&mut self, index: u16, hue: u16, lightness: u16, saturation: u16);

    /// Defines palette slot `index` from percent RGB channels.
    fn define_rgb_color(&mut self, index: u16, red: u16, green: u16, blue: u16);

    /// Plots one sixel (0..=63, bit 0 topmost) at the cursor and advances it.
    fn render(&mut self, sixel: u8);

    /// Plots `count` copies of `sixel`; a count of 0 means 1.
    fn render_repeated(&mut self, count: u16, sixel: u8);

    /// Graphic carriage return: column back to 0.
    fn rewind(&mut self);

    /// Graphic line feed: column 0, down one band of six pixels.
    fn newline(&mut self);

    /// The stream is complete (for now); settle deferred raster geometry.
    fn finalize(&mut self);
}

/// Parameters past this count are accepted but ignored. No Sixel command
/// takes more than five.
const MAX_COMMAND_PARAMS: usize = 8;

/// Bounded accumulator for the numeric parameters of one command.
#[derive(Debug, Default, Clone, Copy)]
struct Params {
    values: [u16; MAX_COMMAND_PARAMS],
    len: usize,
    current: u16,
    /// The parameter being accumulated has seen at least one digit.
    started: bool,
}

impl Params {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn push_digit(&mut self, byte: u8) {
        self.current = self
            .current
            .saturating_mul(10)
            .saturating_add(u16::from(byte - b'0'));
        self.started = true;
    }

    /// `;` terminates the current parameter; an empty parameter is 0.
    fn next_parameter(&mut self) {
        if self.len < MAX_COMMAND_PARAMS {
            self.values[self.len] = self.current;
            self.len += 1;
        }
        self.current = 0;
        self.started = false;
    }

    /// Closes a trailing started parameter and returns the parameter list.
    fn finish(&mut self) -> &[u16] {
        if self.started {
            self.next_parameter();
        }
        &self.values[..self.len]
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Ground,
    RasterSettings,
    ColorIntroducer,
    RepeatIntroducer,
}

/// Streaming parser for the picture definition of a Sixel sequence.
///
/// State persists across [`parse_fragment`](Self::parse_fragment) calls, so
/// the payload may arrive in arbitrary fragments.
#[derive(Debug, Default)]
pub struct SixelParser {
    state: State,
    params: Params,
}

impl SixelParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a payload fragment through the state machine.
    pub fn parse_fragment<R: SixelResponder>(&mut self, data: &[u8], responder: &mut R) {
        for &byte in data {
            self.advance(byte, responder);
        }
    }

    /// Flushes any pending parameter-only command and finalizes the raster.
    ///
    /// The parser is left in ground state; the stream may legally continue
    /// afterwards.
    pub fn done<R: SixelResponder>(&mut self, responder: &mut R) {
        if self.state != State::Ground {
            // NUL terminates the pending command and is inert in ground.
            self.dispatch(0, responder);
        }
        responder.finalize();
    }

    fn advance<R: SixelResponder>(&mut self, byte: u8, responder: &mut R) {
        if self.state == State::Ground {
            self.ground(byte, responder);
            return;
        }

        match byte {
            b'0'..=b'9' => self.params.push_digit(byte),
            b';' => self.params.next_parameter(),
            _ => {
                if self.dispatch(byte, responder) {
                    self.ground(byte, responder);
                }
            }
        }
    }

    fn ground<R: SixelResponder>(&mut self, byte: u8, responder: &mut R) {
        match byte {
            b'!' => self.enter(State::RepeatIntroducer),
            b'"' => self.enter(State::RasterSettings),
            b'#' => self.enter(State::ColorIntroducer),
            b'$' => responder.rewind(),
            b'-' => responder.newline(),
            0x3F..=0x7E => responder.render(byte - 0x3F),
            _ => {} // Unknown bytes are skipped.
        }
    }

    fn enter(&mut self, state: State) {
        self.params.clear();
        self.state = state;
    }

    /// Executes the command terminated by `byte` and returns to ground.
    /// Returns true when `byte` still needs to be processed there.
    fn dispatch<R: SixelResponder>(&mut self, byte: u8, responder: &mut R) -> bool {
        let state = mem::take(&mut self.state);
        let params = self.params.finish();
        let param = |index: usize, default: u16| params.get(index).copied().unwrap_or(default);

        match state {
            State::Ground => true,

            State::RasterSettings => {
                responder.set_raster(param(0, 1), param(1, 1), param(2, 0), param(3, 0));
                true
            }

            State::ColorIntroducer => {
                let index = param(0, 0);
                match params.get(1).copied() {
                    Some(1) => {
                        responder.define_hls_color(index, param(2, 0), param(3, 0), param(4, 0));
                        responder.use_color(index);
                    }
                    Some(2) => {
                        responder.define_rgb_color(index, param(2, 0), param(3, 0), param(4, 0));
                        responder.use_color(index);
                    }
                    _ => responder.use_color(index),
                }
                true
            }

            State::RepeatIntroducer => {
                if (0x3F..=0x7E).contains(&byte) {
                    responder.render_repeated(param(0, 1), byte - 0x3F);
                    false
                } else {
                    // Aborted repeat; drop the count silently.
                    true
                }
            }
        }
    }
}
