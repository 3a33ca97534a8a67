use atomic_float::AtomicF32;
use nih_plug::prelude::{Editor, GuiContext};
use nih_plug_iced::canvas::{self, Canvas, Cursor, Geometry, Path, Program, Stroke};
use nih_plug_iced::widgets as nih_widgets;
use nih_plug_iced::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::biquad::BiquadCoeffs;
use crate::params::PhaseEqParams;

/// Vertical span of the magnitude plot in dB, matching the gain range.
const PLOT_RANGE_DB: f32 = 10.0;

// Makes sense to also define this here, makes it a bit easier to keep track of
pub(crate) fn default_state() -> Arc<IcedState> {
    IcedState::from_size(1000, 800)
}

pub(crate) fn create(
    params: Arc<PhaseEqParams>,
    sample_rate: Arc<AtomicF32>,
    response_changed: Arc<AtomicBool>,
    editor_state: Arc<IcedState>,
) -> Option<Box<dyn Editor>> {
    create_iced_editor::<PhaseEqEditor>(editor_state, (params, sample_rate, response_changed))
}

struct PhaseEqEditor {
    params: Arc<PhaseEqParams>,
    context: Arc<dyn GuiContext>,

    sample_rate: Arc<AtomicF32>,
    /// Set by the audio thread after a coefficient recompute; consumed here
    /// once per frame to invalidate the cached plot geometry.
    response_changed: Arc<AtomicBool>,
    plot_cache: canvas::Cache,

    freq_slider_state: nih_widgets::param_slider::State,
    gain_slider_state: nih_widgets::param_slider::State,
    q_slider_state: nih_widgets::param_slider::State,
    filter_type_slider_state: nih_widgets::param_slider::State,
}

#[derive(Debug, Clone, Copy)]
enum Message {
    /// Update a parameter's value.
    ParamUpdate(nih_widgets::ParamMessage),
}

impl IcedEditor for PhaseEqEditor {
    type Executor = executor::Default;
    type Message = Message;
    type InitializationFlags = (Arc<PhaseEqParams>, Arc<AtomicF32>, Arc<AtomicBool>);

    fn new(
        (params, sample_rate, response_changed): Self::InitializationFlags,
        context: Arc<dyn GuiContext>,
    ) -> (Self, Command<Self::Message>) {
        let editor = PhaseEqEditor {
            params,
            context,

            sample_rate,
            response_changed,
            plot_cache: canvas::Cache::new(),

            freq_slider_state: Default::default(),
            gain_slider_state: Default::default(),
            q_slider_state: Default::default(),
            filter_type_slider_state: Default::default(),
        };

        (editor, Command::none())
    }

    fn context(&self) -> &dyn GuiContext {
        self.context.as_ref()
    }

    fn update(
        &mut self,
        _window: &mut WindowQueue,
        message: Self::Message,
    ) -> Command<Self::Message> {
        match message {
            Message::ParamUpdate(message) => self.handle_param_message(message),
        }

        Command::none()
    }

    fn view(&mut self) -> Element<'_, Self::Message> {
        // This is the GUI end of the redraw protocol: the audio thread raises
        // the flag after swapping coefficients, and the frame timer brings us
        // here to drop the stale geometry.
        if self.response_changed.swap(false, Ordering::AcqRel) {
            self.plot_cache.clear();
        }

        let plot = ResponsePlot {
            cache: &self.plot_cache,
            params: &self.params,
            sample_rate: self.sample_rate.load(Ordering::Relaxed),
        };

        Column::new()
            .align_items(Alignment::Center)
            .padding(20)
            .spacing(10)
            .push(
                Text::new("Phase EQ")
                    .font(assets::NOTO_SANS_LIGHT)
                    .size(24)
                    .height(30.into())
                    .width(Length::Fill)
                    .color(Color::WHITE)
                    .horizontal_alignment(alignment::Horizontal::Center)
                    .vertical_alignment(alignment::Vertical::Bottom),
            )
            .push(
                Canvas::new(plot)
                    .width(Length::Fill)
                    .height(Length::Units(400)),
            )
            .push(Space::with_height(10.into()))
            .push(
                nih_widgets::ParamSlider::new(&mut self.freq_slider_state, &self.params.freq)
                    .map(Message::ParamUpdate),
            )
            .push(
                nih_widgets::ParamSlider::new(&mut self.gain_slider_state, &self.params.gain)
                    .map(Message::ParamUpdate),
            )
            .push(
                nih_widgets::ParamSlider::new(&mut self.q_slider_state, &self.params.q)
                    .map(Message::ParamUpdate),
            )
            .push(
                nih_widgets::ParamSlider::new(
                    &mut self.filter_type_slider_state,
                    &self.params.filter_type,
                )
                .map(Message::ParamUpdate),
            )
            .into()
    }

    fn background_color(&self) -> nih_plug_iced::Color {
        nih_plug_iced::Color {
            r: 0.08,
            g: 0.08,
            b: 0.08,
            a: 1.0,
        }
    }
}

/// Magnitude (green) and phase (blue) response curves over a bordered
/// window. The curves are evaluated against the editor's own coefficient
/// snapshot; the audio thread's set is never touched from here.
struct ResponsePlot<'a> {
    cache: &'a canvas::Cache,
    params: &'a PhaseEqParams,
    sample_rate: f32,
}

impl<'a> ResponsePlot<'a> {
    /// One query frequency per pixel column, crowded toward the low end the
    /// same way the frequency parameter is.
    fn query_freq(&self, column: usize, columns: usize) -> f64 {
        let nyquist = f64::from(self.sample_rate) / 2.0;
        let t = column as f64 / columns as f64;
        nyquist * (1.0 - ((1.0 - t).ln() * 0.1).exp())
    }
}

impl<'a> Program<Message> for ResponsePlot<'a> {
    fn draw(&self, bounds: Rectangle, _cursor: Cursor) -> Vec<Geometry> {
        let plot = self.cache.draw(bounds.size(), |frame| {
            let width = frame.width();
            let height = frame.height();
            let sample_rate = f64::from(self.sample_rate);

            let coeffs = BiquadCoeffs::compute(
                self.params.filter_type.value(),
                self.params.freq.value(),
                self.params.gain.value(),
                self.params.q.value(),
                self.sample_rate,
            )
            .unwrap_or(BiquadCoeffs::IDENTITY);

            let columns = (width as usize).max(2);

            let magnitude_curve = Path::new(|path| {
                for column in 0..columns {
                    let freq = self.query_freq(column, columns);
                    let (mag, _) = coeffs.response_at(freq, sample_rate);

                    let db = 20.0 * (mag.max(1e-9)).log10() as f32;
                    let y = ((PLOT_RANGE_DB - db) / (2.0 * PLOT_RANGE_DB) * height)
                        .clamp(0.0, height);

                    let point = Point::new(column as f32, y);
                    if column == 0 {
                        path.move_to(point);
                    } else {
                        path.line_to(point);
                    }
                }
            });

            let phase_curve = Path::new(|path| {
                for column in 0..columns {
                    let freq = self.query_freq(column, columns);
                    let (_, phase) = coeffs.response_at(freq, sample_rate);

                    let degrees = phase.to_degrees() as f32;
                    let y = ((degrees + 180.0) / 360.0 * height).clamp(0.0, height);

                    let point = Point::new(column as f32, y);
                    if column == 0 {
                        path.move_to(point);
                    } else {
                        path.line_to(point);
                    }
                }
            });

            frame.stroke(
                &phase_curve,
                Stroke::default()
                    .with_color(Color::from_rgb(0.12, 0.56, 1.0))
                    .with_width(1.5),
            );
            frame.stroke(
                &magnitude_curve,
                Stroke::default()
                    .with_color(Color::from_rgb(0.56, 0.93, 0.56))
                    .with_width(1.5),
            );

            frame.stroke(
                &Path::rectangle(Point::ORIGIN, frame.size()),
                Stroke::default()
                    .with_color(Color::from_rgb(0.83, 0.83, 0.83))
                    .with_width(1.0),
            );
        });

        vec![plot]
    }
}
