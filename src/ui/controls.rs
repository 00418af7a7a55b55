use crate::app::AppState;
use crate::playback::PlaybackState;
use imgui::{Condition, Ui};

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    Start(String),
    BrowseDataset,
    UseDemo,
}

/// Segment entry, dataset selection and playback status
pub struct ControlPanel {
    pub segment_input: String,
    input_error: Option<String>,
}

impl ControlPanel {
    pub fn new(segment_input: String) -> Self {
        Self {
            segment_input,
            input_error: None,
        }
    }

    /// Show why the last Start was refused, next to the input
    pub fn set_input_error(&mut self, error: Option<String>) {
        self.input_error = error;
    }

    pub fn render(&mut self, ui: &Ui, app: &AppState, show: &mut bool) -> Option<ControlAction> {
        if !*show {
            return None;
        }

        let mut action = None;
        ui.window("Controls")
            .size([360.0, 260.0], Condition::FirstUseEver)
            .position([20.0, 640.0], Condition::FirstUseEver)
            .opened(show)
            .build(|| {
                ui.text("Road segment");
                let _width = ui.push_item_width(120.0);
                let entered = ui
                    .input_text("##segment", &mut self.segment_input)
                    .enter_returns_true(true)
                    .build();
                ui.same_line();
                if ui.button("Start") || entered {
                    action = Some(ControlAction::Start(self.segment_input.clone()));
                }
                if let Some(ref error) = self.input_error {
                    ui.text_colored([1.0, 0.6, 0.2, 1.0], error);
                }

                ui.separator();
                ui.text(format!("Source: {}", app.source_name()));
                if ui.button("Open Dataset...") {
                    action = Some(ControlAction::BrowseDataset);
                }
                ui.same_line();
                if ui.button("Demo Data") {
                    action = Some(ControlAction::UseDemo);
                }

                ui.separator();
                let controller = app.controller();
                match (controller.state(), controller.segment()) {
                    (PlaybackState::Playing, Some(segment)) => {
                        ui.text(format!("Segment {}", segment));
                        ui.text(format!(
                            "Record {}/{} | ticks {}",
                            controller.context().store.cursor(),
                            controller.context().store.len(),
                            controller.scheduler().ticks()
                        ));
                        if let (Some(record), Some(state)) =
                            (controller.context().current_record(), controller.context().published())
                        {
                            ui.text(format!(
                                "Density {} | brakes {}",
                                record.local_car_density, record.brake_events
                            ));
                            ui.text(format!(
                                "Cars {} | scroll {:.2} | wheels {:.2} rad/s",
                                state.active_car_count, state.scroll_speed, state.rotation_speed
                            ));
                            ui.text_disabled(format!(
                                "{} frames, {} tile wraps",
                                controller.animator().frames(),
                                controller.animator().relocations()
                            ));
                        }
                    }
                    _ if app.is_loading() => ui.text("Loading..."),
                    _ => ui.text_disabled("Idle"),
                }

                if let Some(status) = app.status_message() {
                    ui.separator();
                    ui.text_wrapped(status);
                }
            });
        action
    }
}
