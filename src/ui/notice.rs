use crate::app::Notice;
use imgui::Ui;

const POPUP_ID: &str = "Segment Error";

/// Modal that blocks the window until the user acknowledges a failed load
#[derive(Debug, Default)]
pub struct NoticeModal {
    opened: Option<u64>,
}

impl NoticeModal {
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once per notice: the frame it first has to be opened
    fn take_open_request(&mut self, notice: &Notice) -> bool {
        if self.opened == Some(notice.serial) {
            return false;
        }
        self.opened = Some(notice.serial);
        true
    }

    /// Returns true once the user dismissed the notice
    pub fn render(&mut self, ui: &Ui, notice: Option<&Notice>) -> bool {
        let Some(notice) = notice else {
            return false;
        };

        if self.take_open_request(notice) {
            ui.open_popup(POPUP_ID);
        }

        let mut dismissed = false;
        ui.modal_popup_config(POPUP_ID)
            .always_auto_resize(true)
            .build(|| {
                ui.text(&notice.title);
                ui.separator();
                ui.text_colored([1.0, 0.45, 0.45, 1.0], &notice.message);
                ui.separator();
                if ui.button("OK") {
                    dismissed = true;
                    ui.close_current_popup();
                }
            });
        dismissed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(serial: u64) -> Notice {
        Notice {
            serial,
            title: "Segment 4".into(),
            message: "segment has no records".into(),
        }
    }

    #[test]
    fn test_popup_opened_once_per_notice() {
        let mut modal = NoticeModal::new();
        let first = notice(1);

        assert!(modal.take_open_request(&first));
        assert!(!modal.take_open_request(&first));
        assert!(!modal.take_open_request(&first));

        assert!(modal.take_open_request(&notice(2)));
        assert!(!modal.take_open_request(&notice(2)));
    }
}
