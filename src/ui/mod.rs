pub mod controls;
pub mod dialogs;
pub mod notice;
pub mod road_view;

pub use controls::{ControlAction, ControlPanel};
pub use dialogs::FileDialogs;
pub use notice::NoticeModal;
pub use road_view::RoadView;
