use rfd::FileDialog;
use std::path::PathBuf;

/// File dialog helper for jamview
pub struct FileDialogs;

impl FileDialogs {
    /// Open a file dialog for selecting a traffic dataset
    pub fn open_dataset() -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("Traffic Datasets", &["csv", "json"])
            .add_filter("CSV Files", &["csv"])
            .add_filter("JSON Files", &["json"])
            .add_filter("All Files", &["*"])
            .set_title("Open Traffic Dataset")
            .pick_file()
    }
}
