use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

pub fn write_asset(base: &Path, relative: &str, content: &[u8]) {
    let path = base.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap().write_all(content).unwrap();
}

/// Three images of distinct content plus a file the default filters ignore.
pub fn create_asset_tree(base: &Path) {
    write_asset(base, "logo.png", &[1u8; 4000]);
    write_asset(base, "img/photo.jpg", &[2u8; 6000]);
    write_asset(base, "img/banner.jpeg", &[3u8; 8000]);
    write_asset(base, "notes.txt", b"not an image");
}

pub fn read_json_list(path: &Path) -> Vec<String> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}
