#![allow(dead_code)]

pub mod synthetic_image;

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cascade_detector_{name}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
