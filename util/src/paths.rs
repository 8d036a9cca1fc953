use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Replaces path separators so a name can be used as one path component.
fn file_component(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

/// A student's submission file: {submissions_dir}/{username}-{file}
/// Example: submission_path("subs", "jdoe", "R1.txt") → subs/jdoe-R1.txt
pub fn submission_path(submissions_dir: &Path, username: &str, file: &str) -> PathBuf {
    submissions_dir.join(format!("{}-{}", file_component(username), file_component(file)))
}

/// A student's feedback file: {feedback_dir}/{username}-{lab}-feedback.yaml
pub fn feedback_path(feedback_dir: &Path, username: &str, lab: &str) -> PathBuf {
    feedback_dir.join(format!(
        "{}-{}-feedback.yaml",
        file_component(username),
        file_component(lab)
    ))
}

/// Sibling path used while a file is being written: `<name>.tmp`.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut tmp = final_path.to_path_buf();
    let fname = final_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    tmp.set_file_name(format!("{fname}.tmp"));
    tmp
}
