use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes `contents` to `dir/name`, creating parent directories, and returns the path.
///
/// # Panics
/// Panics on I/O failure; intended for tests only.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create fixture directory");
    }
    fs::write(&path, contents).expect("failed to write fixture file");
    path
}

pub const SAMPLE_ANSWER_KEY: &str = "\
!-- Lab 3 answer key
#[COURSE: CNET 101]
#[LAB: Lab3]
#[PROFESSOR: Dr. Smith]

(3 Points) Router R{UID} basics
    (1) hostname R1-{UID}
    #[DETAIL: R1 - hostname set to {UID}]
    (2) interface g0/0 &&
        ip address 10.{UID}.0.1 255.255.255.0
(2 Points) Security
    (1) enable secret
    #[FEEDBACK: enable secret is not configured]
    (1) /^line vty 0 (4|15)$/
";

pub const SAMPLE_ROSTER: &str = "username,uid\njdoe,7\nasmith,8\nnouid,\nghost,9\n";

pub const SAMPLE_FULL_SUBMISSION: &str = "\
hostname R1-7
enable secret 5 $1$abc
interface g0/0
 ip address 10.7.0.1 255.255.255.0
line vty 0 4
";

pub const SAMPLE_PARTIAL_SUBMISSION: &str = "\
hostname R1-8
interface g0/0
 ip address 10.99.0.1 255.255.255.0
";

/// A complete grading directory in a temp folder.
///
/// - `jdoe` submits a full config, `asmith` a partial one.
/// - `nouid` has no UID, `ghost` has no submission.
///
/// Keep the fixture in scope for as long as you need the files.
pub struct GradingFixture {
    pub dir: TempDir,
    pub config_path: PathBuf,
}

impl GradingFixture {
    pub fn new() -> Self {
        Self::with_answer_key(SAMPLE_ANSWER_KEY)
    }

    pub fn with_answer_key(answer_key: &str) -> Self {
        let dir = TempDir::new().expect("failed to create tempdir");
        let root = dir.path();
        write_file(root, "students.csv", SAMPLE_ROSTER);
        write_file(root, "answer_key.txt", answer_key);
        write_file(root, "submissions/jdoe-config.txt", SAMPLE_FULL_SUBMISSION);
        write_file(root, "submissions/asmith-config.txt", SAMPLE_PARTIAL_SUBMISSION);
        write_file(root, "submissions/nouid-config.txt", SAMPLE_FULL_SUBMISSION);
        let config_path = write_file(
            root,
            "grader.yaml",
            "students_file: students.csv\n\
             submissions_dir: submissions\n\
             answer_key_file: answer_key.txt\n",
        );
        Self { dir, config_path }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root().join("submissions").join("results")
    }
}

impl Default for GradingFixture {
    fn default() -> Self {
        Self::new()
    }
}
