use log::debug;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Prefix of every stored submission path, relative to the upload root
pub const SUBMISSIONS_DIR: &str = "assignments/assignments/submissions";

/// Stores submission files under a fixed directory of the upload root
#[derive(Debug, Clone)]
pub struct SubmissionFiles {
    root: PathBuf,
}

impl SubmissionFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` and returns the relative path to record. Same name overwrites.
    pub async fn store(
        &self,
        student_id: Uuid,
        assignment_id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> std::io::Result<String> {
        let name = storage_name(student_id, assignment_id, filename);
        let relative = format!("{SUBMISSIONS_DIR}/{name}");

        let dir = self.root.join(SUBMISSIONS_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), bytes).await?;
        debug!("Stored {} bytes at {relative}", bytes.len());

        Ok(relative)
    }

    /// Reads a stored file by its canonical relative path
    pub async fn read(&self, relative: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.root.join(relative)).await
    }

    pub async fn remove(&self, relative: &str) -> std::io::Result<()> {
        tokio::fs::remove_file(self.root.join(relative)).await
    }
}

/// `{student_id}_{assignment_id}_{file name}`, keeping only the last path component
pub fn storage_name(student_id: Uuid, assignment_id: Uuid, filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .replace("..", "");
    let base = if base.trim().is_empty() { "upload" } else { base.trim() };

    format!("{student_id}_{assignment_id}_{base}")
}

/// Canonical relative path for a requested download path.
///
/// `..` is removed, backslashes become slashes and surrounding slashes are trimmed.
/// Requests that name only the file are placed under [`SUBMISSIONS_DIR`].
pub fn canonical_path(requested: &str) -> Option<String> {
    let cleaned = requested.replace('\\', "/").replace("..", "");
    let segments: Vec<&str> = cleaned
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    if segments.is_empty() {
        return None;
    }

    let joined = segments.join("/");
    if joined.starts_with(SUBMISSIONS_DIR) {
        Some(joined)
    } else {
        Some(format!("{SUBMISSIONS_DIR}/{joined}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_storage_name_drops_directories() {
        let student = Uuid::nil();
        let assignment = Uuid::from_u128(1);

        let name = storage_name(student, assignment, "../../etc/passwd");
        assert_eq!(name, format!("{student}_{assignment}_passwd"));

        let name = storage_name(student, assignment, "C:\\Users\\me\\hw.py");
        assert!(name.ends_with("_hw.py"));

        let name = storage_name(student, assignment, "");
        assert!(name.ends_with("_upload"));
    }

    #[test]
    fn test_canonical_path() {
        assert_eq!(
            canonical_path("a_b_hw.py").as_deref(),
            Some("assignments/assignments/submissions/a_b_hw.py")
        );
        assert_eq!(
            canonical_path("/assignments/assignments/submissions/a_b_hw.py/").as_deref(),
            Some("assignments/assignments/submissions/a_b_hw.py")
        );
        assert_eq!(
            canonical_path("..\\..\\a_b_hw.py").as_deref(),
            Some("assignments/assignments/submissions/a_b_hw.py")
        );
        assert_eq!(canonical_path("../..//"), None);
    }

    #[tokio::test]
    async fn test_store_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let files = SubmissionFiles::new(dir.path());
        let student = Uuid::new_v4();
        let assignment = Uuid::new_v4();

        let relative = files
            .store(student, assignment, "hw.py", b"print('hi')")
            .await
            .unwrap();

        assert_eq!(
            relative,
            format!("{SUBMISSIONS_DIR}/{student}_{assignment}_hw.py")
        );
        assert_eq!(files.read(&relative).await.unwrap(), b"print('hi')");

        // same name overwrites
        files.store(student, assignment, "hw.py", b"v2").await.unwrap();
        assert_eq!(files.read(&relative).await.unwrap(), b"v2");
    }
}
