//! Classification of a calculation's output artifacts.

use std::borrow::Cow;
use std::path::Path;

use tracing::{debug, trace};

use crate::error::DecodeError;
use crate::registry::FileKind;

/// Content of one classified artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent<'a> {
    /// Text of stdout or of a named file.
    Text(Cow<'a, str>),
    /// The output directory.
    Directory(&'a Path),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Stdout,
    Directory,
    Named(usize),
    Done,
}

/// Lazy sequence of `(FileKind, FileContent)` pairs for one calculation.
///
/// Yields stdout first, then the directory, then each named file found in
/// the directory in the order given. Missing named files are skipped. A
/// directory that does not exist ends the sequence with
/// [`DecodeError::InvalidDirectory`].
#[derive(Debug, Clone)]
pub struct ClassifiedFiles<'a> {
    stdout: Option<&'a str>,
    directory: Option<&'a Path>,
    named_files: &'static [&'static str],
    stage: Stage,
}

impl<'a> ClassifiedFiles<'a> {
    pub fn new(
        stdout: Option<&'a str>,
        directory: Option<&'a Path>,
        named_files: &'static [&'static str],
    ) -> Self {
        Self {
            stdout,
            directory,
            named_files,
            stage: Stage::Stdout,
        }
    }
}

impl<'a> Iterator for ClassifiedFiles<'a> {
    type Item = Result<(FileKind, FileContent<'a>), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stage {
                Stage::Stdout => {
                    self.stage = Stage::Directory;
                    if let Some(stdout) = self.stdout {
                        return Some(Ok((FileKind::Stdout, FileContent::Text(Cow::Borrowed(stdout)))));
                    }
                }
                Stage::Directory => {
                    let Some(directory) = self.directory else {
                        self.stage = Stage::Done;
                        continue;
                    };
                    if !directory.is_dir() {
                        self.stage = Stage::Done;
                        return Some(Err(DecodeError::InvalidDirectory(directory.to_path_buf())));
                    }
                    self.stage = Stage::Named(0);
                    return Some(Ok((FileKind::Directory, FileContent::Directory(directory))));
                }
                Stage::Named(index) => {
                    let (Some(directory), Some(name)) = (self.directory, self.named_files.get(index).copied())
                    else {
                        self.stage = Stage::Done;
                        continue;
                    };
                    self.stage = Stage::Named(index + 1);

                    let path = directory.join(name);
                    if !path.is_file() {
                        trace!("Named file {} not present", path.display());
                        continue;
                    }
                    debug!("Found named file {}", path.display());
                    return Some(
                        std::fs::read_to_string(&path)
                            .map(|text| (FileKind::Named(name), FileContent::Text(Cow::Owned(text))))
                            .map_err(|source| DecodeError::Io { path, source }),
                    );
                }
                Stage::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NAMED: &[&str] = &["first.out", "second.out", "third.out"];

    fn kinds(files: ClassifiedFiles<'_>) -> Vec<FileKind> {
        files.map(|item| item.unwrap().0).collect()
    }

    #[test]
    fn test_stdout_only() {
        let files: Vec<_> = ClassifiedFiles::new(Some("hello"), None, NAMED)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(files, vec![(FileKind::Stdout, FileContent::Text("hello".into()))]);
    }

    #[test]
    fn test_named_files_in_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        // Written in reverse so directory order cannot explain the result
        std::fs::write(dir.path().join("third.out"), "3").unwrap();
        std::fs::write(dir.path().join("first.out"), "1").unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), "x").unwrap();

        let expected = vec![
            FileKind::Stdout,
            FileKind::Directory,
            FileKind::Named("first.out"),
            FileKind::Named("third.out"),
        ];
        let files = ClassifiedFiles::new(Some("out"), Some(dir.path()), NAMED);
        assert_eq!(kinds(files.clone()), expected);
        // Re-iterating gives the same sequence
        assert_eq!(kinds(files), expected);
    }

    #[test]
    fn test_named_file_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("second.out"), "two").unwrap();
        let (kind, content) = ClassifiedFiles::new(None, Some(dir.path()), NAMED)
            .nth(1)
            .unwrap()
            .unwrap();
        assert_eq!(kind, FileKind::Named("second.out"));
        assert!(matches!(content, FileContent::Text(ref text) if text == "two"));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let mut files = ClassifiedFiles::new(Some("out"), Some(&missing), NAMED);

        assert!(matches!(files.next(), Some(Ok((FileKind::Stdout, _)))));
        assert!(matches!(files.next(), Some(Err(DecodeError::InvalidDirectory(_)))));
        assert!(files.next().is_none());
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let mut files = ClassifiedFiles::new(None, Some(&file), NAMED);
        assert!(matches!(files.next(), Some(Err(DecodeError::InvalidDirectory(_)))));
    }
}
