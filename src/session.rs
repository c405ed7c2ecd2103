/// Resumable annotation session
///
/// Owns the worklist of images still to label, a cursor into it, and the
/// annotations submitted during this run. Images whose basename already has a
/// `<basename>.json` file in the output directory are skipped, so a session can
/// be stopped at any point and restarted later.
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::config::{ANNOTATION_EXTENSION, DEFAULT_OUTPUT_SUBDIR};
use crate::error::{AnnotatorError, Result};
use crate::file_io::{self, get_basename};
use crate::label::{Annotation, AnnotationCandidate};

/// Where the images to annotate come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Every image immediately inside the directory
    Directory(PathBuf),
    /// Exactly these files, in this order
    Files(Vec<PathBuf>),
}

/// One image to annotate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub path: PathBuf,
    pub basename: String,
}

impl Example {
    pub fn new(path: PathBuf) -> Option<Self> {
        let basename = get_basename(&path)?;
        Some(Self { path, basename })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.basename.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub annotated: usize,
    pub remaining: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} example(s) annotated, {} example(s) remaining",
            self.annotated, self.remaining
        )
    }
}

pub struct AnnotationSession {
    input: InputSource,
    output_dir: PathBuf,
    examples: Vec<Example>,
    cursor: usize,
    annotations: Vec<(Example, Annotation)>,
}

impl AnnotationSession {
    /// Create a session, defaulting the output directory to `<input>/labels`
    #[allow(dead_code)]
    pub fn new(input: InputSource, output_dir: Option<PathBuf>) -> Result<Self> {
        Self::with_output_subdir(input, output_dir, DEFAULT_OUTPUT_SUBDIR)
    }

    /// Create a session, defaulting the output directory to `<input>/<output_subdir>`
    pub fn with_output_subdir(
        input: InputSource,
        output_dir: Option<PathBuf>,
        output_subdir: &str,
    ) -> Result<Self> {
        Self::validate_input(&input)?;
        let output_dir = Self::set_output_dir(&input, output_dir, output_subdir)?;

        let mut session = Self {
            input,
            output_dir,
            examples: Vec::new(),
            cursor: 0,
            annotations: Vec::new(),
        };
        session.examples = session.compute_pending()?;

        if session.examples.is_empty() {
            info!("Nothing to annotate: no images found or all of them already have annotations");
        } else {
            info!("{} example(s) to annotate", session.examples.len());
        }
        Ok(session)
    }

    fn validate_input(input: &InputSource) -> Result<()> {
        match input {
            InputSource::Directory(directory) => {
                if !file_io::is_directory(directory) {
                    return Err(AnnotatorError::InputNotFound(directory.clone()));
                }
            }
            InputSource::Files(paths) => {
                if let Some(missing) = paths.iter().find(|path| !file_io::is_file(path)) {
                    return Err(AnnotatorError::InputNotFound(missing.clone()));
                }
            }
        }
        Ok(())
    }

    /// Resolve the output directory and create it if it does not exist yet
    fn set_output_dir(
        input: &InputSource,
        output_dir: Option<PathBuf>,
        output_subdir: &str,
    ) -> Result<PathBuf> {
        let output_dir = match (output_dir, input) {
            (Some(dir), _) => dir,
            (None, InputSource::Directory(directory)) => directory.join(output_subdir),
            (None, InputSource::Files(_)) => return Err(AnnotatorError::OutputDirRequired),
        };
        let output_dir = std::path::absolute(&output_dir).unwrap_or(output_dir);

        if !file_io::is_directory(&output_dir) {
            fs::create_dir_all(&output_dir).map_err(|source| {
                AnnotatorError::DirectoryCreationFailed {
                    path: output_dir.clone(),
                    source,
                }
            })?;
            info!("created output directory: {}", output_dir.display());
        }
        Ok(output_dir)
    }

    fn list_input_examples(&self) -> Result<Vec<Example>> {
        let paths = match &self.input {
            InputSource::Directory(directory) => file_io::list_images_in_directory(directory)?,
            InputSource::Files(paths) => paths.clone(),
        };

        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut examples = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(example) = Example::new(path) else {
                warn!("Skipping input without a file name");
                continue;
            };
            if let Some(first) = seen.get(&example.basename) {
                return Err(AnnotatorError::DuplicateBasename {
                    basename: example.basename,
                    first: first.clone(),
                    second: example.path,
                });
            }
            seen.insert(example.basename.clone(), example.path.clone());
            examples.push(example);
        }
        Ok(examples)
    }

    /// Input images whose basename has no annotation file yet, in discovery order
    pub fn compute_pending(&self) -> Result<Vec<Example>> {
        let all_examples = self.list_input_examples()?;
        let already_annotated = file_io::get_basenames_in_directory(&self.output_dir)?;

        let pending: Vec<Example> = all_examples
            .into_iter()
            .filter(|example| !already_annotated.contains(&example.basename))
            .collect();
        debug!(
            "{} already annotated, {} pending",
            already_annotated.len(),
            pending.len()
        );
        Ok(pending)
    }

    /// Example waiting for an annotation, or `None` once every example is done
    pub fn current(&self) -> Option<&Example> {
        self.examples.get(self.cursor)
    }

    pub fn is_completed(&self) -> bool {
        self.cursor >= self.examples.len()
    }

    /// Validate, save and move on to the next example.
    ///
    /// Returns the JSON text written to disk. On any error nothing is recorded
    /// and the cursor stays put.
    pub fn submit(&mut self, candidate: &AnnotationCandidate) -> Result<String> {
        let example = self.current().cloned().ok_or(AnnotatorError::SessionCompleted)?;

        let annotation = match candidate.complete() {
            Ok(annotation) => annotation,
            Err(e) => {
                debug!("Incomplete annotation for {}: {}", example.file_name(), e);
                return Err(e);
            }
        };
        let json = annotation.to_json()?;

        // Write first: a crash after this point is picked up by compute_pending on restart
        self.save_annotation(&json, &example)?;

        self.annotations.push((example, annotation));
        self.cursor += 1;
        Ok(json)
    }

    fn save_annotation(&self, json: &str, example: &Example) -> Result<()> {
        let destination_path = self.annotation_path(example);
        fs::write(&destination_path, format!("{}\n", json)).map_err(|source| {
            error!("Failed to write annotation file: {}", source);
            AnnotatorError::WriteFailed {
                path: destination_path.clone(),
                source,
            }
        })?;
        info!("annotation saved to {}", destination_path.display());
        Ok(())
    }

    /// Path of the annotation file for an example
    pub fn annotation_path(&self, example: &Example) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", example.basename, ANNOTATION_EXTENSION))
    }

    pub fn progress(&self) -> Progress {
        Progress {
            annotated: self.annotations.len(),
            remaining: self.examples.len() - self.cursor,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn pending(&self) -> &[Example] {
        &self.examples
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Annotations submitted during this run, oldest first
    pub fn annotations(&self) -> &[(Example, Annotation)] {
        &self.annotations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{Attribute, Color, Number, Shading, Shape};
    use tempfile::TempDir;

    fn touch(directory: &Path, filename: &str) {
        fs::write(directory.join(filename), b"").unwrap();
    }

    fn card_directory() -> TempDir {
        let tmpdir = TempDir::new().unwrap();
        touch(tmpdir.path(), "img1.png");
        touch(tmpdir.path(), "img2.jpg");
        touch(tmpdir.path(), "img3.png");
        tmpdir
    }

    fn full_candidate() -> AnnotationCandidate {
        Annotation {
            number: Number::Two,
            color: Color::Purple,
            shape: Shape::Squiggle,
            shading: Shading::Open,
        }
        .into()
    }

    fn file_names(examples: &[Example]) -> Vec<String> {
        examples.iter().map(Example::file_name).collect()
    }

    #[test]
    fn test_default_output_dir_is_created() {
        let tmpdir = card_directory();
        let session = AnnotationSession::new(InputSource::Directory(tmpdir.path().to_path_buf()), None).unwrap();

        assert_eq!(session.output_dir(), tmpdir.path().join("labels"));
        assert!(tmpdir.path().join("labels").is_dir());

        // Creating again over the existing directory is fine
        AnnotationSession::new(InputSource::Directory(tmpdir.path().to_path_buf()), None).unwrap();
    }

    #[test]
    fn test_custom_output_subdir() {
        let tmpdir = card_directory();
        let session = AnnotationSession::with_output_subdir(
            InputSource::Directory(tmpdir.path().to_path_buf()),
            None,
            "annotations",
        )
        .unwrap();
        assert_eq!(session.output_dir(), tmpdir.path().join("annotations"));
    }

    #[test]
    fn test_resume_scenario() {
        let tmpdir = card_directory();
        let labels = tmpdir.path().join("labels");
        fs::create_dir(&labels).unwrap();
        touch(&labels, "img1.json");

        let mut session = AnnotationSession::new(InputSource::Directory(tmpdir.path().to_path_buf()), None).unwrap();
        assert_eq!(file_names(session.pending()), vec!["img2.jpg", "img3.png"]);
        assert_eq!(session.current().unwrap().basename, "img2");

        let json = session.submit(&full_candidate()).unwrap();
        assert_eq!(json, r#"{"number":2,"color":"purple","shape":"squiggle","shading":"open"}"#);
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.progress(), Progress { annotated: 1, remaining: 1 });

        let written = fs::read_to_string(labels.join("img2.json")).unwrap();
        assert_eq!(written, format!("{}\n", json));
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        let object = parsed.as_object().unwrap();
        assert_eq!(object.len(), 4);
        for attribute in Attribute::ALL {
            assert!(object.contains_key(attribute.name()));
        }
    }

    #[test]
    fn test_incomplete_submit_changes_nothing() {
        let tmpdir = card_directory();
        let mut session = AnnotationSession::new(InputSource::Directory(tmpdir.path().to_path_buf()), None).unwrap();

        let mut candidate = full_candidate();
        candidate.shape = None;
        let result = session.submit(&candidate);

        match result {
            Err(AnnotatorError::MissingAttributes(missing)) => assert_eq!(missing, vec![Attribute::Shape]),
            other => panic!("expected missing attributes, got {:?}", other),
        }
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.progress(), Progress { annotated: 0, remaining: 3 });
        assert_eq!(fs::read_dir(session.output_dir()).unwrap().count(), 0);

        // Completing the selection and resubmitting goes through
        candidate.shape = Some(Shape::Oval);
        session.submit(&candidate).unwrap();
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_restart_excludes_submitted_examples() {
        let tmpdir = card_directory();
        let input = InputSource::Directory(tmpdir.path().to_path_buf());

        let mut session = AnnotationSession::new(input.clone(), None).unwrap();
        let original_length = session.pending().len();
        session.submit(&full_candidate()).unwrap();
        session.submit(&full_candidate()).unwrap();
        let submitted: Vec<String> = session.annotations().iter().map(|(e, _)| e.basename.clone()).collect();
        assert_eq!(submitted, vec!["img2", "img1"]);

        let restarted = AnnotationSession::new(input, None).unwrap();
        assert_eq!(restarted.pending().len(), original_length - 2);
        assert_eq!(file_names(restarted.pending()), vec!["img3.png"]);
        assert_eq!(restarted.compute_pending().unwrap(), restarted.pending());
    }

    #[test]
    fn test_submit_overwrites_existing_file() {
        let tmpdir = card_directory();
        let mut session = AnnotationSession::new(InputSource::Directory(tmpdir.path().to_path_buf()), None).unwrap();

        // Appears after the pending list was computed
        let target = session.annotation_path(session.current().unwrap());
        fs::write(&target, "stale content\n").unwrap();

        let json = session.submit(&full_candidate()).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), format!("{}\n", json));
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_session_completes() {
        let tmpdir = TempDir::new().unwrap();
        touch(tmpdir.path(), "card.png");
        let mut session = AnnotationSession::new(InputSource::Directory(tmpdir.path().to_path_buf()), None).unwrap();

        assert!(!session.is_completed());
        session.submit(&full_candidate()).unwrap();
        assert!(session.is_completed());
        assert!(session.current().is_none());
        assert_eq!(session.progress(), Progress { annotated: 1, remaining: 0 });
        assert!(matches!(
            session.submit(&full_candidate()),
            Err(AnnotatorError::SessionCompleted)
        ));
    }

    #[test]
    fn test_empty_input_starts_completed() {
        let tmpdir = TempDir::new().unwrap();
        let session = AnnotationSession::new(InputSource::Directory(tmpdir.path().to_path_buf()), None).unwrap();
        assert!(session.is_completed());
        assert_eq!(session.progress(), Progress { annotated: 0, remaining: 0 });
    }

    #[test]
    fn test_file_list_input() {
        let tmpdir = card_directory();
        let files = vec![tmpdir.path().join("img3.png"), tmpdir.path().join("img1.png")];
        let output = tmpdir.path().join("out");

        assert!(matches!(
            AnnotationSession::new(InputSource::Files(files.clone()), None),
            Err(AnnotatorError::OutputDirRequired)
        ));

        let mut session = AnnotationSession::new(InputSource::Files(files), Some(output.clone())).unwrap();
        assert_eq!(file_names(session.pending()), vec!["img3.png", "img1.png"]);
        session.submit(&full_candidate()).unwrap();
        assert!(output.join("img3.json").is_file());
    }

    #[test]
    fn test_duplicate_basenames_are_rejected() {
        let tmpdir = card_directory();
        touch(tmpdir.path(), "img1.jpg");
        let result = AnnotationSession::new(InputSource::Directory(tmpdir.path().to_path_buf()), None);
        match result {
            Err(AnnotatorError::DuplicateBasename { basename, .. }) => assert_eq!(basename, "img1"),
            other => panic!("expected duplicate basename, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_input_is_rejected() {
        let tmpdir = TempDir::new().unwrap();
        let missing = tmpdir.path().join("nope");
        assert!(matches!(
            AnnotationSession::new(InputSource::Directory(missing.clone()), None),
            Err(AnnotatorError::InputNotFound(path)) if path == missing
        ));
    }

    #[test]
    fn test_output_dir_creation_failure() {
        let tmpdir = card_directory();
        // A regular file where the directory should go
        touch(tmpdir.path(), "blocker");
        let output = tmpdir.path().join("blocker").join("labels");
        assert!(matches!(
            AnnotationSession::new(InputSource::Directory(tmpdir.path().to_path_buf()), Some(output)),
            Err(AnnotatorError::DirectoryCreationFailed { .. })
        ));
    }

    #[test]
    fn test_write_failure_leaves_state_unchanged() {
        let tmpdir = card_directory();
        let mut session = AnnotationSession::new(InputSource::Directory(tmpdir.path().to_path_buf()), None).unwrap();

        // A directory squatting on the annotation path makes the write fail
        let target = session.annotation_path(session.current().unwrap());
        fs::create_dir(&target).unwrap();

        assert!(matches!(
            session.submit(&full_candidate()),
            Err(AnnotatorError::WriteFailed { .. })
        ));
        assert_eq!(session.cursor(), 0);
        assert!(session.annotations().is_empty());
    }
}
