/// Interactive terminal front-end for an annotation session
///
/// Each input line sets any number of attribute values and then submits the
/// selection, like pressing the toggle buttons and then SUBMIT. The selection
/// survives a rejected submission so only the missing values need typing.
use std::io::{self, BufRead, Write};

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::error::AnnotatorError;
use crate::file_io;
use crate::label::{Attribute, AttributeValue, AnnotationCandidate};
use crate::session::{AnnotationSession, Example};

/// How a run of the prompt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every pending example was annotated
    Completed,
    /// The user quit or input ran out first
    Stopped,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptOptions {
    pub open_image_viewer: bool,
    pub show_image_size: bool,
}

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Quit,
    Help,
    Submit(Vec<AttributeValue>),
    Invalid(Vec<String>),
}

fn parse_command(line: &str) -> Command {
    match line.trim().to_lowercase().as_str() {
        "q" | "quit" | "exit" => return Command::Quit,
        "?" | "help" => return Command::Help,
        _ => {}
    }

    let mut values = Vec::new();
    let mut unknown = Vec::new();
    for token in line.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        match token.parse::<AttributeValue>() {
            Ok(value) => values.push(value),
            Err(e) => unknown.push(e.0),
        }
    }

    if unknown.is_empty() {
        Command::Submit(values)
    } else {
        Command::Invalid(unknown)
    }
}

pub struct Prompt<R, W> {
    input: R,
    output: W,
    options: PromptOptions,
    selection: AnnotationCandidate,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W, options: PromptOptions) -> Self {
        Self {
            input,
            output,
            options,
            selection: AnnotationCandidate::new(),
        }
    }

    /// Run until the session completes, the user quits, or input ends.
    ///
    /// Missing attributes are reported and retried; any other session error
    /// aborts the run.
    pub fn run(&mut self, session: &mut AnnotationSession) -> Result<RunOutcome, AnnotatorError> {
        let mut shown_cursor = None;

        loop {
            self.write_line(&session.progress().to_string())?;

            if session.is_completed() {
                self.write_line("Annotation completed.")?;
                info!("Annotation completed: {}", session.progress());
                return Ok(RunOutcome::Completed);
            }
            let example = session.current().cloned().ok_or(AnnotatorError::SessionCompleted)?;

            if shown_cursor != Some(session.cursor()) {
                self.show_example(&example)?;
                shown_cursor = Some(session.cursor());
            }
            self.show_choices()?;

            let mut line = String::new();
            let read = self.input.read_line(&mut line).map_err(AnnotatorError::Terminal)?;
            if read == 0 {
                debug!("Input closed");
                return Ok(RunOutcome::Stopped);
            }

            match parse_command(&line) {
                Command::Quit => return Ok(RunOutcome::Stopped),
                Command::Help => self.show_help()?,
                Command::Invalid(unknown) => {
                    self.write_line(&format!("Unknown value(s): {}. Type 'help' for usage.", unknown.join(", ")))?;
                }
                Command::Submit(values) => {
                    for value in values {
                        debug!("{} set to {}", value.attribute(), value);
                        self.selection.set(value);
                    }
                    match session.submit(&self.selection) {
                        Ok(json) => {
                            self.write_line(&format!("Annotation submitted: {}", json))?;
                            self.selection.clear();
                        }
                        Err(e) if e.is_recoverable() => {
                            self.write_line(&format!("{}. Retry.", e))?;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }

    fn show_example(&mut self, example: &Example) -> Result<(), AnnotatorError> {
        let mut description = example.path.display().to_string();
        if self.options.show_image_size {
            match image::image_dimensions(&example.path) {
                Ok((width, height)) => description.push_str(&format!(" ({}x{})", width, height)),
                Err(e) => warn!("Could not read size of {}: {}", example.path.display(), e),
            }
        }
        self.write_line(&format!("Image: {}", description))?;

        if self.options.open_image_viewer {
            if let Err(e) = file_io::open_in_image_viewer(&example.path) {
                warn!("Failed to open {} in image viewer: {}", example.path.display(), e);
            }
        }
        Ok(())
    }

    /// One line per attribute, the selected value in brackets
    fn show_choices(&mut self) -> Result<(), AnnotatorError> {
        for attribute in Attribute::ALL {
            let selected = self.selection.get(attribute);
            let options: Vec<String> = attribute
                .options()
                .iter()
                .map(|option| {
                    if Some(*option) == selected {
                        format!("[{}]", option)
                    } else {
                        option.to_string()
                    }
                })
                .collect();
            self.write_line(&format!("  {:<8} {}", attribute.name(), options.join(" ")))?;
        }
        self.write(b"> ")
    }

    fn show_help(&mut self) -> Result<(), AnnotatorError> {
        self.write_line("Type one value per attribute, separated by spaces, then press Enter to submit.")?;
        self.write_line("  example: 2 green diamond striped")?;
        self.write_line("Values already chosen are kept until the annotation is accepted.")?;
        self.write_line("Type 'q' to stop; the next run resumes where this one ended.")
    }

    fn write_line(&mut self, line: &str) -> Result<(), AnnotatorError> {
        self.write(format!("{}\n", line).as_bytes())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), AnnotatorError> {
        self.output
            .write_all(bytes)
            .and_then(|_| self.output.flush())
            .map_err(AnnotatorError::Terminal)
    }
}

impl Prompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(options: PromptOptions) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), options)
    }
}
