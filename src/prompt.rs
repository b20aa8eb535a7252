//! Interactive front-end: asks for the file, the sink and two yes/no
//! questions on a terminal.

use std::fs::File;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::SessionError;

/// Fail unless `path` can be opened for reading.
pub fn check_readable(path: &Path) -> Result<(), SessionError> {
    File::open(path).map(|_| ()).map_err(|e| {
        SessionError::Input(format!(
            "Error: Cannot access audio file '{}'\nReason: {}",
            path.display(),
            e
        ))
    })
}

/// Blank input selects `default`. Sink names end up unquoted in module
/// arguments, so inner whitespace is rejected.
pub fn resolve_sink_name(raw: &str, default: &str) -> Result<String, SessionError> {
    let name = raw.trim();
    if name.is_empty() {
        return Ok(default.to_string());
    }
    if name.chars().any(char::is_whitespace) {
        return Err(SessionError::Input(format!(
            "Error: Sink name '{}' must not contain whitespace",
            name
        )));
    }
    Ok(name.to_string())
}

/// Anything starting with `y` or `Y` is a yes.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim_start().chars().next(), Some('y' | 'Y'))
}

pub struct Answers {
    pub file: PathBuf,
    pub sink_name: String,
    pub hear_audio: bool,
    pub loop_playback: bool,
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one line without its line ending.
    /// `None` on end of input.
    fn ask(&mut self, question: &str) -> Result<Option<String>, SessionError> {
        write!(self.output, "{}", question).map_err(input_error)?;
        self.output.flush().map_err(input_error)?;

        let mut line = String::new();
        let n = self.input.read_line(&mut line).map_err(input_error)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn ask_required(&mut self, question: &str) -> Result<String, SessionError> {
        self.ask(question)?
            .ok_or_else(|| SessionError::Input("Error reading input".into()))
    }

    /// End of input counts as "no".
    fn ask_yes_no(&mut self, question: &str) -> Result<bool, SessionError> {
        Ok(self.ask(question)?.as_deref().is_some_and(is_yes))
    }

    /// Run the whole questionnaire.
    pub fn collect(&mut self, default_sink: &str) -> Result<Answers, SessionError> {
        let file = PathBuf::from(self.ask_required("Input audio file path: ")?);
        check_readable(&file)?;

        let sink = self.ask_required(&format!(
            "Input sink name (or press Enter for default '{}'): ",
            default_sink
        ))?;
        let sink_name = resolve_sink_name(&sink, default_sink)?;

        let hear_audio = self.ask_yes_no("Do you want to hear the audio while it plays? (y/n): ")?;
        let loop_playback = self.ask_yes_no("Loop playback? (y/n): ")?;

        Ok(Answers {
            file,
            sink_name,
            hear_audio,
            loop_playback,
        })
    }
}

fn input_error(e: std::io::Error) -> SessionError {
    SessionError::Input(format!("Error reading input: {}", e))
}
