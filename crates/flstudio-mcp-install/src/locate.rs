//! Finding the FL Studio installation directory.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use flstudio_mcp_core::{Error, Result};

/// How many times the operator is asked before giving up.
const MAX_PROMPTS: usize = 3;

/// Asks the operator for an installation directory when probing fails.
pub trait PathPrompt {
    /// Ask for a path. `tried` lists the candidates that did not exist.
    ///
    /// `Ok(None)` means the operator cancelled.
    fn ask_install_dir(&mut self, tried: &[PathBuf]) -> Result<Option<PathBuf>>;
}

/// How the installation directory was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// Given on the command line
    Override,
    /// First existing entry of the candidate list
    Detected,
    /// Typed in by the operator
    Prompted,
}

/// A resolved FL Studio installation directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// The directory
    pub path: PathBuf,
    /// Where it came from
    pub source: LocationSource,
}

/// Resolve the installation directory.
///
/// An explicit directory must exist. Otherwise candidates are probed in order
/// and the first existing one wins; if none exists the operator is asked,
/// up to three times, for a directory that exists.
pub fn locate_install_dir(
    explicit: Option<&Path>,
    candidates: &[PathBuf],
    prompt: &mut dyn PathPrompt,
) -> Result<Location> {
    if let Some(path) = explicit {
        if path.is_dir() {
            info!("Using FL Studio directory {}", path.display());
            return Ok(Location {
                path: path.to_path_buf(),
                source: LocationSource::Override,
            });
        }
        warn!("Given FL Studio directory does not exist: {}", path.display());
        return Err(Error::InstallDirNotFound);
    }

    for candidate in candidates {
        debug!("Probing {}", candidate.display());
        if candidate.is_dir() {
            info!("Found FL Studio at {}", candidate.display());
            return Ok(Location {
                path: candidate.clone(),
                source: LocationSource::Detected,
            });
        }
    }

    info!(
        "No FL Studio installation among {} candidates, asking the operator",
        candidates.len()
    );
    for _ in 0..MAX_PROMPTS {
        match prompt.ask_install_dir(candidates)? {
            None => break,
            Some(path) if path.is_dir() => {
                return Ok(Location {
                    path,
                    source: LocationSource::Prompted,
                });
            }
            Some(path) => warn!("Not a directory: {}", path.display()),
        }
    }

    Err(Error::InstallDirNotFound)
}

/// Line-oriented prompt over any reader and writer.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompt on the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    /// Prompt over the given streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `message` and wait for Enter.
    pub fn pause(&mut self, message: &str) -> Result<()> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(())
    }

    /// Consume the prompt and return the output stream.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> PathPrompt for TerminalPrompt<R, W> {
    fn ask_install_dir(&mut self, tried: &[PathBuf]) -> Result<Option<PathBuf>> {
        writeln!(self.output, "FL Studio installation not found in:")?;
        for path in tried {
            writeln!(self.output, "  {}", path.display())?;
        }
        write!(
            self.output,
            "Enter your FL Studio installation path (empty to cancel): "
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim().trim_matches('"').trim();
        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(answer)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Scripted {
        answers: Vec<Option<PathBuf>>,
        asked: usize,
    }

    impl PathPrompt for Scripted {
        fn ask_install_dir(&mut self, _tried: &[PathBuf]) -> Result<Option<PathBuf>> {
            self.asked += 1;
            Ok(self.answers.remove(0))
        }
    }

    #[test]
    fn first_existing_candidate_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let second = tmp.path().join("FL Studio 21");
        let third = tmp.path().join("FL Studio 20");
        std::fs::create_dir(&second).unwrap();
        std::fs::create_dir(&third).unwrap();
        let candidates = vec![tmp.path().join("FL Studio 2024"), second.clone(), third];

        let mut prompt = Scripted {
            answers: vec![],
            asked: 0,
        };
        let location = locate_install_dir(None, &candidates, &mut prompt).unwrap();
        assert_eq!(location.path, second);
        assert_eq!(location.source, LocationSource::Detected);
        assert_eq!(prompt.asked, 0);
    }

    #[test]
    fn prompt_used_when_nothing_found() {
        let tmp = tempfile::tempdir().unwrap();
        let candidates = vec![tmp.path().join("nope")];
        let mut prompt = Scripted {
            answers: vec![Some(tmp.path().join("typo")), Some(tmp.path().to_path_buf())],
            asked: 0,
        };

        let location = locate_install_dir(None, &candidates, &mut prompt).unwrap();
        assert_eq!(location.path, tmp.path());
        assert_eq!(location.source, LocationSource::Prompted);
        assert_eq!(prompt.asked, 2);
    }

    #[test]
    fn cancelled_prompt_is_not_found() {
        let mut prompt = Scripted {
            answers: vec![None],
            asked: 0,
        };
        let err = locate_install_dir(None, &[], &mut prompt).unwrap_err();
        assert!(matches!(err, Error::InstallDirNotFound));
        assert_eq!(prompt.asked, 1);
    }

    #[test]
    fn prompt_gives_up_after_three_bad_answers() {
        let mut prompt = Scripted {
            answers: vec![
                Some(PathBuf::from("/definitely/missing/1")),
                Some(PathBuf::from("/definitely/missing/2")),
                Some(PathBuf::from("/definitely/missing/3")),
            ],
            asked: 0,
        };
        assert!(locate_install_dir(None, &[], &mut prompt).is_err());
        assert_eq!(prompt.asked, 3);
    }

    #[test]
    fn explicit_dir_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let mut prompt = Scripted {
            answers: vec![],
            asked: 0,
        };
        let ok = locate_install_dir(Some(tmp.path()), &[], &mut prompt).unwrap();
        assert_eq!(ok.source, LocationSource::Override);

        let missing = tmp.path().join("missing");
        assert!(locate_install_dir(Some(missing.as_path()), &[], &mut prompt).is_err());
        assert_eq!(prompt.asked, 0);
    }

    #[test]
    fn terminal_prompt_reads_quoted_path() {
        let input = Cursor::new(b"\"C:\\Program Files\\Image-Line\\FL Studio 21\"\r\n".to_vec());
        let mut prompt = TerminalPrompt::new(input, Vec::new());
        let answer = prompt
            .ask_install_dir(&[PathBuf::from("/tried/one")])
            .unwrap();
        assert_eq!(
            answer,
            Some(PathBuf::from(r"C:\Program Files\Image-Line\FL Studio 21"))
        );
        let shown = String::from_utf8(prompt.into_output()).unwrap();
        assert!(shown.contains("/tried/one"));
        assert!(shown.contains("Enter your FL Studio installation path"));
    }

    #[test]
    fn terminal_prompt_empty_line_cancels() {
        let mut prompt = TerminalPrompt::new(Cursor::new(b"\n".to_vec()), Vec::new());
        assert_eq!(prompt.ask_install_dir(&[]).unwrap(), None);

        let mut eof = TerminalPrompt::new(Cursor::new(Vec::new()), Vec::new());
        assert_eq!(eof.ask_install_dir(&[]).unwrap(), None);
    }
}
