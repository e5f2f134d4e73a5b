//! Frame verdict sources
//!
//! A replay script lists one token per frame:
//!
//! ```text
//! # warm up, then nod off
//! 20*O  H H
//! 45*C  -  40*O
//! ```
//!
//! `C`, `H` and `O` are closed, half-open and open eyes, `-` is a frame with
//! no face, and `N*X` repeats `X` N times. `#` starts a comment.

use crate::MonitorError;
use dms::{EyeCode, FrameVerdict};
use std::collections::VecDeque;
use std::path::Path;
use tracing::info;

/// Largest `N` accepted in an `N*X` token (about nine hours at 30 fps)
pub const MAX_REPEAT: usize = 1_000_000;

/// Produces one entry per captured frame
pub trait FrameSource {
    /// `None` when the source is exhausted; `Some(None)` for a frame
    /// without a detected face
    fn next_frame(&mut self) -> Option<Option<FrameVerdict>>;
}

/// Replays a scripted sequence of verdicts
#[derive(Debug, Clone, Default)]
pub struct ReplayFrameSource {
    frames: VecDeque<Option<FrameVerdict>>,
}

impl ReplayFrameSource {
    pub fn from_path(path: &Path) -> Result<Self, MonitorError> {
        let script = std::fs::read_to_string(path)?;
        let source = Self::parse(&script)?;
        info!("Loaded {} frames from {}", source.remaining(), path.display());
        Ok(source)
    }

    pub fn parse(script: &str) -> Result<Self, MonitorError> {
        let mut frames = VecDeque::new();

        for (index, line) in script.lines().enumerate() {
            let line_no = index + 1;
            let content = line.split('#').next().unwrap_or("");

            for token in content.split_whitespace() {
                let (count, code) = match token.split_once('*') {
                    Some((count, code)) => {
                        let count = count.parse::<usize>().map_err(|_| MonitorError::Script {
                            line: line_no,
                            reason: format!("bad repeat count in {:?}", token),
                        })?;
                        if count > MAX_REPEAT {
                            return Err(MonitorError::Script {
                                line: line_no,
                                reason: format!("repeat count {} exceeds {}", count, MAX_REPEAT),
                            });
                        }
                        (count, code)
                    }
                    None => (1, token),
                };

                let frame = parse_code(code).ok_or_else(|| MonitorError::Script {
                    line: line_no,
                    reason: format!("unknown frame code {:?}", code),
                })?;
                frames.extend(std::iter::repeat(frame).take(count));
            }
        }

        Ok(Self { frames })
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

fn parse_code(code: &str) -> Option<Option<FrameVerdict>> {
    match code {
        "C" | "c" => Some(Some(EyeCode::Closed)),
        "H" | "h" => Some(Some(EyeCode::Half)),
        "O" | "o" => Some(Some(EyeCode::Open)),
        "-" => Some(None),
        _ => None,
    }
}

impl FrameSource for ReplayFrameSource {
    fn next_frame(&mut self) -> Option<Option<FrameVerdict>> {
        self.frames.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens_and_repeats() {
        let mut source = ReplayFrameSource::parse("# header\n3*C H  # trailing\n- o\n").unwrap();
        assert_eq!(source.remaining(), 6);

        let frames: Vec<_> = std::iter::from_fn(|| source.next_frame()).collect();
        assert_eq!(
            frames,
            vec![
                Some(EyeCode::Closed),
                Some(EyeCode::Closed),
                Some(EyeCode::Closed),
                Some(EyeCode::Half),
                None,
                Some(EyeCode::Open),
            ]
        );
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_zero_repeat_is_empty() {
        assert_eq!(ReplayFrameSource::parse("0*C").unwrap().remaining(), 0);
    }

    #[test]
    fn test_oversized_repeat_rejected() {
        match ReplayFrameSource::parse("O\n99999999999*C\n") {
            Err(MonitorError::Script { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("exceeds"));
            }
            other => panic!("expected script error, got {:?}", other),
        }
        let at_limit = format!("{}*O", MAX_REPEAT);
        assert_eq!(ReplayFrameSource::parse(&at_limit).unwrap().remaining(), MAX_REPEAT);
    }

    #[test]
    fn test_errors_report_line() {
        match ReplayFrameSource::parse("O\nO X\n") {
            Err(MonitorError::Script { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected script error, got {:?}", other),
        }
        assert!(ReplayFrameSource::parse("many*O").is_err());
    }
}
