//! File-name contract for audio recordings.
//!
//! Recording names follow `<student>-<session>-t<task>.mp3`, for example
//! `231101013-6-t1.mp3`. Scoring only needs the trailing session/task pair;
//! the student prefix is consumed by the report layer.

use once_cell::sync::Lazy;
use regex::Regex;

static FILE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-(\d+)-t(\d+)\.mp3$").expect("file name regex should be valid"));

/// Extracts `(session_id, task_id)` from a recording path or file name.
///
/// The task ID keeps its `t` prefix (`"t1"`). Returns `None` when the name
/// does not end with `-<digits>-t<digits>.mp3`.
#[must_use]
pub fn parse_file_name(name: &str) -> Option<(String, String)> {
    let captures = FILE_NAME_REGEX.captures(name)?;
    let session_id = captures[1].to_string();
    let task_id = format!("t{}", &captures[2]);
    Some((session_id, task_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_canonical_name() {
        let (session, task) = parse_file_name("231101013-6-t1.mp3").unwrap();
        assert_eq!(session, "6");
        assert_eq!(task, "t1");
    }

    #[test]
    fn test_parses_full_path() {
        let (session, task) = parse_file_name("/data/audio/231101013-12-t3.mp3").unwrap();
        assert_eq!(session, "12");
        assert_eq!(task, "t3");
    }

    #[test]
    fn test_rejects_nonconforming_names() {
        assert!(parse_file_name("bad.mp3").is_none());
        assert!(parse_file_name("231101013-6-1.mp3").is_none());
        assert!(parse_file_name("231101013-6-t1.wav").is_none());
        assert!(parse_file_name("231101013-6-t1.mp3.bak").is_none());
        assert!(parse_file_name("231101013-six-t1.mp3").is_none());
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        assert!(parse_file_name("231101013-6-t1.MP3").is_none());
    }
}
