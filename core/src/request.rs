use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::index::DocId;

/// One thing to evaluate against the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum Request {
    Word(String),
    Document(DocId),
    Query(String),
    PrintWord(String),
    PrintDocument(DocId),
}

impl Request {
    /// Parse a command line such as `-SEARCH=WORD banana`, `-SEARCH=DOC 12`,
    /// `-SEARCH=QUERY neural networks` or `-PRINT_INDEX=DOC 3`. The command is
    /// case-insensitive.
    pub fn parse_command(line: &str) -> Result<Self, RequestError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(RequestError::Empty);
        }
        let (command, value) = match line.split_once(char::is_whitespace) {
            Some((command, value)) => (command, value.trim()),
            None => (line, ""),
        };
        let command = command.to_ascii_uppercase();
        if !COMMANDS.contains(&command.as_str()) {
            return Err(RequestError::UnknownCommand(command));
        }
        if value.is_empty() {
            return Err(RequestError::MissingValue(command));
        }
        match command.as_str() {
            "-SEARCH=WORD" => Ok(Request::Word(value.to_string())),
            "-SEARCH=DOC" => parse_doc_id(value).map(Request::Document),
            "-SEARCH=QUERY" => Ok(Request::Query(value.to_string())),
            "-PRINT_INDEX=WORD" => Ok(Request::PrintWord(value.to_string())),
            _ => parse_doc_id(value).map(Request::PrintDocument),
        }
    }

    /// Parse a line typed at the prompt: command lines as in
    /// [`Request::parse_command`], `doc <id>`, `word <term>`, or otherwise a
    /// free-text query.
    pub fn parse_interactive(line: &str) -> Result<Self, RequestError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(RequestError::Empty);
        }
        if strip_prefix_ignore_case(line, "-search=").is_some()
            || strip_prefix_ignore_case(line, "-print_index=").is_some()
        {
            return Self::parse_command(line);
        }
        if let Some(rest) = strip_prefix_ignore_case(line, "doc ") {
            return parse_doc_id(rest.trim()).map(Request::Document);
        }
        if let Some(rest) = strip_prefix_ignore_case(line, "word ") {
            return Ok(Request::Word(rest.trim().to_string()));
        }
        Ok(Request::Query(line.to_string()))
    }
}

const COMMANDS: [&str; 5] = ["-SEARCH=WORD", "-SEARCH=DOC", "-SEARCH=QUERY", "-PRINT_INDEX=WORD", "-PRINT_INDEX=DOC"];

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &line[prefix.len()..])
}

fn parse_doc_id(value: &str) -> Result<DocId, RequestError> {
    value.trim().parse().map_err(|_| RequestError::InvalidDocId(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_case_insensitively() {
        assert_eq!(Request::parse_command("-SEARCH=WORD banana"), Ok(Request::Word("banana".into())));
        assert_eq!(Request::parse_command("-search=doc 12"), Ok(Request::Document(12)));
        assert_eq!(
            Request::parse_command("-SEARCH=QUERY  neural   networks "),
            Ok(Request::Query("neural   networks".into()))
        );
        assert_eq!(Request::parse_command("-PRINT_INDEX=DOC 3"), Ok(Request::PrintDocument(3)));
        assert_eq!(Request::parse_command("-PRINT_INDEX=WORD rust"), Ok(Request::PrintWord("rust".into())));
    }

    #[test]
    fn malformed_commands_are_errors() {
        assert_eq!(Request::parse_command(""), Err(RequestError::Empty));
        assert_eq!(
            Request::parse_command("-SEARCH=WORD"),
            Err(RequestError::MissingValue("-SEARCH=WORD".into()))
        );
        assert_eq!(
            Request::parse_command("-FIND x"),
            Err(RequestError::UnknownCommand("-FIND".into()))
        );
        assert_eq!(
            Request::parse_command("-SEARCH=DOC twelve"),
            Err(RequestError::InvalidDocId("twelve".into()))
        );
    }

    #[test]
    fn interactive_aliases() {
        assert_eq!(Request::parse_interactive("doc 7"), Ok(Request::Document(7)));
        assert_eq!(Request::parse_interactive("Word Banana"), Ok(Request::Word("Banana".into())));
        assert_eq!(
            Request::parse_interactive("machine learning retrieval"),
            Ok(Request::Query("machine learning retrieval".into()))
        );
        assert_eq!(Request::parse_interactive("-SEARCH=DOC 2"), Ok(Request::Document(2)));
        assert!(Request::parse_interactive("doc x").is_err());
    }
}
