//! Migration document parsing.
//!
//! A migration document is a sequence of segments, each introduced by a header
//! line and followed by the script:
//!
//! ```text
//! ---- 1 Creating table posts
//! CREATE TABLE posts (
//!     id INT,
//!     title VARCHAR(255),
//!     PRIMARY KEY (id)
//! );
//!
//! ---- 2 Adding column body
//! ALTER TABLE posts ADD body TEXT;
//! ```
//!
//! The header holds a marker, the version and a free-form description. A line
//! made only of four or more dashes also ends a segment. Dashes anywhere else,
//! such as SQL comments or string literals, are part of the script.

use std::io::Read;
use std::path::Path;

use crate::error::{MigrateResult, ParseError};
use crate::migration::{Migration, Version};

/// Prefix of a header line that also terminates the previous segment.
const HEADER_PREFIX: &str = "---- ";

/// Minimum number of dashes in a separator line.
const SEPARATOR_MIN_LEN: usize = 4;

/// Parse migrations from a string, in document order.
pub fn parse_str(content: &str) -> MigrateResult<Vec<Migration>> {
    let mut parser = DocumentParser::default();
    for line in content.lines() {
        parser.feed(line)?;
    }
    Ok(parser.finish()?)
}

/// Parse migrations from any reader.
pub fn parse_reader(mut reader: impl Read) -> MigrateResult<Vec<Migration>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    parse_str(&content)
}

/// Parse migrations from a file.
pub async fn parse_file(path: impl AsRef<Path>) -> MigrateResult<Vec<Migration>> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    parse_str(&content)
}

/// Render migrations back into the document format.
pub fn render(migrations: &[Migration]) -> String {
    migrations
        .iter()
        .map(|m| format!("{HEADER_PREFIX}{} {}\n{}\n", m.version, m.description, m.script))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Segment being accumulated.
#[derive(Debug, Default)]
struct Segment {
    header: Option<String>,
    lines: Vec<String>,
    seen_content: bool,
}

#[derive(Debug, Default)]
struct DocumentParser {
    migrations: Vec<Migration>,
    current: Segment,
    index: usize,
}

impl DocumentParser {
    fn feed(&mut self, line: &str) -> Result<(), ParseError> {
        let line = line.trim_end_matches('\r');

        if is_separator_line(line) {
            return self.flush();
        }

        if self.current.header.is_some() && is_header_line(line) {
            self.flush()?;
        }

        let blank = line.trim().is_empty();

        if self.current.header.is_none() {
            if !blank {
                self.current.header = Some(line.trim().to_string());
            }
            return Ok(());
        }

        // Leading blank lines never reach the script.
        if blank && !self.current.seen_content {
            return Ok(());
        }
        if !blank {
            self.current.seen_content = true;
        }
        self.current.lines.push(line.to_string());
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Migration>, ParseError> {
        self.flush()?;
        Ok(self.migrations)
    }

    fn flush(&mut self) -> Result<(), ParseError> {
        let segment = std::mem::take(&mut self.current);
        let index = self.index;

        let header = match segment.header {
            Some(header) => header,
            None if segment.lines.is_empty() => return Ok(()),
            None => return Err(ParseError::MissingHeader { segment: index }),
        };

        let (version, description) = parse_header(&header, index)?;

        let script = segment.lines.join("\n").trim().to_string();
        if script.is_empty() {
            return Err(ParseError::EmptyScript { segment: index });
        }

        self.migrations.push(Migration {
            version,
            description,
            script,
        });
        self.index += 1;
        Ok(())
    }
}

/// Split a header into its version and description.
fn parse_header(header: &str, segment: usize) -> Result<(Version, String), ParseError> {
    if header.split_whitespace().count() < 3 {
        return Err(ParseError::InvalidHeader {
            header: header.to_string(),
            segment,
        });
    }

    let (_marker, rest) = next_token(header).ok_or_else(|| ParseError::InvalidHeader {
        header: header.to_string(),
        segment,
    })?;
    let (version_token, rest) = next_token(rest).ok_or_else(|| ParseError::InvalidHeader {
        header: header.to_string(),
        segment,
    })?;

    let description = rest.trim();
    if description.is_empty() {
        return Err(ParseError::EmptyDescription { segment });
    }

    let value: f64 = version_token
        .parse()
        .map_err(|e: std::num::ParseFloatError| ParseError::InvalidVersion {
            reason: format!("{version_token:?}: {e}"),
            segment,
        })?;
    if !value.is_finite() {
        return Err(ParseError::InvalidVersion {
            reason: format!("{version_token:?}: NaN/Inf disallowed"),
            segment,
        });
    }

    Ok((Version::new(value), description.to_string()))
}

/// First whitespace-delimited token and the remainder after it.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

fn is_separator_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= SEPARATOR_MIN_LEN && trimmed.bytes().all(|b| b == b'-')
}

fn is_header_line(line: &str) -> bool {
    line.trim_start_matches([' ', '\t']).starts_with(HEADER_PREFIX)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::MigrationError;

    fn parse_err(input: &str) -> ParseError {
        match parse_str(input) {
            Err(MigrationError::Parse(e)) => e,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_simple() {
        let input = "---- 0.3 creating table config
CREATE TABLE config
(
    id    bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    key   VARCHAR(255),
    value VARCHAR(255)
);
";
        let expected = vec![Migration::new(
            0.3,
            "creating table config",
            "CREATE TABLE config
(
    id    bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    key   VARCHAR(255),
    value VARCHAR(255)
);",
        )];
        assert_eq!(parse_str(input).unwrap(), expected);
    }

    #[test]
    fn test_dashes_inside_sql_do_not_split() {
        let input = "
---- 3.0 section with dashes in SQL
-- this is a comment ---- should not split
INSERT INTO t (c) VALUES ('---- inside string');
";
        let got = parse_str(input).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(
            got[0].script,
            "-- this is a comment ---- should not split
INSERT INTO t (c) VALUES ('---- inside string');"
        );
    }

    #[test]
    fn test_separator_line_ends_segment() {
        let input = "---- 1 first
SELECT 1;
--------
---- 2 second
SELECT 2;
";
        let got = parse_str(input).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].script, "SELECT 1;");
        assert_eq!(got[1].description, "second");
    }

    #[test]
    fn test_empty_script() {
        let err = parse_err("\n---- 7.0 desc\n  \n  \n");
        assert_eq!(err, ParseError::EmptyScript { segment: 0 });
        assert!(err.to_string().contains("empty script"));
    }

    #[test]
    fn test_header_followed_by_header_is_empty_script() {
        let err = parse_err("---- 1 first\n---- 2 second\nSELECT 2;");
        assert_eq!(err, ParseError::EmptyScript { segment: 0 });
    }

    #[test]
    fn test_nan_and_inf_rejected() {
        for input in [
            "---- NaN bad\nSELECT 1;",
            "---- Inf bad\nSELECT 1;",
            "---- -Inf bad\nSELECT 1;",
            "---- v1 bad\nSELECT 1;",
        ] {
            let err = parse_err(input);
            assert!(matches!(err, ParseError::InvalidVersion { segment: 0, .. }));
            assert!(err.to_string().contains("invalid version"));
        }
    }

    #[test]
    fn test_minus_zero_normalized() {
        let got = parse_str("---- -0 desc\nSELECT 1;").unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].version.as_f64(), 0.0);
        assert!(got[0].version.as_f64().is_sign_positive());
    }

    #[test]
    fn test_multiple_with_do_block() {
        let input = "---- 1 create
CREATE TABLE demo (id BIGSERIAL PRIMARY KEY, message text);
---- 2 do-rename
DO $$
BEGIN
  IF EXISTS (
    SELECT 1 FROM information_schema.columns
    WHERE table_schema = 'public' AND table_name = 'demo' AND column_name = 'message'
  ) THEN
    ALTER TABLE public.demo RENAME COLUMN message TO note;
  END IF;
END
$$;
---- 3 index
CREATE INDEX idx_demo_note ON public.demo (note);";

        let got = parse_str(input).unwrap();
        let versions: Vec<f64> = got.iter().map(|m| m.version.as_f64()).collect();
        assert_eq!(versions, vec![1.0, 2.0, 3.0]);
        assert!(got[1].script.starts_with("DO $$"));
        assert!(got[1].script.ends_with("$$;"));
    }

    #[test]
    fn test_trims_blank_lines_and_whitespace() {
        let input = "---- 0.3 creating table config


CREATE TABLE config
(
    id    bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY
);

";
        let got = parse_str(input).unwrap();
        assert_eq!(
            got[0].script,
            "CREATE TABLE config
(
    id    bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY
);"
        );
    }

    #[test]
    fn test_embedded_blank_lines_preserved() {
        let got = parse_str("---- 1 two statements\nSELECT 1;\n\n\nSELECT 2;\n").unwrap();
        assert_eq!(got[0].script, "SELECT 1;\n\n\nSELECT 2;");
    }

    #[test]
    fn test_document_order_is_kept() {
        let input = "---- 0.4 desc4
CREATE TABLE config4 (id int PRIMARY KEY);
---- 0.1 desc1
CREATE TABLE config1 (id int PRIMARY KEY);
---- 0.2 desc2
CREATE TABLE config2 (id int PRIMARY KEY);
";
        let got = parse_str(input).unwrap();
        let descriptions: Vec<&str> = got.iter().map(|m| m.description.as_str()).collect();
        assert_eq!(descriptions, vec!["desc4", "desc1", "desc2"]);
    }

    #[test]
    fn test_crlf() {
        let input = "---- 5.0 windows line endings\r\n\r\nCREATE TABLE x (\r\n  id bigint\r\n);\r\n";
        let got = parse_reader(input.as_bytes()).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].script, "CREATE TABLE x (\n  id bigint\n);");
        assert_eq!(got[0].description, "windows line endings");
    }

    #[test]
    fn test_header_missing_parts() {
        let err = parse_err("\n---- onlyversion\nSELECT 1;\n");
        assert!(matches!(err, ParseError::InvalidHeader { segment: 0, .. }));
        assert!(err.to_string().contains("invalid header"));
    }

    #[test]
    fn test_description_keeps_inner_spacing() {
        let got = parse_str("----   2.5   add   index  \nSELECT 1;").unwrap();
        assert_eq!(got[0].version, Version::new(2.5));
        assert_eq!(got[0].description, "add   index");
    }

    #[test]
    fn test_error_reports_segment_index() {
        let err = parse_err("---- 1 ok\nSELECT 1;\n---- 2 broken\n\n");
        assert_eq!(err.segment(), 1);
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_str("").unwrap().is_empty());
        assert!(parse_str("\n\n   \n").unwrap().is_empty());
    }

    #[test]
    fn test_render_round_trip() {
        let migrations = vec![
            Migration::new(1.0, "Creating table posts", "CREATE TABLE posts (\n\tid INT\n);"),
            Migration::new(1.25, "Adding column body", "ALTER TABLE posts ADD body TEXT;"),
            Migration::new(2.0, "Seed", "-- comment ---- with dashes\nINSERT INTO posts VALUES (1);\n\nSELECT 1;"),
        ];
        let rendered = render(&migrations);
        assert_eq!(parse_str(&rendered).unwrap(), migrations);
    }

    #[tokio::test]
    async fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migrations.sql");
        tokio::fs::write(&path, "---- 1 create\nCREATE TABLE a (id INT);\n")
            .await
            .unwrap();

        let got = parse_file(&path).await.unwrap();
        assert_eq!(got, vec![Migration::new(1.0, "create", "CREATE TABLE a (id INT);")]);

        let missing = parse_file(dir.path().join("nope.sql")).await;
        assert!(matches!(missing, Err(MigrationError::Io(_))));
    }
}
