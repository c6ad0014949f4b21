//! Line-oriented prompts for the pre-launch profile dialog.
//!
//! Everything reads from a `BufRead` and writes to a `Write` so the dialog
//! can be driven from stdin/stdout or from a test buffer.

use anyhow::{Result, bail};
use std::io::{BufRead, Write};
use zeroize::Zeroizing;

/// Ask `question` and read one line. `None` at end of input.
pub fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<Option<String>> {
    write!(out, "{question}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// `[y/N]` confirmation. Anything but `y`/`yes` is a no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool> {
    let answer = ask(input, out, &format!("{question} [y/N] "))?;
    Ok(matches!(
        answer.map(|a| a.trim().to_lowercase()).as_deref(),
        Some("y" | "yes")
    ))
}

/// Read a password. An empty line or end of input means the user declined.
pub fn password<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
) -> Result<Option<Zeroizing<String>>> {
    write!(out, "{question}")?;
    out.flush()?;

    let mut line = Zeroizing::new(String::new());
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_string());
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed))
}

/// Read a new password twice. Fails if the two entries differ.
pub fn new_password<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    name: &str,
) -> Result<Zeroizing<String>> {
    let Some(first) = password(input, out, &format!("New password for '{name}': "))? else {
        bail!("a password is required for an encrypted profile");
    };
    let second = password(input, out, "Confirm password: ")?;
    if second.as_deref().map(String::as_str) != Some(first.as_str()) {
        bail!("passwords do not match");
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_confirm() {
        let mut out = Vec::new();
        assert!(confirm(&mut Cursor::new("YES\n"), &mut out, "Go?").unwrap());
        assert!(!confirm(&mut Cursor::new("n\n"), &mut out, "Go?").unwrap());
        assert!(!confirm(&mut Cursor::new(""), &mut out, "Go?").unwrap());
        assert!(String::from_utf8(out).unwrap().starts_with("Go? [y/N] "));
    }

    #[test]
    fn test_password_strips_newline_and_declines_empty() {
        let mut out = Vec::new();
        let pw = password(&mut Cursor::new("s3cret\r\n"), &mut out, "> ").unwrap();
        assert_eq!(pw.as_deref().map(String::as_str), Some("s3cret"));
        assert!(password(&mut Cursor::new("\n"), &mut out, "> ").unwrap().is_none());
        assert!(password(&mut Cursor::new(""), &mut out, "> ").unwrap().is_none());
    }

    #[test]
    fn test_new_password_requires_matching_entries() {
        let mut out = Vec::new();
        let pw = new_password(&mut Cursor::new("abc\nabc\n"), &mut out, "vault").unwrap();
        assert_eq!(pw.as_str(), "abc");
        assert!(new_password(&mut Cursor::new("abc\nabd\n"), &mut out, "vault").is_err());
        assert!(new_password(&mut Cursor::new("\n"), &mut out, "vault").is_err());
    }
}
