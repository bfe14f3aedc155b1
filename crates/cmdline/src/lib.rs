//! Line-oriented command parser for report sessions.
//! 報表工作階段的逐行指令解析器。
//!
//! Each non-blank line holds one command, e.g.
//!
//! ```text
//! brand "Brand X"
//! add company_name=Acme using_company="X Corp" phone=010-1111-2222
//! add-reported Foo http://foo.example
//! save 2024-01-01
//! render-png
//! ```
//!
//! `#` starts a comment outside quotes. Double quotes group words and may
//! appear anywhere in a token; `\"` and `\\` escape inside quotes.

use chrono::NaiveDate;
use reportsheet_core::{Record, RecordField};
use thiserror::Error;

/// One user action, mirroring the buttons of the input form.
/// 對應表單按鈕的單一操作。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    AddRecord(Record),
    PopRecord,
    ClearRecords,
    AddReported { company: String, url: Option<String> },
    /// 1-based, as displayed to the user.
    RemoveReported { index: usize },
    ClearReported,
    SetBrand(String),
    /// `None` means "today".
    SaveSnapshot { date: Option<NaiveDate> },
    /// Raw `YYYY-MM-DD_brand` text; the session validates it when applied.
    LoadSnapshot(String),
    DeleteSnapshot(String),
    ClearSnapshots,
    ListSnapshots,
    Summary,
    RenderPng,
    RenderPdf,
}

impl SessionCommand {
    /// Keyword that introduces this command in a script.
    pub fn keyword(&self) -> &'static str {
        match self {
            SessionCommand::AddRecord(_) => "add",
            SessionCommand::PopRecord => "pop",
            SessionCommand::ClearRecords => "clear",
            SessionCommand::AddReported { .. } => "add-reported",
            SessionCommand::RemoveReported { .. } => "remove-reported",
            SessionCommand::ClearReported => "clear-reported",
            SessionCommand::SetBrand(_) => "brand",
            SessionCommand::SaveSnapshot { .. } => "save",
            SessionCommand::LoadSnapshot(_) => "load",
            SessionCommand::DeleteSnapshot(_) => "delete-snapshot",
            SessionCommand::ClearSnapshots => "clear-snapshots",
            SessionCommand::ListSnapshots => "list-snapshots",
            SessionCommand::Summary => "summary",
            SessionCommand::RenderPng => "render-png",
            SessionCommand::RenderPdf => "render-pdf",
        }
    }
}

/// Errors emitted while parsing a single command line.
/// 解析單行指令時可能回傳的錯誤。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("unknown record field '{0}'")]
    UnknownField(String),
    #[error("expected key=value, found '{0}'")]
    InvalidAssignment(String),
    #[error("'{command}' requires {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{command}' does not take '{value}'")]
    UnexpectedArgument { command: &'static str, value: String },
    #[error("invalid index '{0}' (expected a number starting at 1)")]
    InvalidIndex(String),
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("unterminated quote")]
    UnterminatedQuote,
}

/// A [`ParseError`] tagged with its 1-based script line.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {source}")]
pub struct ScriptError {
    pub line: usize,
    #[source]
    pub source: ParseError,
}

/// Parses one line; blank lines and comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>, ParseError> {
    let tokens = tokenize(line)?;
    let mut iter = tokens.into_iter();
    let Some(keyword) = iter.next() else {
        return Ok(None);
    };
    let args: Vec<String> = iter.collect();

    let command = match keyword.to_ascii_lowercase().as_str() {
        "add" => SessionCommand::AddRecord(parse_record(&args)?),
        "pop" => no_args("pop", &args, SessionCommand::PopRecord)?,
        "clear" => no_args("clear", &args, SessionCommand::ClearRecords)?,
        "add-reported" => parse_add_reported(args)?,
        "remove-reported" => {
            let raw = single_arg("remove-reported", "an index", &args)?;
            let index = raw
                .parse::<usize>()
                .ok()
                .filter(|index| *index >= 1)
                .ok_or_else(|| ParseError::InvalidIndex(raw.to_string()))?;
            SessionCommand::RemoveReported { index }
        }
        "clear-reported" => no_args("clear-reported", &args, SessionCommand::ClearReported)?,
        "brand" => SessionCommand::SetBrand(args.join(" ")),
        "save" => {
            let date = match args.as_slice() {
                [] => None,
                [raw] => Some(parse_date(raw)?),
                [_, extra, ..] => {
                    return Err(ParseError::UnexpectedArgument {
                        command: "save",
                        value: extra.clone(),
                    })
                }
            };
            SessionCommand::SaveSnapshot { date }
        }
        "load" => SessionCommand::LoadSnapshot(parse_key("load", &args)?),
        "delete-snapshot" => {
            SessionCommand::DeleteSnapshot(parse_key("delete-snapshot", &args)?)
        }
        "clear-snapshots" => no_args("clear-snapshots", &args, SessionCommand::ClearSnapshots)?,
        "list-snapshots" => no_args("list-snapshots", &args, SessionCommand::ListSnapshots)?,
        "summary" => no_args("summary", &args, SessionCommand::Summary)?,
        "render-png" => no_args("render-png", &args, SessionCommand::RenderPng)?,
        "render-pdf" => no_args("render-pdf", &args, SessionCommand::RenderPdf)?,
        _ => return Err(ParseError::UnknownCommand(keyword)),
    };
    Ok(Some(command))
}

/// Parses a whole script, stopping at the first bad line.
pub fn parse_script(text: &str) -> Result<Vec<(usize, SessionCommand)>, ScriptError> {
    let mut commands = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        match parse_line(line) {
            Ok(Some(command)) => commands.push((line_no, command)),
            Ok(None) => {}
            Err(source) => {
                return Err(ScriptError {
                    line: line_no,
                    source,
                })
            }
        }
    }
    Ok(commands)
}

fn parse_record(args: &[String]) -> Result<Record, ParseError> {
    let mut record = Record::default();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| ParseError::InvalidAssignment(arg.clone()))?;
        let field = RecordField::from_key(key.trim())
            .ok_or_else(|| ParseError::UnknownField(key.trim().to_string()))?;
        record.set(field, value);
    }
    Ok(record)
}

fn parse_add_reported(args: Vec<String>) -> Result<SessionCommand, ParseError> {
    let mut iter = args.into_iter();
    let company = iter.next().ok_or(ParseError::MissingArgument {
        command: "add-reported",
        argument: "a company name",
    })?;
    let url = iter.next();
    if let Some(extra) = iter.next() {
        return Err(ParseError::UnexpectedArgument {
            command: "add-reported",
            value: extra,
        });
    }
    Ok(SessionCommand::AddReported { company, url })
}

fn parse_key(command: &'static str, args: &[String]) -> Result<String, ParseError> {
    single_arg(command, "a snapshot key", args).map(str::to_string)
}

fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ParseError::InvalidDate(raw.to_string()))
}

fn single_arg<'a>(
    command: &'static str,
    argument: &'static str,
    args: &'a [String],
) -> Result<&'a str, ParseError> {
    match args {
        [] => Err(ParseError::MissingArgument { command, argument }),
        [value] => Ok(value.as_str()),
        [_, extra, ..] => Err(ParseError::UnexpectedArgument {
            command,
            value: extra.clone(),
        }),
    }
}

fn no_args(
    command: &'static str,
    args: &[String],
    parsed: SessionCommand,
) -> Result<SessionCommand, ParseError> {
    match args.first() {
        Some(value) => Err(ParseError::UnexpectedArgument {
            command,
            value: value.clone(),
        }),
        None => Ok(parsed),
    }
}

fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_token = true;
                read_quoted(&mut chars, &mut current)?;
            }
            '#' if !in_token => break,
            ch if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            ch => {
                in_token = true;
                current.push(ch);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn read_quoted(chars: &mut std::str::Chars<'_>, out: &mut String) -> Result<(), ParseError> {
    while let Some(ch) = chars.next() {
        match ch {
            '"' => return Ok(()),
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '\\')) => out.push(escaped),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            },
            other => out.push(other),
        }
    }
    Err(ParseError::UnterminatedQuote)
}
