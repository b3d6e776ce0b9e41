//! Command-line parsing.
//!
//! Two grammars produce the same [`Command`]:
//!
//! - canonical: `verb Type id field value`, shell-quoted
//! - dotted: `Type.verb(arg, arg, ...)`, including the batch update form
//!   `Type.update(id, {"field": value, ...})`
//!
//! Parsing never fails; anything unrecognized becomes [`Command::Unknown`].

/// Positional arguments shared by every verb, in grammar order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pub class: Option<String>,
    pub id: Option<String>,
    pub field: Option<String>,
    pub value: Option<String>,
}

impl Args {
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut tokens = tokens.into_iter();
        Self {
            class: tokens.next(),
            id: tokens.next(),
            field: tokens.next(),
            value: tokens.next(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Quit,
    Create(Args),
    Show(Args),
    Destroy(Args),
    All(Args),
    Count(Args),
    Update(Args),
    /// One update per `(field, value)` pair, in literal order.
    BatchUpdate {
        args: Args,
        changes: Vec<(String, String)>,
    },
    Unknown(String),
}

pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    parse_dotted(line).unwrap_or_else(|| parse_canonical(line))
}

fn parse_canonical(line: &str) -> Command {
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let args = || Args::from_tokens(tokenize(rest));

    match verb {
        "create" => Command::Create(args()),
        "show" => Command::Show(args()),
        "destroy" => Command::Destroy(args()),
        "all" => Command::All(args()),
        "count" => Command::Count(args()),
        "update" => Command::Update(args()),
        "quit" | "EOF" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Shell-style split; unbalanced quotes fall back to plain whitespace.
fn tokenize(rest: &str) -> Vec<String> {
    shlex::split(rest)
        .unwrap_or_else(|| rest.split_whitespace().map(str::to_string).collect())
}

/// Recognizes `Type.verb(args)`. Returns `None` when the line does not have
/// that shape at all, so the canonical grammar gets a chance.
fn parse_dotted(line: &str) -> Option<Command> {
    let (class, rest) = line.split_once('.')?;
    let (verb, rest) = rest.split_once('(')?;
    let inner = rest.strip_suffix(')')?;
    if !is_identifier(class) || !is_identifier(verb) {
        return None;
    }

    let with_class = |tokens: Vec<String>| {
        Args::from_tokens(std::iter::once(class.to_string()).chain(tokens))
    };

    let command = match verb {
        "all" => Command::All(with_class(Vec::new())),
        "count" => Command::Count(with_class(Vec::new())),
        "create" => Command::Create(with_class(Vec::new())),
        "show" => Command::Show(with_class(split_arguments(inner))),
        "destroy" => Command::Destroy(with_class(split_arguments(inner))),
        "update" => match parse_batch(inner) {
            Some((id, changes)) => Command::BatchUpdate {
                args: with_class(vec![id]),
                changes,
            },
            None => Command::Update(with_class(split_arguments(inner))),
        },
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Splits `id, {literal}` into the id and the literal's pairs. `None` when
/// there is no literal or it does not parse.
fn parse_batch(inner: &str) -> Option<(String, Vec<(String, String)>)> {
    let (id, literal) = inner.split_once(',')?;
    let literal = literal.trim();
    if !literal.starts_with('{') {
        return None;
    }

    let object = parse_object_literal(literal)?;
    let changes = object
        .into_iter()
        .map(|(field, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (field, value)
        })
        .collect();
    Some((unquote(id.trim()).to_string(), changes))
}

/// Accepts strict JSON, then the single-quoted dict spelling.
fn parse_object_literal(literal: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    serde_json::from_str(literal)
        .or_else(|_| serde_json::from_str(&single_quotes_to_json(literal)))
        .ok()
}

/// Rewrites single-quoted strings as JSON strings. Double-quoted strings are
/// copied untouched, so apostrophes inside them survive.
fn single_quotes_to_json(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut quote: Option<char> = None;
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        match (c, quote) {
            ('\\', Some(q)) => match chars.next() {
                Some('\'') if q == '\'' => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            ('\'', None) => {
                quote = Some('\'');
                out.push('"');
            }
            ('"', None) => {
                quote = Some('"');
                out.push('"');
            }
            ('\'', Some('\'')) | ('"', Some('"')) => {
                quote = None;
                out.push('"');
            }
            ('"', Some('\'')) => out.push_str("\\\""),
            (c, _) => out.push(c),
        }
    }
    out
}

/// Splits on commas outside quotes, trims each piece and strips its quotes.
fn split_arguments(inner: &str) -> Vec<String> {
    if inner.trim().is_empty() {
        return Vec::new();
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match (c, quote) {
            ('"' | '\'', None) => {
                quote = Some(c);
                current.push(c);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                current.push(c);
            }
            (',', None) => pieces.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }
    pieces.push(current);

    pieces
        .iter()
        .map(|piece| unquote(piece.trim()).to_string())
        .collect()
}

fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
