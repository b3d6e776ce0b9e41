//! The command dispatcher and its read-eval loop.
//!
//! A [`Console`] owns the [`FileStorage`] it mutates and an output stream.
//! Each line goes through [`parse_line`], then ordered validation against the
//! kind catalog and the registry, then exactly one query or mutation. Mutating
//! commands persist the registry before returning.

mod coerce;
mod error;
mod parse;

use std::io::{BufRead, Write};

use crate::models::{quote, ModelKind, Record, RESERVED_FIELDS};
use crate::storage::FileStorage;

pub use coerce::coerce;
pub use error::*;
pub use parse::{parse_line, Args, Command};

/// Whether the loop should keep reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

pub struct Console<W: Write> {
    storage: FileStorage,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(storage: FileStorage, out: W) -> Self {
        Self { storage, out }
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Reads commands until `quit`, `EOF` or end of input.
    ///
    /// Coercion failures end only the command that raised them; they are
    /// reported on stderr and the loop continues. A line that is not valid
    /// UTF-8 is reported as unknown syntax.
    pub fn run<R: BufRead>(&mut self, mut input: R, prompt: Option<&str>) -> Result<(), CommandError> {
        let mut buf = Vec::new();
        loop {
            if let Some(prompt) = prompt {
                write!(self.out, "{}", prompt)?;
                self.out.flush()?;
            }

            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                if prompt.is_some() {
                    writeln!(self.out)?;
                }
                break;
            }
            if buf.ends_with(b"\n") {
                buf.pop();
                if buf.ends_with(b"\r") {
                    buf.pop();
                }
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("input line is not UTF-8: {}", e);
                    let shown = String::from_utf8_lossy(&buf).into_owned();
                    writeln!(self.out, "{}", InputError::UnknownSyntax(shown))?;
                    continue;
                }
            };

            match self.onecmd(line) {
                Ok(Control::Continue) => {}
                Ok(Control::Exit) => break,
                Err(CommandError::Coercion(e)) => {
                    tracing::error!(field = %e.field, "update aborted: {}", e);
                    eprintln!("error: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        self.out.flush()?;
        Ok(())
    }

    /// Parses and executes one line.
    ///
    /// Validation failures are printed as their fixed token and count as
    /// handled. Only coercion and output errors come back as `Err`.
    pub fn onecmd(&mut self, line: &str) -> Result<Control, CommandError> {
        let command = parse_line(line);
        tracing::debug!(?command, "dispatching");

        let result = match command {
            Command::Empty => Ok(()),
            Command::Quit => return Ok(Control::Exit),
            Command::Create(args) => self.do_create(&args),
            Command::Show(args) => self.do_show(&args),
            Command::Destroy(args) => self.do_destroy(&args),
            Command::All(args) => self.do_all(&args),
            Command::Count(args) => self.do_count(&args),
            Command::Update(args) => self.do_update(&args),
            Command::BatchUpdate { args, changes } => self.do_batch_update(args, changes),
            Command::Unknown(line) => Err(InputError::UnknownSyntax(line).into()),
        };
        self.report(result)?;
        Ok(Control::Continue)
    }

    /// Prints input errors as their token; passes everything else through.
    fn report(&mut self, result: Result<(), CommandError>) -> Result<(), CommandError> {
        match result {
            Err(CommandError::Input(e)) => {
                writeln!(self.out, "{}", e)?;
                Ok(())
            }
            other => other,
        }
    }

    fn do_create(&mut self, args: &Args) -> Result<(), CommandError> {
        let kind = require_kind(args)?;
        let record = Record::new(kind);
        let id = record.id().to_string();
        self.storage.new_record(record);
        self.storage.save();
        tracing::info!(kind = %kind, id = %id, "created record");
        writeln!(self.out, "{}", id)?;
        Ok(())
    }

    fn do_show(&mut self, args: &Args) -> Result<(), CommandError> {
        let shown = self.require_record(args)?.to_string();
        writeln!(self.out, "{}", shown)?;
        Ok(())
    }

    fn do_destroy(&mut self, args: &Args) -> Result<(), CommandError> {
        let (kind, id) = {
            let record = self.require_record(args)?;
            (record.kind(), record.id().to_string())
        };
        self.storage.remove(kind, &id);
        self.storage.save();
        tracing::info!(kind = %kind, id = %id, "destroyed record");
        Ok(())
    }

    fn do_all(&mut self, args: &Args) -> Result<(), CommandError> {
        let filter = match args.class.as_deref() {
            Some(name) => Some(ModelKind::from_str(name).ok_or(InputError::ClassDoesNotExist)?),
            None => None,
        };

        let shown: Vec<String> = self
            .storage
            .all()
            .values()
            .filter(|record| filter.map_or(true, |kind| record.kind() == kind))
            .map(|record| quote(&record.to_string()))
            .collect();
        writeln!(self.out, "[{}]", shown.join(", "))?;
        Ok(())
    }

    fn do_count(&mut self, args: &Args) -> Result<(), CommandError> {
        let kind = require_kind(args)?;
        writeln!(self.out, "{}", self.storage.count(kind))?;
        Ok(())
    }

    fn do_update(&mut self, args: &Args) -> Result<(), CommandError> {
        let (kind, id) = {
            let record = self.require_record(args)?;
            (record.kind(), record.id().to_string())
        };
        let field = args.field.as_deref().ok_or(InputError::AttributeNameMissing)?;
        let raw = args.value.as_deref().ok_or(InputError::ValueMissing)?;

        if RESERVED_FIELDS.contains(&field) {
            tracing::debug!(field, "ignoring update of reserved field");
            return Ok(());
        }

        let value = coerce(field, raw)?;
        let record = self
            .storage
            .get_mut(kind, &id)
            .ok_or(InputError::NoInstanceFound)?;
        record.set(field, value);
        record.touch();
        self.storage.save();
        tracing::debug!(kind = %kind, id = %id, field, "updated record");
        Ok(())
    }

    /// Runs one full update per pair. Every pair is attempted; the first
    /// coercion or output failure is returned once all pairs have run.
    fn do_batch_update(
        &mut self,
        args: Args,
        changes: Vec<(String, String)>,
    ) -> Result<(), CommandError> {
        if changes.is_empty() {
            return self.require_record(&args).map(|_| ()).map_err(Into::into);
        }

        let mut first_failure = None;
        for (field, value) in changes {
            let single = Args {
                field: Some(field),
                value: Some(value),
                ..args.clone()
            };
            let result = self.do_update(&single);
            if let Err(e) = self.report(result) {
                first_failure.get_or_insert(e);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    /// Class, then id, then existence, short-circuiting on the first failure.
    fn require_record(&self, args: &Args) -> Result<&Record, InputError> {
        let kind = require_kind(args)?;
        let id = args.id.as_deref().ok_or(InputError::InstanceIdMissing)?;
        self.storage
            .get(kind, id)
            .ok_or(InputError::NoInstanceFound)
    }
}

fn require_kind(args: &Args) -> Result<ModelKind, InputError> {
    let name = args.class.as_deref().ok_or(InputError::ClassNameMissing)?;
    ModelKind::from_str(name).ok_or(InputError::ClassDoesNotExist)
}
