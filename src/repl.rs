//! Interactive REPL: a `rustyline::DefaultEditor` reading lines in a loop,
//! history persisted to a dotfile, `Ctrl-C` continues the loop, `Ctrl-D`
//! exits. Meta-commands are dot-free (`#load`, `#show`, `#step`, `#help`)
//! to stay out of the way of Dedalus's own `#` location-term prefix;
//! anything else is parsed as one or more rule statements appended to the
//! loaded program.

use std::fs;
use std::path::{Path, PathBuf};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::config::Config;
use crate::desugar::desugar;
use crate::error::{ReplError, ReplResult};
use crate::eval::{spawn, Process, UniformRandInt};
use crate::parser::parse_program;
use crate::render::render_process;
use crate::typecheck::typecheck;

const HELP_TEXT: &str = "\
Meta-commands:
  #load <path>   load and typecheck a program, replacing any session state
  #show          render the current process
  #step [n]      advance n timesteps (default 1)
  #help          show this message
Anything else is parsed as one or more rule statements and appended to the
currently loaded program; the whole program is re-typechecked before the
addition takes effect, so a bad rule leaves the session unchanged.";

fn history_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(|h| Path::new(&h).join(".dedalus_history"))
        .unwrap_or_else(|| PathBuf::from(".dedalus_history"))
}

/// Session state: the most recently typechecked program, and the live
/// process it's being evaluated against, if any rule has loaded or
/// `#step` has run.
pub struct Session {
    config: Config,
    program: Option<crate::ast::Program>,
    process: Option<Process>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session { config, program: None, process: None }
    }

    fn load(&mut self, source: &str) -> ReplResult<()> {
        let parsed = parse_program(source)?;
        let checked = typecheck(desugar(&parsed))?;
        let randint = UniformRandInt::new(self.config.run.randint_low, self.config.run.randint_high);
        self.process = Some(spawn(checked.clone(), Some(Box::new(randint))));
        self.program = Some(checked);
        Ok(())
    }

    fn extend(&mut self, source: &str) -> ReplResult<()> {
        let Some(existing) = self.program.clone() else { return Err(ReplError::NoProgramLoaded) };
        let added = parse_program(source)?;
        let mut rules = existing.rules.clone();
        rules.extend(added.rules);
        let candidate = crate::ast::Program::new(rules);
        let checked = typecheck(desugar(&candidate))?;

        // Rebuild the process from scratch on the extended program.
        // `step` produces immutable successors rather than mutating in
        // place, so there is no partially-advanced database to carry
        // over; extension only takes effect between runs.
        let randint = UniformRandInt::new(self.config.run.randint_low, self.config.run.randint_high);
        self.process = Some(spawn(checked.clone(), Some(Box::new(randint))));
        self.program = Some(checked);
        Ok(())
    }

    fn show(&self) -> ReplResult<String> {
        let process = self.process.as_ref().ok_or(ReplError::NoProgramLoaded)?;
        Ok(render_process(process))
    }

    fn advance(&mut self, n: u64) -> ReplResult<String> {
        let process = self.process.take().ok_or(ReplError::NoProgramLoaded)?;
        let process = crate::eval::run(process, n);
        let rendered = render_process(&process);
        self.process = Some(process);
        Ok(rendered)
    }

    fn handle_line(&mut self, line: &str) -> ReplResult<Option<String>> {
        if let Some(rest) = line.strip_prefix("#load") {
            let path = rest.trim();
            let source = fs::read_to_string(path).map_err(|e| ReplError::Io(e.to_string()))?;
            self.load(&source)?;
            return Ok(Some(format!("loaded {path}")));
        }
        if line.trim() == "#show" {
            return Ok(Some(self.show()?));
        }
        if let Some(rest) = line.strip_prefix("#step") {
            let n: u64 = rest.trim().parse().unwrap_or(1);
            return Ok(Some(self.advance(n)?));
        }
        if line.trim() == "#help" {
            return Ok(Some(HELP_TEXT.to_string()));
        }

        self.extend(line)?;
        Ok(Some("ok".to_string()))
    }
}

pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(config);
    let mut editor = DefaultEditor::new()?;

    let path = history_path();
    if path.exists() {
        let _ = editor.load_history(&path);
    }

    loop {
        match editor.readline("dedalus> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                match session.handle_line(line) {
                    Ok(Some(output)) => println!("{output}"),
                    Ok(None) => {}
                    Err(e) => println!("error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("goodbye");
                break;
            }
            Err(err) => {
                println!("error: {err:?}");
                break;
            }
        }
    }

    let _ = editor.save_history(&path);
    Ok(())
}
