use crate::command::{BuiltinCommand, Disposition};
use crate::env::{MAX_NAME_LEN, MAX_VALUE_LEN, StoreError, VariableStore};
use crate::error::describe;
use anyhow::Result;
use std::env;
use std::io::Write;
use thiserror::Error;
use tracing::debug;

/// Every built-in, in the order `help` lists them.
pub static BUILTINS: [&dyn BuiltinCommand; 5] = [&Cd, &Help, &Exit, &Export, &Echo];

/// Find the built-in called exactly `name`.
pub fn find_builtin(name: &str) -> Option<&'static dyn BuiltinCommand> {
    BUILTINS.iter().copied().find(|builtin| builtin.name() == name)
}

/// Change the current working directory to the first argument.
pub struct Cd;

impl BuiltinCommand for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn execute(
        &self,
        args: &[&str],
        _stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        _vars: &mut VariableStore,
    ) -> Result<Disposition> {
        // extra arguments after the target are ignored
        match args.get(1) {
            None => writeln!(stderr, "lsh: expected argument to \"cd\"")?,
            Some(target) => {
                if let Err(e) = env::set_current_dir(target) {
                    debug!(dir = %target, error = %e, "cd failed");
                    writeln!(stderr, "lsh: {}", describe(&e))?;
                }
            }
        }
        Ok(Disposition::Continue)
    }
}

/// Print a short banner and the list of built-ins.
pub struct Help;

impl BuiltinCommand for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    fn execute(
        &self,
        _args: &[&str],
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _vars: &mut VariableStore,
    ) -> Result<Disposition> {
        writeln!(stdout, "Stephen Brennan's LSH")?;
        writeln!(stdout, "Type program names and arguments, and hit enter.")?;
        writeln!(stdout, "The following are built in:")?;
        for builtin in BUILTINS.iter() {
            writeln!(stdout, "  {}", builtin.name())?;
        }
        writeln!(stdout, "Use the man command for information on other programs.")?;
        Ok(Disposition::Continue)
    }
}

/// Leave the shell. Arguments are ignored.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn execute(
        &self,
        _args: &[&str],
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _vars: &mut VariableStore,
    ) -> Result<Disposition> {
        Ok(Disposition::Stop)
    }
}

/// Why an `export` assignment was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("expected more arguments")]
    ExpectedMoreArguments,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Define a variable (`export NAME=VALUE`) or list all of them (`export`).
pub struct Export;

impl BuiltinCommand for Export {
    fn name(&self) -> &'static str {
        "export"
    }

    fn execute(
        &self,
        args: &[&str],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        vars: &mut VariableStore,
    ) -> Result<Disposition> {
        if args.len() < 2 {
            for var in vars.list() {
                writeln!(stdout, "declare {} = \"{}\"", var.name(), var.value())?;
            }
            return Ok(Disposition::Continue);
        }

        let committed = parse_assignment(&args[1..])
            .and_then(|(name, value)| Ok(vars.set(name, &value)?));
        if let Err(e) = committed {
            writeln!(stderr, "lsh: export: {e}")?;
        }
        Ok(Disposition::Continue)
    }
}

/// Split the arguments of `export` into a variable name and its value.
///
/// The name runs up to the first `=`. Whitespace may separate the name, the
/// `=` and the value, so all of these are accepted:
///
/// ```text
/// export NAME=John Doe
/// export NAME= John Doe
/// export NAME = John Doe
/// export NAME =John Doe
/// ```
///
/// The value is the rest of the token holding the `=` joined with every later
/// token by single spaces. When the name is a whole token of its own, the
/// next token starts the value even if it holds no `=`.
///
/// `args` does not include the `export` token itself; an empty slice asks
/// for more arguments.
pub fn parse_assignment<'a>(args: &[&'a str]) -> Result<(&'a str, String), ExportError> {
    let Some(&first) = args.first() else {
        return Err(ExportError::ExpectedMoreArguments);
    };
    if !first.as_bytes().first().is_some_and(u8::is_ascii_alphabetic) {
        return Err(StoreError::InvalidName.into());
    }

    let bytes = first.as_bytes();
    let name_len = bytes
        .iter()
        .take(MAX_NAME_LEN)
        .position(|&b| b == b'=')
        .unwrap_or(bytes.len().min(MAX_NAME_LEN));

    let (name, head, tail) = if name_len < bytes.len() {
        if bytes[name_len] != b'=' {
            return Err(StoreError::NameTooLong.into());
        }
        let rest = &first[name_len + 1..];
        if rest.is_empty() {
            // NAME= VALUE
            let head = args.get(1).ok_or(ExportError::ExpectedMoreArguments)?;
            (&first[..name_len], *head, &args[2..])
        } else {
            // NAME=VALUE
            (&first[..name_len], rest, &args[1..])
        }
    } else {
        let next = *args.get(1).ok_or(ExportError::ExpectedMoreArguments)?;
        if next == "=" {
            // NAME = VALUE
            let head = args.get(2).ok_or(ExportError::ExpectedMoreArguments)?;
            (first, *head, &args[3..])
        } else if let Some(rest) = next.strip_prefix('=') {
            // NAME =VALUE
            (first, rest, &args[2..])
        } else {
            (first, next, &args[2..])
        }
    };

    let value = std::iter::once(head)
        .chain(tail.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    if value.len() > MAX_VALUE_LEN {
        return Err(StoreError::ValueTooLong.into());
    }
    Ok((name, value))
}

/// Write the arguments to the diagnostic stream, each followed by a space.
///
/// An argument of the form `$NAME` is replaced by the value of the first
/// variable whose name starts with `NAME`, or by nothing if none does.
pub struct Echo;

impl BuiltinCommand for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn execute(
        &self,
        args: &[&str],
        _stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        vars: &mut VariableStore,
    ) -> Result<Disposition> {
        if args.len() < 2 {
            return Ok(Disposition::Continue);
        }

        for arg in &args[1..] {
            match arg.strip_prefix('$') {
                Some(request) => {
                    if let Some(value) = vars.lookup_prefix(request) {
                        write!(stderr, "{value}")?;
                    }
                    write!(stderr, " ")?;
                }
                None => write!(stderr, "{arg} ")?,
            }
        }
        writeln!(stderr)?;
        Ok(Disposition::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock_current_dir;
    use std::fs;

    struct Output {
        disposition: Disposition,
        stdout: String,
        stderr: String,
    }

    fn run(vars: &mut VariableStore, line: &str) -> Output {
        let args: Vec<&str> = line.split(' ').filter(|s| !s.is_empty()).collect();
        let builtin = find_builtin(args[0]).expect("builtin");
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let disposition = builtin
            .execute(&args, &mut stdout, &mut stderr, vars)
            .unwrap();
        Output {
            disposition,
            stdout: String::from_utf8(stdout).unwrap(),
            stderr: String::from_utf8(stderr).unwrap(),
        }
    }

    fn pairs(vars: &VariableStore) -> Vec<(String, String)> {
        vars.list()
            .map(|var| (var.name().to_string(), var.value().to_string()))
            .collect()
    }

    #[test]
    fn test_registry_order_and_lookup() {
        let names: Vec<&str> = BUILTINS.iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["cd", "help", "exit", "export", "echo"]);
        assert!(find_builtin("echo").is_some());
        assert!(find_builtin("ECHO").is_none());
        assert!(find_builtin("ls").is_none());
    }

    #[test]
    fn test_help_lists_builtins() {
        let out = run(&mut VariableStore::new(), "help ignored");
        assert_eq!(out.disposition, Disposition::Continue);
        assert!(out.stdout.starts_with("Stephen Brennan's LSH\n"));
        assert!(out.stdout.contains("  cd\n  help\n  exit\n  export\n  echo\n"));
        assert!(out.stdout.ends_with("Use the man command for information on other programs.\n"));
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn test_exit_stops() {
        let out = run(&mut VariableStore::new(), "exit 3");
        assert_eq!(out.disposition, Disposition::Stop);
        assert!(out.stdout.is_empty() && out.stderr.is_empty());
    }

    #[test]
    fn test_cd_without_argument() {
        let out = run(&mut VariableStore::new(), "cd");
        assert_eq!(out.disposition, Disposition::Continue);
        assert_eq!(out.stderr, "lsh: expected argument to \"cd\"\n");
    }

    #[test]
    fn test_cd_changes_directory() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let target = fs::canonicalize(temp.path()).unwrap();

        let line = format!("cd {} ignored", target.display());
        let out = run(&mut VariableStore::new(), &line);

        let now = fs::canonicalize(env::current_dir().unwrap()).unwrap();
        env::set_current_dir(&orig).unwrap();

        assert_eq!(out.disposition, Disposition::Continue);
        assert!(out.stderr.is_empty());
        assert_eq!(now, target);
    }

    #[test]
    fn test_cd_nonexistent_reports_error() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();

        let line = format!("cd nonexistent_dir_for_lsh_test_{}", std::process::id());
        let out = run(&mut VariableStore::new(), &line);

        assert_eq!(out.disposition, Disposition::Continue);
        assert_eq!(out.stderr, "lsh: No such file or directory\n");
        assert_eq!(env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_echo_plain_words_trailing_space() {
        let out = run(&mut VariableStore::new(), "echo hello world");
        assert_eq!(out.stderr, "hello world \n");
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn test_echo_without_arguments_is_silent() {
        let out = run(&mut VariableStore::new(), "echo");
        assert!(out.stderr.is_empty());
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn test_echo_unset_variable_emits_only_space() {
        let out = run(&mut VariableStore::new(), "echo $X");
        assert_eq!(out.stderr, " \n");
    }

    #[test]
    fn test_echo_expands_variables() {
        let mut vars = VariableStore::new();
        vars.set("A", "hello").unwrap();
        let out = run(&mut vars, "echo say $A now");
        assert_eq!(out.stderr, "say hello now \n");
    }

    #[test]
    fn test_echo_matches_name_prefix() {
        let mut vars = VariableStore::new();
        vars.set("HOME", "/root").unwrap();
        assert_eq!(run(&mut vars, "echo $HO").stderr, "/root \n");
        assert_eq!(run(&mut vars, "echo $HOMES").stderr, " \n");
        assert_eq!(run(&mut vars, "echo $").stderr, "/root \n");
    }

    #[test]
    fn test_export_round_trip_through_echo() {
        let mut vars = VariableStore::new();
        for (name, value) in [("A", "hello"), ("ABCDEFGHIJ", "123456789012345"), ("z9", "=x=")] {
            let out = run(&mut vars, &format!("export {name}={value}"));
            assert!(out.stderr.is_empty(), "{}", out.stderr);
            let out = run(&mut vars, &format!("echo ${name}"));
            assert_eq!(out.stderr, format!("{value} \n"));
        }
    }

    #[test]
    fn test_export_lists_in_insertion_order() {
        let mut vars = VariableStore::new();
        run(&mut vars, "export B=2");
        run(&mut vars, "export A=1");
        run(&mut vars, "export B=3");
        let out = run(&mut vars, "export");
        assert_eq!(out.stdout, "declare B = \"3\"\ndeclare A = \"1\"\n");
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn test_export_list_empty_store() {
        let out = run(&mut VariableStore::new(), "export");
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn test_export_equals_as_own_token() {
        let mut vars = VariableStore::new();
        run(&mut vars, "export NAME = John Doe");
        let out = run(&mut vars, "export");
        assert_eq!(out.stdout, "declare NAME = \"John Doe\"\n");
    }

    #[test]
    fn test_export_value_split_across_tokens() {
        let mut vars = VariableStore::new();
        run(&mut vars, "export A=one two   three");
        assert_eq!(vars.lookup("A"), Some("one two three"));
    }

    #[test]
    fn test_export_equals_placements() {
        let mut vars = VariableStore::new();
        run(&mut vars, "export A= x y");
        run(&mut vars, "export B =x y");
        run(&mut vars, "export C x y");
        run(&mut vars, "export D=a=b");
        assert_eq!(
            pairs(&vars),
            vec![
                ("A".into(), "x y".into()),
                ("B".into(), "x y".into()),
                ("C".into(), "x y".into()),
                ("D".into(), "a=b".into()),
            ]
        );
    }

    #[test]
    fn test_export_first_letter() {
        let mut vars = VariableStore::new();
        let out = run(&mut vars, "export 1bad=x");
        assert_eq!(
            out.stderr,
            "lsh: export: first letter of variable name must be a letter\n"
        );
        assert!(vars.is_empty());
    }

    #[test]
    fn test_export_name_limit() {
        let mut vars = VariableStore::new();
        let out = run(&mut vars, "export ABCDEFGHIJ=v");
        assert!(out.stderr.is_empty());

        let out = run(&mut vars, "export ABCDEFGHIJK=v");
        assert_eq!(
            out.stderr,
            "lsh: export: variable name exceeds a limit of 10 characters\n"
        );
        let out = run(&mut vars, "export ABCDEFGHIJK = v");
        assert_eq!(
            out.stderr,
            "lsh: export: variable name exceeds a limit of 10 characters\n"
        );
        assert_eq!(pairs(&vars), vec![("ABCDEFGHIJ".into(), "v".into())]);
    }

    #[test]
    fn test_export_value_limit() {
        let mut vars = VariableStore::new();
        let out = run(&mut vars, "export A=123456789012345");
        assert!(out.stderr.is_empty());

        let out = run(&mut vars, "export B=1234567890123456");
        assert_eq!(
            out.stderr,
            "lsh: export: variable value exceeds a limit of 15 characters\n"
        );
        // the joining spaces count towards the limit
        let out = run(&mut vars, "export C = 12345678 1234567");
        assert_eq!(
            out.stderr,
            "lsh: export: variable value exceeds a limit of 15 characters\n"
        );
        assert_eq!(pairs(&vars), vec![("A".into(), "123456789012345".into())]);
    }

    #[test]
    fn test_export_expected_more_arguments() {
        for line in ["export A", "export A=", "export A ="] {
            let mut vars = VariableStore::new();
            let out = run(&mut vars, line);
            assert_eq!(out.stderr, "lsh: export: expected more arguments\n", "{line}");
            assert!(vars.is_empty());
        }
    }

    #[test]
    fn test_export_capacity() {
        let mut vars = VariableStore::new();
        for name in ["A", "B", "C", "D", "E"] {
            let out = run(&mut vars, &format!("export {name}=v"));
            assert!(out.stderr.is_empty());
        }
        let out = run(&mut vars, "export F=v");
        assert_eq!(out.stderr, "lsh: export: maximum number of variables reached\n");
        assert_eq!(vars.len(), 5);
        assert_eq!(vars.lookup("F"), None);

        // overwriting is still allowed
        let out = run(&mut vars, "export A=w");
        assert!(out.stderr.is_empty());
        assert_eq!(vars.lookup("A"), Some("w"));
    }

    #[test]
    fn test_export_modifies_store_or_diagnoses() {
        let lines = [
            "export A=1",
            "export 9=1",
            "export B = 2",
            "export A=3",
            "export LONGERNAME1=x",
            "export C",
            "export D=0123456789abcdefg",
            "export E=5",
            "export F=6",
            "export G=7",
            "export H=8",
        ];
        let mut vars = VariableStore::new();
        for line in lines {
            let before = pairs(&vars);
            let out = run(&mut vars, line);
            let changed = before != pairs(&vars);
            let diagnosed = !out.stderr.is_empty();
            assert!(changed != diagnosed, "{line}: changed={changed} diagnosed={diagnosed}");
        }
        assert_eq!(
            vars.list().map(|v| v.name()).collect::<Vec<_>>(),
            vec!["A", "B", "E", "F", "G"]
        );
    }

    #[test]
    fn test_parse_assignment_directly() {
        assert_eq!(parse_assignment(&["X=1"]), Ok(("X", "1".to_string())));
        assert_eq!(
            parse_assignment(&["X", "=", "a", "b"]),
            Ok(("X", "a b".to_string()))
        );
        assert_eq!(
            parse_assignment(&["X="]),
            Err(ExportError::ExpectedMoreArguments)
        );
        assert_eq!(
            parse_assignment(&["_X=1"]),
            Err(ExportError::Store(StoreError::InvalidName))
        );
    }

    #[test]
    fn test_parse_assignment_degenerate_input() {
        assert_eq!(parse_assignment(&[]), Err(ExportError::ExpectedMoreArguments));
        assert_eq!(
            parse_assignment(&[""]),
            Err(ExportError::Store(StoreError::InvalidName))
        );
        assert_eq!(
            parse_assignment(&["", "=", "x"]),
            Err(ExportError::Store(StoreError::InvalidName))
        );
    }
}
