//! Parsing of the line-oriented command language.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch { folder_id: String },
    /// Creates from the given name, or from the folder-name draft when absent.
    Create { name: Option<String> },
    Name(String),
    Title(String),
    Description(String),
    Add,
    Delete { service_id: String },
    Save,
    Reset,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  fetch <id>           load a folder from the remote
  create [name]        create a folder (uses the drafted name when omitted)
  name <text>          draft the folder name
  title <text>         draft the service title
  description <text>   draft the service description
  add                  add the drafted service
  delete <id>          delete a service
  save                 save the services of the active folder
  reset                drop the folder and start over
  show | help | quit";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "fetch" => Command::Fetch {
            folder_id: required(rest, "fetch <id>")?,
        },
        "create" => Command::Create {
            name: (!rest.is_empty()).then(|| rest.to_string()),
        },
        // Draft text is taken verbatim; validation happens on submit.
        "name" => Command::Name(rest.to_string()),
        "title" => Command::Title(rest.to_string()),
        "description" | "desc" => Command::Description(rest.to_string()),
        "add" => Command::Add,
        "delete" | "rm" => Command::Delete {
            service_id: required(rest, "delete <id>")?,
        },
        "save" => Command::Save,
        "reset" => Command::Reset,
        "show" | "ls" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}'; type 'help'")),
    };
    Ok(Some(command))
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(rest.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn verbs_are_case_insensitive_and_keep_argument_text() {
        assert_eq!(
            parse_command("TITLE  Web Service "),
            Ok(Some(Command::Title("Web Service".into())))
        );
        assert_eq!(
            parse_command("fetch 42"),
            Ok(Some(Command::Fetch {
                folder_id: "42".into()
            }))
        );
    }

    #[test]
    fn create_without_name_uses_draft() {
        assert_eq!(
            parse_command("create"),
            Ok(Some(Command::Create { name: None }))
        );
        assert_eq!(
            parse_command("create Ops team"),
            Ok(Some(Command::Create {
                name: Some("Ops team".into())
            }))
        );
    }

    #[test]
    fn missing_required_argument_reports_usage() {
        let err = parse_command("delete").expect_err("must fail");
        assert!(err.contains("delete <id>"));
    }

    #[test]
    fn unknown_verbs_are_rejected() {
        assert!(parse_command("launch rockets").is_err());
    }
}
