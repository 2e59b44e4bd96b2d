//! Line interpreter behind the terminal app.
//!
//! `execute` is pure: it never touches the tree and reports a cwd change and
//! a history effect back to the caller instead of applying them.

use chrono::{DateTime, Local};

use crate::vfs::{self, Node, VirtualFileTree, HOME_DIR};

pub const USER_NAME: &str = "user";
pub const HOST_NAME: &str = "futureos";
pub const SYSTEM_NAME: &str = "FutureOS 1.0.0";
pub const EMPTY_DIR_MESSAGE: &str = "Directory vuota";

pub const HELP_TEXT: &str = "Comandi disponibili:
ls          - Lista file e directory
pwd         - Mostra directory corrente
cd [path]   - Cambia directory
cat [file]  - Mostra contenuto file
clear       - Pulisce il terminale
mkdir [dir] - Crea directory
touch [file]- Crea file vuoto
help        - Mostra questo messaggio";

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub command: String,
    pub output: String,
    pub timestamp: DateTime<Local>,
    pub directory: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEffect {
    Append,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: String,
    pub new_cwd: Option<String>,
    pub effect: HistoryEffect,
}

impl Execution {
    fn output(text: impl Into<String>) -> Self {
        Self {
            output: text.into(),
            new_cwd: None,
            effect: HistoryEffect::Append,
        }
    }

    fn change_dir(path: String) -> Self {
        Self {
            output: String::new(),
            new_cwd: Some(path),
            effect: HistoryEffect::Append,
        }
    }
}

pub fn prompt(cwd: &str) -> String {
    format!("{USER_NAME}@{HOST_NAME}:{cwd}$")
}

pub fn execute(line: &str, cwd: &str, tree: &VirtualFileTree, now: DateTime<Local>) -> Execution {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Execution::output("");
    };
    let args: Vec<&str> = parts.collect();

    match cmd {
        "ls" => {
            let names = tree.child_names(cwd).unwrap_or_default();
            if names.is_empty() {
                Execution::output(EMPTY_DIR_MESSAGE)
            } else {
                Execution::output(names.join("  "))
            }
        }
        "pwd" => Execution::output(cwd),
        "cd" => change_directory(args.first().copied(), cwd, tree),
        "cat" => match args.first() {
            None => Execution::output("cat: specificare un file"),
            Some(name) => match tree.node(&vfs::normalize(cwd, name)) {
                Some(Node::File(file)) => Execution::output(file.content.clone()),
                Some(Node::Folder(_)) => Execution::output(format!("cat: {name}: È una directory")),
                None => Execution::output(format!("cat: {name}: File non trovato")),
            },
        },
        "clear" => Execution {
            output: String::new(),
            new_cwd: None,
            effect: HistoryEffect::Clear,
        },
        "help" => Execution::output(HELP_TEXT),
        "mkdir" => match args.first() {
            None => Execution::output("mkdir: specificare il nome della directory"),
            Some(name) => Execution::output(format!("Directory '{name}' creata (simulazione)")),
        },
        "touch" => match args.first() {
            None => Execution::output("touch: specificare il nome del file"),
            Some(name) => Execution::output(format!("File '{name}' creato (simulazione)")),
        },
        "whoami" => Execution::output(USER_NAME),
        "date" => Execution::output(now.format("%a %b %d %Y %H:%M:%S %:z").to_string()),
        "uname" => Execution::output(SYSTEM_NAME),
        other => Execution::output(format!(
            "{other}: comando non trovato. Usa 'help' per vedere i comandi disponibili."
        )),
    }
}

fn change_directory(target: Option<&str>, cwd: &str, tree: &VirtualFileTree) -> Execution {
    let Some(target) = target else {
        return Execution::change_dir(HOME_DIR.to_string());
    };
    let resolved = vfs::normalize(cwd, target);
    if tree.is_folder(&resolved) {
        Execution::change_dir(resolved)
    } else {
        Execution::output(format!("cd: {target}: Directory non trovata"))
    }
}

/// History a fresh terminal opens with.
pub fn seeded_history(now: DateTime<Local>) -> Vec<HistoryEntry> {
    vec![
        HistoryEntry {
            command: "ls".to_string(),
            output: "Documents  Downloads  Pictures".to_string(),
            timestamp: now,
            directory: HOME_DIR.to_string(),
        },
        HistoryEntry {
            command: "pwd".to_string(),
            output: HOME_DIR.to_string(),
            timestamp: now,
            directory: HOME_DIR.to_string(),
        },
    ]
}

/// Run `line` and fold its effects into `history` and `cwd`.
pub fn run_line(
    line: &str,
    cwd: &mut String,
    history: &mut Vec<HistoryEntry>,
    tree: &VirtualFileTree,
    now: DateTime<Local>,
) {
    let result = execute(line, cwd, tree, now);
    match result.effect {
        HistoryEffect::Clear => history.clear(),
        HistoryEffect::Append => history.push(HistoryEntry {
            command: line.to_string(),
            output: result.output,
            timestamp: now,
            directory: cwd.clone(),
        }),
    }
    if let Some(next) = result.new_cwd {
        *cwd = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(line: &str, cwd: &str) -> Execution {
        execute(line, cwd, &VirtualFileTree::seeded(), Local::now())
    }

    #[test]
    fn walkthrough_from_home() {
        let tree = VirtualFileTree::seeded();
        let mut cwd = HOME_DIR.to_string();
        let mut history = Vec::new();
        let now = Local::now();

        run_line("ls", &mut cwd, &mut history, &tree, now);
        assert_eq!(history[0].output, "Documents  Downloads  Pictures");

        run_line("cd Documents", &mut cwd, &mut history, &tree, now);
        assert_eq!(cwd, "/home/user/Documents");
        assert_eq!(history[1].output, "");
        assert_eq!(history[1].directory, HOME_DIR);

        run_line("cat welcome.txt", &mut cwd, &mut history, &tree, now);
        let welcome = tree.read_file("/home/user/Documents/welcome.txt").unwrap();
        assert_eq!(history[2].output, welcome.content);

        run_line("cat nosuchfile", &mut cwd, &mut history, &tree, now);
        assert_eq!(history[3].output, "cat: nosuchfile: File non trovato");
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn cd_up_at_root_is_silent_noop() {
        let result = run("cd ..", "/");
        assert_eq!(result.output, "");
        assert_eq!(result.new_cwd.as_deref(), Some("/"));
    }

    #[test]
    fn cd_variants() {
        assert_eq!(run("cd", "/etc").new_cwd.as_deref(), Some(HOME_DIR));
        assert_eq!(run("cd ..", HOME_DIR).new_cwd.as_deref(), Some("/home"));
        assert_eq!(run("cd /etc", HOME_DIR).new_cwd.as_deref(), Some("/etc"));
        let missing = run("cd Music", HOME_DIR);
        assert_eq!(missing.new_cwd, None);
        assert_eq!(missing.output, "cd: Music: Directory non trovata");
        let into_file = run("cd notes.txt", "/home/user/Documents");
        assert_eq!(into_file.output, "cd: notes.txt: Directory non trovata");
        assert_eq!(run("cd /nope", HOME_DIR).output, "cd: /nope: Directory non trovata");
    }

    #[test]
    fn cat_errors() {
        assert_eq!(run("cat", HOME_DIR).output, "cat: specificare un file");
        assert_eq!(run("cat Documents", HOME_DIR).output, "cat: Documents: È una directory");
    }

    #[test]
    fn cat_resolves_paths_like_cd() {
        let welcome = "Benvenuto in FutureOS!";
        let docs = "/home/user/Documents";
        assert!(run("cat ./welcome.txt", docs).output.starts_with(welcome));
        assert!(run("cat ../Documents/welcome.txt", docs).output.starts_with(welcome));
        assert!(run("cat /home/user/Documents/welcome.txt", "/").output.starts_with(welcome));
        assert_eq!(
            run("cat ../welcome.txt", docs).output,
            "cat: ../welcome.txt: File non trovato"
        );
    }

    #[test]
    fn clear_empties_history_and_is_not_recorded() {
        let tree = VirtualFileTree::seeded();
        let mut cwd = HOME_DIR.to_string();
        let mut history = seeded_history(Local::now());
        run_line("pwd", &mut cwd, &mut history, &tree, Local::now());
        assert_eq!(history.len(), 3);
        run_line("clear", &mut cwd, &mut history, &tree, Local::now());
        assert!(history.is_empty());
        run_line("clear", &mut cwd, &mut history, &tree, Local::now());
        assert!(history.is_empty());
    }

    #[test]
    fn mkdir_and_touch_do_not_mutate_tree() {
        let tree = VirtualFileTree::seeded();
        let before = tree.clone();
        let result = execute("mkdir Music", HOME_DIR, &tree, Local::now());
        assert_eq!(result.output, "Directory 'Music' creata (simulazione)");
        let result = execute("touch a.txt", HOME_DIR, &tree, Local::now());
        assert_eq!(result.output, "File 'a.txt' creato (simulazione)");
        assert_eq!(tree, before);
        assert_eq!(
            run("mkdir", HOME_DIR).output,
            "mkdir: specificare il nome della directory"
        );
        assert_eq!(run("touch", HOME_DIR).output, "touch: specificare il nome del file");
    }

    #[test]
    fn fixed_outputs_and_unknown_commands() {
        assert_eq!(run("whoami", HOME_DIR).output, "user");
        assert_eq!(run("uname", HOME_DIR).output, "FutureOS 1.0.0");
        assert_eq!(run("pwd", "/etc").output, "/etc");
        assert!(run("help", HOME_DIR).output.starts_with("Comandi disponibili:"));
        assert!(!run("date", HOME_DIR).output.is_empty());
        assert_eq!(
            run("rm -rf /", HOME_DIR).output,
            "rm: comando non trovato. Usa 'help' per vedere i comandi disponibili."
        );
    }

    #[test]
    fn ls_in_empty_folder() {
        assert_eq!(run("ls", "/bin").output, EMPTY_DIR_MESSAGE);
    }

    #[test]
    fn every_failed_command_is_recorded_once() {
        let tree = VirtualFileTree::seeded();
        let mut cwd = HOME_DIR.to_string();
        let mut history = Vec::new();
        for line in ["bogus", "cd nowhere", "cat", "ls"] {
            run_line(line, &mut cwd, &mut history, &tree, Local::now());
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history[1].command, "cd nowhere");
    }
}
