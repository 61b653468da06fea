// src/exec/terminal.rs

use std::path::Path;

use crate::config::Settings;

/// Marker for the script path inside `[general] terminal_args`.
pub const SCRIPT_MARKER: &str = "{script}";

/// Program and arguments that open `script` in the configured terminal.
///
/// An explicit `terminal_args` list wins; `{script}` in it is replaced by the
/// script path, and the path is appended when no entry mentions it.
/// Otherwise the argument convention is picked from the terminal's name.
pub fn terminal_command(settings: &Settings, script: &Path) -> (String, Vec<String>) {
    let script = script.to_string_lossy().into_owned();
    let program = settings.terminal.clone();

    if let Some(template) = &settings.terminal_args {
        let mut args: Vec<String> = template
            .iter()
            .map(|arg| arg.replace(SCRIPT_MARKER, &script))
            .collect();
        if !template.iter().any(|arg| arg.contains(SCRIPT_MARKER)) {
            args.push(script);
        }
        return (program, args);
    }

    let args = match terminal_name(&program) {
        "konsole" => vec!["--new-tab".to_string(), "-e".to_string(), script],
        "gnome-terminal" => vec!["--".to_string(), script],
        "kitty" => vec![script],
        "wezterm" => vec!["start".to_string(), "--".to_string(), script],
        _ => vec!["-e".to_string(), script],
    };

    (program, args)
}

fn terminal_name(program: &str) -> &str {
    Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(terminal: &str, args: Option<&[&str]>) -> Settings {
        Settings {
            terminal: terminal.to_string(),
            terminal_args: args.map(|a| a.iter().map(|s| s.to_string()).collect()),
            ..Settings::default()
        }
    }

    #[test]
    fn known_terminal_conventions() {
        let script = Path::new("/tmp/x.sh");
        let cases: [(&str, &[&str]); 5] = [
            ("konsole", &["--new-tab", "-e", "/tmp/x.sh"]),
            ("/usr/bin/gnome-terminal", &["--", "/tmp/x.sh"]),
            ("kitty", &["/tmp/x.sh"]),
            ("wezterm", &["start", "--", "/tmp/x.sh"]),
            ("xterm", &["-e", "/tmp/x.sh"]),
        ];

        for (terminal, expected) in cases {
            let (program, args) = terminal_command(&settings(terminal, None), script);
            assert_eq!(program, terminal);
            assert_eq!(args, expected, "terminal {terminal}");
        }
    }

    #[test]
    fn explicit_args_replace_marker() {
        let (_, args) = terminal_command(
            &settings("foot", Some(&["--hold", "sh", "{script}"])),
            Path::new("/tmp/x.sh"),
        );
        assert_eq!(args, vec!["--hold", "sh", "/tmp/x.sh"]);
    }

    #[test]
    fn explicit_args_without_marker_append_script() {
        let (_, args) = terminal_command(
            &settings("alacritty", Some(&["-e"])),
            Path::new("/tmp/x.sh"),
        );
        assert_eq!(args, vec!["-e", "/tmp/x.sh"]);
    }
}
