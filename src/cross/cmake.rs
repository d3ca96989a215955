//! Typed CMake script builder.
//!
//! Triplets, overlay triplets and the cross toolchain are assembled as a
//! list of [`Statement`]s and rendered by [`CMakeScript::render`].

use std::fmt::Write as _;

/// Type tag of a `CACHE` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    String,
    FilePath,
}

impl CacheKind {
    fn as_str(&self) -> &'static str {
        match self {
            CacheKind::String => "STRING",
            CacheKind::FilePath => "FILEPATH",
        }
    }
}

/// One CMake statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Comment(String),
    Blank,
    /// `set(VAR value)` or `set(VAR "value")`
    Set {
        var: String,
        value: String,
        quoted: bool,
    },
    /// `set(VAR "value" CACHE <kind> "doc" [FORCE])`
    SetCache {
        var: String,
        value: String,
        kind: CacheKind,
        doc: String,
        force: bool,
    },
    /// `string(APPEND VAR " value")`
    StringAppend { var: String, value: String },
    /// `list(APPEND VAR "value")`
    ListAppend { var: String, value: String },
    /// `include("path")`
    Include(String),
    /// Configure options applied to a single port
    PortOptions { port: String, options: Vec<String> },
}

/// An ordered CMake script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CMakeScript {
    statements: Vec<Statement>,
}

impl CMakeScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn push(&mut self, statement: Statement) -> &mut Self {
        self.statements.push(statement);
        self
    }

    pub fn comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Statement::Comment(text.into()))
    }

    pub fn blank(&mut self) -> &mut Self {
        self.push(Statement::Blank)
    }

    pub fn set(&mut self, var: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(Statement::Set {
            var: var.into(),
            value: value.into(),
            quoted: false,
        })
    }

    pub fn set_quoted(&mut self, var: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(Statement::Set {
            var: var.into(),
            value: value.into(),
            quoted: true,
        })
    }

    pub fn set_cache(
        &mut self,
        var: impl Into<String>,
        value: impl Into<String>,
        kind: CacheKind,
        doc: impl Into<String>,
        force: bool,
    ) -> &mut Self {
        self.push(Statement::SetCache {
            var: var.into(),
            value: value.into(),
            kind,
            doc: doc.into(),
            force,
        })
    }

    pub fn string_append(&mut self, var: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(Statement::StringAppend {
            var: var.into(),
            value: value.into(),
        })
    }

    pub fn list_append(&mut self, var: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(Statement::ListAppend {
            var: var.into(),
            value: value.into(),
        })
    }

    pub fn include(&mut self, path: impl Into<String>) -> &mut Self {
        self.push(Statement::Include(path.into()))
    }

    pub fn port_options(&mut self, port: impl Into<String>, options: Vec<String>) -> &mut Self {
        self.push(Statement::PortOptions {
            port: port.into(),
            options,
        })
    }

    /// Append every statement of `other`.
    pub fn extend(&mut self, other: CMakeScript) -> &mut Self {
        self.statements.extend(other.statements);
        self
    }

    /// Value of the last plain or cache `set` of `var`, if any.
    pub fn value_of(&self, var: &str) -> Option<&str> {
        self.statements.iter().rev().find_map(|s| match s {
            Statement::Set { var: v, value, .. } | Statement::SetCache { var: v, value, .. }
                if v == var =>
            {
                Some(value.as_str())
            }
            _ => None,
        })
    }

    /// Render to CMake source, one statement per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            render_statement(&mut out, statement);
        }
        out
    }
}

fn render_statement(out: &mut String, statement: &Statement) {
    // Writing into a String cannot fail.
    let _ = match statement {
        Statement::Comment(text) => writeln!(out, "# {}", text),
        Statement::Blank => writeln!(out),
        Statement::Set { var, value, quoted } => {
            if *quoted {
                writeln!(out, "set({} \"{}\")", var, escape(value))
            } else {
                writeln!(out, "set({} {})", var, value)
            }
        }
        Statement::SetCache {
            var,
            value,
            kind,
            doc,
            force,
        } => writeln!(
            out,
            "set({} \"{}\" CACHE {} \"{}\"{})",
            var,
            escape(value),
            kind.as_str(),
            escape(doc),
            if *force { " FORCE" } else { "" }
        ),
        Statement::StringAppend { var, value } => {
            writeln!(out, "string(APPEND {} \" {}\")", var, escape(value))
        }
        Statement::ListAppend { var, value } => {
            writeln!(out, "list(APPEND {} \"{}\")", var, escape(value))
        }
        Statement::Include(path) => writeln!(out, "include(\"{}\")", escape(path)),
        Statement::PortOptions { port, options } => {
            let _ = writeln!(out, "if(PORT STREQUAL \"{}\")", escape(port));
            for option in options {
                let _ = writeln!(
                    out,
                    "  list(APPEND VCPKG_CMAKE_CONFIGURE_OPTIONS \"{}\")",
                    escape(option)
                );
            }
            writeln!(out, "endif()")
        }
    };
}

/// `CMAKE_FIND_ROOT_PATH_MODE_*`: programs from the host, everything else
/// from the sysroot and installed tree only.
pub fn find_root_isolation() -> CMakeScript {
    let mut script = CMakeScript::new();
    script
        .set("CMAKE_FIND_ROOT_PATH_MODE_PROGRAM", "NEVER")
        .set("CMAKE_FIND_ROOT_PATH_MODE_LIBRARY", "ONLY")
        .set("CMAKE_FIND_ROOT_PATH_MODE_INCLUDE", "ONLY")
        .set("CMAKE_FIND_ROOT_PATH_MODE_PACKAGE", "ONLY");
    script
}

fn escape(value: &str) -> String {
    value.replace('\\', "/").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_statements() {
        let mut script = CMakeScript::new();
        script
            .comment("generated")
            .set("CMAKE_SYSTEM_NAME", "Linux")
            .set_cache("CMAKE_C_FLAGS", "-fPIC", CacheKind::String, "", true)
            .set_cache("CMAKE_AR", "x86_64-linux-musl-ar", CacheKind::FilePath, "Archiver", false)
            .blank()
            .string_append("VCPKG_C_FLAGS", "-O2")
            .list_append("CMAKE_FIND_ROOT_PATH", "/usr/x86_64-linux-musl")
            .include("/opt/vcpkg/triplets/x64-linux.cmake");

        let expected = "\
# generated
set(CMAKE_SYSTEM_NAME Linux)
set(CMAKE_C_FLAGS \"-fPIC\" CACHE STRING \"\" FORCE)
set(CMAKE_AR \"x86_64-linux-musl-ar\" CACHE FILEPATH \"Archiver\")

string(APPEND VCPKG_C_FLAGS \" -O2\")
list(APPEND CMAKE_FIND_ROOT_PATH \"/usr/x86_64-linux-musl\")
include(\"/opt/vcpkg/triplets/x64-linux.cmake\")
";
        assert_eq!(script.render(), expected);
    }

    #[test]
    fn test_port_options_block() {
        let mut script = CMakeScript::new();
        script.port_options("sdl3", vec!["-DSDL_X11=OFF".to_string(), "-DSDL_WAYLAND=OFF".to_string()]);
        assert_eq!(
            script.render(),
            "if(PORT STREQUAL \"sdl3\")\n  list(APPEND VCPKG_CMAKE_CONFIGURE_OPTIONS \"-DSDL_X11=OFF\")\n  list(APPEND VCPKG_CMAKE_CONFIGURE_OPTIONS \"-DSDL_WAYLAND=OFF\")\nendif()\n"
        );
    }

    #[test]
    fn test_value_of_and_escaping() {
        let mut script = CMakeScript::new();
        script.set("A", "1").set_quoted("A", "C:\\x \"y\"");
        assert_eq!(script.value_of("A"), Some("C:\\x \"y\""));
        assert_eq!(script.value_of("B"), None);
        assert_eq!(script.render(), "set(A 1)\nset(A \"C:/x \\\"y\\\"\")\n");
    }
}
