//! External tool invocation.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use geo_common::{GeoError, GeoResult};

/// Values substituted into a tool command template.
#[derive(Debug, Clone, Copy)]
pub struct ToolVars<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub zoom: &'a str,
    pub format: &'a str,
    pub tolerance: f64,
}

/// A command line template such as
/// `rio mbtiles {input} {output} --zoom-levels {zoom} --format {format}`.
///
/// Arguments are split on whitespace; placeholders are replaced per run
/// and no shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn parse(template: &str) -> GeoResult<Self> {
        let command = Self::split(template);
        if command.program.is_empty() {
            return Err(GeoError::Config("tool command must not be empty".to_string()));
        }
        Ok(command)
    }

    pub(crate) fn split(template: &str) -> Self {
        let mut parts = template.split_whitespace().map(str::to_string);
        Self {
            program: parts.next().unwrap_or_default(),
            args: parts.collect(),
        }
    }

    /// Name used in diagnostics: the program plus a leading subcommand, if any.
    pub fn name(&self) -> String {
        match self.args.first() {
            Some(sub) if !sub.starts_with('-') && !sub.contains('{') => {
                format!("{} {}", self.program, sub)
            }
            _ => self.program.clone(),
        }
    }

    /// Arguments with placeholders filled in.
    pub fn render_args(&self, vars: &ToolVars<'_>) -> Vec<OsString> {
        let tolerance = vars.tolerance.to_string();
        self.args
            .iter()
            .map(|arg| match arg.as_str() {
                "{input}" => vars.input.as_os_str().to_owned(),
                "{output}" => vars.output.as_os_str().to_owned(),
                _ => OsString::from(
                    arg.replace("{input}", &vars.input.to_string_lossy())
                        .replace("{output}", &vars.output.to_string_lossy())
                        .replace("{zoom}", vars.zoom)
                        .replace("{format}", vars.format)
                        .replace("{tolerance}", &tolerance),
                ),
            })
            .collect()
    }

    /// Run to completion, blocking the calling thread.
    ///
    /// A non-zero exit is reported with the tool's stderr verbatim. Never retried.
    pub fn run(&self, vars: &ToolVars<'_>) -> GeoResult<()> {
        let name = self.name();
        let args = self.render_args(vars);
        debug!(tool = %name, args = ?args, "Running external tool");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| GeoError::ToolSpawn {
                tool: name.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
            warn!(tool = %name, status = ?output.status.code(), stderr = %stderr, "External tool failed");
            return Err(GeoError::ExternalToolFailure {
                tool: name,
                status: output.status.code(),
                stderr,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(input: &'a Path, output: &'a Path) -> ToolVars<'a> {
        ToolVars {
            input,
            output,
            zoom: "0..8",
            format: "PNG",
            tolerance: 0.001,
        }
    }

    #[test]
    fn test_parse_and_name() {
        let cmd = ToolCommand::parse("rio mbtiles {input} {output} --zoom-levels {zoom}").unwrap();
        assert_eq!(cmd.program, "rio");
        assert_eq!(cmd.name(), "rio mbtiles");

        let cmd = ToolCommand::parse("ogr2ogr -f GeoJSON -simplify {tolerance} {output} {input}").unwrap();
        assert_eq!(cmd.name(), "ogr2ogr");
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(matches!(ToolCommand::parse("   "), Err(GeoError::Config(_))));
    }

    #[test]
    fn test_render_args() {
        let cmd = ToolCommand::parse(
            "rio mbtiles {input} {output} --zoom-levels {zoom} --format {format} -s {tolerance}",
        )
        .unwrap();
        let args = cmd.render_args(&vars(Path::new("/tmp/a.tif"), Path::new("/tmp/b.mbtiles")));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "mbtiles",
                "/tmp/a.tif",
                "/tmp/b.mbtiles",
                "--zoom-levels",
                "0..8",
                "--format",
                "PNG",
                "-s",
                "0.001"
            ]
        );
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let cmd = ToolCommand::parse("definitely-not-a-real-tool-xyz {input}").unwrap();
        let err = cmd
            .run(&vars(Path::new("a"), Path::new("b")))
            .unwrap_err();
        assert!(matches!(err, GeoError::ToolSpawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_stderr() {
        let cmd = ToolCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo 'no driver' >&2; exit 3".to_string()],
        };
        let err = cmd
            .run(&vars(Path::new("a"), Path::new("b")))
            .unwrap_err();
        match err {
            GeoError::ExternalToolFailure { tool, status, stderr } => {
                assert_eq!(tool, "sh");
                assert_eq!(status, Some(3));
                assert_eq!(stderr, "no driver");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
