// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;
use vsstubs_core::template::TEMPLATE;
use vsstubs_core::StubDocument;

fn samples_registry() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|parent| parent.parent())
        .expect("vsstubs-cli should live under workspace_root/apps/vsstubs")
        .join("samples/registry")
}

/// A scratch directory with a config pointing at the sample registry.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self::with_config("")
    }

    fn with_config(extra: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = samples_registry();
        let config = format!(
            "[registry]\npaths = [{:?}]\n\n[output]\ndefault_path = \"default/stubs.pyi\"\n{extra}",
            registry.to_str().expect("utf-8 path")
        );
        std::fs::write(dir.path().join("vsstubs.toml"), config).expect("write config");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_vsstubs"));
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path("vsstubs.toml"))
            .args(args);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("run vsstubs")
    }

    fn run_with_stdin(&self, args: &[&str], stdin: &str) -> Output {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn vsstubs");
        child.stdin.take().expect("stdin").write_all(stdin.as_bytes()).expect("write stdin");
        child.wait_with_output().expect("wait vsstubs")
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).expect("read output")
    }
}

fn namespaces(text: &str) -> Vec<String> {
    StubDocument::parse(text)
        .expect("valid stub document")
        .namespaces()
        .into_iter()
        .map(String::from)
        .collect()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(output: &Output) {
    assert!(output.status.success(), "vsstubs failed: {}", stderr(output));
}

#[test]
fn generates_every_plugin_with_pyi_suffix() {
    let ws = Workspace::new();
    let output = ws.run(&["-o", "stubs"]);
    assert_success(&output);

    let text = ws.read("stubs.pyi");
    assert_eq!(namespaces(&text), vec!["akarin", "resize", "std"]);
    assert!(text.contains("_VSCallback_std_FrameEval_eval: TypeAlias = Callable[..., VideoNode]"));
    assert!(
        text.contains("def SetFrameProps(self, clip: VideoNode, **kwargs: Any) -> VideoNode: ...")
    );
}

#[test]
fn without_output_writes_configured_default_path() {
    let ws = Workspace::new();
    assert_success(&ws.run(&["--template"]));
    assert_eq!(ws.read("default/stubs.pyi"), TEMPLATE);
}

#[test]
fn in_place_output_without_input_fails_and_writes_nothing() {
    let ws = Workspace::new();
    let output = ws.run(&["-o", "@"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("'@'"));
    assert!(!ws.path("default").exists());
    let entries: Vec<_> = std::fs::read_dir(ws.dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "only the config file should exist");
}

#[test]
fn check_mode_reports_and_leaves_input_unmodified() {
    let ws = Workspace::new();
    assert_success(&ws.run(&["-T", "-o", "stubs.pyi", "add", "std"]));
    let before = ws.read("stubs.pyi");

    let output = ws.run(&["--check", "-i", "stubs.pyi"]);
    assert_success(&output);
    assert!(stderr(&output)
        .contains("Mismatched plugin(s): only in input=none, only new=akarin, resize"));

    assert_eq!(ws.read("stubs.pyi"), before);
    assert!(!ws.path("default").exists());
}

#[test]
fn check_mode_on_fresh_stubs_is_clean() {
    let ws = Workspace::new();
    assert_success(&ws.run(&[]));

    let output = ws.run(&["-C"]);
    assert_success(&output);
    let err = stderr(&output);
    assert!(!err.contains("Mismatched"), "{err}");
    assert!(!err.contains("differ"), "{err}");
}

#[test]
fn add_and_remove_in_place_round_trip() {
    let ws = Workspace::new();
    assert_success(&ws.run(&["-T", "-o", "stubs.pyi", "add", "std", "akarin"]));
    let original = ws.read("stubs.pyi");

    assert_success(&ws.run(&["-i", "stubs.pyi", "-o", "@", "add", "resize"]));
    let added = ws.read("stubs.pyi");
    assert_eq!(namespaces(&added), vec!["akarin", "resize", "std"]);

    assert_success(&ws.run(&["-i", "stubs.pyi", "-o", "@", "remove", "resize"]));
    assert_eq!(ws.read("stubs.pyi"), original);
}

#[test]
fn unknown_namespace_is_a_warning() {
    let ws = Workspace::new();
    let output = ws.run(&["-T", "-o", "out", "add", "nope"]);
    assert_success(&output);
    assert!(stderr(&output).contains("\"nope\" isn't a valid plugin namespace."));
    assert!(namespaces(&ws.read("out.pyi")).is_empty());

    let output = ws.run(&["-i", "out.pyi", "-o", "@", "remove", "nope"]);
    assert_success(&output);
    assert!(stderr(&output).contains("\"nope\" isn't a valid plugin namespace."));
}

#[test]
fn quiet_suppresses_warnings() {
    let ws = Workspace::new();
    let output = ws.run(&["--quiet", "-T", "-o", "out", "add", "nope"]);
    assert_success(&output);
    assert!(stderr(&output).is_empty(), "{}", stderr(&output));
}

#[test]
fn pipes_through_standard_streams() {
    let ws = Workspace::new();
    let output = ws.run(&["-T", "-o", "-"]);
    assert_success(&output);
    assert_eq!(String::from_utf8_lossy(&output.stdout), TEMPLATE);

    let output = ws.run_with_stdin(&["-i", "-", "-o", "-", "add", "resize"], TEMPLATE);
    assert_success(&output);
    let text = String::from_utf8_lossy(&output.stdout);
    assert_eq!(namespaces(&text), vec!["resize"]);
}

#[test]
fn update_refreshes_present_namespaces_only() {
    let ws = Workspace::new();
    assert_success(&ws.run(&["-T", "-o", "stubs.pyi", "add", "resize"]));
    let stale = ws.read("stubs.pyi").replace("def Bilinear(", "def Bilinear_old(");
    std::fs::write(ws.path("stubs.pyi"), stale).unwrap();

    assert_success(&ws.run(&["-i", "stubs.pyi", "-o", "@", "update"]));
    let text = ws.read("stubs.pyi");
    assert_eq!(namespaces(&text), vec!["resize"]);
    assert!(!text.contains("Bilinear_old"));
}

#[test]
fn load_adds_plugins_from_extra_dumps() {
    let ws = Workspace::new();
    let dump = ws.path("extra.json");
    std::fs::write(
        &dump,
        r#"[{
            "namespace": "neo",
            "name": "Neo",
            "functions": [
                {
                    "name": "Blur",
                    "arguments": "clip:vnode;radius:int:opt;",
                    "returns": "clip:vnode;"
                }
            ]
        }]"#,
    )
    .unwrap();

    assert_success(&ws.run(&["-T", "-L", dump.to_str().unwrap(), "-o", "out"]));
    assert_eq!(namespaces(&ws.read("out.pyi")), vec!["neo"]);
}

#[test]
fn configured_callbacks_override_builtin_signatures() {
    let ws =
        Workspace::with_config("\n[callbacks]\n\"std.Lut.function\" = \"Callable[[int], int]\"\n");
    assert_success(&ws.run(&["-T", "-o", "out", "add", "std"]));
    assert!(ws
        .read("out.pyi")
        .contains("_VSCallback_std_Lut_function: TypeAlias = Callable[[int], int]"));
}

#[test]
fn environment_overrides_config_file() {
    let ws = Workspace::new();
    let output = ws
        .command(&["-T"])
        .env("VSSTUBS_OUTPUT__DEFAULT_PATH", "from-env/stubs.pyi")
        .output()
        .unwrap();
    assert_success(&output);
    assert!(ws.path("from-env/stubs.pyi").exists());
    assert!(!ws.path("default").exists());
}

#[test]
fn missing_registry_is_fatal() {
    let ws = Workspace::new();
    std::fs::write(ws.path("vsstubs.toml"), "[registry]\npaths = [\"./nowhere\"]\n").unwrap();
    let output = ws.run(&["-o", "out"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!Path::new(&ws.path("out.pyi")).exists());
}

#[test]
fn config_default_prints_toml() {
    let ws = Workspace::new();
    let output = ws.run(&["config", "default"]);
    assert_success(&output);
    let text = String::from_utf8_lossy(&output.stdout);
    let config: vsstubs_cli::Config = toml::from_str(&text).expect("default config parses");
    assert_eq!(config.output.default_path, "vapoursynth-stubs/__init__.pyi");
}
