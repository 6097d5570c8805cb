// End-to-end pipeline tests against a stand-in Blender executable
//
// The stand-in is a shell script that behaves like headless Blender from the
// pipeline's point of view: it finds the --python script argument, pulls the
// export filepath out of it, writes a small OBJ there and prints the marker
// line. Failure variants exit nonzero or skip the file write.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use nova_bridge::blender::BlenderRunner;
use nova_bridge::config::{BridgeConfig, NovaEndpoint};
use nova_bridge::nova::NovaClient;
use nova_bridge::tools::implementations::{BlenderExportTool, BlenderToNovaTool};
use nova_bridge::tools::registry::Tool;

const FAKE_BLENDER_OK: &str = r#"#!/bin/sh
script=""
prev=""
for a in "$@"; do
  if [ "$prev" = "--python" ]; then script="$a"; fi
  prev="$a"
done
out=$(grep -o 'filepath="[^"]*"' "$script" | head -n1 | sed 's/filepath="//; s/"$//')
printf 'v 0.0 0.0 0.0\nv 1.0 0.0 0.0\nv 0.0 1.0 0.0\nf 1 2 3\n' > "$out"
echo "Blender 4.1.0 (stand-in)"
echo "[nova] exported 1 meshes"
"#;

const FAKE_BLENDER_CRASH: &str = r#"#!/bin/sh
echo "Blender 4.1.0 (stand-in)"
echo "Error: Python script failed" >&2
exit 1
"#;

const FAKE_BLENDER_NO_ARTIFACT: &str = r#"#!/bin/sh
echo "Blender 4.1.0 (stand-in)"
echo "[nova] nothing exported"
"#;

fn install_fake_blender(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("blender");
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn config_with(bin: PathBuf, export_dir: &Path) -> Arc<BridgeConfig> {
    Arc::new(BridgeConfig {
        blender_bin: bin,
        export_dir: export_dir.to_path_buf(),
        ..BridgeConfig::default()
    })
}

fn leftover_scripts(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "py").unwrap_or(false))
        .collect()
}

#[tokio::test]
async fn test_export_writes_artifact_and_cleans_scratch() {
    let bin_dir = TempDir::new().unwrap();
    let export_dir = TempDir::new().unwrap();
    let bin = install_fake_blender(bin_dir.path(), FAKE_BLENDER_OK);
    let config = config_with(bin, export_dir.path());
    let runner = BlenderRunner::new(&config);

    let tool = BlenderExportTool::new(config, runner);
    let output = tool
        .execute(json!({
            "script": "print('building mesh')",
            "output_name": "triangle",
        }))
        .await
        .unwrap();

    assert!(!output.is_error, "unexpected failure: {}", output.details);
    let obj_path = PathBuf::from(output.details["obj_path"].as_str().unwrap());
    assert_eq!(obj_path, export_dir.path().join("triangle.obj"));
    assert!(output.details["size_bytes"].as_u64().unwrap() > 0);
    assert!(output.details["stdout"]
        .as_str()
        .unwrap()
        .contains("[nova] exported 1 meshes"));
    assert!(
        leftover_scripts(export_dir.path()).is_empty(),
        "composed script must be removed after the run"
    );
}

#[tokio::test]
async fn test_export_failure_cleans_scratch_and_reports_exit_code() {
    let bin_dir = TempDir::new().unwrap();
    let export_dir = TempDir::new().unwrap();
    let bin = install_fake_blender(bin_dir.path(), FAKE_BLENDER_CRASH);
    let config = config_with(bin, export_dir.path());
    let runner = BlenderRunner::new(&config);

    let tool = BlenderExportTool::new(config, runner);
    let output = tool
        .execute(json!({ "script": "raise RuntimeError('boom')" }))
        .await
        .unwrap();

    assert!(output.is_error);
    assert_eq!(output.details["category"], "process_failure");
    assert_eq!(output.details["step"], "run");
    assert!(output.details["stderr"]
        .as_str()
        .unwrap()
        .contains("Python script failed"));
    assert!(leftover_scripts(export_dir.path()).is_empty());
}

#[tokio::test]
async fn test_export_clean_exit_without_artifact_is_verify_failure() {
    let bin_dir = TempDir::new().unwrap();
    let export_dir = TempDir::new().unwrap();
    let bin = install_fake_blender(bin_dir.path(), FAKE_BLENDER_NO_ARTIFACT);
    let config = config_with(bin, export_dir.path());
    let runner = BlenderRunner::new(&config);

    let tool = BlenderExportTool::new(config, runner);
    let output = tool.execute(json!({ "script": "pass" })).await.unwrap();

    assert!(output.is_error);
    assert_eq!(output.details["category"], "artifact_missing");
    assert_eq!(output.details["step"], "verify");
}

#[tokio::test]
async fn test_pipeline_relay_failure_preserves_artifact() {
    let bin_dir = TempDir::new().unwrap();
    let export_dir = TempDir::new().unwrap();
    let bin = install_fake_blender(bin_dir.path(), FAKE_BLENDER_OK);
    let config = Arc::new(BridgeConfig {
        blender_bin: bin,
        export_dir: export_dir.path().to_path_buf(),
        // Port 9 (discard) has no listener in the test environment.
        nova: NovaEndpoint {
            host: "127.0.0.1".to_string(),
            port: 9,
            api_key: None,
        },
        ..BridgeConfig::default()
    });
    let runner = BlenderRunner::new(&config);
    let nova = Arc::new(NovaClient::new(&config.nova).unwrap());

    let tool = BlenderToNovaTool::new(config, runner, nova);
    let output = tool
        .execute(json!({
            "asset_name": "Widget",
            "script": "print('building widget')",
        }))
        .await
        .unwrap();

    assert!(output.is_error);
    assert_eq!(output.details["category"], "connection");
    assert_eq!(output.details["step"], "relay");
    // The export succeeded, so the artifact reference must survive the
    // relay failure and the file must still be on disk.
    let artifact_path = PathBuf::from(output.details["artifact"]["path"].as_str().unwrap());
    assert_eq!(artifact_path, export_dir.path().join("Widget.obj"));
    assert!(artifact_path.exists());
}

#[tokio::test]
async fn test_concurrent_exports_do_not_collide() {
    let bin_dir = TempDir::new().unwrap();
    let export_dir = TempDir::new().unwrap();
    let bin = install_fake_blender(bin_dir.path(), FAKE_BLENDER_OK);
    let config = config_with(bin, export_dir.path());
    let runner = BlenderRunner::new(&config);

    let tool_a = BlenderExportTool::new(config.clone(), runner.clone());
    let tool_b = BlenderExportTool::new(config, runner);
    let (a, b) = tokio::join!(
        tool_a.execute(json!({ "script": "pass", "output_name": "left" })),
        tool_b.execute(json!({ "script": "pass", "output_name": "right" })),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(!a.is_error && !b.is_error);
    assert!(export_dir.path().join("left.obj").exists());
    assert!(export_dir.path().join("right.obj").exists());
    assert!(leftover_scripts(export_dir.path()).is_empty());
}
