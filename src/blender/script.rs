// Script composition and scratch-file handling
//
// A composed script is always user fragment first, export trailer second:
// the user fragment builds scene state, the trailer performs the export
// side effect. Reversing the order exports an empty scene.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;

/// Marker prefix Blender scripts print on pipeline-relevant lines, used to
/// separate them from Blender's banner noise.
pub const EXPORT_MARKER: &str = "[nova]";

/// Concatenate an optional user fragment with the fixed trailer.
/// User fragment first, trailer second - this ordering is a hard contract.
pub fn compose(user_fragment: Option<&str>, trailer: &str) -> String {
    match user_fragment {
        Some(fragment) => format!("{}\n{}", fragment, trailer),
        None => trailer.to_string(),
    }
}

/// Python trailer appended to every export pipeline script.
///
/// Drops non-mesh helper objects and incidental flat reference planes that
/// upstream generative scripts tend to leave behind (near-zero extent on one
/// axis, over a meter on the other two), applies pending modifiers, then
/// writes an OBJ in the editor's coordinate convention (-Y forward, Z up).
/// Thresholds are hard-coded for the known output shape of the upstream
/// tools.
pub fn obj_export_trailer(out_path: &Path) -> String {
    format!(
        r#"import bpy

for obj in list(bpy.data.objects):
    if obj.type != 'MESH':
        bpy.data.objects.remove(obj, do_unlink=True)
        continue
    dims = sorted(obj.dimensions)
    if dims[0] < 0.01 and dims[1] > 1.0 and dims[2] > 1.0:
        bpy.data.objects.remove(obj, do_unlink=True)

for obj in bpy.data.objects:
    if obj.type == 'MESH':
        bpy.context.view_layer.objects.active = obj
        for mod in list(obj.modifiers):
            try:
                bpy.ops.object.modifier_apply(modifier=mod.name)
            except Exception:
                pass

bpy.ops.wm.obj_export(
    filepath="{out_path}",
    export_selected_objects=False,
    export_uv=True,
    export_normals=True,
    export_materials=False,
    forward_axis='NEGATIVE_Y',
    up_axis='Z',
    global_scale=1.0,
)
print("{marker} exported " + str(sum(1 for o in bpy.data.objects if o.type == 'MESH')) + " meshes")
"#,
        out_path = out_path.display(),
        marker = EXPORT_MARKER,
    )
}

/// Python snippet importing a downloaded model so the export trailer can
/// re-export it as OBJ. `.blend` files are opened via the command line
/// instead, so they get no import line.
pub fn import_snippet(source: &Path, extension: &str) -> Option<String> {
    let path = source.display();
    match extension {
        "glb" | "gltf" => Some(format!(
            "import bpy\nbpy.ops.wm.read_factory_settings(use_empty=True)\nbpy.ops.import_scene.gltf(filepath=\"{path}\")\n"
        )),
        "fbx" => Some(format!(
            "import bpy\nbpy.ops.wm.read_factory_settings(use_empty=True)\nbpy.ops.import_scene.fbx(filepath=\"{path}\")\n"
        )),
        _ => None,
    }
}

/// A composed script written to the scratch directory. The file is removed
/// when the guard drops, so cleanup holds on every exit path, including
/// timeouts and process failures.
#[derive(Debug)]
pub struct TempScript {
    path: PathBuf,
}

impl TempScript {
    /// Write `text` to a uniquely named file in `dir`. The name combines a
    /// millisecond timestamp with a random suffix so rapid concurrent calls
    /// cannot collide.
    pub fn materialize(text: &str, dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create scratch directory {}", dir.display()))?;
        let name = format!(
            "script_{}_{:04x}.py",
            chrono::Utc::now().timestamp_millis(),
            rand::thread_rng().gen::<u16>()
        );
        let path = dir.join(name);
        fs::write(&path, text)
            .with_context(|| format!("Failed to write script {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempScript {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Strip Blender's banner lines and blank lines from captured stdout.
pub fn filter_banner(stdout: &str) -> String {
    stdout
        .lines()
        .filter(|line| !line.starts_with("Blender ") && !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep only the pipeline-relevant marker lines.
pub fn marker_lines(stdout: &str) -> String {
    stdout
        .lines()
        .filter(|line| line.contains(EXPORT_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Last `n` lines of a stream, for bounded diagnostics.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
