// Blender-side plumbing
//
// Composes export scripts, materializes them as self-cleaning temp files,
// builds headless Blender invocations and post-processes Blender's stdout.

mod artifact;
mod invoke;
mod script;

pub use artifact::ArtifactReference;
pub use invoke::{BlenderRunner, EXPORT_TIMEOUT, RUN_TIMEOUT};
pub use script::{
    compose, filter_banner, import_snippet, marker_lines, obj_export_trailer, tail_lines,
    TempScript, EXPORT_MARKER,
};
