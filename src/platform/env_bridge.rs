use std::collections::BTreeMap;
use std::path::Path;

use super::Platform;

/// Loader search-path variable the platform needs set explicitly, if any.
pub fn loader_path_variable(platform: Platform) -> Option<&'static str> {
    match platform {
        Platform::Linux => Some("LD_LIBRARY_PATH"),
        Platform::MacOs => Some("DYLD_LIBRARY_PATH"),
        Platform::Windows | Platform::Unrecognized => None,
    }
}

/// Environment a managed-runtime process needs to load `artifact`.
///
/// The value is the artifact's containing directory, never the file itself.
/// Empty on platforms whose loader needs no hint.
pub fn bridge_environment(platform: Platform, artifact: &Path) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    let (Some(variable), Some(dir)) = (loader_path_variable(platform), artifact.parent()) else {
        return env;
    };
    let dir = dir.to_string_lossy().into_owned();
    log::info!("Setting {} to: {}", variable, dir);
    env.insert(variable.to_string(), dir);
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_maps_containing_directory() {
        let env = bridge_environment(Platform::Linux, Path::new("/work/build/src/libYini.so"));
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("LD_LIBRARY_PATH").map(String::as_str), Some("/work/build/src"));
    }

    #[test]
    fn macos_uses_dyld_variable() {
        let env = bridge_environment(Platform::MacOs, Path::new("/work/build/src/libYini.dylib"));
        assert_eq!(env.get("DYLD_LIBRARY_PATH").map(String::as_str), Some("/work/build/src"));
    }

    #[test]
    fn windows_and_unknown_need_nothing() {
        assert!(bridge_environment(Platform::Windows, Path::new("C:/b/src/Release/Yini.dll")).is_empty());
        assert!(bridge_environment(Platform::Unrecognized, Path::new("/b/x")).is_empty());
    }

    #[test]
    fn value_is_never_the_artifact_itself() {
        let artifact = Path::new("/work/build/src/libYini.so");
        for value in bridge_environment(Platform::Linux, artifact).values() {
            assert_ne!(Path::new(value), artifact);
            assert_eq!(Some(Path::new(value)), artifact.parent());
        }
    }
}
