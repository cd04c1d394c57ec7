//! `apuforge build`

use crate::cli::Backend;
use crate::error::EnvironmentError;
use crate::utils::command_exists;
use crate::utils::process::Invocation;
use apuforge_kernel::{ActiveConfiguration, BuildKind};
use colored::Colorize;
use std::path::PathBuf;

const DEFAULT_ARCH: &str = "gfx1151";

impl From<Backend> for BuildKind {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Rocm => Self::Rocm,
            Backend::Vulkan => Self::Vulkan,
        }
    }
}

/// cmake configure and build steps for one backend.
pub fn plan(active: &ActiveConfiguration, build: BuildKind, arch: &str) -> Vec<Invocation> {
    let source = active.paths().engine_root.display().to_string();
    let build_dir = active
        .paths()
        .engine_root
        .join(build.build_dir())
        .display()
        .to_string();

    let mut configure = vec!["-S".to_string(), source, "-B".to_string(), build_dir.clone()];
    match build {
        BuildKind::Rocm => {
            configure.push("-DGGML_HIP=ON".to_string());
            configure.push(format!("-DAMDGPU_TARGETS={arch}"));
        }
        BuildKind::Vulkan => configure.push("-DGGML_VULKAN=ON".to_string()),
    }
    configure.push("-DCMAKE_BUILD_TYPE=Release".to_string());

    let mut configure = Invocation::new("cmake", configure);
    if build == BuildKind::Rocm {
        let runtime = &active.paths().runtime_root;
        configure = configure
            .with_env("HIPCXX", runtime.join("llvm/bin/clang").display().to_string())
            .with_env("HIP_PATH", runtime.display().to_string());
    }

    let compile = Invocation::new(
        "cmake",
        ["--build", build_dir.as_str(), "--config", "Release", "-j"],
    );
    vec![configure, compile]
}

/// Server binary produced by `plan` for `build`, which may differ from
/// the profile's own build directory.
pub fn built_binary(active: &ActiveConfiguration, build: BuildKind) -> PathBuf {
    active
        .paths()
        .engine_root
        .join(build.build_dir())
        .join("bin")
        .join("llama-server")
}

pub fn run(
    active: &ActiveConfiguration,
    backend: Option<Backend>,
    arch: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let build = backend.map(BuildKind::from).unwrap_or(active.hardware().build);
    let arch = arch
        .or_else(|| active.hardware().gpu_arch.clone())
        .unwrap_or_else(|| DEFAULT_ARCH.to_string());

    if !dry_run {
        if !command_exists("cmake") {
            return Err(EnvironmentError::MissingTool("cmake".to_string()).into());
        }
        let cmake_lists = active.paths().engine_root.join("CMakeLists.txt");
        if !cmake_lists.is_file() {
            return Err(EnvironmentError::MissingSourceTree(active.paths().engine_root.clone()).into());
        }
    }

    println!(
        "{} Building llama.cpp ({build}) in {}",
        "→".green(),
        active.paths().engine_root.join(build.build_dir()).display()
    );
    for step in plan(active, build, &arch) {
        step.execute(dry_run)?;
    }
    if !dry_run {
        println!("{} Build successful: {}", "✓".green(), built_binary(active, build).display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuforge_kernel::{Overrides, Registries};

    #[test]
    fn rocm_plan_targets_the_architecture() {
        let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
        let steps = plan(&active, BuildKind::Rocm, "gfx1151");
        assert_eq!(steps.len(), 2);
        let configure = steps[0].display();
        assert!(configure.contains("-B /opt/llama.cpp/build-rocm"));
        assert!(configure.contains("-DGGML_HIP=ON"));
        assert!(configure.contains("-DAMDGPU_TARGETS=gfx1151"));
        assert!(configure.contains("-DCMAKE_BUILD_TYPE=Release"));
        assert!(configure.starts_with("HIPCXX=/opt/rocm/llvm/bin/clang HIP_PATH=/opt/rocm cmake"));
        assert_eq!(
            steps[1].display(),
            "cmake --build /opt/llama.cpp/build-rocm --config Release -j"
        );
    }

    #[test]
    fn vulkan_plan_needs_no_hip_environment() {
        let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
        let steps = plan(&active, BuildKind::Vulkan, "ignored");
        assert!(steps[0].env.is_empty());
        assert!(steps[0].args.contains(&"-DGGML_VULKAN=ON".to_string()));
        assert!(!steps[0].display().contains("AMDGPU_TARGETS"));
        assert!(steps[1].display().contains("build-vulkan"));
    }

    #[test]
    fn built_binary_follows_the_requested_backend() {
        let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
        assert_eq!(
            built_binary(&active, BuildKind::Vulkan),
            PathBuf::from("/opt/llama.cpp/build-vulkan/bin/llama-server")
        );
        assert_eq!(built_binary(&active, active.hardware().build), active.engine_binary());
    }
}
