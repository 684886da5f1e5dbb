//! Build script for mpi-debug-demos
//!
//! Locates an MPI installation, compiles the C shim in `csrc/` against it and
//! emits the link flags for the library and both binaries.

use std::env;
use std::path::PathBuf;
use std::process::Command;

const SHIM_SOURCE: &str = "csrc/mpishim.c";
const SHIM_HEADER: &str = "csrc/mpishim.h";

fn main() {
    println!("cargo:rerun-if-changed={SHIM_SOURCE}");
    println!("cargo:rerun-if-changed={SHIM_HEADER}");
    println!("cargo:rerun-if-env-changed=MPI_PKG_CONFIG");
    println!("cargo:rerun-if-env-changed=MPICC");

    let mpi = locate_mpi();

    let mut build = cc::Build::new();
    build
        .file(SHIM_SOURCE)
        .include("csrc")
        .warnings(true)
        .extra_warnings(true)
        // The shim is stepped through by the debuggers these demos target.
        .debug(true);
    for path in &mpi.include_paths {
        build.include(path);
    }
    build.compile("mpishim");

    for path in &mpi.link_paths {
        println!("cargo:rustc-link-search=native={}", path.display());
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", path.display());
    }
    for lib in &mpi.libs {
        println!("cargo:rustc-link-lib={lib}");
    }

    if let Some(version) = mpi.version {
        println!("cargo:rustc-env=MPI_DEMOS_MPI_VERSION={version}");
    }
}

struct MpiInstall {
    include_paths: Vec<PathBuf>,
    link_paths: Vec<PathBuf>,
    libs: Vec<String>,
    version: Option<String>,
}

fn locate_mpi() -> MpiInstall {
    if let Ok(pkg_name) = env::var("MPI_PKG_CONFIG") {
        if let Ok(found) = probe_pkg_config(&pkg_name) {
            eprintln!("mpi-debug-demos: MPI via MPI_PKG_CONFIG={pkg_name}");
            return found;
        }
    }

    for pkg_name in ["mpich", "ompi", "mpi"] {
        if let Ok(found) = probe_pkg_config(pkg_name) {
            eprintln!("mpi-debug-demos: MPI via pkg-config {pkg_name}");
            return found;
        }
    }

    match probe_mpicc() {
        Ok(found) => {
            eprintln!("mpi-debug-demos: MPI via mpicc -show");
            return found;
        }
        Err(e) => eprintln!("mpi-debug-demos: {e}"),
    }

    for prefix in ["/usr", "/usr/local", "/opt/mpich", "/opt/openmpi"] {
        let include = PathBuf::from(prefix).join("include");
        if include.join("mpi.h").exists() {
            eprintln!("mpi-debug-demos: MPI headers under {prefix}");
            return MpiInstall {
                include_paths: vec![include],
                link_paths: vec![PathBuf::from(prefix).join("lib")],
                libs: vec!["mpi".to_string()],
                version: None,
            };
        }
    }

    panic!(
        "Could not find an MPI installation. Install MPICH or Open MPI and either:\n\
         - set MPI_PKG_CONFIG to its pkg-config name (e.g. 'mpich' or 'ompi')\n\
         - put 'mpicc' on PATH, or point MPICC at it"
    );
}

fn probe_pkg_config(name: &str) -> Result<MpiInstall, pkg_config::Error> {
    let lib = pkg_config::Config::new()
        .cargo_metadata(false)
        .probe(name)?;

    Ok(MpiInstall {
        include_paths: lib.include_paths,
        link_paths: lib.link_paths,
        libs: lib.libs,
        version: Some(lib.version),
    })
}

fn probe_mpicc() -> Result<MpiInstall, String> {
    let mpicc = env::var("MPICC").unwrap_or_else(|_| "mpicc".to_string());

    let output = Command::new(&mpicc)
        .arg("-show")
        .output()
        .map_err(|e| format!("failed to run '{mpicc} -show': {e}"))?;
    if !output.status.success() {
        return Err(format!("'{mpicc} -show' exited with {}", output.status));
    }

    Ok(parse_compiler_flags(&String::from_utf8_lossy(&output.stdout)))
}

/// Pull `-I`, `-L` and `-l` flags out of a compiler wrapper command line.
fn parse_compiler_flags(show: &str) -> MpiInstall {
    let mut install = MpiInstall {
        include_paths: Vec::new(),
        link_paths: Vec::new(),
        libs: Vec::new(),
        version: None,
    };

    for flag in show.split_whitespace() {
        if let Some(path) = flag.strip_prefix("-I") {
            install.include_paths.push(PathBuf::from(path));
        } else if let Some(path) = flag.strip_prefix("-L") {
            install.link_paths.push(PathBuf::from(path));
        } else if let Some(lib) = flag.strip_prefix("-l") {
            install.libs.push(lib.to_string());
        }
    }

    if install.libs.is_empty() {
        install.libs.push("mpi".to_string());
    }
    install
}
