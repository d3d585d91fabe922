#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const VMLINUX: &str = "/usr/lib/debug/lib/modules/3.10.0-1160.el7.x86_64/vmlinux";
pub const VMLINUX_CONTENT: &[u8] = b"\x7fELF kernel image with symbols";

/// Package stand-in: a tar archive whose members are stored as `./usr/...`.
pub fn build_archive(dir: &Path, name: &str, with_vmlinux: bool) -> PathBuf {
    let payload = dir.join(format!("{}.payload", name));
    fs::create_dir_all(payload.join("usr/share/doc/kernel")).unwrap();
    fs::write(payload.join("usr/share/doc/kernel/COPYING"), b"GPLv2").unwrap();

    if with_vmlinux {
        let member = payload.join(VMLINUX.trim_start_matches('/'));
        fs::create_dir_all(member.parent().unwrap()).unwrap();
        fs::write(&member, VMLINUX_CONTENT).unwrap();
    }

    let archive = dir.join(name);
    let status = Command::new("tar")
        .arg("-cf")
        .arg(&archive)
        .arg("-C")
        .arg(&payload)
        .arg(".")
        .status()
        .unwrap();
    assert!(status.success());
    fs::remove_dir_all(&payload).unwrap();

    archive
}

pub struct IndexPackage<'a> {
    pub version: &'a str,
    pub location: &'a str,
    pub files: &'a [&'a str],
}

/// Repository index with a debug repository holding `packages` and an
/// enabled base repository that the default disable pattern switches off.
pub fn write_index(dir: &Path, packages: &[IndexPackage<'_>]) -> PathBuf {
    let mut index = String::from(
        "[[repository]]\nid = \"repo-base\"\nenabled = true\nbaseurl = \"base\"\n\n\
         [[repository]]\nid = \"repo-debug\"\nenabled = false\nbaseurl = \"packages\"\n",
    );

    for package in packages {
        let files: Vec<String> = package.files.iter().map(|f| format!("\"{}\"", f)).collect();
        index.push_str(&format!(
            "\n[[repository.package]]\nname = \"kernel-debuginfo\"\nversion = \"{}\"\n\
             release = \"1160.el7\"\narch = \"x86_64\"\nlocation = \"{}\"\nfiles = [{}]\n",
            package.version,
            package.location,
            files.join(", ")
        ));
    }

    let path = dir.join("repos.toml");
    fs::write(&path, index).unwrap();
    fs::create_dir_all(dir.join("packages")).unwrap();
    path
}

/// Configuration using `cat` and `tar` in place of rpm2cpio and cpio.
pub fn write_config(dir: &Path, index: &Path, output_root: &Path) -> PathBuf {
    let config = format!(
        "[repositories]\nindex = \"{}\"\n\n\
         [extraction]\noutput_root = \"{}\"\n\n\
         [tools]\nconverter = \"cat\"\nconverter_args = []\nunpacker = \"tar\"\nunpacker_args = [\"-xf\", \"-\"]\n\n\
         [download]\ncache_dir = \"{}\"\n",
        index.display(),
        output_root.display(),
        dir.join("cache").display()
    );

    let path = dir.join("debugsym.toml");
    fs::write(&path, config).unwrap();
    path
}
