use std::process::Command;

fn main() {
    // Short commit hash shown by `scholar --version`
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output();

    let git_hash = match output {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        _ => "unknown".to_string(),
    };

    println!("cargo:rustc-env=SCHOLAR_GIT_HASH={}", git_hash);
    println!("cargo:rerun-if-changed=build.rs");
}
