use regex::Regex;
use std::process::Command;

fn main() {
    let manip_build = get_version().unwrap_or(format!("{} (Cargo)", env!("CARGO_PKG_VERSION")));

    println!("cargo:rustc-env=MANIP_BUILD={}", &manip_build);
    println!("cargo:rerun-if-changed=.git/HEAD");
}

fn get_version() -> Result<String, Box<dyn std::error::Error>> {
    let re = Regex::new(r"v([0-9.]+)-([0-9]+)-g([a-f0-9]+)")?;
    let output = Command::new("git")
        .args(["describe", "--tags", "--abbrev=7"])
        .output()?;

    if !output.status.success() {
        return Err("git describe failed".into());
    }

    let output_str = String::from_utf8(output.stdout)?;
    let trimmed = output_str.trim();
    if trimmed.is_empty() {
        return Err("no tags".into());
    }

    Ok(re.replace_all(trimmed, "${1}.r${2}.${3}").into_owned())
}
