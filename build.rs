use std::process::Command;

/// `git` を実行して成功したときだけ標準出力を返す
fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&out.stdout).trim().to_owned())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    // git の無い環境 (tarball からのビルド等) 向けの上書き
    println!("cargo:rerun-if-env-changed=REP_TRACKER_VERSION");

    let pkg = env!("CARGO_PKG_VERSION");
    let version = match std::env::var("REP_TRACKER_VERSION") {
        Ok(v) if !v.is_empty() => v,
        _ => match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) => {
                let dirty = git(&["status", "--porcelain", "--untracked-files=no"]).is_some_and(|s| !s.is_empty());
                format!("{}+{}{}", pkg, hash, if dirty { "-dirty" } else { "" })
            }
            None => pkg.to_owned(),
        },
    };

    println!("cargo:rustc-env=GIT_VERSION={}", version);
}
