use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn voxchat_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_voxchat").expect("voxchat test binary not built")
}

#[test]
fn voxchat_help_mentions_name() {
    let output = Command::new(voxchat_bin())
        .arg("--help")
        .output()
        .expect("run voxchat --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("voxchat"));
    assert!(combined.contains("--vosk-model"));
}

#[test]
fn voxchat_rejects_out_of_range_threshold() {
    let output = Command::new(voxchat_bin())
        .args(["--threshold", "1.5"])
        .output()
        .expect("run voxchat --threshold 1.5");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--threshold"));
}

#[test]
fn voxchat_rejects_non_http_ollama_address() {
    let output = Command::new(voxchat_bin())
        .args(["--ollama-address", "localhost:11434"])
        .output()
        .expect("run voxchat with bad address");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--ollama-address"));
}
