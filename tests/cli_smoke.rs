use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_ringspin")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "ringspin.exe"
            } else {
                "ringspin"
            });
            p
        })
}

#[test]
fn cli_frame_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let cfg_path = dir.join("scene.json");
    let script_path = dir.join("script.json");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);

    let cfg = ringspin::SceneConfig::mobile(ringspin::Canvas {
        width: 96,
        height: 64,
    });
    let f = std::fs::File::create(&cfg_path).unwrap();
    serde_json::to_writer_pretty(f, &cfg).unwrap();

    std::fs::write(
        &script_path,
        r#"[{ "tick": 1, "command": { "type": "toggle_connection" } }]"#,
    )
    .unwrap();

    let status = std::process::Command::new(exe())
        .args(["frame", "--ticks", "3", "--config"])
        .arg(&cfg_path)
        .arg("--script")
        .arg(&script_path)
        .arg("--out")
        .arg(&out_path)
        .env_remove("RINGSPIN_FONT")
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap();
    assert_eq!((img.width(), img.height()), (96, 64));
}

#[test]
fn cli_frames_writes_sequence() {
    let dir = PathBuf::from("target").join("cli_smoke_frames");
    let _ = std::fs::remove_dir_all(&dir);

    let status = std::process::Command::new(exe())
        .args([
            "frames",
            "--width",
            "300",
            "--height",
            "300",
            "--seconds",
            "1",
            "--fps",
            "2",
            "--out-dir",
        ])
        .arg(&dir)
        .env_remove("RINGSPIN_FONT")
        .status()
        .unwrap();

    assert!(status.success());
    assert!(dir.join("frame_001.png").exists());
    assert!(dir.join("frame_002.png").exists());
    assert!(!dir.join("frame_003.png").exists());
}

#[test]
fn cli_rejects_bad_config() {
    let dir = PathBuf::from("target").join("cli_smoke_bad");
    std::fs::create_dir_all(&dir).unwrap();
    let cfg_path = dir.join("scene.json");
    std::fs::write(
        &cfg_path,
        r#"{ "canvas": { "width": 10, "height": 10 }, "circles": [] }"#,
    )
    .unwrap();

    let status = std::process::Command::new(exe())
        .args(["frame", "--out", "target/cli_smoke_bad/out.png", "--config"])
        .arg(&cfg_path)
        .status()
        .unwrap();
    assert!(!status.success());
}
